// Writes the TypeScript bindings for the presentation-facing types.
// Run with: cargo run -p comic --bin export_types

use comic::{ArchiveFormat, CollectionSummary, MediaKind, PageSummary};
use ts_rs::TS;

fn main() -> Result<(), ts_rs::ExportError> {
    println!("Exporting TypeScript types...");

    ArchiveFormat::export()?;
    MediaKind::export()?;
    PageSummary::export()?;
    CollectionSummary::export()?;

    println!("TypeScript types exported to bindings/");
    Ok(())
}
