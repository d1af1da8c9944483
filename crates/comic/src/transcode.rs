//! HEIC/HEIF transcoding through an external tool.

use crate::error::TranscodeError;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Output format requested from a transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
    Png,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
        }
    }
}

/// Converts HEIC/HEIF bytes into a widely renderable format.
pub trait Transcoder: Send + Sync + fmt::Debug {
    /// `quality` is a fraction in `0.0..=1.0`.
    fn transcode(
        &self,
        bytes: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, TranscodeError>;
}

/// Command-line tools able to decode HEIF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderTool {
    /// `heif-convert` from libheif
    HeifConvert,
    /// ImageMagick 7 `magick`
    ImageMagick,
}

impl TranscoderTool {
    /// Probe order.
    pub const ALL: [TranscoderTool; 2] = [TranscoderTool::HeifConvert, TranscoderTool::ImageMagick];

    pub fn program(&self) -> &'static str {
        match self {
            TranscoderTool::HeifConvert => "heif-convert",
            TranscoderTool::ImageMagick => "magick",
        }
    }
}

/// Transcoder that runs an installed tool over scratch files.
#[derive(Debug, Clone)]
pub struct ExternalTranscoder {
    tool: TranscoderTool,
    program: PathBuf,
}

impl ExternalTranscoder {
    pub fn new(tool: TranscoderTool, program: PathBuf) -> Self {
        Self { tool, program }
    }

    /// Find the first supported tool on `PATH`.
    pub fn probe() -> Option<Self> {
        let path_var = env::var_os("PATH")?;
        let dirs: Vec<PathBuf> = env::split_paths(&path_var).collect();

        for tool in TranscoderTool::ALL {
            if let Some(program) = find_program(&dirs, tool.program()) {
                tracing::info!("Using {} for HEIC transcoding", program.display());
                return Some(Self::new(tool, program));
            }
        }

        tracing::info!("No HEIC transcoder found on PATH");
        None
    }

    pub fn tool(&self) -> TranscoderTool {
        self.tool
    }

    fn command(&self, input: &Path, output: &Path, quality: u8) -> Command {
        let mut command = Command::new(&self.program);
        match self.tool {
            TranscoderTool::HeifConvert => {
                command
                    .arg("-q")
                    .arg(quality.to_string())
                    .arg(input)
                    .arg(output);
            }
            TranscoderTool::ImageMagick => {
                command
                    .arg(input)
                    .arg("-quality")
                    .arg(quality.to_string())
                    .arg(output);
            }
        }
        command
    }
}

impl Transcoder for ExternalTranscoder {
    fn transcode(
        &self,
        bytes: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, TranscodeError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("input.heic");
        let output = scratch.path().join(format!("output.{}", target.extension()));
        std::fs::write(&input, bytes)?;

        let quality = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
        let result = self.command(&input, &output, quality).output()?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TranscodeError::Failed(format!(
                "{} exited with {}: {}",
                self.tool.program(),
                result.status,
                stderr.trim()
            )));
        }

        let converted = std::fs::read(&output)?;
        if converted.is_empty() {
            return Err(TranscodeError::Failed("transcoder produced no output".to_string()));
        }
        Ok(converted)
    }
}

fn find_program(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| candidate_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|candidate| candidate.is_file())
}

fn candidate_names(name: &str) -> Vec<String> {
    if cfg!(windows) {
        vec![format!("{}.exe", name), name.to_string()]
    } else {
        vec![name.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_program_in_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join(candidate_names("heif-convert")[0].clone());
        std::fs::write(&bin, b"").unwrap();

        let dirs = vec![PathBuf::from("/nonexistent-dir"), temp_dir.path().to_path_buf()];
        assert_eq!(find_program(&dirs, "heif-convert"), Some(bin));
        assert_eq!(find_program(&dirs, "magick"), None);
    }

    #[test]
    fn test_target_format_mapping() {
        assert_eq!(TargetFormat::Jpeg.extension(), "jpg");
        assert_eq!(TargetFormat::Jpeg.mime(), "image/jpeg");
        assert_eq!(TargetFormat::Png.mime(), "image/png");
    }

    #[test]
    fn test_missing_program_fails_without_panic() {
        let transcoder = ExternalTranscoder::new(
            TranscoderTool::HeifConvert,
            PathBuf::from("/nonexistent-dir/heif-convert"),
        );
        let result = transcoder.transcode(b"not heic", TargetFormat::Jpeg, 0.9);
        assert!(matches!(result, Err(TranscodeError::Io(_))));
    }
}
