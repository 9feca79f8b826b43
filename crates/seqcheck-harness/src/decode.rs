#![forbid(unsafe_code)]

//! External container decoder invocation.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Output file pattern handed to the decoder.
pub const DUMP_PATTERN: &str = "frames%06d.png";

/// Path of dumped frame `number` (1-based, as the decoder numbers them).
#[must_use]
pub fn frame_path(dir: &Path, number: usize) -> PathBuf {
    dir.join(format!("frames{number:06}.png"))
}

pub fn command_exists(command: &str) -> bool {
    which::which(command).is_ok()
}

pub fn require_program(program: &str) -> Result<()> {
    if command_exists(program) {
        Ok(())
    } else {
        Err(HarnessError::MissingCommand {
            command: program.to_string(),
        })
    }
}

/// `PROGRAM -i INPUT -vsync 0 -vframes N DIR/frames%06d.png`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeCommand {
    pub program: String,
    pub input: PathBuf,
}

impl DecodeCommand {
    #[must_use]
    pub fn new(program: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            input: input.into(),
        }
    }

    #[must_use]
    pub fn command(&self, frame_limit: usize, dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-i")
            .arg(&self.input)
            .arg("-vsync")
            .arg("0")
            .arg("-vframes")
            .arg(frame_limit.to_string())
            .arg(dir.join(DUMP_PATTERN))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    /// Dump up to `frame_limit` frames into `dir`. Blocks until the decoder
    /// exits.
    pub fn dump(&self, frame_limit: usize, dir: &Path) -> Result<()> {
        debug!(
            program = %self.program,
            input = %self.input.display(),
            frame_limit,
            dir = %dir.display(),
            "running decoder"
        );
        let status = self.command(frame_limit, dir).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(HarnessError::ExternalToolFailure {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_six_digit_one_based() {
        let dir = Path::new("/scratch");
        assert_eq!(
            frame_path(dir, 1),
            PathBuf::from("/scratch/frames000001.png")
        );
        assert_eq!(
            frame_path(dir, 123_456),
            PathBuf::from("/scratch/frames123456.png")
        );
    }

    #[test]
    fn command_line_matches_decoder_convention() {
        let cmd = DecodeCommand::new("ffmpeg", "in.mp4").command(10, Path::new("out"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let expected_dump = Path::new("out").join(DUMP_PATTERN);
        assert_eq!(
            args,
            vec![
                "-i".to_string(),
                "in.mp4".into(),
                "-vsync".into(),
                "0".into(),
                "-vframes".into(),
                "10".into(),
                expected_dump.to_string_lossy().into_owned(),
            ]
        );
        assert_eq!(cmd.get_program(), "ffmpeg");
    }

    #[test]
    fn missing_program_is_reported() {
        let err = require_program("seqcheck-no-such-decoder-binary").expect_err("missing");
        assert!(matches!(err, HarnessError::MissingCommand { .. }));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn spawn_failure_is_io() {
        let dir = tempfile::tempdir().expect("dir");
        let err = DecodeCommand::new("seqcheck-no-such-decoder-binary", "in.mp4")
            .dump(1, dir.path())
            .expect_err("spawn");
        assert!(matches!(err, HarnessError::Io(_)));
    }
}
