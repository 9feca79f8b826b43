#![forbid(unsafe_code)]

//! Run configuration and the scoped run workspace.
//!
//! Environment overrides (all optional):
//!
//! | variable                   | field             |
//! |----------------------------|-------------------|
//! | `SEQCHECK_SEED`            | `seed`            |
//! | `SEQCHECK_ORDER_COUNT`     | `order_count`     |
//! | `SEQCHECK_MAX_LENGTH`      | `max_length`      |
//! | `SEQCHECK_STRIDE`          | `stride`          |
//! | `SEQCHECK_SEQUENTIAL_ONLY` | `sequential_only` |
//! | `SEQCHECK_SCRATCH_DIR`     | `scratch_root`    |

use std::io;
use std::path::{Path, PathBuf};

use seqcheck_core::DEFAULT_STRIDE;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{HarnessError, Result};

pub const DEFAULT_ORDER_COUNT: usize = 20;
pub const DEFAULT_MAX_LENGTH: usize = 500;
pub const DEFAULT_SEED: u64 = 0x5E0C_4EC4;
pub const DEFAULT_ARTIFACT: &str = "mismatch.json";
pub const DEFAULT_DECODER: &str = "ffmpeg";
pub const DEFAULT_DECODE_FRAMES: usize = 10;
pub const DEFAULT_ITERATIONS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Samples drawn for each random order.
    pub order_count: usize,
    /// Cap on the frame count used to build orders.
    pub max_length: usize,
    pub stride: usize,
    pub seed: u64,
    pub sequential_only: bool,
    /// Where the mismatch bundle goes; `None` disables it.
    pub artifact_path: Option<PathBuf>,
    pub scratch_root: PathBuf,
    pub decoder: String,
    pub decode_frames: usize,
    pub iterations: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            order_count: DEFAULT_ORDER_COUNT,
            max_length: DEFAULT_MAX_LENGTH,
            stride: DEFAULT_STRIDE,
            seed: DEFAULT_SEED,
            sequential_only: false,
            artifact_path: Some(PathBuf::from(DEFAULT_ARTIFACT)),
            scratch_root: std::env::temp_dir(),
            decoder: DEFAULT_DECODER.to_string(),
            decode_frames: DEFAULT_DECODE_FRAMES,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl RunConfig {
    /// Defaults with `SEQCHECK_*` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|_| {
                        HarnessError::invalid(format!("{key}={raw:?} is not a number"))
                    })
                })
                .transpose()
        };

        if let Some(seed) = number("SEQCHECK_SEED")? {
            self.seed = seed;
        }
        if let Some(count) = number("SEQCHECK_ORDER_COUNT")? {
            self.order_count = count as usize;
        }
        if let Some(max) = number("SEQCHECK_MAX_LENGTH")? {
            self.max_length = max as usize;
        }
        if let Some(stride) = number("SEQCHECK_STRIDE")? {
            self.stride = stride as usize;
        }
        if let Some(flag) = lookup("SEQCHECK_SEQUENTIAL_ONLY") {
            self.sequential_only = matches!(flag.as_str(), "1" | "true" | "TRUE");
        }
        if let Some(dir) = lookup("SEQCHECK_SCRATCH_DIR") {
            self.scratch_root = PathBuf::from(dir);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(HarnessError::invalid("max_length must be at least 1"));
        }
        if self.stride == 0 {
            return Err(HarnessError::invalid("stride must be at least 1"));
        }
        Ok(())
    }
}

/// Remove a temporary directory; a directory that is already gone is fine.
pub fn close_dir(dir: TempDir) -> io::Result<()> {
    match dir.close() {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Scratch directory owned by one run. Created at run start, removed by
/// [`RunWorkspace::close`] (or on drop, best effort).
#[derive(Debug)]
pub struct RunWorkspace {
    dir: TempDir,
}

impl RunWorkspace {
    pub fn create(config: &RunConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.scratch_root)?;
        let dir = tempfile::Builder::new()
            .prefix("seqcheck-")
            .tempdir_in(&config.scratch_root)?;
        debug!(path = %dir.path().display(), "created run workspace");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fresh subdirectory for one decode invocation.
    pub fn scoped_dir(&self, prefix: &str) -> Result<TempDir> {
        Ok(tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(self.path())?)
    }

    pub fn close(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        close_dir(self.dir)?;
        debug!(path = %path.display(), "removed run workspace");
        Ok(())
    }
}
