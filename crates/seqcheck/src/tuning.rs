#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Args;
use seqcheck_harness::{Result, RunConfig};

/// Flags shared by every verification command. Unset flags fall back to
/// `SEQCHECK_*` environment variables, then to built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct TuningArgs {
    /// Seed for the random access orders.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Cap on the number of frames the orders cover.
    #[arg(long = "max-length")]
    pub max_length: Option<usize>,

    /// Samples per random order.
    #[arg(long = "orders")]
    pub order_count: Option<usize>,

    /// Hash every Nth byte of each frame.
    #[arg(long)]
    pub stride: Option<usize>,

    /// Read every source in sequential order only.
    #[arg(long = "seq-only")]
    pub sequential_only: bool,

    /// Where to write the mismatch bundle.
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    #[arg(long = "no-artifact", conflicts_with = "artifact")]
    pub no_artifact: bool,

    /// Parent directory for per-run scratch space.
    #[arg(long)]
    pub scratch: Option<PathBuf>,
}

impl TuningArgs {
    pub fn resolve(&self) -> Result<RunConfig> {
        self.apply(RunConfig::from_env()?)
    }

    pub fn apply(&self, mut config: RunConfig) -> Result<RunConfig> {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_length) = self.max_length {
            config.max_length = max_length;
        }
        if let Some(order_count) = self.order_count {
            config.order_count = order_count;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }
        config.sequential_only |= self.sequential_only;
        if self.no_artifact {
            config.artifact_path = None;
        } else if let Some(artifact) = &self.artifact {
            config.artifact_path = Some(artifact.clone());
        }
        if let Some(scratch) = &self.scratch {
            config.scratch_root = scratch.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
