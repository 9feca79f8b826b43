#![forbid(unsafe_code)]

pub mod cli;
pub mod compare;
pub mod convert;
pub mod determinism;
pub mod hash;
pub mod logging;
pub mod output;
pub mod tuning;

pub use cli::{Cli, run};
pub use seqcheck_harness::{HarnessError, Result};
