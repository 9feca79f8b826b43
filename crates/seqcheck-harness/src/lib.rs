#![forbid(unsafe_code)]

//! Verification harness for seqcheck.
//!
//! The pieces, leaves first:
//!
//! - [`orders`]: the access-order catalog every source is read through
//! - [`collect`]: drives one reader through one order
//! - [`classify`]: separates known leading-frame desyncs from real mismatches
//! - [`compare`]: cross-source comparison against a baseline
//! - [`determinism`]: repeated-read stability
//! - [`decode`]: the external decoder under test
//!
//! [`RunConfig`] carries all tunables; [`RunWorkspace`] owns the scratch
//! directory of one run.

pub mod artifact;
pub mod classify;
pub mod collect;
pub mod compare;
pub mod config;
pub mod decode;
pub mod determinism;
pub mod error;
pub mod orders;

pub use artifact::MismatchArtifact;
pub use classify::{MismatchKind, MismatchReport, PositionMismatch, classify, mismatch_positions};
pub use collect::{DigestSequence, collect, collect_sequence};
pub use compare::{Comparator, ComparisonOutcome, OrderRun, RunStatus, SourceRun, check_bad_index};
pub use config::{RunConfig, RunWorkspace, close_dir};
pub use decode::{DecodeCommand, frame_path, require_program};
pub use determinism::{
    DeterminismReport, DigestProducer, ExternalDecode, ReaderReplay, check_determinism,
    repeated_compare,
};
pub use error::{HarnessError, Result};
pub use orders::{AccessOrder, OrderSet};
