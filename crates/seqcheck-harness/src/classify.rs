#![forbid(unsafe_code)]

//! Known decoder desync patterns.
//!
//! Two artifacts of container decoders are cataloged:
//!
//! - `frame_0_dup`: frame 0 is emitted twice and true frame 1 is lost, so
//!   position 1 holds a copy of position 0 while everything from position 2
//!   onward still lines up.
//! - `frame_0_missing`: the leading frame is dropped and the whole sequence
//!   shifts left by one.
//!
//! Both are tested in each direction, so the verdict does not depend on
//! which side is the baseline. Anything else is [`MismatchKind::Unknown`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use seqcheck_core::FrameDigest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    #[serde(rename = "frame_0_dup")]
    Frame0Dup,
    #[serde(rename = "frame_0_missing")]
    Frame0Missing,
    Unknown,
}

impl MismatchKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frame0Dup => "frame_0_dup",
            Self::Frame0Missing => "frame_0_missing",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn frame_0_dup_one_way<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len()
        && a.len() >= 2
        && a[0] == b[0]
        && a[1] != b[1]
        && b[1] == a[0]
        && a[2..] == b[2..]
}

/// `b` is `a` without its leading frame: either the same length with one
/// new trailing frame, or exactly one frame shorter.
fn frame_0_missing_one_way<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() < 2 {
        return false;
    }
    if b.len() == a.len() {
        a[1..] == b[..b.len() - 1]
    } else if b.len() + 1 == a.len() {
        a[1..] == b[..]
    } else {
        false
    }
}

/// Classify a divergence between two digest sequences.
///
/// Meant for sequences already known to differ.
#[must_use]
pub fn classify<T: PartialEq>(a: &[T], b: &[T]) -> MismatchKind {
    if frame_0_dup_one_way(a, b) || frame_0_dup_one_way(b, a) {
        MismatchKind::Frame0Dup
    } else if frame_0_missing_one_way(a, b) || frame_0_missing_one_way(b, a) {
        MismatchKind::Frame0Missing
    } else {
        MismatchKind::Unknown
    }
}

/// True when the compared prefix (`min` of both lengths) is identical.
#[must_use]
pub fn prefix_matches<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

/// One disagreeing position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMismatch {
    pub position: usize,
    pub baseline: FrameDigest,
    pub candidate: FrameDigest,
    /// Baseline positions holding the candidate's digest ("it actually
    /// matches baseline frame K").
    pub baseline_matches: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MismatchReport {
    pub source: String,
    pub order: String,
    pub baseline_len: usize,
    pub candidate_len: usize,
    pub positions: Vec<PositionMismatch>,
    pub kind: MismatchKind,
}

impl MismatchReport {
    /// Diagnose and classify `candidate` against `baseline`.
    #[must_use]
    pub fn build(
        source: &str,
        order: &str,
        baseline: &[FrameDigest],
        candidate: &[FrameDigest],
    ) -> Self {
        Self {
            source: source.to_string(),
            order: order.to_string(),
            baseline_len: baseline.len(),
            candidate_len: candidate.len(),
            positions: mismatch_positions(baseline, candidate),
            kind: classify(baseline, candidate),
        }
    }

    #[must_use]
    pub fn position_indices(&self) -> Vec<usize> {
        self.positions.iter().map(|p| p.position).collect()
    }

    /// One line per disagreeing position, for logs and terminal output.
    #[must_use]
    pub fn detail_lines(&self) -> Vec<String> {
        self.positions
            .iter()
            .map(|p| {
                format!(
                    "mismatch: frame {} of {} matches frames {:?} of baseline",
                    p.position, self.source, p.baseline_matches
                )
            })
            .collect()
    }
}

/// Positions where the compared prefixes disagree, each with the baseline
/// positions that share the candidate's digest.
#[must_use]
pub fn mismatch_positions(
    baseline: &[FrameDigest],
    candidate: &[FrameDigest],
) -> Vec<PositionMismatch> {
    let index = positions_by_value(baseline);
    baseline
        .iter()
        .zip(candidate)
        .enumerate()
        .filter(|(_, (b, c))| b != c)
        .map(|(position, (b, c))| PositionMismatch {
            position,
            baseline: *b,
            candidate: *c,
            baseline_matches: index.get(c).cloned().unwrap_or_default(),
        })
        .collect()
}

fn positions_by_value<T: Eq + Hash>(values: &[T]) -> HashMap<&T, Vec<usize>> {
    let mut index: HashMap<&T, Vec<usize>> = HashMap::new();
    for (position, value) in values.iter().enumerate() {
        index.entry(value).or_default().push(position);
    }
    index
}
