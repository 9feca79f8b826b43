#![forbid(unsafe_code)]

//! Repeated-read stability checks.
//!
//! A [`DigestProducer`] is asked for the same digest sequence over and over;
//! each round is diffed against the previous one and any instability goes
//! through the classifier. Known decoder artifacts are logged and counted,
//! anything else fails immediately.

use seqcheck_core::{Frame, FrameDigest, SequenceReader, Source, SourceOpener, digest};
use tracing::{debug, error, info, info_span, warn};

use crate::classify::MismatchReport;
use crate::collect::{DigestSequence, collect_sequence};
use crate::compare::{ComparisonOutcome, Comparator};
use crate::config::{RunConfig, RunWorkspace, close_dir};
use crate::decode::{DecodeCommand, frame_path, require_program};
use crate::error::{HarnessError, Result};
use crate::orders::{AccessOrder, SEQUENTIAL};

pub trait DigestProducer {
    /// Name used in logs and reports.
    fn label(&self) -> String;

    fn produce(&mut self, iteration: usize) -> Result<DigestSequence>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeterminismReport {
    pub source: String,
    pub iterations: usize,
    /// Digests of the first round.
    pub digests: Vec<FrameDigest>,
    /// Known mismatches between consecutive rounds.
    pub known: Vec<MismatchReport>,
}

impl DeterminismReport {
    #[must_use]
    pub fn is_stable(&self) -> bool {
        self.known.is_empty()
    }
}

pub fn check_determinism<P: DigestProducer + ?Sized>(
    producer: &mut P,
    iterations: usize,
) -> Result<DeterminismReport> {
    let label = producer.label();
    let span = info_span!("seqcheck.determinism", source = %label, iterations);
    let _guard = span.enter();

    let mut report = DeterminismReport {
        source: label,
        iterations: 0,
        digests: Vec::new(),
        known: Vec::new(),
    };
    let mut previous: Option<DigestSequence> = None;

    for iteration in 0..iterations {
        let current = producer.produce(iteration)?;
        match &previous {
            None => report.digests = current.digests.clone(),
            Some(prev) if prev.digests != current.digests => {
                let mismatch = MismatchReport::build(
                    &current.source,
                    &current.order,
                    &prev.digests,
                    &current.digests,
                );
                for line in mismatch.detail_lines() {
                    debug!(iteration, "{line}");
                }
                if !mismatch.kind.is_known() {
                    error!(
                        source = %mismatch.source,
                        iteration,
                        positions = ?mismatch.position_indices(),
                        "unknown mismatch between iterations"
                    );
                    return Err(HarnessError::UnknownMismatch {
                        source_label: mismatch.source.clone(),
                        order: mismatch.order.clone(),
                        positions: mismatch.position_indices(),
                    });
                }
                warn!(
                    source = %mismatch.source,
                    iteration,
                    kind = mismatch.kind.name(),
                    "known mismatch between iterations"
                );
                report.known.push(mismatch);
            }
            Some(_) => {}
        }
        info!(iteration, frames = current.digests.len(), "iteration complete");
        report.iterations += 1;
        previous = Some(current);
    }
    Ok(report)
}

/// Digests of frames dumped by an external decoder, one scoped directory
/// per round.
#[derive(Debug)]
pub struct ExternalDecode<'w> {
    command: DecodeCommand,
    frame_count: usize,
    stride: usize,
    is_color: bool,
    workspace: &'w RunWorkspace,
}

impl<'w> ExternalDecode<'w> {
    /// Fails with `MissingCommand` when the decoder is not on `PATH`.
    pub fn new(
        command: DecodeCommand,
        config: &RunConfig,
        is_color: bool,
        workspace: &'w RunWorkspace,
    ) -> Result<Self> {
        require_program(&command.program)?;
        Ok(Self {
            command,
            frame_count: config.decode_frames,
            stride: config.stride,
            is_color,
            workspace,
        })
    }
}

impl DigestProducer for ExternalDecode<'_> {
    fn label(&self) -> String {
        format!("{}:{}", self.command.program, self.command.input.display())
    }

    fn produce(&mut self, _iteration: usize) -> Result<DigestSequence> {
        let dir = self.workspace.scoped_dir("decode-")?;
        self.command.dump(self.frame_count, dir.path())?;

        let mut digests = Vec::with_capacity(self.frame_count);
        for number in 1..=self.frame_count {
            let path = frame_path(dir.path(), number);
            if !path.exists() {
                break;
            }
            let image = image::open(&path).map_err(|source| HarnessError::DumpDecode {
                path: path.clone(),
                source,
            })?;
            digests.push(digest(&Frame::from_image(image, self.is_color), self.stride));
        }
        close_dir(dir)?;

        Ok(DigestSequence {
            source: self.label(),
            order: SEQUENTIAL.to_string(),
            digests,
        })
    }
}

/// Re-opens a source through its opener every round and reads it
/// sequentially.
pub struct ReaderReplay<'a, O: SourceOpener + ?Sized> {
    opener: &'a O,
    source: Source,
    frame_count: usize,
    stride: usize,
}

impl<'a, O: SourceOpener + ?Sized> ReaderReplay<'a, O> {
    #[must_use]
    pub fn new(opener: &'a O, source: Source, frame_count: usize, stride: usize) -> Self {
        Self {
            opener,
            source,
            frame_count,
            stride,
        }
    }
}

impl<O: SourceOpener + ?Sized> DigestProducer for ReaderReplay<'_, O> {
    fn label(&self) -> String {
        self.source.label()
    }

    fn produce(&mut self, _iteration: usize) -> Result<DigestSequence> {
        let mut reader = self.opener.open(&self.source)?;
        let order = AccessOrder::sequential(reader.len().min(self.frame_count));
        collect_sequence(reader.as_mut(), &self.label(), &order, self.stride)
    }
}

/// Compare a source against itself `config.iterations` times using only the
/// sequential order.
pub fn repeated_compare<O: SourceOpener + ?Sized>(
    config: &RunConfig,
    opener: &O,
    source: &Source,
) -> Result<ComparisonOutcome> {
    let comparator = Comparator::new(RunConfig {
        sequential_only: true,
        ..config.clone()
    });
    let sources = vec![source.clone(); config.iterations.max(1)];
    comparator.compare(opener, &sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::MismatchKind;

    use seqcheck_core::{MemoryOpener, MemorySequence, Shape};

    struct Scripted {
        rounds: Vec<Vec<&'static str>>,
    }

    impl DigestProducer for Scripted {
        fn label(&self) -> String {
            "scripted".into()
        }

        fn produce(&mut self, iteration: usize) -> Result<DigestSequence> {
            let labels = &self.rounds[iteration % self.rounds.len()];
            Ok(DigestSequence {
                source: self.label(),
                order: SEQUENTIAL.into(),
                digests: labels.iter().map(|l| FrameDigest::of_label(l)).collect(),
            })
        }
    }

    #[test]
    fn stable_producer_passes() {
        let mut producer = Scripted {
            rounds: vec![vec!["a", "b", "c"]],
        };
        let report = check_determinism(&mut producer, 5).expect("stable");
        assert!(report.is_stable());
        assert_eq!(report.iterations, 5);
        assert_eq!(report.digests.len(), 3);
    }

    #[test]
    fn leading_duplicate_is_counted_and_tolerated() {
        let mut producer = Scripted {
            rounds: vec![vec!["a", "b", "c"], vec!["a", "a", "c"]],
        };
        let report = check_determinism(&mut producer, 4).expect("known");
        assert_eq!(report.iterations, 4);
        assert_eq!(report.known.len(), 3);
        assert!(
            report
                .known
                .iter()
                .all(|m| m.kind == MismatchKind::Frame0Dup)
        );
    }

    #[test]
    fn truncated_round_is_not_tolerated() {
        let mut producer = Scripted {
            rounds: vec![
                vec!["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9"],
                vec!["f0", "f0"],
            ],
        };
        let err = check_determinism(&mut producer, 3).expect_err("truncated");
        assert!(matches!(err, HarnessError::UnknownMismatch { .. }));
    }

    #[test]
    fn unknown_instability_fails_immediately() {
        let mut producer = Scripted {
            rounds: vec![vec!["a", "b", "c"], vec!["a", "x", "c"]],
        };
        let err = check_determinism(&mut producer, 10).expect_err("unknown");
        assert!(matches!(
            err,
            HarnessError::UnknownMismatch { ref positions, .. } if positions == &vec![1]
        ));
    }

    #[test]
    fn replay_reopens_and_caps_frame_count() {
        let frames = (0..6)
            .map(|v| Frame::filled(Shape::gray(4, 4), v))
            .collect();
        let opener = MemoryOpener::new().with("m", MemorySequence::new(0, frames).expect("seq"));
        let mut replay = ReaderReplay::new(&opener, Source::new("mem", "m"), 4, 1);
        let report = check_determinism(&mut replay, 3).expect("stable");
        assert_eq!(report.digests.len(), 4);
        assert_eq!(report.source, "mem:m");
    }

    #[test]
    fn repeated_compare_uses_sequential_order_only() {
        let frames = (0..3)
            .map(|v| Frame::filled(Shape::gray(4, 4), v))
            .collect();
        let opener = MemoryOpener::new().with("m", MemorySequence::new(0, frames).expect("seq"));
        let config = RunConfig {
            iterations: 4,
            artifact_path: None,
            ..RunConfig::default()
        };
        let outcome =
            repeated_compare(&config, &opener, &Source::new("mem", "m")).expect("compare");
        assert_eq!(outcome.sources.len(), 4);
        assert_eq!(outcome.orders.len(), 1);
        assert!(outcome.all_match());
    }
}
