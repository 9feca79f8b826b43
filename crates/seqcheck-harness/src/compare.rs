#![forbid(unsafe_code)]

//! Cross-source comparison.
//!
//! Every source is opened, checked for range enforcement, and read through
//! the same [`OrderSet`]. Source 0 is the baseline; every other source is
//! checked against it order by order. Disagreements are classified, and
//! any difference at all persists a [`MismatchArtifact`] before an unknown
//! mismatch is allowed to fail the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use seqcheck_core::{FrameDigest, SequenceReader, Source, SourceOpener};
use tracing::{debug, error, info, info_span, warn};

use crate::artifact::MismatchArtifact;
use crate::classify::{MismatchReport, prefix_matches};
use crate::collect::collect;
use crate::config::RunConfig;
use crate::error::{HarnessError, Result};
use crate::orders::OrderSet;

/// How far below `first` the bad-index check reads.
pub const BAD_INDEX_DISTANCE: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Match,
    Mismatch,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
        }
    }
}

/// One (source, order) collection.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRun {
    pub order: String,
    pub digests: Vec<FrameDigest>,
    pub elapsed: Duration,
    pub status: RunStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRun {
    pub source: Source,
    pub runs: Vec<OrderRun>,
}

impl SourceRun {
    #[must_use]
    pub fn run(&self, order: &str) -> Option<&OrderRun> {
        self.runs.iter().find(|r| r.order == order)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub orders: OrderSet,
    pub sources: Vec<SourceRun>,
    /// Prefix disagreements, in (source, order) visiting order.
    pub mismatches: Vec<MismatchReport>,
    /// Where the mismatch bundle was written, if it was.
    pub artifact: Option<PathBuf>,
}

impl ComparisonOutcome {
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn known_mismatches(&self) -> impl Iterator<Item = &MismatchReport> {
        self.mismatches.iter().filter(|m| m.kind.is_known())
    }

    #[must_use]
    pub fn first_unknown(&self) -> Option<&MismatchReport> {
        self.mismatches.iter().find(|m| !m.kind.is_known())
    }

    #[must_use]
    pub fn source(&self, label: &str) -> Option<&SourceRun> {
        self.sources.iter().find(|s| s.source.label() == label)
    }

    #[must_use]
    pub fn digests(&self, label: &str, order: &str) -> Option<&[FrameDigest]> {
        self.source(label)?.run(order).map(|r| r.digests.as_slice())
    }

    #[must_use]
    pub fn mismatches_for(&self, label: &str) -> Vec<&MismatchReport> {
        self.mismatches
            .iter()
            .filter(|m| m.source == label)
            .collect()
    }
}

/// Read `first - 2`; only an out-of-range rejection passes.
pub fn check_bad_index<R: SequenceReader + ?Sized>(reader: &mut R, label: &str) -> Result<()> {
    let index = reader.first() - BAD_INDEX_DISTANCE;
    match reader.read(index) {
        Ok(_) => Err(HarnessError::BadIndexAccepted {
            source_label: label.to_string(),
            index,
        }),
        Err(err) if err.is_index_out_of_range() => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: RunConfig,
}

impl Comparator {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn order_set(&self, baseline_len: usize) -> OrderSet {
        let length = baseline_len.min(self.config.max_length);
        if self.config.sequential_only {
            OrderSet::sequential_only(length)
        } else {
            OrderSet::seeded(length, self.config.order_count, self.config.seed)
        }
    }

    /// Collect, diff, classify and persist without failing on unknown
    /// mismatches.
    pub fn diff<O: SourceOpener + ?Sized>(
        &self,
        opener: &O,
        sources: &[Source],
    ) -> Result<ComparisonOutcome> {
        if sources.is_empty() {
            return Err(HarnessError::NoSources);
        }
        let span = info_span!(
            "seqcheck.compare",
            sources = sources.len(),
            orders = tracing::field::Empty
        );
        let _guard = span.enter();

        let mut readers = Vec::with_capacity(sources.len());
        for source in sources {
            let mut reader = opener.open(source)?;
            check_bad_index(reader.as_mut(), &source.label())?;
            debug!(
                source = %source.label(),
                first = reader.first(),
                last = reader.last(),
                shape = %reader.shape(),
                "opened source"
            );
            readers.push(reader);
        }

        let orders = self.order_set(readers[0].len());
        span.record("orders", orders.len());

        let mut outcome = ComparisonOutcome {
            orders,
            sources: Vec::with_capacity(sources.len()),
            mismatches: Vec::new(),
            artifact: None,
        };
        let mut differs = false;

        for (source, reader) in sources.iter().zip(readers.iter_mut()) {
            let label = source.label();
            let available = reader.len();
            let base = reader.first();
            let mut runs = Vec::with_capacity(outcome.orders.len());

            for (slot, order) in outcome.orders.iter().enumerate() {
                let clamped = order.clamped(available);
                let started = Instant::now();
                let digests = collect(reader.as_mut(), base, &clamped, self.config.stride)?;
                let elapsed = started.elapsed();

                let baseline = outcome.sources.first().map(|b| &b.runs[slot].digests);
                let status = match baseline {
                    Some(baseline) if !prefix_matches(baseline, &digests) => {
                        let report = MismatchReport::build(&label, &order.name, baseline, &digests);
                        if report.kind.is_known() {
                            warn!(
                                source = %label,
                                order = %order.name,
                                kind = report.kind.name(),
                                "known mismatch"
                            );
                        }
                        for line in report.detail_lines() {
                            debug!("{line}");
                        }
                        outcome.mismatches.push(report);
                        differs = true;
                        RunStatus::Mismatch
                    }
                    Some(baseline) => {
                        differs |= *baseline != digests;
                        RunStatus::Match
                    }
                    None => RunStatus::Match,
                };

                info!(
                    source = %label,
                    order = %order.name,
                    status = status.as_str(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    frames = digests.len(),
                    "order collected"
                );
                runs.push(OrderRun {
                    order: order.name.clone(),
                    digests,
                    elapsed,
                    status,
                });
            }
            outcome.sources.push(SourceRun {
                source: source.clone(),
                runs,
            });
        }

        if differs {
            if let Some(path) = &self.config.artifact_path {
                MismatchArtifact::from_outcome(&outcome).write_to(path)?;
                info!(path = %path.display(), "wrote mismatch artifact");
                outcome.artifact = Some(path.clone());
            }
        }
        Ok(outcome)
    }

    /// [`Comparator::diff`], failing on the first unknown mismatch.
    pub fn compare<O: SourceOpener + ?Sized>(
        &self,
        opener: &O,
        sources: &[Source],
    ) -> Result<ComparisonOutcome> {
        let outcome = self.diff(opener, sources)?;
        if let Some(report) = outcome.first_unknown() {
            error!(
                source = %report.source,
                order = %report.order,
                positions = ?report.position_indices(),
                "unknown mismatch"
            );
            return Err(HarnessError::UnknownMismatch {
                source_label: report.source.clone(),
                order: report.order.clone(),
                positions: report.position_indices(),
            });
        }
        Ok(outcome)
    }
}
