#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Args;
use seqcheck_core::{FileOpener, Source};
use seqcheck_harness::{Comparator, ComparisonOutcome, Result};
use serde::Serialize;

use crate::output::emit;
use crate::tuning::TuningArgs;

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    /// Sources as FORMAT:FIRST:LAST:COLOR:LOCATOR. The first one is the
    /// baseline.
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<Source>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order: String,
    pub status: String,
    pub frames: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KnownMismatchSummary {
    pub source: String,
    pub order: String,
    pub kind: String,
    pub positions: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompareSummary {
    pub status: String,
    pub orders: Vec<String>,
    pub sources: Vec<SourceSummary>,
    pub known_mismatches: Vec<KnownMismatchSummary>,
    pub artifact: Option<PathBuf>,
}

impl CompareSummary {
    #[must_use]
    pub fn from_outcome(outcome: &ComparisonOutcome) -> Self {
        let status = if outcome.all_match() {
            "ok"
        } else {
            "known_mismatch"
        };
        Self {
            status: status.to_string(),
            orders: outcome.orders.iter().map(|o| o.name.clone()).collect(),
            sources: outcome
                .sources
                .iter()
                .map(|s| SourceSummary {
                    source: s.source.label(),
                    orders: s
                        .runs
                        .iter()
                        .map(|r| OrderSummary {
                            order: r.order.clone(),
                            status: r.status.as_str().to_string(),
                            frames: r.digests.len(),
                            elapsed_ms: r.elapsed.as_millis() as u64,
                        })
                        .collect(),
                })
                .collect(),
            known_mismatches: outcome
                .known_mismatches()
                .map(|m| KnownMismatchSummary {
                    source: m.source.clone(),
                    order: m.order.clone(),
                    kind: m.kind.name().to_string(),
                    positions: m.position_indices(),
                })
                .collect(),
            artifact: outcome.artifact.clone(),
        }
    }

    fn render(&self) -> String {
        let mut lines = Vec::new();
        for source in &self.sources {
            for order in &source.orders {
                lines.push(format!(
                    "{:<8} {:<14} {:>5} frames {:>6} ms  {}",
                    order.status, order.order, order.frames, order.elapsed_ms, source.source
                ));
            }
        }
        for known in &self.known_mismatches {
            lines.push(format!(
                "known mismatch ({}) in {} order {} at {:?}",
                known.kind, known.source, known.order, known.positions
            ));
        }
        if let Some(path) = &self.artifact {
            lines.push(format!("mismatch artifact: {}", path.display()));
        }
        lines.push(format!("status: {}", self.status));
        lines.join("\n")
    }
}

pub fn run_compare(args: CompareArgs, json: bool) -> Result<()> {
    let config = args.tuning.resolve()?;
    let outcome = Comparator::new(config).compare(&FileOpener, &args.sources)?;
    let summary = CompareSummary::from_outcome(&outcome);
    emit(json, &summary, || summary.render())
}
