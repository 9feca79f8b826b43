#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::Args;
use seqcheck_core::{FileOpener, Source};
use seqcheck_harness::{
    DecodeCommand, DeterminismReport, ExternalDecode, HarnessError, ReaderReplay, Result,
    RunWorkspace, check_determinism, repeated_compare,
};
use serde::Serialize;

use crate::compare::CompareSummary;
use crate::output::emit;
use crate::tuning::TuningArgs;

#[derive(Debug, Clone, Args)]
pub struct DeterminismArgs {
    /// Container to decode repeatedly with the external decoder.
    #[arg(long, conflicts_with = "source")]
    pub input: Option<PathBuf>,

    /// Source (FORMAT:FIRST:LAST:COLOR:LOCATOR) to re-open and re-read
    /// in process.
    #[arg(long)]
    pub source: Option<Source>,

    /// Decoder program for `--input`.
    #[arg(long)]
    pub decoder: Option<String>,

    /// Frames per round.
    #[arg(long)]
    pub frames: Option<usize>,

    #[arg(long)]
    pub iterations: Option<usize>,

    /// Decode dumped frames as grayscale.
    #[arg(long)]
    pub gray: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeterminismSummary {
    pub status: String,
    pub source: String,
    pub iterations: usize,
    pub frames: usize,
    pub known_mismatches: Vec<String>,
}

impl DeterminismSummary {
    fn from_report(report: &DeterminismReport) -> Self {
        let status = if report.is_stable() {
            "ok"
        } else {
            "known_mismatch"
        };
        Self {
            status: status.to_string(),
            source: report.source.clone(),
            iterations: report.iterations,
            frames: report.digests.len(),
            known_mismatches: report
                .known
                .iter()
                .map(|m| m.kind.name().to_string())
                .collect(),
        }
    }

    fn render(&self) -> String {
        let mut text = format!(
            "{}: {} iterations of {} frames",
            self.source, self.iterations, self.frames
        );
        if !self.known_mismatches.is_empty() {
            text.push_str(&format!("\nknown mismatches: {}", self.known_mismatches.join(", ")));
        }
        text.push_str(&format!("\nstatus: {}", self.status));
        text
    }
}

pub fn run_determinism(args: DeterminismArgs, json: bool) -> Result<()> {
    let mut config = args.tuning.resolve()?;
    if let Some(decoder) = &args.decoder {
        config.decoder = decoder.clone();
    }
    if let Some(frames) = args.frames {
        config.decode_frames = frames;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }

    match (&args.input, &args.source) {
        (Some(input), _) => {
            let workspace = RunWorkspace::create(&config)?;
            let command = DecodeCommand::new(config.decoder.clone(), input);
            let report = {
                let mut producer = ExternalDecode::new(command, &config, !args.gray, &workspace)?;
                check_determinism(&mut producer, config.iterations)?
            };
            workspace.close()?;
            let summary = DeterminismSummary::from_report(&report);
            emit(json, &summary, || summary.render())
        }
        (None, Some(source)) if config.sequential_only => {
            let outcome = repeated_compare(&config, &FileOpener, source)?;
            let summary = CompareSummary::from_outcome(&outcome);
            emit(json, &summary, || {
                format!(
                    "{} repeated reads\nstatus: {}",
                    outcome.sources.len(), summary.status
                )
            })
        }
        (None, Some(source)) => {
            let frames = args.frames.unwrap_or(config.max_length);
            let mut producer =
                ReaderReplay::new(&FileOpener, source.clone(), frames, config.stride);
            let report = check_determinism(&mut producer, config.iterations)?;
            let summary = DeterminismSummary::from_report(&report);
            emit(json, &summary, || summary.render())
        }
        (None, None) => Err(HarnessError::invalid("either --input or --source is required")),
    }
}
