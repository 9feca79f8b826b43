#![forbid(unsafe_code)]

use std::str::FromStr;

use clap::Args;
use seqcheck_core::{
    FileOpener, SequenceError, SequenceReader, Source, SourceOpener, copy_frames, create_writer,
};
use seqcheck_harness::Result;
use serde::Serialize;
use tracing::info;

use crate::output::emit;

#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Source to copy from (FORMAT:FIRST:LAST:COLOR:LOCATOR).
    #[arg(long = "from")]
    pub from: Source,

    /// Destination locator, e.g. `out/frame_%06d.png`.
    #[arg(long = "to")]
    pub to: String,

    #[arg(long, default_value_t = 25.0)]
    pub fps: f64,

    /// Copy every STEP-th frame of the first source.
    #[arg(long, default_value_t = 1)]
    pub step: usize,

    /// Further sources written into the same output, each at its own frame
    /// indices (SOURCE or SOURCE@STEP). Repeatable.
    #[arg(long = "append")]
    pub append: Vec<AppendSource>,
}

/// A source merged into the output after the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendSource {
    pub source: Source,
    pub step: usize,
}

impl FromStr for AppendSource {
    type Err = SequenceError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some((head, tail)) = s.rsplit_once('@') {
            if let Ok(step) = tail.trim().parse::<usize>() {
                if step == 0 {
                    return Err(SequenceError::InvalidSource {
                        input: s.to_string(),
                        reason: "append step must be at least 1".to_string(),
                    });
                }
                return Ok(Self {
                    source: head.parse()?,
                    step,
                });
            }
        }
        Ok(Self {
            source: s.parse()?,
            step: 1,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertSummary {
    pub from: String,
    pub to: String,
    pub frames: usize,
    pub appended: Vec<String>,
}

pub fn run_convert(args: ConvertArgs, json: bool) -> Result<()> {
    let mut reader = FileOpener.open(&args.from)?;
    let is_color = args.from.color.resolve(reader.shape());
    let mut writer = create_writer(&args.to, args.fps, reader.shape(), is_color)?;
    let mut frames = copy_frames(reader.as_mut(), writer.as_mut(), args.step)?;
    info!(from = %args.from.label(), to = %args.to, frames, step = args.step, "converted");
    drop(reader);

    let mut appended = Vec::with_capacity(args.append.len());
    for extra in &args.append {
        let mut reader = FileOpener.open(&extra.source)?;
        let copied = copy_frames(reader.as_mut(), writer.as_mut(), extra.step)?;
        info!(source = %extra.source.label(), frames = copied, step = extra.step, "appended");
        frames += copied;
        appended.push(extra.source.label());
    }
    writer.finish()?;

    let summary = ConvertSummary {
        from: args.from.label(),
        to: args.to,
        frames,
        appended,
    };
    emit(json, &summary, || {
        format!(
            "converted {} frames: {} -> {}",
            summary.frames, summary.from, summary.to
        )
    })
}
