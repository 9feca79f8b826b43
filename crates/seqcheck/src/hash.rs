#![forbid(unsafe_code)]

use clap::Args;
use seqcheck_core::{FileOpener, FrameDigest, SequenceReader, Source, SourceOpener, digest};
use seqcheck_harness::Result;
use serde::Serialize;

use crate::output::emit;

#[derive(Debug, Clone, Args)]
pub struct HashArgs {
    /// Source to hash (FORMAT:FIRST:LAST:COLOR:LOCATOR).
    pub source: Source,

    /// Hash every Nth byte of each frame.
    #[arg(long, default_value_t = seqcheck_core::DEFAULT_STRIDE)]
    pub stride: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexedDigest {
    pub index: i64,
    pub digest: FrameDigest,
}

/// Digest of every frame, in index order.
pub fn hash_source(source: &Source, stride: usize) -> Result<Vec<IndexedDigest>> {
    let mut reader = FileOpener.open(source)?;
    let mut digests = Vec::with_capacity(reader.len());
    for index in reader.first()..=reader.last() {
        let frame = reader.read(index)?;
        digests.push(IndexedDigest {
            index,
            digest: digest(&frame, stride),
        });
    }
    Ok(digests)
}

pub fn run_hash(args: HashArgs, json: bool) -> Result<()> {
    let digests = hash_source(&args.source, args.stride)?;
    emit(json, &digests, || {
        digests
            .iter()
            .map(|d| format!("{:>8}  {}", d.index, d.digest))
            .collect::<Vec<_>>()
            .join("\n")
    })
}
