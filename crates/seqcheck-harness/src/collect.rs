#![forbid(unsafe_code)]

//! Drives a reader through one access order.

use seqcheck_core::{FrameDigest, SequenceReader, digest};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::orders::AccessOrder;

/// Per-position digests produced by one (source, order) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSequence {
    pub source: String,
    pub order: String,
    pub digests: Vec<FrameDigest>,
}

impl DigestSequence {
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// Read `base_offset + offset` for every offset in `order` and digest it.
///
/// Every read goes to the reader; nothing is cached. Offsets are expected to
/// lie inside the reader's range already, so a range error here is a defect
/// and propagates.
pub fn collect<R: SequenceReader + ?Sized>(
    reader: &mut R,
    base_offset: i64,
    order: &AccessOrder,
    stride: usize,
) -> Result<Vec<FrameDigest>> {
    let mut digests = Vec::with_capacity(order.len());
    for &offset in &order.offsets {
        let frame = reader.read(base_offset + offset as i64)?;
        digests.push(digest(&frame, stride));
    }
    Ok(digests)
}

/// [`collect`] tagged with the source label and order name.
pub fn collect_sequence<R: SequenceReader + ?Sized>(
    reader: &mut R,
    source: &str,
    order: &AccessOrder,
    stride: usize,
) -> Result<DigestSequence> {
    let base = reader.first();
    Ok(DigestSequence {
        source: source.to_string(),
        order: order.name.clone(),
        digests: collect(reader, base, order, stride)?,
    })
}
