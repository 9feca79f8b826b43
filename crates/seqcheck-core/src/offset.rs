#![forbid(unsafe_code)]

//! Index-shifting wrapper.
//!
//! External decoders number dumped frames from 1 while most containers index
//! from 0. Wrapping a reader with an offset lets both line up on the same
//! frame indices. The locator form is `INNER::N`.

use crate::error::{Result, SequenceError};
use crate::frame::{Frame, Shape};
use crate::sequence::{AUTO_INDEX, SequenceReader};

const OFFSET_SEPARATOR: &str = "::";

/// Split `locator` into `(inner, offset)` when it carries a non-zero `::N`
/// suffix.
#[must_use]
pub fn split_offset(locator: &str) -> Option<(&str, i64)> {
    let (inner, suffix) = locator.rsplit_once(OFFSET_SEPARATOR)?;
    let offset: i64 = suffix.trim().parse().ok()?;
    (offset != 0 && !inner.is_empty()).then_some((inner, offset))
}

/// Range to request from the wrapped reader for an outer `[first, last]`.
///
/// An explicit outer bound that would shift onto [`AUTO_INDEX`] is rejected,
/// since the inner reader would read it as "detect".
pub fn inner_range(first: i64, last: i64, offset: i64) -> Result<(i64, i64)> {
    let shift = |index: i64| {
        if index == AUTO_INDEX {
            return Ok(AUTO_INDEX);
        }
        let inner = index - offset;
        if inner == AUTO_INDEX {
            return Err(SequenceError::InvalidSource {
                input: format!("{index}::{offset}"),
                reason: format!("index {index} shifted by {offset} hits the auto marker"),
            });
        }
        Ok(inner)
    };
    Ok((shift(first)?, shift(last)?))
}

#[derive(Debug)]
pub struct OffsetReader<R> {
    inner: R,
    offset: i64,
}

impl<R: SequenceReader> OffsetReader<R> {
    /// Present `inner` frame `i` as frame `i + offset`.
    #[must_use]
    pub fn new(inner: R, offset: i64) -> Self {
        Self { inner, offset }
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: SequenceReader> SequenceReader for OffsetReader<R> {
    fn first(&self) -> i64 {
        self.inner.first() + self.offset
    }

    fn last(&self) -> i64 {
        self.inner.last() + self.offset
    }

    fn shape(&self) -> Shape {
        self.inner.shape()
    }

    fn read(&mut self, index: i64) -> Result<Frame> {
        // The outer check reports the caller's indices, not the shifted ones.
        self.check_index(index)?;
        self.inner.read(index - self.offset)
    }
}
