#![forbid(unsafe_code)]

//! Reader and writer contracts, plus the [`Source`] descriptor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SequenceError};
use crate::frame::{Frame, Shape};

/// Sentinel for "detect from the underlying sequence" in a [`Source`] range.
pub const AUTO_INDEX: i64 = -1;

/// Random-access frame reader over an inclusive index range.
///
/// `read` must fail with [`SequenceError::IndexOutOfRange`] for any index
/// outside `[first, last]`, negative indices included. The verifier checks
/// this before trusting a reader.
pub trait SequenceReader {
    fn first(&self) -> i64;

    fn last(&self) -> i64;

    fn shape(&self) -> Shape;

    fn read(&mut self, index: i64) -> Result<Frame>;

    /// Number of frames in `[first, last]`.
    fn len(&self) -> usize {
        usize::try_from(self.last() - self.first() + 1).unwrap_or(0)
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared range check for implementors.
    fn check_index(&self, index: i64) -> Result<()> {
        if index < self.first() || index > self.last() {
            return Err(SequenceError::IndexOutOfRange {
                index,
                first: self.first(),
                last: self.last(),
            });
        }
        Ok(())
    }
}

impl<R: SequenceReader + ?Sized> SequenceReader for Box<R> {
    fn first(&self) -> i64 {
        (**self).first()
    }

    fn last(&self) -> i64 {
        (**self).last()
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn read(&mut self, index: i64) -> Result<Frame> {
        (**self).read(index)
    }
}

/// Frame sink. Writers are created from (locator, frame rate, shape, color).
pub trait SequenceWriter {
    fn write(&mut self, frame: &Frame, index: i64) -> Result<()>;

    fn shape(&self) -> Shape;

    /// Flush anything buffered. Writers that write through may ignore this.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<W: SequenceWriter + ?Sized> SequenceWriter for Box<W> {
    fn write(&mut self, frame: &Frame, index: i64) -> Result<()> {
        (**self).write(frame, index)
    }

    fn shape(&self) -> Shape {
        (**self).shape()
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Copy every frame of `reader` into `writer`, keeping frame indices.
pub fn convert<R, W>(reader: &mut R, writer: &mut W) -> Result<usize>
where
    R: SequenceReader + ?Sized,
    W: SequenceWriter + ?Sized,
{
    let copied = copy_frames(reader, writer, 1)?;
    writer.finish()?;
    tracing::debug!(copied, "converted sequence");
    Ok(copied)
}

/// Copy every `step`-th frame of `reader` from `first` on, keeping frame
/// indices. The writer is left open so further sequences can be appended.
pub fn copy_frames<R, W>(reader: &mut R, writer: &mut W, step: usize) -> Result<usize>
where
    R: SequenceReader + ?Sized,
    W: SequenceWriter + ?Sized,
{
    let mut copied = 0usize;
    for index in (reader.first()..=reader.last()).step_by(step.max(1)) {
        let frame = reader.read(index)?;
        writer.write(&frame, index)?;
        copied += 1;
    }
    Ok(copied)
}

/// How frames of a [`Source`] are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Follow the first decoded frame: color if it has color channels.
    Auto,
    #[default]
    Color,
    Gray,
}

impl ColorMode {
    /// The CLI value of [`ColorMode::Auto`].
    pub const AUTO_FLAG: &'static str = "-1";

    #[must_use]
    pub fn from_color(is_color: bool) -> Self {
        if is_color { Self::Color } else { Self::Gray }
    }

    /// Decide color for a sequence whose decoded frames look like `shape`.
    #[must_use]
    pub fn resolve(self, shape: Shape) -> bool {
        match self {
            Self::Auto => shape.is_color(),
            Self::Color => true,
            Self::Gray => false,
        }
    }

    fn flag(self) -> &'static str {
        match self {
            Self::Auto => Self::AUTO_FLAG,
            Self::Color => "1",
            Self::Gray => "0",
        }
    }
}

/// One sequence instance under test.
///
/// The CLI form is `FORMAT:FIRST:LAST:COLOR:LOCATOR`; the locator comes last
/// so it may itself contain colons (`frames_%06d.png::1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub format: String,
    pub locator: String,
    pub first: i64,
    pub last: i64,
    pub color: ColorMode,
}

impl Source {
    #[must_use]
    pub fn new(format: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            locator: locator.into(),
            first: AUTO_INDEX,
            last: AUTO_INDEX,
            color: ColorMode::Color,
        }
    }

    #[must_use]
    pub fn with_range(mut self, first: i64, last: i64) -> Self {
        self.first = first;
        self.last = last;
        self
    }

    #[must_use]
    pub fn with_color(mut self, is_color: bool) -> Self {
        self.color = ColorMode::from_color(is_color);
        self
    }

    #[must_use]
    pub fn with_color_mode(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    /// Label used in logs and reports.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}:{}", self.format, self.locator)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.format,
            self.first,
            self.last,
            self.color.flag(),
            self.locator
        )
    }
}

impl FromStr for Source {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| SequenceError::InvalidSource {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = s.splitn(5, ':');
        let format = parts.next().filter(|p| !p.is_empty());
        let first = parts.next();
        let last = parts.next();
        let color = parts.next();
        let locator = parts.next().filter(|p| !p.is_empty());
        let (Some(format), Some(first), Some(last), Some(color), Some(locator)) =
            (format, first, last, color, locator)
        else {
            return Err(invalid("expected FORMAT:FIRST:LAST:COLOR:LOCATOR"));
        };
        let parse_index = |raw: &str| -> Result<i64> {
            let raw = raw.trim();
            if raw.is_empty() {
                return Ok(AUTO_INDEX);
            }
            raw.parse()
                .map_err(|_| invalid(&format!("invalid frame index {raw:?}")))
        };
        let color = match color.trim() {
            "1" | "true" | "color" => ColorMode::Color,
            "0" | "false" | "gray" => ColorMode::Gray,
            ColorMode::AUTO_FLAG | "auto" => ColorMode::Auto,
            other => return Err(invalid(&format!("invalid color flag {other:?}"))),
        };
        Ok(Self {
            format: format.to_string(),
            locator: locator.to_string(),
            first: parse_index(first)?,
            last: parse_index(last)?,
            color,
        })
    }
}
