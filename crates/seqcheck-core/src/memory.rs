#![forbid(unsafe_code)]

//! In-memory sequences.

use std::collections::BTreeMap;

use crate::error::{Result, SequenceError};
use crate::frame::{Frame, Shape};
use crate::sequence::{SequenceReader, SequenceWriter};

/// A fully decoded sequence held in memory, indexed from `first`.
#[derive(Debug, Clone)]
pub struct MemorySequence {
    first: i64,
    shape: Shape,
    frames: Vec<Frame>,
    reads: u64,
}

impl MemorySequence {
    /// Build from frames that all share one shape.
    pub fn new(first: i64, frames: Vec<Frame>) -> Result<Self> {
        let Some(shape) = frames.first().map(Frame::shape) else {
            return Err(SequenceError::EmptySequence {
                locator: "memory".to_string(),
            });
        };
        if let Some(bad) = frames.iter().find(|f| f.shape() != shape) {
            return Err(SequenceError::ShapeMismatch {
                expected: shape,
                actual: bad.shape(),
            });
        }
        Ok(Self {
            first,
            shape,
            frames,
            reads: 0,
        })
    }

    /// Number of successful reads served so far.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.reads
    }

    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl SequenceReader for MemorySequence {
    fn first(&self) -> i64 {
        self.first
    }

    fn last(&self) -> i64 {
        self.first + self.frames.len() as i64 - 1
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn read(&mut self, index: i64) -> Result<Frame> {
        self.check_index(index)?;
        let frame = self.frames[(index - self.first) as usize].clone();
        self.reads += 1;
        Ok(frame)
    }
}

/// Collects written frames by index.
#[derive(Debug, Clone)]
pub struct MemoryWriter {
    shape: Shape,
    fps: f64,
    frames: BTreeMap<i64, Frame>,
}

impl MemoryWriter {
    #[must_use]
    pub fn new(fps: f64, shape: Shape) -> Self {
        Self {
            shape,
            fps,
            frames: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Indices written so far, ascending.
    pub fn indices(&self) -> impl Iterator<Item = i64> + '_ {
        self.frames.keys().copied()
    }

    /// Turn the written frames into a reader. Indices must be contiguous.
    pub fn into_sequence(self) -> Result<MemorySequence> {
        let Some(&first) = self.frames.keys().next() else {
            return Err(SequenceError::EmptySequence {
                locator: "memory".to_string(),
            });
        };
        let mut frames = Vec::with_capacity(self.frames.len());
        for (expected, (index, frame)) in (first..).zip(self.frames) {
            if index != expected {
                return Err(SequenceError::IndexOutOfRange {
                    index: expected,
                    first,
                    last: index - 1,
                });
            }
            frames.push(frame);
        }
        MemorySequence::new(first, frames)
    }
}

impl SequenceWriter for MemoryWriter {
    fn write(&mut self, frame: &Frame, index: i64) -> Result<()> {
        if frame.shape() != self.shape {
            return Err(SequenceError::ShapeMismatch {
                expected: self.shape,
                actual: frame.shape(),
            });
        }
        self.frames.insert(index, frame.clone());
        Ok(())
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}
