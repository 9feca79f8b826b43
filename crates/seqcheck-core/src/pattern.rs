#![forbid(unsafe_code)]

//! Image-file sequences named by a printf-style pattern.
//!
//! `frames_%06d.png` expands to `frames_000000.png`, `frames_000001.png`, and
//! so on. Exactly one integer conversion (`%d`, `%i`, `%u`, optionally
//! zero-padded with a width) is required; `%%` is a literal percent sign.

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::debug;

use crate::error::{Result, SequenceError};
use crate::frame::{Frame, Shape};
use crate::sequence::{AUTO_INDEX, ColorMode, SequenceReader, SequenceWriter};

/// Highest index tried when searching for the first file of a sequence.
pub const AUTO_FIRST_SCAN_LIMIT: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    raw: String,
    prefix: String,
    suffix: String,
    width: usize,
    zero_pad: bool,
}

impl FramePattern {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| SequenceError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec: Option<(bool, usize)> = None;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            let out = if spec.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }
            if spec.is_some() {
                return Err(invalid("more than one index conversion"));
            }
            let zero_pad = chars.peek() == Some(&'0');
            if zero_pad {
                chars.next();
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            match chars.next() {
                Some('d' | 'i' | 'u') => {}
                _ => return Err(invalid("expected %d, %i or %u conversion")),
            }
            let width = if digits.is_empty() {
                0
            } else {
                digits
                    .parse()
                    .map_err(|_| invalid("conversion width too large"))?
            };
            spec = Some((zero_pad, width));
        }

        let Some((zero_pad, width)) = spec else {
            return Err(invalid("no index conversion"));
        };
        Ok(Self {
            raw: raw.to_string(),
            prefix,
            suffix,
            width,
            zero_pad,
        })
    }

    /// True when `raw` contains an index conversion this parser accepts.
    #[must_use]
    pub fn looks_like_pattern(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn format(&self, index: i64) -> String {
        let number = match (self.zero_pad, self.width) {
            (_, 0) => index.to_string(),
            (true, width) => format!("{index:0width$}"),
            (false, width) => format!("{index:width$}"),
        };
        format!("{}{}{}", self.prefix, number, self.suffix)
    }

    #[must_use]
    pub fn path(&self, index: i64) -> PathBuf {
        PathBuf::from(self.format(index))
    }
}

/// Reads one image file per frame.
#[derive(Debug)]
pub struct PatternReader {
    pattern: FramePattern,
    first: i64,
    last: i64,
    is_color: bool,
    shape: Shape,
}

impl PatternReader {
    /// Open a pattern sequence. `first`/`last` of [`AUTO_INDEX`] are detected
    /// by scanning for existing files; [`ColorMode::Auto`] follows the first
    /// file's color type.
    pub fn open(pattern: &str, first: i64, last: i64, color: ColorMode) -> Result<Self> {
        let pattern = FramePattern::parse(pattern)?;
        let empty = || SequenceError::EmptySequence {
            locator: pattern.raw().to_string(),
        };

        let first = if first == AUTO_INDEX {
            (0..=AUTO_FIRST_SCAN_LIMIT)
                .find(|&i| pattern.path(i).is_file())
                .ok_or_else(empty)?
        } else {
            first
        };
        let last = if last == AUTO_INDEX {
            let mut end = first;
            while pattern.path(end + 1).is_file() {
                end += 1;
            }
            end
        } else {
            last
        };
        if first < 0 || last < first {
            return Err(empty());
        }

        let first_file = pattern.path(first);
        if !first_file.is_file() {
            return Err(empty());
        }
        let image = decode(&first_file)?;
        let is_color = match color {
            ColorMode::Auto => image.color().has_color(),
            ColorMode::Color => true,
            ColorMode::Gray => false,
        };
        let shape = Frame::from_image(image, is_color).shape();
        debug!(pattern = pattern.raw(), first, last, %shape, "opened pattern sequence");
        Ok(Self {
            pattern,
            first,
            last,
            is_color,
            shape,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &FramePattern {
        &self.pattern
    }
}

fn decode(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| SequenceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn load(path: &Path, is_color: bool) -> Result<Frame> {
    Ok(Frame::from_image(decode(path)?, is_color))
}

impl SequenceReader for PatternReader {
    fn first(&self) -> i64 {
        self.first
    }

    fn last(&self) -> i64 {
        self.last
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn read(&mut self, index: i64) -> Result<Frame> {
        self.check_index(index)?;
        let frame = load(&self.pattern.path(index), self.is_color)?;
        if frame.shape() != self.shape {
            return Err(SequenceError::ShapeMismatch {
                expected: self.shape,
                actual: frame.shape(),
            });
        }
        Ok(frame)
    }
}

/// Writes one image file per frame; the encoder follows the file extension.
#[derive(Debug)]
pub struct PatternWriter {
    pattern: FramePattern,
    shape: Shape,
    fps: f64,
    next: i64,
}

impl PatternWriter {
    /// Create a writer, checking up front that the pattern is writable.
    pub fn create(pattern: &str, fps: f64, shape: Shape, is_color: bool) -> Result<Self> {
        let pattern = FramePattern::parse(pattern)?;
        let shape = Shape::new(shape.width, shape.height, if is_color { 3 } else { 1 });
        let writer = Self {
            pattern,
            shape,
            fps,
            next: 0,
        };
        writer.check_writable()?;
        Ok(writer)
    }

    fn check_writable(&self) -> Result<()> {
        let path = self.pattern.path(0);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        if path.exists() {
            return Ok(());
        }
        Frame::filled(self.shape, 0).to_image()?.save(&path)?;
        fs::remove_file(&path)?;
        Ok(())
    }

    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Index the next write without an explicit index would use.
    #[must_use]
    pub fn next_index(&self) -> i64 {
        self.next
    }
}

impl SequenceWriter for PatternWriter {
    fn write(&mut self, frame: &Frame, index: i64) -> Result<()> {
        if frame.shape() != self.shape {
            return Err(SequenceError::ShapeMismatch {
                expected: self.shape,
                actual: frame.shape(),
            });
        }
        frame.to_image()?.save(self.pattern.path(index))?;
        self.next = index + 1;
        Ok(())
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::memory::MemorySequence;
    use crate::sequence::convert;

    use tempfile::tempdir;

    #[test]
    fn formats_printf_style_patterns() {
        let p = FramePattern::parse("frames_%06d.png").expect("pattern");
        assert_eq!(p.format(7), "frames_000007.png");
        let plain = FramePattern::parse("f%i.png").expect("pattern");
        assert_eq!(plain.format(12), "f12.png");
        let padded = FramePattern::parse("f%3d.png").expect("pattern");
        assert_eq!(padded.format(5), "f  5.png");
        assert_eq!(
            FramePattern::parse("100%%_%04u.jpg")
                .expect("pattern")
                .format(3),
            "100%_0003.jpg"
        );
    }

    #[test]
    fn rejects_patterns_without_single_conversion() {
        assert!(FramePattern::parse("video.mov").is_err());
        assert!(FramePattern::parse("a%d_%d.png").is_err());
        assert!(FramePattern::parse("a%s.png").is_err());
        assert!(!FramePattern::looks_like_pattern("100%%.png"));
    }

    fn sample_frames(n: u8, color: bool) -> Vec<Frame> {
        let shape = if color {
            Shape::color(8, 6)
        } else {
            Shape::gray(8, 6)
        };
        (0..n)
            .map(|i| {
                let data = (0..shape.byte_len())
                    .map(|b| (b as u8).wrapping_mul(i + 1))
                    .collect();
                Frame::new(shape, data).expect("frame")
            })
            .collect()
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let dir = tempdir().expect("tempdir");
        let pattern = dir.path().join("out/frames_%06d.png").display().to_string();
        let mut source = MemorySequence::new(1, sample_frames(3, true)).expect("seq");

        let mut writer =
            PatternWriter::create(&pattern, 30.0, source.shape(), true).expect("writer");
        convert(&mut source, &mut writer).expect("convert");
        assert_eq!(writer.next_index(), 4);

        let mut reader = PatternReader::open(&pattern, AUTO_INDEX, AUTO_INDEX, ColorMode::Color)
            .expect("reader");
        assert_eq!((reader.first(), reader.last()), (1, 3));
        for index in 1..=3 {
            assert_eq!(
                reader.read(index).expect("read"),
                source.read(index).expect("read")
            );
        }
        assert!(reader.read(-1).expect_err("range").is_index_out_of_range());
    }

    #[test]
    fn missing_sequence_is_empty() {
        let dir = tempdir().expect("tempdir");
        let pattern = dir.path().join("none_%04d.png").display().to_string();
        let err = PatternReader::open(&pattern, AUTO_INDEX, AUTO_INDEX, ColorMode::Color)
            .expect_err("empty");
        assert!(matches!(err, SequenceError::EmptySequence { .. }));
    }

    #[test]
    fn writer_test_write_leaves_no_file_behind() {
        let dir = tempdir().expect("tempdir");
        let pattern = dir.path().join("g_%02d.png").display().to_string();
        let writer =
            PatternWriter::create(&pattern, 25.0, Shape::gray(4, 4), false).expect("writer");
        assert_eq!(writer.shape(), Shape::gray(4, 4));
        assert!(!dir.path().join("g_00.png").exists());
    }

    #[test]
    fn gray_sequences_decode_as_single_channel() {
        let dir = tempdir().expect("tempdir");
        let pattern = dir.path().join("g_%02d.png").display().to_string();
        let mut source = MemorySequence::new(0, sample_frames(2, false)).expect("seq");
        let mut writer =
            PatternWriter::create(&pattern, 25.0, source.shape(), false).expect("writer");
        convert(&mut source, &mut writer).expect("convert");

        let mut reader = PatternReader::open(&pattern, 0, 1, ColorMode::Gray).expect("reader");
        assert_eq!(reader.shape(), Shape::gray(8, 6));
        assert_eq!(reader.read(1).expect("read"), source.read(1).expect("read"));
    }

    #[test]
    fn auto_color_follows_first_file() {
        let dir = tempdir().expect("tempdir");
        for (name, is_color) in [("c_%02d.png", true), ("g_%02d.png", false)] {
            let pattern = dir.path().join(name).display().to_string();
            let mut source = MemorySequence::new(0, sample_frames(2, is_color)).expect("seq");
            let mut writer =
                PatternWriter::create(&pattern, 25.0, source.shape(), is_color).expect("writer");
            convert(&mut source, &mut writer).expect("convert");

            let mut reader = PatternReader::open(&pattern, AUTO_INDEX, AUTO_INDEX, ColorMode::Auto)
                .expect("reader");
            assert_eq!(reader.shape(), source.shape());
            assert_eq!(reader.read(1).expect("read"), source.read(1).expect("read"));
        }
    }
}
