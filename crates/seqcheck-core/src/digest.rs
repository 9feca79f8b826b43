#![forbid(unsafe_code)]

//! Subsampled SHA-256 frame digests.
//!
//! Hashing every byte of a large frame dominates the cost of a multi-order
//! comparison run, so the digest covers every `stride`-th sample only. Real
//! decode divergence perturbs long runs of bytes and still moves the digest.
//!
//! # Example
//!
//! ```
//! use seqcheck_core::{digest, Frame, Shape, DEFAULT_STRIDE};
//!
//! let frame = Frame::filled(Shape::gray(64, 48), 7);
//! assert_eq!(digest(&frame, DEFAULT_STRIDE), digest(&frame, DEFAULT_STRIDE));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::SequenceError;
use crate::frame::Frame;

/// Default byte stride used when subsampling a frame.
pub const DEFAULT_STRIDE: usize = 100;

/// Length of a digest in bytes.
pub const DIGEST_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameDigest([u8; DIGEST_LEN]);

impl FrameDigest {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, 64 characters.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(DIGEST_LEN * 2);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Digest of an arbitrary label; lets tests build readable sequences.
    #[must_use]
    pub fn of_label(label: &str) -> Self {
        Self(Sha256::digest(label.as_bytes()).into())
    }
}

/// Digest every `stride`-th sample byte of `frame`, starting at byte 0.
///
/// A stride of 0 is treated as 1 (hash every byte).
#[must_use]
pub fn digest(frame: &Frame, stride: usize) -> FrameDigest {
    let stride = stride.max(1);
    let subsample: Vec<u8> = frame.as_bytes().iter().step_by(stride).copied().collect();
    FrameDigest(Sha256::digest(&subsample).into())
}

impl fmt::Display for FrameDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FrameDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps mismatch dumps readable.
        write!(f, "FrameDigest({})", &self.to_hex()[..12])
    }
}

impl FromStr for FrameDigest {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SequenceError::InvalidSource {
            input: s.to_string(),
            reason: reason.to_string(),
        };
        if s.len() != DIGEST_LEN * 2 || !s.is_ascii() {
            return Err(invalid("digest must be 64 hex characters"));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        for (idx, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[idx * 2..idx * 2 + 2], 16)
                .map_err(|_| invalid("non-hex character in digest"))?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for FrameDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FrameDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::frame::Shape;

    use proptest::prelude::*;

    fn ramp(len: usize) -> Frame {
        let data = (0..len).map(|i| (i % 251) as u8).collect();
        Frame::new(Shape::gray(len as u32, 1), data).expect("frame")
    }

    #[test]
    fn matches_sha256_of_subsample() {
        let frame = ramp(1000);
        let expected: Vec<u8> = (0..1000).step_by(100).map(|i| (i % 251) as u8).collect();
        let want: [u8; 32] = Sha256::digest(&expected).into();
        assert_eq!(digest(&frame, 100).as_bytes(), &want);
    }

    #[test]
    fn bytes_between_samples_do_not_move_the_digest() {
        let a = ramp(1000);
        let mut data = a.as_bytes().to_vec();
        data[1] ^= 0xFF;
        let b = Frame::new(a.shape(), data).expect("frame");
        assert_eq!(digest(&a, 100), digest(&b, 100));
        assert_ne!(digest(&a, 1), digest(&b, 1));
    }

    #[test]
    fn sampled_byte_change_moves_the_digest() {
        let a = ramp(1000);
        let mut data = a.as_bytes().to_vec();
        data[300] ^= 0x01;
        let b = Frame::new(a.shape(), data).expect("frame");
        assert_ne!(digest(&a, 100), digest(&b, 100));
    }

    #[test]
    fn zero_stride_hashes_every_byte() {
        let frame = ramp(50);
        assert_eq!(digest(&frame, 0), digest(&frame, 1));
    }

    #[test]
    fn hex_parses_back() {
        let d = FrameDigest::of_label("h0");
        let parsed: FrameDigest = d.to_hex().parse().expect("parse");
        assert_eq!(parsed, d);
        assert!("zz".parse::<FrameDigest>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let d = FrameDigest::of_label("h1");
        let json = serde_json::to_string(&d).expect("json");
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
    }

    proptest! {
        #[test]
        fn digest_is_pure(
            data in proptest::collection::vec(any::<u8>(), 1..4096),
            stride in 0usize..300,
        ) {
            let frame = Frame::new(Shape::gray(data.len() as u32, 1), data).unwrap();
            prop_assert_eq!(digest(&frame, stride), digest(&frame, stride));
            prop_assert_eq!(digest(&frame.clone(), stride), digest(&frame, stride));
        }
    }
}
