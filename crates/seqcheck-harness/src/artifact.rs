#![forbid(unsafe_code)]

//! Mismatch bundle persisted when sources disagree.

use std::fs;
use std::path::Path;

use seqcheck_core::{FrameDigest, Source};
use serde::{Deserialize, Serialize};

use crate::compare::ComparisonOutcome;
use crate::error::Result;
use crate::orders::AccessOrder;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHashes {
    pub order: String,
    pub digests: Vec<FrameDigest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTiming {
    pub order: String,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHashes {
    pub source: String,
    pub orders: Vec<OrderHashes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTimings {
    pub source: String,
    pub orders: Vec<OrderTiming>,
}

/// Everything needed to replay a failing comparison offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MismatchArtifact {
    pub sources: Vec<Source>,
    pub orders: Vec<AccessOrder>,
    pub hashes: Vec<SourceHashes>,
    pub timings: Vec<SourceTimings>,
}

impl MismatchArtifact {
    #[must_use]
    pub fn from_outcome(outcome: &ComparisonOutcome) -> Self {
        let hashes = outcome
            .sources
            .iter()
            .map(|run| SourceHashes {
                source: run.source.label(),
                orders: run
                    .runs
                    .iter()
                    .map(|r| OrderHashes {
                        order: r.order.clone(),
                        digests: r.digests.clone(),
                    })
                    .collect(),
            })
            .collect();
        let timings = outcome
            .sources
            .iter()
            .map(|run| SourceTimings {
                source: run.source.label(),
                orders: run
                    .runs
                    .iter()
                    .map(|r| OrderTiming {
                        order: r.order.clone(),
                        seconds: r.elapsed.as_secs_f64(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            sources: outcome
                .sources
                .iter()
                .map(|run| run.source.clone())
                .collect(),
            orders: outcome.orders.as_slice().to_vec(),
            hashes,
            timings,
        }
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Digests recorded for `(source label, order)`.
    #[must_use]
    pub fn digests(&self, source: &str, order: &str) -> Option<&[FrameDigest]> {
        self.hashes
            .iter()
            .find(|h| h.source == source)?
            .orders
            .iter()
            .find(|o| o.order == order)
            .map(|o| o.digests.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MismatchArtifact {
        MismatchArtifact {
            sources: vec![Source::new("png", "/tmp/f%04d.png")],
            orders: vec![AccessOrder::sequential(2)],
            hashes: vec![SourceHashes {
                source: "png:/tmp/f%04d.png".into(),
                orders: vec![OrderHashes {
                    order: "sequential".into(),
                    digests: vec![FrameDigest::of_label("a"), FrameDigest::of_label("b")],
                }],
            }],
            timings: vec![SourceTimings {
                source: "png:/tmp/f%04d.png".into(),
                orders: vec![OrderTiming {
                    order: "sequential".into(),
                    seconds: 0.25,
                }],
            }],
        }
    }

    #[test]
    fn persisted_bundle_reloads() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("nested").join("mismatch.json");
        let artifact = sample();
        artifact.write_to(&path).expect("write");
        assert_eq!(MismatchArtifact::read_from(&path).expect("read"), artifact);
    }

    #[test]
    fn json_has_top_level_sections_and_hex_digests() {
        let value = serde_json::to_value(sample()).expect("json");
        for key in ["sources", "orders", "hashes", "timings"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let first = &value["hashes"][0]["orders"][0]["digests"][0];
        assert_eq!(first.as_str().map(str::len), Some(64));
    }

    #[test]
    fn digests_lookup_by_source_and_order() {
        let artifact = sample();
        let sequential = artifact.digests("png:/tmp/f%04d.png", "sequential");
        assert_eq!(sequential.map(<[_]>::len), Some(2));
        assert!(artifact.digests("png:/tmp/f%04d.png", "random").is_none());
        assert!(artifact.digests("mp4:x", "sequential").is_none());
    }
}
