#![forbid(unsafe_code)]

//! Frame access orders.
//!
//! Position-dependent reader bugs (stale seek state, forward-only decoders,
//! keyframe snapping) only show up under specific access patterns, so every
//! source is read several ways:
//!
//! | name           | offsets                                                     |
//! |----------------|-------------------------------------------------------------|
//! | `sequential`   | `0..length`                                                 |
//! | `random`       | `sample_count` uniform draws from `[0, length)`             |
//! | `random_fwd`   | an independent draw, sorted ascending                       |
//! | `random_bwd`   | an independent draw, sorted descending                      |
//! | `reverse_skip` | `length-1` down to `0`, step `max(1, length / sample_count)` |

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

pub const SEQUENTIAL: &str = "sequential";
pub const RANDOM: &str = "random";
pub const RANDOM_FWD: &str = "random_fwd";
pub const RANDOM_BWD: &str = "random_bwd";
pub const REVERSE_SKIP: &str = "reverse_skip";

/// A named sequence of offsets relative to a source's first index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessOrder {
    pub name: String,
    pub offsets: Vec<usize>,
}

impl AccessOrder {
    #[must_use]
    pub fn new(name: impl Into<String>, offsets: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            offsets,
        }
    }

    #[must_use]
    pub fn sequential(length: usize) -> Self {
        Self::new(SEQUENTIAL, (0..length).collect())
    }

    #[must_use]
    pub fn reverse_skip(length: usize, sample_count: usize) -> Self {
        let step = (length / sample_count.max(1)).max(1);
        let offsets = (0..length).rev().step_by(step).collect();
        Self::new(REVERSE_SKIP, offsets)
    }

    /// Leading offsets that fall inside a source of `available` frames.
    #[must_use]
    pub fn clamped(&self, available: usize) -> Self {
        let offsets = self
            .offsets
            .iter()
            .copied()
            .take_while(|&offset| offset < available)
            .collect();
        Self::new(self.name.clone(), offsets)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

fn draw<R: Rng>(rng: &mut R, length: usize, sample_count: usize) -> Vec<usize> {
    if length == 0 {
        return Vec::new();
    }
    (0..sample_count)
        .map(|_| rng.random_range(0..length))
        .collect()
}

/// The orders used for one comparison run, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSet {
    orders: Vec<AccessOrder>,
}

impl OrderSet {
    /// Build the full catalog for a sequence of `length` frames.
    pub fn generate<R: Rng>(length: usize, sample_count: usize, rng: &mut R) -> Self {
        let random = draw(rng, length, sample_count);
        let mut fwd = draw(rng, length, sample_count);
        fwd.sort_unstable();
        let mut bwd = draw(rng, length, sample_count);
        bwd.sort_unstable_by(|a, b| b.cmp(a));

        Self {
            orders: vec![
                AccessOrder::sequential(length),
                AccessOrder::new(RANDOM, random),
                AccessOrder::new(RANDOM_FWD, fwd),
                AccessOrder::new(RANDOM_BWD, bwd),
                AccessOrder::reverse_skip(length, sample_count),
            ],
        }
    }

    /// [`OrderSet::generate`] driven by a `SmallRng` seeded with `seed`.
    #[must_use]
    pub fn seeded(length: usize, sample_count: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::generate(length, sample_count, &mut rng)
    }

    /// Only the `sequential` order; used for repeated self-comparison.
    #[must_use]
    pub fn sequential_only(length: usize) -> Self {
        Self {
            orders: vec![AccessOrder::sequential(length)],
        }
    }

    #[must_use]
    pub fn from_orders(orders: Vec<AccessOrder>) -> Self {
        Self { orders }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessOrder> {
        self.orders.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AccessOrder> {
        self.orders.iter().find(|o| o.name == name)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[AccessOrder] {
        &self.orders
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
