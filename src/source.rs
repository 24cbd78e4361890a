//! Where new pieces come from: uniform random draws or a fixed repeating order.

use crate::piece::TetrominoKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the kind of each newly spawned piece.
pub trait PieceSource: std::fmt::Debug {
    fn next_kind(&mut self) -> TetrominoKind;
}

/// Uniform draw from all seven kinds.
#[derive(Debug)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PieceSource for RandomSource {
    fn next_kind(&mut self) -> TetrominoKind {
        let i = self.rng.gen_range(0..TetrominoKind::ALL.len());
        TetrominoKind::ALL[i]
    }
}

/// Cycles through a fixed, non-empty list of kinds forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    kinds: Vec<TetrominoKind>,
    next: usize,
}

impl Sequence {
    /// `None` for an empty list.
    pub fn new(kinds: Vec<TetrominoKind>) -> Option<Self> {
        if kinds.is_empty() {
            return None;
        }
        Some(Self { kinds, next: 0 })
    }
}

impl PieceSource for Sequence {
    fn next_kind(&mut self) -> TetrominoKind {
        let kind = self.kinds[self.next];
        self.next = (self.next + 1) % self.kinds.len();
        kind
    }
}
