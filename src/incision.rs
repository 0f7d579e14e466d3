// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// The affinity of a boundary: how strongly a resource resists being cut from
/// its neighbour on this side.
///
/// Larger values express a stronger desire to keep the boundary *inside* a
/// segment (not cut there); [`Incision::Impossible`] expresses the strongest
/// desire to cut there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incision {
    /// This boundary must not be cut
    MustBe = 2,

    /// This boundary should most likely not be cut
    MostLikely = 1,

    /// No preference either way
    Uncertain = 0,

    /// This is a natural cut point
    Impossible = -1,
}

impl Incision {
    /// The smallest boundary level the arithmetic in `level` ever clamps to
    pub(crate) const MIN_LEVEL: i64 = Self::Impossible.value();

    /// The raw integer affinity value
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::MustBe => 2,
            Self::MostLikely => 1,
            Self::Uncertain => 0,
            Self::Impossible => -1,
        }
    }

    /// The clamped boundary level between two adjacent incisions
    #[must_use]
    pub(crate) fn level(end: Self, start: Self) -> i64 {
        (end.value() + start.value()).max(Self::MIN_LEVEL)
    }
}
