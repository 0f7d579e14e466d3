// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::Resource;

/// A flat bundle of two or more consecutive resources with an aggregate weight
///
/// A segment never contains another segment: the tree the segmenter builds
/// internally is always flattened before being handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<P> {
    /// `Σ resources[i].count`
    pub count: u64,

    /// The resources in this segment, in their original stream order
    pub resources: Vec<Resource<P>>,
}

impl<P> Segment<P> {
    /// Builds a segment from its resources
    ///
    /// # Panics
    ///
    /// Panics (in debug builds) if `resources` has fewer than two items, or if
    /// `count` does not match the sum of the resources' counts: singletons
    /// are unwrapped by the caller before reaching this constructor.
    pub(crate) fn new(count: u64, resources: Vec<Resource<P>>) -> Self {
        debug_assert!(resources.len() >= 2, "a segment must hold >= 2 resources");
        debug_assert_eq!(
            count,
            resources.iter().map(|r| r.count).sum::<u64>(),
            "segment count must equal the sum of its resources' counts"
        );
        Self { count, resources }
    }
}

/// Either a standalone [`Resource`] or an aggregate [`Segment`]
///
/// This is what [`crate::allocate_segments`] and [`crate::group_items`] yield:
/// the public, already-flattened view of the segmenter's internal tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item<P> {
    /// A single resource that was not grouped with any neighbour
    Resource(Resource<P>),

    /// Two or more resources that were grouped together
    Segment(Segment<P>),
}

impl<P> Item<P> {
    /// The aggregate weight of this item
    #[must_use]
    pub fn count(&self) -> u64 {
        match self {
            Self::Resource(r) => r.count,
            Self::Segment(s) => s.count,
        }
    }

    /// The boundary affinity immediately before this item's first resource
    #[must_use]
    pub fn start_incision(&self) -> crate::Incision {
        match self {
            Self::Resource(r) => r.start_incision,
            Self::Segment(s) => s
                .resources
                .first()
                .map(|r| r.start_incision)
                .unwrap_or(crate::Incision::Impossible),
        }
    }

    /// The boundary affinity immediately after this item's last resource
    #[must_use]
    pub fn end_incision(&self) -> crate::Incision {
        match self {
            Self::Resource(r) => r.end_incision,
            Self::Segment(s) => s
                .resources
                .last()
                .map(|r| r.end_incision)
                .unwrap_or(crate::Incision::Impossible),
        }
    }
}
