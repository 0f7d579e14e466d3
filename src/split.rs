// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! The composed convenience entry point wiring the segmenter into the
//! grouper.

use crate::{
    grouper::{self, Grouper},
    segmenter::Segmenter,
    allocate_segments, group_items, Group, GroupError, Incision, Resource,
};

/// Lazy iterator returned by [`split`]
pub struct Split<P, I: Iterator<Item = Resource<P>>> {
    inner: Grouper<P, Segmenter<P, I>>,
}

impl<P: Clone, I: Iterator<Item = Resource<P>>> Iterator for Split<P, I> {
    type Item = Group<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(grouper::truncate_gap)
    }
}

/// Segments `resources` and packs the result into overlapping groups in one
/// step: `group_items(allocate_segments(resources, border_incision,
/// max_segment_count), max_segment_count, gap_rate, tail_rate)`, with each
/// emitted [`Group`]'s head/tail truncated to its gap budget.
///
/// This is the entry point most callers want; [`allocate_segments`] and
/// [`group_items`] remain available separately for callers who only need one
/// stage of the pipeline.
pub fn split<P, R>(
    resources: R,
    max_segment_count: u64,
    border_incision: Incision,
    gap_rate: f64,
    tail_rate: f64,
) -> Result<Split<P, R::IntoIter>, GroupError>
where
    R: IntoIterator<Item = Resource<P>>,
{
    let segments = allocate_segments(resources, border_incision, max_segment_count)?;
    let inner = group_items(segments, max_segment_count, gap_rate, tail_rate)?;
    Ok(Split { inner })
}
