// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Partitions a lazy sequence of weighted resources into context-window-
//! shaped groups, suitable for feeding downstream consumers (e.g. language
//! model prompt builders) that require bounded-size chunks with optional
//! overlap.
//!
//! Each [`Resource`] carries a weight (a "count", often a token count) and
//! two boundary hints — a start [`Incision`] and an end incision — which
//! express the cost of cutting the stream immediately before or after that
//! resource. The pipeline has two stages:
//!
//! 1. [`allocate_segments`] groups resources into [`Item`]s (a standalone
//!    [`Resource`] or an aggregate [`Segment`]) by recursively walking
//!    boundary affinity, never exceeding `max_segment_count` where a
//!    sanctioned cut point exists.
//! 2. [`group_items`] slides a window over that item sequence, producing
//!    [`Group`]s whose `body` fits a budget and whose `head`/`tail` preview
//!    material from the neighbouring groups.
//!
//! [`split`] composes both stages; most callers want that one.
//!
//! # Example usage
//!
//! ```
//! use resource_segmentation::{split, Incision, Resource};
//!
//! let resources = vec![
//!     Resource::new(80, Incision::Uncertain, Incision::Uncertain, "alpha"),
//!     Resource::new(80, Incision::Uncertain, Incision::Uncertain, "beta"),
//!     Resource::new(80, Incision::Uncertain, Incision::Uncertain, "gamma"),
//! ];
//!
//! let groups = split(resources, 1_000, Incision::Uncertain, 0.1, 0.5)?;
//!
//! for group in groups {
//!     println!("body weight: {}", group.body_count());
//! }
//! # Ok::<(), resource_segmentation::GroupError>(())
//! ```
//!
//! Resources are never split: a resource larger than a budget is passed
//! through oversize rather than divided, and the semantics of `payload` are
//! opaque to this crate.

mod error;
mod group;
mod grouper;
mod incision;
mod resource;
mod segment;
mod segmenter;
mod split;
mod stream;

pub use error::{GroupError, SegmentError};
pub use group::Group;
pub use grouper::{group_items, Grouper};
pub use incision::Incision;
pub use resource::Resource;
pub use segment::{Item, Segment};
pub use segmenter::{allocate_segments, Segmenter};
pub use split::{split, Split};
