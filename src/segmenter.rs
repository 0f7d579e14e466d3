// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Builds a tree of affinity segments from boundary-hint arithmetic, then
//! flattens it into the public [`Item`](crate::Item) stream.

use crate::{stream::PushbackStream, Incision, Item, Resource, Segment, SegmentError};
use std::collections::VecDeque;

/// A node or leaf in the segmenter's private working tree
enum Child<P> {
    Resource(Resource<P>),
    Node(Node<P>),
}

impl<P> Child<P> {
    fn count(&self) -> u64 {
        match self {
            Self::Resource(r) => r.count,
            Self::Node(n) => n.count,
        }
    }

    fn start_incision(&self) -> Incision {
        match self {
            Self::Resource(r) => r.start_incision,
            Self::Node(n) => n.start_incision,
        }
    }

    fn end_incision(&self) -> Incision {
        match self {
            Self::Resource(r) => r.end_incision,
            Self::Node(n) => n.end_incision,
        }
    }
}

/// A recursive, private tree node; never leaves the segmenter
struct Node<P> {
    level: i64,
    count: u64,
    start_incision: Incision,
    end_incision: Incision,
    children: Vec<Child<P>>,
}

/// Adapts a plain resource iterator into the `Child` stream the tree builder
/// pulls from, so that a node popped back onto the stream mid-recursion
/// (see `collect`) can be recovered just like a raw resource.
struct ChildSource<I> {
    inner: I,
}

impl<P, I: Iterator<Item = Resource<P>>> Iterator for ChildSource<I> {
    type Item = Child<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Child::Resource)
    }
}

/// Pulls items from `stream` at `floor_level`, recursing one level deeper
/// whenever a boundary is stronger than the current floor.
///
/// NOTE: when a boundary falls below the floor, this records the incoming
/// (and immediately pushed-back) item's `end_incision` as the node's own
/// `end_incision`, even though that item is not a member of the node. This
/// mirrors a quirk in the original implementation and is reproduced here
/// deliberately; see the historical-bug test in this module.
fn collect<P, I>(stream: &mut PushbackStream<ChildSource<I>>, floor_level: i64) -> Node<P>
where
    I: Iterator<Item = Resource<P>>,
{
    let mut children: Vec<Child<P>> = Vec::new();
    let mut start_incision = Incision::Impossible;
    let mut end_incision = Incision::Impossible;

    loop {
        let Some(item) = stream.get() else {
            break;
        };

        let Some(prev) = children.last() else {
            start_incision = item.start_incision();
            children.push(item);
            continue;
        };

        let lvl = Incision::level(prev.end_incision(), item.start_incision());

        match lvl.cmp(&floor_level) {
            std::cmp::Ordering::Less => {
                end_incision = item.end_incision();
                stream.recover(item);
                break;
            }
            std::cmp::Ordering::Greater => {
                let prev = children.pop().expect("children is non-empty");
                stream.recover(item);
                stream.recover(prev);
                let nested = collect(stream, lvl);
                log::trace!("boundary level {lvl} exceeds floor {floor_level}, nesting a segment");
                children.push(Child::Node(nested));
            }
            std::cmp::Ordering::Equal => {
                children.push(item);
            }
        }
    }

    let count = children.iter().map(Child::count).sum();

    Node {
        level: floor_level,
        count,
        start_incision,
        end_incision,
        children,
    }
}

/// Splits `node` into same-level nodes that each fit `max_segment_count`,
/// recursively unfolding any child that is itself oversize first.
///
/// An oversize *resource* is never split: if it ends up alone as a node's
/// sole child, the returned node legitimately exceeds `max_segment_count`.
fn size_split<P>(node: Node<P>, max_segment_count: u64) -> Vec<Node<P>> {
    if node.count <= max_segment_count {
        return vec![node];
    }

    log::debug!(
        "segment of weight {} exceeds max_segment_count {max_segment_count}, splitting",
        node.count
    );

    let level = node.level;
    let mut unfolded: Vec<Child<P>> = Vec::new();

    for child in node.children {
        match child {
            Child::Node(n) if n.count > max_segment_count => {
                unfolded.extend(size_split(n, max_segment_count).into_iter().map(Child::Node));
            }
            other => unfolded.push(other),
        }
    }

    let mut result = Vec::new();
    let mut buffer: Vec<Child<P>> = Vec::new();
    let mut count = 0u64;

    for item in unfolded {
        if !buffer.is_empty() && count + item.count() > max_segment_count {
            result.push(flush(level, std::mem::take(&mut buffer)));
            count = 0;
        }
        count += item.count();
        buffer.push(item);
    }

    if !buffer.is_empty() {
        result.push(flush(level, buffer));
    }

    result
}

fn flush<P>(level: i64, children: Vec<Child<P>>) -> Node<P> {
    let count = children.iter().map(Child::count).sum();
    let start_incision = children
        .first()
        .map(Child::start_incision)
        .unwrap_or(Incision::Impossible);
    let end_incision = children
        .last()
        .map(Child::end_incision)
        .unwrap_or(Incision::Impossible);

    Node {
        level,
        count,
        start_incision,
        end_incision,
        children,
    }
}

fn flatten_resources<P>(node: Node<P>, out: &mut Vec<Resource<P>>) {
    for child in node.children {
        match child {
            Child::Resource(r) => out.push(r),
            Child::Node(n) => flatten_resources(n, out),
        }
    }
}

fn flatten_and_unwrap<P>(node: Node<P>) -> Item<P> {
    let mut resources = Vec::new();
    flatten_resources(node, &mut resources);

    if resources.len() == 1 {
        Item::Resource(resources.into_iter().next().expect("len == 1"))
    } else {
        let count = resources.iter().map(|r| r.count).sum();
        Item::Segment(Segment::new(count, resources))
    }
}

/// Lazy iterator returned by [`crate::allocate_segments`]
pub struct Segmenter<P, I: Iterator<Item = Resource<P>>> {
    stream: PushbackStream<ChildSource<I>>,
    floor_level: i64,
    max_segment_count: u64,
    pending: VecDeque<Item<P>>,
    exhausted: bool,
}

impl<P, I: Iterator<Item = Resource<P>>> Segmenter<P, I> {
    pub(crate) fn new(inner: I, border_incision: Incision, max_segment_count: u64) -> Self {
        Self {
            stream: PushbackStream::new(ChildSource { inner }),
            floor_level: border_incision.value().max(Incision::MIN_LEVEL),
            max_segment_count,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }
}

impl<P, I: Iterator<Item = Resource<P>>> Iterator for Segmenter<P, I> {
    type Item = Item<P>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(item);
            }

            if self.exhausted {
                return None;
            }

            let root = collect(&mut self.stream, self.floor_level);

            if root.children.is_empty() {
                self.exhausted = true;
                return None;
            }

            log::trace!(
                "top-level boundary decided, weight {} across {} children",
                root.count,
                root.children.len()
            );

            for child in root.children {
                match child {
                    Child::Resource(r) => self.pending.push_back(Item::Resource(r)),
                    Child::Node(node) => {
                        for split in size_split(node, self.max_segment_count) {
                            self.pending.push_back(flatten_and_unwrap(split));
                        }
                    }
                }
            }
        }
    }
}

/// Produces a lazy sequence of [`Item`]s from `resources`, grouping runs of
/// resources whose boundary affinity exceeds `border_incision` into
/// [`Segment`]s no larger than `max_segment_count` (oversize resources
/// excepted; see the crate documentation).
pub fn allocate_segments<P, R>(
    resources: R,
    border_incision: Incision,
    max_segment_count: u64,
) -> Result<Segmenter<P, R::IntoIter>, SegmentError>
where
    R: IntoIterator<Item = Resource<P>>,
{
    if max_segment_count == 0 {
        return Err(SegmentError::NonPositiveMaxSegmentCount);
    }

    Ok(Segmenter::new(
        resources.into_iter(),
        border_incision,
        max_segment_count,
    ))
}
