// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Packs the segmenter's item stream into overlapping, budget-bounded
//! [`Group`]s.

use crate::{Group, GroupError, Item, Resource, Segment};
use std::collections::VecDeque;

fn validate(max_count: u64, gap_rate: f64, tail_rate: f64) -> Result<(), GroupError> {
    if max_count == 0 {
        return Err(GroupError::NonPositiveMaxCount);
    }
    if !(0.0..=0.5).contains(&gap_rate) {
        return Err(GroupError::GapRateOutOfRange);
    }
    if !(0.0..=1.0).contains(&tail_rate) {
        return Err(GroupError::TailRateOutOfRange);
    }
    Ok(())
}

/// Lazy iterator returned by [`crate::group_items`]
pub struct Grouper<P, I: Iterator<Item = Item<P>>> {
    source: I,
    lookahead: VecDeque<Item<P>>,
    prev_body: Vec<Item<P>>,
    max_count: u64,
    gap_max: u64,
    body_max: u64,
    tail_rate: f64,
    done: bool,
}

impl<P, I: Iterator<Item = Item<P>>> Grouper<P, I> {
    pub(crate) fn new(source: I, max_count: u64, gap_rate: f64, tail_rate: f64) -> Self {
        let gap_max = (max_count as f64 * gap_rate).floor() as u64;
        let body_max = max_count - 2 * gap_max;

        Self {
            source,
            lookahead: VecDeque::new(),
            prev_body: Vec::new(),
            max_count,
            gap_max,
            body_max,
            tail_rate,
            done: false,
        }
    }

    fn ensure_lookahead(&mut self, at_least: usize) {
        while self.lookahead.len() <= at_least {
            match self.source.next() {
                Some(item) => self.lookahead.push_back(item),
                None => break,
            }
        }
    }

    /// Greedily packs a body starting at `self.lookahead`'s front, consuming
    /// the items it takes.
    fn pack_body(&mut self) -> Vec<Item<P>>
    where
        P: Clone,
    {
        let mut body: Vec<Item<P>> = Vec::new();
        let mut acc = 0u64;

        loop {
            self.ensure_lookahead(0);
            let Some(count) = self.lookahead.front().map(Item::count) else {
                break;
            };

            if body.is_empty() {
                let item = self.lookahead.pop_front().expect("front was checked");
                if count > self.body_max {
                    body.push(item);
                    break;
                }
                body.push(item);
                acc = count;
                continue;
            }

            if acc + count <= self.body_max {
                let item = self.lookahead.pop_front().expect("front was checked");
                body.push(item);
                acc += count;
            } else {
                break;
            }
        }

        body
    }

    /// Previews the body that *would* be packed next, pulling further
    /// resources from the source into `self.lookahead` as needed but without
    /// consuming anything: the real [`Self::pack_body`] call for the next
    /// group will walk the same prefix.
    fn peek_next_body(&mut self) -> Vec<Item<P>>
    where
        P: Clone,
    {
        let mut body: Vec<Item<P>> = Vec::new();
        let mut acc = 0u64;
        let mut idx = 0usize;

        loop {
            self.ensure_lookahead(idx);
            let Some(item) = self.lookahead.get(idx) else {
                break;
            };
            let count = item.count();

            if body.is_empty() {
                body.push(item.clone());
                if count > self.body_max {
                    break;
                }
                acc = count;
                idx += 1;
                continue;
            }

            if acc + count <= self.body_max {
                body.push(item.clone());
                acc += count;
                idx += 1;
            } else {
                break;
            }
        }

        body
    }
}

/// Splits the residual budget (`max_count - body_count`) between head and
/// tail according to `tail_rate`.
///
/// When this group is the first (no head neighbour ever) or last (no tail
/// neighbour ever) emitted, the whole residual goes to whichever side still
/// has somewhere to put it rather than being halved by `tail_rate` against a
/// side that can never use its share.
fn residual_shares(residual: u64, tail_rate: f64, is_first: bool, is_last: bool) -> (u64, u64) {
    if is_first {
        (0, residual)
    } else if is_last {
        (residual, 0)
    } else {
        let tail = (residual as f64 * tail_rate).round() as u64;
        (residual.saturating_sub(tail), tail)
    }
}

/// Whether `neighbour` is itself a lone oversize body: exactly one item
/// whose weight exceeds `body_max`. Such a body was already forced to stand
/// alone by the packer, so previewing it needs to see it whole rather than
/// be capped at the ordinary gap budget.
fn is_forced_oversize<P>(neighbour: &[Item<P>], body_max: u64) -> bool {
    matches!(neighbour, [only] if only.count() > body_max)
}

fn trim_segment_resources<P: Clone>(
    resources: &[Resource<P>],
    budget: u64,
    from_end: bool,
) -> Vec<Resource<P>> {
    let mut acc = 0u64;
    let mut kept: Vec<Resource<P>> = Vec::new();

    let iter: Box<dyn Iterator<Item = &Resource<P>>> = if from_end {
        Box::new(resources.iter().rev())
    } else {
        Box::new(resources.iter())
    };

    for r in iter {
        if kept.is_empty() {
            kept.push(r.clone());
            acc = r.count;
            continue;
        }
        if acc + r.count <= budget {
            kept.push(r.clone());
            acc += r.count;
        } else {
            break;
        }
    }

    if from_end {
        kept.reverse();
    }
    kept
}

fn wrap_resources<P>(resources: Vec<Resource<P>>) -> Option<Item<P>> {
    match resources.len() {
        0 => None,
        1 => Some(Item::Resource(resources.into_iter().next().expect("len == 1"))),
        _ => {
            let count = resources.iter().map(|r| r.count).sum();
            Some(Item::Segment(Segment::new(count, resources)))
        }
    }
}

/// Selects a budget-bounded run from the end of `items`, preserving the
/// items closest to the body. The item closest to the body is always kept
/// even if it alone overshoots `budget` (resources are never split); a
/// `budget` of zero yields no material at all.
fn select_trailing<P: Clone>(items: &[Item<P>], budget: u64) -> Vec<Item<P>> {
    if budget == 0 {
        return Vec::new();
    }

    let mut acc = 0u64;
    let mut picked: Vec<Item<P>> = Vec::new();

    for item in items.iter().rev() {
        let count = item.count();

        if picked.is_empty() {
            if count <= budget {
                picked.push(item.clone());
                acc = count;
            } else if let Item::Segment(seg) = item {
                let kept = trim_segment_resources(&seg.resources, budget, true);
                if let Some(item) = wrap_resources(kept) {
                    acc = item.count();
                    picked.push(item);
                }
            } else {
                picked.push(item.clone());
                acc = count;
            }
            continue;
        }

        if acc + count <= budget {
            picked.push(item.clone());
            acc += count;
        } else {
            break;
        }
    }

    picked.reverse();
    picked
}

/// Symmetric to [`select_trailing`], walking from the start of `items`.
fn select_leading<P: Clone>(items: &[Item<P>], budget: u64) -> Vec<Item<P>> {
    if budget == 0 {
        return Vec::new();
    }

    let mut acc = 0u64;
    let mut picked: Vec<Item<P>> = Vec::new();

    for item in items.iter() {
        let count = item.count();

        if picked.is_empty() {
            if count <= budget {
                picked.push(item.clone());
                acc = count;
            } else if let Item::Segment(seg) = item {
                let kept = trim_segment_resources(&seg.resources, budget, false);
                if let Some(item) = wrap_resources(kept) {
                    acc = item.count();
                    picked.push(item);
                }
            } else {
                picked.push(item.clone());
                acc = count;
            }
            continue;
        }

        if acc + count <= budget {
            picked.push(item.clone());
            acc += count;
        } else {
            break;
        }
    }

    picked
}

impl<P: Clone, I: Iterator<Item = Item<P>>> Iterator for Grouper<P, I> {
    type Item = Group<P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let body = self.pack_body();
        if body.is_empty() {
            self.done = true;
            return None;
        }

        let body_count: u64 = body.iter().map(Item::count).sum();

        let is_first = self.prev_body.is_empty();
        let upcoming = self.peek_next_body();
        let is_last = upcoming.is_empty();

        let residual = self.max_count.saturating_sub(body_count);
        let (raw_head, raw_tail) = residual_shares(residual, self.tail_rate, is_first, is_last);

        let head_target = if is_first {
            0
        } else if is_forced_oversize(&self.prev_body, self.body_max) {
            raw_head
        } else {
            raw_head.min(self.gap_max)
        };
        let head = select_trailing(&self.prev_body, head_target);
        let head_remain_count = if is_first { 0 } else { head_target };

        let tail_target = if is_last {
            0
        } else if is_forced_oversize(&upcoming, self.body_max) {
            raw_tail
        } else {
            raw_tail.min(self.gap_max)
        };
        let tail = select_leading(&upcoming, tail_target);
        let tail_remain_count = if is_last { 0 } else { tail_target };

        log::trace!(
            "emitting group: body weight {body_count}, head {}, tail {}",
            head.iter().map(Item::count).sum::<u64>(),
            tail.iter().map(Item::count).sum::<u64>(),
        );

        self.prev_body = body.clone();

        Some(Group::new(head, body, tail, head_remain_count, tail_remain_count))
    }
}

/// Produces a lazy sequence of [`Group`]s from `items`, each with a `body`
/// bounded by `max_count - 2 * floor(max_count * gap_rate)` and `head`/`tail`
/// overlaps drawn from the neighbouring groups, biased between the two by
/// `tail_rate`.
pub fn group_items<P, Items>(
    items: Items,
    max_count: u64,
    gap_rate: f64,
    tail_rate: f64,
) -> Result<Grouper<P, Items::IntoIter>, GroupError>
where
    Items: IntoIterator<Item = Item<P>>,
{
    validate(max_count, gap_rate, tail_rate)?;
    Ok(Grouper::new(items.into_iter(), max_count, gap_rate, tail_rate))
}

/// Clamps `group`'s head and tail to their recorded `*_remain_count`
/// budgets, preserving the material closest to the body, and recomputes
/// those budgets from the truncated contents.
pub(crate) fn truncate_gap<P: Clone>(group: Group<P>) -> Group<P> {
    let head = select_trailing(&group.head, group.head_remain_count);
    let tail = select_leading(&group.tail, group.tail_remain_count);

    let head_remain_count = head.iter().map(Item::count).sum::<u64>().min(group.head_remain_count);
    let tail_remain_count = tail.iter().map(Item::count).sum::<u64>().min(group.tail_remain_count);

    Group::new(head, group.body, tail, head_remain_count, tail_remain_count)
}
