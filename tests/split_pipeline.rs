// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Whole-pipeline scenario tests composing [`split`] end to end, rather than
//! exercising `allocate_segments` and `group_items` in isolation.

use resource_segmentation::{split, Group, Incision, Item, Resource};

fn uniform(counts: &[u64]) -> Vec<Resource<String>> {
    counts
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Resource::new(
                c,
                Incision::Uncertain,
                Incision::Uncertain,
                format!("r{i}"),
            )
        })
        .collect()
}

fn body_payloads(group: &Group<String>) -> Vec<String> {
    group
        .body
        .iter()
        .flat_map(|item| match item {
            Item::Resource(r) => vec![r.payload.clone()],
            Item::Segment(s) => s.resources.iter().map(|r| r.payload.clone()).collect(),
        })
        .collect()
}

/// Scenario A: concatenating every group's body reproduces the original
/// resource sequence, with no gaps or duplicates.
#[test_log::test]
fn bodies_concatenate_to_the_original_sequence() {
    let resources = uniform(&[100, 100, 100, 100, 100]);

    let groups: Vec<_> = split(resources, 400, Incision::Uncertain, 0.25, 0.5)
        .expect("valid config")
        .collect();

    assert!(groups.len() > 1, "expected the input to be split into several groups");

    let reassembled: Vec<_> = groups.iter().flat_map(body_payloads).collect();
    let expected: Vec<_> = (0..5).map(|i| format!("r{i}")).collect();
    assert_eq!(expected, reassembled);
}

/// Every group's head/tail weight never exceeds its own recorded remain-count
/// budget, across the whole pipeline (segmentation feeding into grouping).
#[test_log::test]
fn head_and_tail_never_exceed_their_own_budget() {
    let resources = uniform(&[30, 30, 30, 30, 30, 30, 30, 30, 30, 30]);

    let groups: Vec<_> = split(resources, 150, Incision::Uncertain, 0.2, 0.5)
        .expect("valid config")
        .collect();

    assert!(!groups.is_empty());
    for g in &groups {
        assert!(g.head_count() <= g.head_remain_count);
        assert!(g.tail_count() <= g.tail_remain_count);
        assert!(!g.body.is_empty());
    }
}

/// A single strong (`MustBe`) boundary run that still fits under
/// `max_segment_count` survives segmentation as one aggregate segment and is
/// never torn across a group boundary.
#[test_log::test]
fn strongly_bound_run_stays_together_through_grouping() {
    let resources = vec![
        Resource::new(50, Incision::Uncertain, Incision::Uncertain, "before".to_string()),
        Resource::new(40, Incision::Uncertain, Incision::MustBe, "a".to_string()),
        Resource::new(40, Incision::MustBe, Incision::MustBe, "b".to_string()),
        Resource::new(40, Incision::MustBe, Incision::Uncertain, "c".to_string()),
        Resource::new(50, Incision::Uncertain, Incision::Uncertain, "after".to_string()),
    ];

    let groups: Vec<_> = split(resources, 1_000, Incision::Uncertain, 0.1, 0.5)
        .expect("valid config")
        .collect();

    assert_eq!(1, groups.len(), "everything fits in a single group's body");

    let found_run = groups[0].body.iter().any(|item| match item {
        Item::Segment(s) => {
            s.resources.iter().map(|r| r.payload.as_str()).collect::<Vec<_>>() == ["a", "b", "c"]
        }
        Item::Resource(_) => false,
    });
    assert!(found_run, "expected a, b, c to be grouped into one segment");
}

/// An individually oversize resource is never split, even when it forces a
/// group's body past `max_count`.
#[test_log::test]
fn oversize_resource_passes_through_whole() {
    let resources = vec![
        Resource::new(50, Incision::Uncertain, Incision::Uncertain, "small".to_string()),
        Resource::new(500, Incision::Uncertain, Incision::Uncertain, "huge".to_string()),
        Resource::new(50, Incision::Uncertain, Incision::Uncertain, "small2".to_string()),
    ];

    let groups: Vec<_> = split(resources, 200, Incision::Uncertain, 0.25, 0.5)
        .expect("valid config")
        .collect();

    let huge_group = groups
        .iter()
        .find(|g| g.body.iter().any(|i| i.count() == 500))
        .expect("the oversize resource must appear somewhere");

    assert_eq!(1, huge_group.body.len());
    match &huge_group.body[0] {
        Item::Resource(r) => assert_eq!("huge", r.payload),
        Item::Segment(_) => panic!("an oversize resource must never be wrapped into a segment"),
    }
}

/// An empty input produces no groups at all.
#[test_log::test]
fn empty_input_yields_no_groups() {
    let resources: Vec<Resource<()>> = vec![];
    let groups: Vec<_> = split(resources, 100, Incision::Uncertain, 0.1, 0.5)
        .expect("valid config")
        .collect();
    assert!(groups.is_empty());
}

#[test_log::test]
fn rejects_invalid_max_segment_count() {
    let resources: Vec<Resource<()>> = vec![];
    let err = split(resources, 0, Incision::Uncertain, 0.1, 0.5).unwrap_err();
    assert!(matches!(err, resource_segmentation::GroupError::Segment(_)));
}
