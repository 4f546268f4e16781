mod common;

use common::{bits, build, crustaceans, names, record, scenario, ALL_EVENTS};
use matrixkey::events::{EventKind, KeyEvent};
use matrixkey::key::Mode;
use matrixkey::KeyError;

#[test]
fn scenario_incidence_matrix() {
    let key = build(scenario(), Mode::Strict);
    assert_eq!(
        key.incidence().to_matrix(),
        vec![vec![1, 0, 1], vec![0, 1, 0], vec![0, 0, 1], vec![1, 1, 1]]
    );
    assert_eq!(bits(key.possible_items()), vec![1, 1, 1]);
    assert_eq!(bits(key.possible_values()), vec![1, 1, 1, 1]);
}

#[test]
fn scenario_select_and_deselect() {
    let mut key = build(scenario(), Mode::Strict);
    assert!(key.select_value(0, None).unwrap());
    assert_eq!(bits(key.possible_items()), vec![1, 0, 1]);
    assert_eq!(bits(key.possible_values()), vec![1, 0, 1, 1]);

    assert!(key.select_value(2, None).unwrap());
    assert_eq!(bits(key.possible_items()), vec![0, 0, 1]);

    assert!(key.deselect_value(2, None).unwrap());
    assert_eq!(bits(key.possible_items()), vec![1, 0, 1]);

    assert!(key.deselect_value(0, None).unwrap());
    assert_eq!(bits(key.possible_items()), vec![1, 1, 1]);
    assert_eq!(bits(key.possible_values()), vec![1, 1, 1, 1]);
}

#[test]
fn remaining_selection_still_constrains_after_partial_deselect() {
    let mut key = build(scenario(), Mode::Strict);
    key.select_value(0, None).unwrap();
    key.select_value(2, None).unwrap();
    key.deselect_value(0, None).unwrap();
    // only value 2 remains selected, which only the third item carries
    assert_eq!(bits(key.possible_items()), vec![0, 0, 1]);
    assert_eq!(key.selected_values(), vec![2]);
}

#[test]
fn conjunction_across_filters() {
    let mut key = build(scenario(), Mode::Strict);
    key.select_value(0, None).unwrap();
    key.select_range("length", 5.0, 10.0).unwrap();
    assert_eq!(bits(key.possible_items()), vec![0, 0, 1]);

    let mut key = build(crustaceans(), Mode::Strict);
    assert_eq!(bits(key.possible_items()), vec![1, 1, 1, 1]);
    key.select_value(0, None).unwrap(); // claws
    assert_eq!(bits(key.possible_items()), vec![1, 1, 0, 0]);
    key.select_value(3, None).unwrap(); // blue
    assert_eq!(bits(key.possible_items()), vec![0, 1, 0, 0]);
    assert_eq!(names(&key.results()), vec!["crayfish"]);
}

#[test]
fn values_carried_only_by_excluded_items_become_impossible() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap(); // claws
    assert_eq!(bits(key.possible_values()), vec![1, 0, 1, 1, 1, 1, 1, 0, 1]);
}

#[test]
fn select_then_deselect_restores_snapshot() {
    let mut key = build(crustaceans(), Mode::Fluid);
    key.select_value(2, None).unwrap(); // red
    let items = key.possible_items().to_vec();
    let values = key.possible_values().to_vec();
    let visible = key.visible_filters().to_vec();
    let scores = key.scores().to_vec();

    key.select_value(5, None).unwrap(); // fan
    assert_ne!(key.possible_items(), items.as_slice());
    key.deselect_value(5, None).unwrap();

    assert_eq!(key.possible_items(), items.as_slice());
    assert_eq!(key.possible_values(), values.as_slice());
    assert_eq!(key.visible_filters(), visible.as_slice());
    assert_eq!(key.scores(), scores.as_slice());
}

#[test]
fn reselecting_is_silent() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap();
    let before = key.possible_values().to_vec();
    let log = record(
        &mut key,
        &[
            EventKind::ValueSelected,
            EventKind::ValuePossibilityChanged,
            EventKind::FilterVisibilityChanged,
            EventKind::ResultsUpdated,
        ],
    );
    assert!(!key.select_value(0, None).unwrap());
    assert!(log.borrow().is_empty());
    assert_eq!(key.possible_values(), before.as_slice());
}

#[test]
fn pre_selection_notice_fires_even_for_no_ops() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap();
    let log = record(&mut key, &ALL_EVENTS);
    key.select_value(0, None).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![KeyEvent::BeforeValueSelected { index: 0, payload: None }]
    );
}

#[test]
fn impossible_value_is_not_selected() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap(); // claws
    key.select_value(3, None).unwrap(); // blue, only crayfish left
    // tail:fan is carried by crab and shrimp, both excluded
    assert!(!key.possible_values()[5]);
    assert!(!key.select_value(5, None).unwrap());
    assert!(!key.is_selected(5));
    assert_eq!(key.selected_values(), vec![0, 3]);
}

#[test]
fn deselecting_unselected_value_is_a_no_op() {
    let mut key = build(scenario(), Mode::Strict);
    let log = record(&mut key, &ALL_EVENTS);
    assert!(!key.deselect_value(1, None).unwrap());
    assert!(log.borrow().is_empty());
}

#[test]
fn out_of_range_index_fails_without_side_effects() {
    let mut key = build(scenario(), Mode::Strict);
    key.select_value(0, None).unwrap();
    let log = record(&mut key, &ALL_EVENTS);
    let err = key.select_value(4, None).unwrap_err();
    assert!(matches!(err, KeyError::IndexOutOfRange { index: 4, len: 4 }));
    let err = key.deselect_value(17, None).unwrap_err();
    assert!(matches!(err, KeyError::IndexOutOfRange { index: 17, .. }));
    assert!(log.borrow().is_empty());
    assert_eq!(bits(key.possible_items()), vec![1, 0, 1]);
    assert_eq!(key.selected_values(), vec![0]);
}

#[test]
fn strict_results_keep_input_order() {
    let mut key = build(crustaceans(), Mode::Strict);
    assert_eq!(names(&key.results()), vec!["crab", "crayfish", "shrimp", "krill"]);
    key.select_value(2, None).unwrap(); // red
    assert_eq!(names(&key.results()), vec!["crab", "crayfish", "krill"]);
    assert_eq!(names(&key.impossible_results()), vec!["shrimp"]);
}

#[test]
fn impossible_results_are_ranked() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap(); // claws, 5 points for crab and crayfish
    key.select_value(3, None).unwrap(); // blue, 2 points for crayfish and shrimp
    assert_eq!(names(&key.results()), vec!["crayfish"]);
    // crab 5/10, shrimp 2/10, krill 0/9
    assert_eq!(names(&key.impossible_results()), vec!["crab", "shrimp", "krill"]);
}

#[test]
fn single_select_siblings_stay_selectable() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap(); // claws
    // plain is carried by no surviving item, but would replace claws
    assert!(!key.possible_values()[1]);
    assert!(key.selectable_values()[1]);
    assert_eq!(bits(&key.selectable_values()), vec![1, 1, 1, 1, 1, 1, 1, 0, 1]);
    assert!(key.select_value(1, None).unwrap());
}

#[test]
fn sibling_blocked_by_other_filters_is_not_selectable() {
    let mut key = build(crustaceans(), Mode::Strict);
    key.select_value(0, None).unwrap(); // claws
    key.select_value(3, None).unwrap(); // blue, only crayfish left
    key.select_value(6, None).unwrap(); // pointed
    // fan is only carried by crab and shrimp, with or without pointed
    assert!(!key.selectable_values()[5]);
    assert!(!key.select_value(5, None).unwrap());
    assert!(key.is_selected(6));
}
