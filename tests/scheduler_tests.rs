use chrono::NaiveDate;
use logbook_tool::{LogbookError, ShiftPattern, ShiftSlot, schedule, slots_to_dataframe};
use polars::prelude::DataType;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn two_slots_per_day_alternate_kinds() {
    let pattern = ShiftPattern::alternating(["lunch", "dinner"], 2);
    let slots = schedule(d(2024, 1, 1), 4, &pattern).unwrap();
    assert_eq!(
        slots,
        vec![
            ShiftSlot::new(1, d(2024, 1, 1), "lunch"),
            ShiftSlot::new(2, d(2024, 1, 1), "dinner"),
            ShiftSlot::new(3, d(2024, 1, 2), "lunch"),
            ShiftSlot::new(4, d(2024, 1, 2), "dinner"),
        ]
    );
}

#[test]
fn schedule_is_idempotent() {
    let pattern = ShiftPattern::alternating(["lunch", "dinner"], 2);
    let first = schedule(d(2025, 1, 6), 48, &pattern).unwrap();
    let second = schedule(d(2025, 1, 6), 48, &pattern).unwrap();
    assert_eq!(first, second);
}

#[test]
fn forty_eight_slots_split_evenly_over_twenty_four_days() {
    let pattern = ShiftPattern::alternating(["lunch", "dinner"], 2);
    let slots = schedule(d(2025, 1, 6), 48, &pattern).unwrap();
    assert_eq!(slots.len(), 48);
    assert_eq!(slots.iter().filter(|s| s.kind == "lunch").count(), 24);
    assert_eq!(slots.iter().filter(|s| s.kind == "dinner").count(), 24);
    assert_eq!(slots.last().unwrap().date, d(2025, 1, 29));
    assert!(slots.iter().enumerate().all(|(i, s)| s.index as usize == i + 1));
}

#[test]
fn block_rotation_keeps_each_kind_for_a_block() {
    let pattern = ShiftPattern::block(["preparation", "sauce", "garnish"], 1, 5);
    let slots = schedule(d(2025, 3, 3), 16, &pattern).unwrap();
    let kinds: Vec<&str> = slots.iter().map(|s| s.kind.as_str()).collect();
    assert!(kinds[0..5].iter().all(|k| *k == "preparation"));
    assert!(kinds[5..10].iter().all(|k| *k == "sauce"));
    assert!(kinds[10..15].iter().all(|k| *k == "garnish"));
    assert_eq!(kinds[15], "preparation");
    assert_eq!(slots[15].date, d(2025, 3, 18));
}

#[test]
fn single_slot_per_day_advances_every_slot() {
    let pattern = ShiftPattern::alternating(["dinner"], 1);
    let slots = schedule(d(2024, 12, 30), 3, &pattern).unwrap();
    assert_eq!(slots[2].date, d(2025, 1, 1));
}

#[test]
fn zero_count_gives_empty_schedule() {
    let pattern = ShiftPattern::alternating(["lunch", "dinner"], 2);
    assert!(schedule(d(2025, 1, 6), 0, &pattern).unwrap().is_empty());
}

#[test]
fn invalid_patterns_are_configuration_errors() {
    let empty = ShiftPattern::alternating(Vec::<String>::new(), 2);
    assert!(matches!(
        schedule(d(2025, 1, 6), 4, &empty),
        Err(LogbookError::Configuration(_))
    ));

    let no_slots = ShiftPattern::alternating(["lunch"], 0);
    assert!(matches!(
        schedule(d(2025, 1, 6), 4, &no_slots),
        Err(LogbookError::Configuration(_))
    ));

    let zero_block = ShiftPattern::block(["lunch"], 1, 0);
    assert!(matches!(
        schedule(d(2025, 1, 6), 4, &zero_block),
        Err(LogbookError::Configuration(_))
    ));
}

#[test]
fn slots_dataframe_has_typed_columns() {
    let pattern = ShiftPattern::alternating(["lunch", "dinner"], 2);
    let slots = schedule(d(2024, 1, 1), 4, &pattern).unwrap();
    let df = slots_to_dataframe(&slots).unwrap();
    assert_eq!(df.height(), 4);
    assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
    let kinds: Vec<Option<&str>> = df.column("kind").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(kinds, vec![Some("lunch"), Some("dinner"), Some("lunch"), Some("dinner")]);
}
