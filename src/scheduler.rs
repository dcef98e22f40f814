use crate::error::{LogbookError, LogbookResult};
use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Maps a 0-based slot position to a shift kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RotationRule {
    /// `kinds[i % len]`, e.g. lunch/dinner on the same day.
    #[default]
    Alternate,
    /// `kinds[(i / block_size) % len]`, e.g. five days on each station.
    Block { block_size: u32 },
}

impl RotationRule {
    fn kind_position(&self, slot: u32, kinds: usize) -> usize {
        let step = match self {
            RotationRule::Alternate => slot,
            RotationRule::Block { block_size } => slot / block_size,
        };
        step as usize % kinds
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPattern {
    pub kinds: Vec<String>,
    pub slots_per_day: u32,
    pub rotation: RotationRule,
}

impl ShiftPattern {
    pub fn alternating<I, S>(kinds: I, slots_per_day: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            slots_per_day,
            rotation: RotationRule::Alternate,
        }
    }

    pub fn block<I, S>(kinds: I, slots_per_day: u32, block_size: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            slots_per_day,
            rotation: RotationRule::Block { block_size },
        }
    }

    pub fn validate(&self) -> LogbookResult<()> {
        if self.kinds.is_empty() {
            return Err(LogbookError::config("rotation requires at least one shift kind"));
        }
        if self.kinds.iter().any(|kind| kind.trim().is_empty()) {
            return Err(LogbookError::config("shift kind names must not be blank"));
        }
        if self.slots_per_day == 0 {
            return Err(LogbookError::config("slots_per_day must be at least 1"));
        }
        if let RotationRule::Block { block_size: 0 } = self.rotation {
            return Err(LogbookError::config("block rotation requires block_size >= 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftSlot {
    /// 1-based position in the logbook.
    pub index: u32,
    pub date: NaiveDate,
    pub kind: String,
}

impl ShiftSlot {
    pub fn new(index: u32, date: NaiveDate, kind: impl Into<String>) -> Self {
        Self {
            index,
            date,
            kind: kind.into(),
        }
    }
}

/// Lays out `count` slots from `start_date`. Pure: identical inputs give identical output.
pub fn schedule(
    start_date: NaiveDate,
    count: u32,
    pattern: &ShiftPattern,
) -> LogbookResult<Vec<ShiftSlot>> {
    pattern.validate()?;
    let mut slots = Vec::with_capacity(count as usize);
    for i in 0..count {
        let day_offset = i64::from(i / pattern.slots_per_day);
        let date = start_date
            .checked_add_signed(Duration::days(day_offset))
            .ok_or_else(|| LogbookError::config(format!("slot {} falls outside the calendar", i + 1)))?;
        let kind = &pattern.kinds[pattern.rotation.kind_position(i, pattern.kinds.len())];
        slots.push(ShiftSlot::new(i + 1, date, kind.clone()));
    }
    Ok(slots)
}

pub fn slots_to_dataframe(slots: &[ShiftSlot]) -> PolarsResult<DataFrame> {
    let index: Vec<i32> = slots.iter().map(|slot| slot.index as i32).collect();
    let dates: Vec<i32> = slots.iter().map(|slot| date_to_i32(slot.date)).collect();
    let kinds: Vec<&str> = slots.iter().map(|slot| slot.kind.as_str()).collect();

    let columns = vec![
        Series::new(PlSmallStr::from_static("index"), index).into_column(),
        Series::new(PlSmallStr::from_static("date"), dates)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("kind"), kinds).into_column(),
    ];
    DataFrame::new(columns)
}

pub(crate) fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}
