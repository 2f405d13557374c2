use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::data::{Day, IDEAL, MAX_PREFERENCE, Preference, SLOTS_PER_DAY, Score, UNAVAILABLE};
use crate::error::MalformedInput;

/// Weekly preference grid: for each day, one preference level per half hour.
///
/// `UNAVAILABLE` marks a slot that may not be used at all; higher values are
/// more preferred, up to `MAX_PREFERENCE`. Every day holds exactly
/// `SLOTS_PER_DAY` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotGrid {
    days: BTreeMap<Day, Vec<Preference>>,
}

impl SlotGrid {
    pub fn new(days: BTreeMap<Day, Vec<Preference>>) -> Result<Self, MalformedInput> {
        for (day, levels) in &days {
            if levels.len() != SLOTS_PER_DAY {
                return Err(MalformedInput::GridLength {
                    day: *day,
                    len: levels.len(),
                    expected: SLOTS_PER_DAY,
                });
            }
            if let Some((slot, value)) = levels
                .iter()
                .enumerate()
                .find(|(_, value)| **value > MAX_PREFERENCE)
            {
                return Err(MalformedInput::PreferenceOutOfRange {
                    day: *day,
                    slot,
                    value: *value,
                    max: MAX_PREFERENCE,
                });
            }
        }
        Ok(Self { days })
    }

    /// Every slot of the given days set to `level`.
    pub fn filled(
        days: impl IntoIterator<Item = Day>,
        level: Preference,
    ) -> Result<Self, MalformedInput> {
        Self::new(
            days.into_iter()
                .map(|day| (day, vec![level; SLOTS_PER_DAY]))
                .collect(),
        )
    }

    /// Monday to Friday, all ideal.
    pub fn always_available() -> Self {
        Self {
            days: Day::ALL
                .into_iter()
                .map(|day| (day, vec![IDEAL; SLOTS_PER_DAY]))
                .collect(),
        }
    }

    /// Overwrites `slots` on `day` with `level`.
    pub fn set(
        &mut self,
        day: Day,
        slots: Range<usize>,
        level: Preference,
    ) -> Result<(), MalformedInput> {
        let Some(levels) = self.days.get_mut(&day) else {
            return Err(MalformedInput::UnknownGridDay { day });
        };
        if level > MAX_PREFERENCE {
            return Err(MalformedInput::PreferenceOutOfRange {
                day,
                slot: slots.start,
                value: level,
                max: MAX_PREFERENCE,
            });
        }
        let (start, end) = (slots.start, slots.end);
        let Some(range) = levels.get_mut(slots) else {
            return Err(MalformedInput::GridRange {
                day,
                start,
                end,
                slots: SLOTS_PER_DAY,
            });
        };
        range.fill(level);
        Ok(())
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        self.days.keys().copied()
    }

    pub fn contains_day(&self, day: Day) -> bool {
        self.days.contains_key(&day)
    }

    pub fn preference(&self, day: Day, slot: usize) -> Option<Preference> {
        self.days.get(&day)?.get(slot).copied()
    }

    /// Sum of preferences over `slots` on `day`. Zero for slots outside the grid.
    pub fn range_score(&self, day: Day, slots: Range<usize>) -> Score {
        self.days
            .get(&day)
            .and_then(|levels| levels.get(slots))
            .map(|levels| levels.iter().copied().map(Score::from).sum())
            .unwrap_or(0)
    }

    /// Whether at least one slot in the range is usable.
    pub fn any_available(&self, day: Day, slots: Range<usize>) -> bool {
        self.days
            .get(&day)
            .and_then(|levels| levels.get(slots))
            .is_some_and(|levels| levels.iter().any(|level| *level > UNAVAILABLE))
    }
}
