use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::grid::SlotGrid;

// Type aliases for clarity
pub type Preference = u8;
pub type Score = u32;
pub type ActivityIndex = usize;
pub type OccurrenceIndex = usize;

/// Half-hour buckets per day, 00:00 to 24:00.
pub const SLOTS_PER_DAY: usize = 48;

pub const UNAVAILABLE: Preference = 0;
pub const BAD: Preference = 1;
pub const OKAY: Preference = 2;
pub const IDEAL: Preference = 3;

/// Highest value a grid slot may hold.
pub const MAX_PREFERENCE: Preference = IDEAL;

/// Teaching days, in week order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Parses the upstream spellings: `Mon`, `MON` or the full name.
    pub fn parse(value: &str) -> Option<Day> {
        let lower = value.trim().to_ascii_lowercase();
        Day::ALL.into_iter().find(|day| {
            let name = day.to_string().to_ascii_lowercase();
            name == lower || name[..3] == lower
        })
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        };
        f.write_str(name)
    }
}

/// One candidate meeting time for an activity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub identity: String,
    pub day: Day,
    /// Fractional hours, e.g. `13.5` for 13:30.
    pub start_time: f64,
    /// Fractional hours.
    pub duration: f64,
    pub popularity: u32,
}

impl Occurrence {
    pub fn new(
        identity: impl Into<String>,
        day: Day,
        start_time: f64,
        duration: f64,
        popularity: u32,
    ) -> Self {
        Self {
            identity: identity.into(),
            day,
            start_time,
            duration,
            popularity,
        }
    }

    /// Raw half-open half-hour bounds, `[floor(start*2), floor((start+duration)*2))`.
    ///
    /// Not range checked; the catalog validates these against the day length.
    pub fn slot_bounds(&self) -> (i64, i64) {
        let start = (self.start_time * 2.0).floor() as i64;
        let end = ((self.start_time + self.duration) * 2.0).floor() as i64;
        (start, end)
    }
}

/// A course requirement that needs exactly one of its occurrences scheduled.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub course: String,
    pub category: String,
    pub subcategory: String,
    pub occurrences: Vec<Occurrence>,
}

impl Activity {
    pub fn new(
        course: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        occurrences: Vec<Occurrence>,
    ) -> Self {
        Self {
            course: course.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            occurrences,
        }
    }

    pub fn identifier(&self) -> String {
        format!("{} {}", self.course, self.subcategory)
    }
}

/// Content of a single half-hour slot in a schedule.
///
/// Indices refer to the activity list as it was handed to the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SlotLabel {
    #[default]
    Empty,
    Occupied {
        activity: ActivityIndex,
        occurrence: OccurrenceIndex,
    },
}

impl SlotLabel {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotLabel::Empty)
    }

    /// Human readable label, e.g. `MATH1051 LEC1 01`.
    pub fn render(&self, catalog: &[Activity]) -> Option<String> {
        match *self {
            SlotLabel::Empty => None,
            SlotLabel::Occupied {
                activity,
                occurrence,
            } => {
                let activity = catalog.get(activity)?;
                let occurrence = activity.occurrences.get(occurrence)?;
                Some(format!("{} {}", activity.identifier(), occurrence.identity))
            }
        }
    }
}

/// A complete, conflict-free assignment together with its preference score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    pub score: Score,
    pub days: BTreeMap<Day, Vec<SlotLabel>>,
}

impl Schedule {
    /// An empty schedule covering the given days.
    pub fn empty(days: impl IntoIterator<Item = Day>) -> Self {
        Self {
            score: 0,
            days: days
                .into_iter()
                .map(|day| (day, vec![SlotLabel::Empty; SLOTS_PER_DAY]))
                .collect(),
        }
    }

    pub fn slots(&self, day: Day) -> Option<&[SlotLabel]> {
        self.days.get(&day).map(Vec::as_slice)
    }

    /// Distinct `(activity, occurrence)` pairs present, sorted.
    pub fn placements(&self) -> Vec<(ActivityIndex, OccurrenceIndex)> {
        let mut placed: Vec<_> = self
            .days
            .values()
            .flatten()
            .filter_map(|label| match *label {
                SlotLabel::Empty => None,
                SlotLabel::Occupied {
                    activity,
                    occurrence,
                } => Some((activity, occurrence)),
            })
            .collect();
        placed.sort_unstable();
        placed.dedup();
        placed
    }

    /// Sum of the grid's preference over every occupied slot.
    pub fn recompute_score(&self, grid: &SlotGrid) -> Score {
        self.days
            .iter()
            .flat_map(|(day, labels)| {
                labels
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| !label.is_empty())
                    .map(move |(slot, _)| grid.preference(*day, slot).unwrap_or(UNAVAILABLE))
            })
            .map(Score::from)
            .sum()
    }
}
