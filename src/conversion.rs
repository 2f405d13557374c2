//! Translation between the web payloads and the solver's grid and catalog.
//!
//! Upstream timetable rows arrive one per occurrence, keyed by course code and
//! class type (`LEC1`, `TUT2`, ...). UI preferences arrive as hour cells keyed
//! `"MON-8"`, using the 12-hour labels shown in the grid.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::data::{
    Activity, BAD, Day, IDEAL, OKAY, Occurrence, Preference, Schedule, Score, SlotLabel,
    UNAVAILABLE,
};
use crate::error::MalformedInput;
use crate::grid::SlotGrid;

/// First hour row of the rendered recommendation grid.
pub const DISPLAY_FIRST_HOUR: usize = 8;
/// End (exclusive) of the rendered recommendation grid.
pub const DISPLAY_END_HOUR: usize = 22;

/// Hour labels below this are afternoon hours on the 12-hour UI grid.
const AFTERNOON_WRAP: usize = 8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("unknown day {0:?}")]
    UnknownDay(String),
    #[error("invalid start time {0:?}, expected HH:MM")]
    InvalidClock(String),
    #[error("invalid duration {0:?}, expected minutes")]
    InvalidDuration(String),
    #[error("invalid preference cell {0:?}, expected DAY-HOUR")]
    InvalidCellKey(String),
    #[error("rank {0} is not one of 1, 2, 3")]
    UnknownRank(u8),
    #[error(transparent)]
    Grid(#[from] MalformedInput),
}

/// Duration as sent upstream: minutes, either as text or a number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Minutes {
    Number(f64),
    Text(String),
}

/// One occurrence row as scraped from the university timetable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawActivity {
    pub course_code: String,
    pub class_type: String,
    pub activity_code: String,
    pub day: String,
    pub start: String,
    pub duration: Minutes,
    #[serde(default)]
    pub availability: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellPreference {
    Default,
    Preferred,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PreferenceCell {
    pub preference: CellPreference,
    pub rank: u8,
}

/// One course entry in a rendered grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GridCell {
    pub course_code: String,
    pub class_type: String,
    pub activity_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub name: String,
    pub score: Score,
    pub conflicts: u32,
    /// `grid[hour_row][day]`, rows from `DISPLAY_FIRST_HOUR`.
    pub grid: Vec<Vec<Vec<GridCell>>>,
}

/// `"13:30"` to `13.5`.
pub fn parse_clock(value: &str) -> Result<f64, ConversionError> {
    let invalid = || ConversionError::InvalidClock(value.to_string());
    let (hours, minutes) = value.trim().split_once(':').ok_or_else(invalid)?;
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 24 || minutes >= 60 {
        return Err(invalid());
    }
    Ok(f64::from(hours) + f64::from(minutes) / 60.0)
}

/// Minutes to fractional hours.
pub fn parse_duration(value: &Minutes) -> Result<f64, ConversionError> {
    let minutes = match value {
        Minutes::Number(minutes) => *minutes,
        Minutes::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ConversionError::InvalidDuration(text.clone()))?,
    };
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(ConversionError::InvalidDuration(minutes.to_string()));
    }
    Ok(minutes / 60.0)
}

/// `TUT2` to `TUT`.
pub fn class_category(class_type: &str) -> &str {
    let trimmed = class_type.trim_end_matches(|c: char| c.is_ascii_digit());
    if trimmed.is_empty() { class_type } else { trimmed }
}

/// Groups occurrence rows into activities by course and class type, in first-seen order.
pub fn activities_from_raw(rows: &[RawActivity]) -> Result<Vec<Activity>, ConversionError> {
    rows.iter()
        .enumerate()
        .into_group_map_by(|&(_, row)| (row.course_code.as_str(), row.class_type.as_str()))
        .into_iter()
        .sorted_by_key(|(_, members)| members[0].0)
        .map(|((course, class_type), members)| -> Result<Activity, ConversionError> {
            let occurrences = members
                .into_iter()
                .map(|(_, row)| -> Result<Occurrence, ConversionError> {
                    let day =
                        Day::parse(&row.day).ok_or_else(|| ConversionError::UnknownDay(row.day.clone()))?;
                    Ok(Occurrence::new(
                        row.activity_code.clone(),
                        day,
                        parse_clock(&row.start)?,
                        parse_duration(&row.duration)?,
                        row.availability.unwrap_or(0),
                    ))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Activity::new(
                course,
                class_category(class_type),
                class_type,
                occurrences,
            ))
        })
        .collect()
}

fn cell_level(cell: &PreferenceCell) -> Result<Preference, ConversionError> {
    match cell.preference {
        CellPreference::Unavailable => Ok(UNAVAILABLE),
        CellPreference::Default => Ok(BAD),
        CellPreference::Preferred => match cell.rank {
            1 => Ok(IDEAL),
            2 => Ok(OKAY),
            3 => Ok(BAD),
            other => Err(ConversionError::UnknownRank(other)),
        },
    }
}

/// `"MON-8"` to `(Monday, 8)`, `"WED-2"` to `(Wednesday, 14)`.
fn parse_cell_key(key: &str) -> Result<(Day, usize), ConversionError> {
    let invalid = || ConversionError::InvalidCellKey(key.to_string());
    let (day, hour) = key.split_once('-').ok_or_else(invalid)?;
    let day = Day::parse(day).ok_or_else(invalid)?;
    let hour: usize = hour.trim().parse().map_err(|_| invalid())?;
    let hour = match hour {
        1..AFTERNOON_WRAP => hour + 12,
        h if (AFTERNOON_WRAP..24).contains(&h) => h,
        _ => return Err(invalid()),
    };
    Ok((day, hour))
}

/// Builds the Monday to Friday grid from UI cells.
///
/// Cells the user never touched are available at the lowest positive level.
pub fn grid_from_preferences(
    cells: &HashMap<String, PreferenceCell>,
) -> Result<SlotGrid, ConversionError> {
    let mut grid = SlotGrid::filled(Day::ALL, BAD)?;
    for (key, cell) in cells.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        let (day, hour) = parse_cell_key(key)?;
        let level = cell_level(cell)?;
        grid.set(day, hour * 2..hour * 2 + 2, level)?;
    }
    Ok(grid)
}

fn grid_cell(label: &SlotLabel, catalog: &[Activity]) -> Option<GridCell> {
    let SlotLabel::Occupied {
        activity,
        occurrence,
    } = *label
    else {
        return None;
    };
    let activity = catalog.get(activity)?;
    Some(GridCell {
        course_code: activity.course.clone(),
        class_type: activity.subcategory.clone(),
        activity_code: activity.occurrences.get(occurrence)?.identity.clone(),
    })
}

fn render_grid(schedule: &Schedule, catalog: &[Activity]) -> Vec<Vec<Vec<GridCell>>> {
    (DISPLAY_FIRST_HOUR..DISPLAY_END_HOUR)
        .map(|hour| {
            Day::ALL
                .into_iter()
                .map(|day| match schedule.slots(day) {
                    Some(labels) => labels[hour * 2..hour * 2 + 2]
                        .iter()
                        .filter_map(|label| grid_cell(label, catalog))
                        .unique()
                        .collect(),
                    None => Vec::new(),
                })
                .collect()
        })
        .collect()
}

/// Ranked schedules as UI recommendations, `rec_1` being the best.
pub fn recommendations(schedules: &[Schedule], catalog: &[Activity]) -> Vec<Recommendation> {
    schedules
        .iter()
        .enumerate()
        .map(|(index, schedule)| Recommendation {
            id: format!("rec_{}", index + 1),
            name: format!("Recommendation {}", index + 1),
            score: schedule.score,
            conflicts: 0,
            grid: render_grid(schedule, catalog),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(course: &str, class_type: &str, code: &str, day: &str, start: &str, minutes: &str) -> RawActivity {
        RawActivity {
            course_code: course.into(),
            class_type: class_type.into(),
            activity_code: code.into(),
            day: day.into(),
            start: start.into(),
            duration: Minutes::Text(minutes.into()),
            availability: None,
        }
    }

    #[test]
    fn parses_clock_and_duration() {
        assert_eq!(parse_clock("13:30"), Ok(13.5));
        assert_eq!(parse_clock("08:00"), Ok(8.0));
        assert!(parse_clock("8am").is_err());
        assert!(parse_clock("10:75").is_err());
        assert_eq!(parse_duration(&Minutes::Text("90".into())), Ok(1.5));
        assert_eq!(parse_duration(&Minutes::Number(50.0)), Ok(50.0 / 60.0));
        assert!(parse_duration(&Minutes::Text("0".into())).is_err());
    }

    #[test]
    fn strips_group_number_from_class_type() {
        assert_eq!(class_category("TUT2"), "TUT");
        assert_eq!(class_category("LEC12"), "LEC");
        assert_eq!(class_category("PRA"), "PRA");
        assert_eq!(class_category("12"), "12");
    }

    #[test]
    fn groups_rows_by_course_and_class_type() {
        let rows = vec![
            row("MATH1051", "LEC1", "01", "Mon", "09:00", "60"),
            row("MATH1051", "TUT1", "01", "Tue", "14:00", "50"),
            row("MATH1051", "LEC1", "02", "Wed", "09:00", "60"),
            row("CSSE1001", "PRA1", "01", "Fri", "16:30", "120"),
        ];
        let activities = activities_from_raw(&rows).unwrap();

        let ids: Vec<_> = activities.iter().map(Activity::identifier).collect();
        assert_eq!(ids, vec!["MATH1051 LEC1", "MATH1051 TUT1", "CSSE1001 PRA1"]);
        assert_eq!(activities[0].category, "LEC");
        assert_eq!(activities[0].occurrences.len(), 2);
        assert_eq!(activities[0].occurrences[1].day, Day::Wednesday);
        assert_eq!(activities[2].occurrences[0].start_time, 16.5);
        assert_eq!(activities[2].occurrences[0].duration, 2.0);
    }

    #[test]
    fn rejects_unknown_day() {
        let rows = vec![row("MATH1051", "LEC1", "01", "Sun", "09:00", "60")];
        assert_eq!(
            activities_from_raw(&rows),
            Err(ConversionError::UnknownDay("Sun".into()))
        );
    }

    #[test]
    fn builds_grid_from_cells() {
        let cells: HashMap<String, PreferenceCell> = serde_json::from_value(serde_json::json!({
            "MON-8": { "preference": "preferred", "rank": 1 },
            "MON-9": { "preference": "preferred", "rank": 2 },
            "TUE-2": { "preference": "unavailable", "rank": 5 },
            "FRI-12": { "preference": "default", "rank": 3 }
        }))
        .unwrap();
        let grid = grid_from_preferences(&cells).unwrap();

        assert_eq!(grid.preference(Day::Monday, 16), Some(IDEAL));
        assert_eq!(grid.preference(Day::Monday, 17), Some(IDEAL));
        assert_eq!(grid.preference(Day::Monday, 18), Some(OKAY));
        assert_eq!(grid.preference(Day::Tuesday, 28), Some(UNAVAILABLE));
        assert_eq!(grid.preference(Day::Tuesday, 29), Some(UNAVAILABLE));
        assert_eq!(grid.preference(Day::Friday, 24), Some(BAD));
        assert_eq!(grid.preference(Day::Thursday, 2), Some(BAD));
    }

    #[test]
    fn last_hour_cell_fills_the_end_of_the_day() {
        let cells = HashMap::from([(
            "WED-23".to_string(),
            PreferenceCell {
                preference: CellPreference::Preferred,
                rank: 1,
            },
        )]);
        let grid = grid_from_preferences(&cells).unwrap();

        assert_eq!(grid.preference(Day::Wednesday, 45), Some(BAD));
        assert_eq!(grid.preference(Day::Wednesday, 46), Some(IDEAL));
        assert_eq!(grid.preference(Day::Wednesday, 47), Some(IDEAL));
        assert_eq!(
            parse_cell_key("WED-24"),
            Err(ConversionError::InvalidCellKey("WED-24".into()))
        );
    }

    #[test]
    fn rejects_bad_cells() {
        let bad_rank = HashMap::from([(
            "MON-8".to_string(),
            PreferenceCell {
                preference: CellPreference::Preferred,
                rank: 4,
            },
        )]);
        assert_eq!(
            grid_from_preferences(&bad_rank),
            Err(ConversionError::UnknownRank(4))
        );

        let bad_key = HashMap::from([(
            "MON8".to_string(),
            PreferenceCell {
                preference: CellPreference::Preferred,
                rank: 1,
            },
        )]);
        assert!(matches!(
            grid_from_preferences(&bad_key),
            Err(ConversionError::InvalidCellKey(_))
        ));
    }

    #[test]
    fn renders_hour_rows_per_day() {
        let catalog = vec![Activity::new(
            "MATH1051",
            "LEC",
            "LEC1",
            vec![Occurrence::new("01", Day::Tuesday, 9.5, 1.0, 0)],
        )];
        let mut schedule = Schedule::empty(Day::ALL);
        schedule.score = 6;
        if let Some(tuesday) = schedule.days.get_mut(&Day::Tuesday) {
            tuesday[19..21].fill(SlotLabel::Occupied {
                activity: 0,
                occurrence: 0,
            });
        }

        let recs = recommendations(&[schedule], &catalog);
        assert_eq!(recs[0].id, "rec_1");
        assert_eq!(recs[0].name, "Recommendation 1");
        assert_eq!(recs[0].score, 6);

        let grid = &recs[0].grid;
        assert_eq!(grid.len(), DISPLAY_END_HOUR - DISPLAY_FIRST_HOUR);
        assert_eq!(grid[1][1].len(), 1);
        assert_eq!(grid[1][1][0].activity_code, "01");
        assert_eq!(grid[2][1].len(), 1);
        assert!(grid[0][1].is_empty());
        assert!(grid[1][0].is_empty());
    }
}
