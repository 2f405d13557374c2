use crate::data::{Day, Preference};

/// Input that violates a structural invariant of the grid or catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedInput {
    #[error("activity {activity} meets on {day}, which the preference grid does not cover")]
    MissingDay { activity: String, day: Day },
    #[error("grid for {day} has {len} slots, expected {expected}")]
    GridLength {
        day: Day,
        len: usize,
        expected: usize,
    },
    #[error("grid has no entry for {day}")]
    UnknownGridDay { day: Day },
    #[error("slots {start}..{end} on {day} fall outside 0..{slots}")]
    GridRange {
        day: Day,
        start: usize,
        end: usize,
        slots: usize,
    },
    #[error("grid value {value} at {day} slot {slot} is outside 0..={max}")]
    PreferenceOutOfRange {
        day: Day,
        slot: usize,
        value: Preference,
        max: Preference,
    },
    #[error("occurrence {occurrence} of {activity} has invalid time (start {start}, duration {duration})")]
    InvalidTime {
        activity: String,
        occurrence: String,
        start: f64,
        duration: f64,
    },
    #[error("occurrence {occurrence} of {activity} covers slots {start_slot}..{end_slot}, outside 0..{slots}")]
    SlotOutOfRange {
        activity: String,
        occurrence: String,
        start_slot: i64,
        end_slot: i64,
        slots: usize,
    },
    #[error("no activities to schedule")]
    EmptyCatalog,
    #[error("result capacity must be at least 1")]
    ZeroResults,
}

/// Failure of a single solve invocation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("activities with no available occurrence: {}", .0.join(", "))]
    InvalidActivities(Vec<String>),
    #[error("no conflict-free schedule exists for the given activities")]
    NoFeasibleSchedule,
    #[error("search budget exhausted after {nodes} nodes without a complete schedule")]
    SearchBudgetExhausted { nodes: u64 },
    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInput),
}
