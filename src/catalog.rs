use log::{debug, trace};
use std::ops::Range;

use crate::data::{Activity, ActivityIndex, Day, OccurrenceIndex, SLOTS_PER_DAY, Score};
use crate::error::{MalformedInput, SolveError};
use crate::grid::SlotGrid;

/// An occurrence that survived filtering, with its slot range and grid score resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub occurrence: OccurrenceIndex,
    pub day: Day,
    pub start_slot: usize,
    pub end_slot: usize,
    /// Grid preference summed over the covered slots.
    pub score: Score,
    pub popularity: u32,
}

impl Candidate {
    pub fn slots(&self) -> Range<usize> {
        self.start_slot..self.end_slot
    }

    pub fn len(&self) -> usize {
        self.end_slot - self.start_slot
    }
}

/// An activity together with its feasible candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedActivity {
    /// Position in the catalog as submitted.
    pub index: ActivityIndex,
    pub identifier: String,
    pub candidates: Vec<Candidate>,
}

impl PreparedActivity {
    /// Longest candidate, in slots. Used for the optimistic bound.
    pub fn max_slots(&self) -> usize {
        self.candidates.iter().map(Candidate::len).max().unwrap_or(0)
    }
}

/// Checks every occurrence against the grid and the day length.
///
/// Nothing is clamped: a single bad occurrence rejects the whole catalog.
pub fn validate(grid: &SlotGrid, activities: &[Activity]) -> Result<(), MalformedInput> {
    if activities.is_empty() {
        return Err(MalformedInput::EmptyCatalog);
    }
    for activity in activities {
        for occurrence in &activity.occurrences {
            if !grid.contains_day(occurrence.day) {
                return Err(MalformedInput::MissingDay {
                    activity: activity.identifier(),
                    day: occurrence.day,
                });
            }
            let times_ok = occurrence.start_time.is_finite()
                && occurrence.duration.is_finite()
                && occurrence.start_time >= 0.0
                && occurrence.duration > 0.0;
            if !times_ok {
                return Err(MalformedInput::InvalidTime {
                    activity: activity.identifier(),
                    occurrence: occurrence.identity.clone(),
                    start: occurrence.start_time,
                    duration: occurrence.duration,
                });
            }
            let (start_slot, end_slot) = occurrence.slot_bounds();
            if start_slot < 0 || end_slot > SLOTS_PER_DAY as i64 {
                return Err(MalformedInput::SlotOutOfRange {
                    activity: activity.identifier(),
                    occurrence: occurrence.identity.clone(),
                    start_slot,
                    end_slot,
                    slots: SLOTS_PER_DAY,
                });
            }
        }
    }
    Ok(())
}

/// Validates the catalog and drops every occurrence whose slots are all unavailable.
///
/// Partially unavailable occurrences are kept; their unavailable slots score zero.
/// Fails with the identifiers of every activity left without a candidate.
pub fn filter_feasible(
    grid: &SlotGrid,
    activities: &[Activity],
) -> Result<Vec<PreparedActivity>, SolveError> {
    validate(grid, activities)?;

    let mut prepared = Vec::with_capacity(activities.len());
    let mut invalid = Vec::new();

    for (index, activity) in activities.iter().enumerate() {
        let candidates: Vec<Candidate> = activity
            .occurrences
            .iter()
            .enumerate()
            .filter_map(|(occurrence, occ)| {
                // bounds were checked by validate; a sub-slot occurrence yields an empty range
                let (start, end) = occ.slot_bounds();
                let slots = start as usize..end as usize;
                if !grid.any_available(occ.day, slots.clone()) {
                    trace!(
                        "Dropping {} {} on {}: no available slot",
                        activity.identifier(),
                        occ.identity,
                        occ.day
                    );
                    return None;
                }
                Some(Candidate {
                    occurrence,
                    day: occ.day,
                    start_slot: slots.start,
                    end_slot: slots.end,
                    score: grid.range_score(occ.day, slots),
                    popularity: occ.popularity,
                })
            })
            .collect();

        if candidates.is_empty() {
            invalid.push(activity.identifier());
        }
        prepared.push(PreparedActivity {
            index,
            identifier: activity.identifier(),
            candidates,
        });
    }

    if !invalid.is_empty() {
        return Err(SolveError::InvalidActivities(invalid));
    }

    debug!(
        "{} of {} occurrences survived filtering",
        prepared.iter().map(|a| a.candidates.len()).sum::<usize>(),
        activities.iter().map(|a| a.occurrences.len()).sum::<usize>()
    );
    Ok(prepared)
}

/// Most constrained first. The sort is stable, so ties keep catalog order.
pub fn order_by_constrainedness(activities: &mut [PreparedActivity]) {
    activities.sort_by_key(|activity| activity.candidates.len());
}

/// Reorders each activity's candidates by descending grid score, then lower popularity.
pub fn order_candidates_by_preference(activities: &mut [PreparedActivity]) {
    for activity in activities {
        activity.candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.popularity.cmp(&b.popularity))
        });
    }
}
