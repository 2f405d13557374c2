use itertools::Itertools;
use log::{debug, info, trace};
use std::time::{Duration, Instant};

use crate::catalog::{self, Candidate, PreparedActivity};
use crate::data::{Activity, ActivityIndex, MAX_PREFERENCE, Schedule, Score, SlotLabel};
use crate::error::{MalformedInput, SolveError};
use crate::grid::SlotGrid;
use crate::topk::TopK;

pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Nodes between two clock reads when a time limit is set.
const TIME_CHECK_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Explore the whole tree and keep the K best schedules.
    #[default]
    Exhaustive,
    /// Stop at the first complete schedule.
    FirstFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CandidateOrder {
    /// Occurrences are tried in catalog order.
    #[default]
    Given,
    /// Highest grid score first.
    PreferenceFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchLimits {
    pub node_limit: Option<u64>,
    pub time_limit: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub max_results: usize,
    pub mode: SearchMode,
    pub candidate_order: CandidateOrder,
    pub limits: SearchLimits,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            mode: SearchMode::default(),
            candidate_order: CandidateOrder::default(),
            limits: SearchLimits::default(),
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exhausted,
    FirstFit,
    NodeLimit,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub pruned: u64,
    pub conflicts: u64,
    pub solutions: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveResult {
    /// Best first.
    pub schedules: Vec<Schedule>,
    pub stats: SearchStats,
    pub termination: Termination,
}

/// Finds the best conflict-free schedules for `activities` under `grid`.
///
/// Occurrences on fully unavailable slots are filtered out first; if that leaves
/// an activity with nothing to choose, the call fails before any search with the
/// identifiers of every such activity. Otherwise a branch-and-bound search over
/// the activities (most constrained first) keeps the `max_results` highest
/// scoring complete schedules.
pub fn solve(
    grid: &SlotGrid,
    activities: &[Activity],
    config: &SolverConfig,
) -> Result<SolveResult, SolveError> {
    let start_time = Instant::now();
    if config.max_results == 0 {
        return Err(MalformedInput::ZeroResults.into());
    }
    info!(
        "Solving timetable with {} activities and {} occurrences over {} days, keeping the best {}...",
        activities.len(),
        activities.iter().map(|a| a.occurrences.len()).sum::<usize>(),
        grid.days().count(),
        config.max_results
    );

    let mut order = catalog::filter_feasible(grid, activities)?;
    catalog::order_by_constrainedness(&mut order);
    if config.candidate_order == CandidateOrder::PreferenceFirst {
        catalog::order_candidates_by_preference(&mut order);
    }
    debug!(
        "Placement order: {}",
        order
            .iter()
            .map(|a| format!("{} ({})", a.identifier, a.candidates.len()))
            .join(", ")
    );

    Search::new(grid, config, order, start_time).run()
}

enum Flow {
    Continue,
    Stop(Termination),
}

/// State of one solve invocation. Nothing here outlives the call.
struct Search<'a> {
    grid: &'a SlotGrid,
    config: &'a SolverConfig,
    order: Vec<PreparedActivity>,
    /// `remaining_slots[i]` sums the longest candidate of every activity in `order[i..]`.
    remaining_slots: Vec<Score>,
    buffer: Schedule,
    results: TopK<Schedule>,
    stats: SearchStats,
    started: Instant,
}

impl<'a> Search<'a> {
    fn new(
        grid: &'a SlotGrid,
        config: &'a SolverConfig,
        order: Vec<PreparedActivity>,
        started: Instant,
    ) -> Self {
        let mut remaining_slots = vec![0; order.len() + 1];
        for (i, activity) in order.iter().enumerate().rev() {
            remaining_slots[i] = remaining_slots[i + 1] + activity.max_slots() as Score;
        }
        Self {
            grid,
            config,
            order,
            remaining_slots,
            buffer: Schedule::empty(grid.days()),
            results: TopK::new(config.max_results),
            stats: SearchStats::default(),
            started,
        }
    }

    fn run(mut self) -> Result<SolveResult, SolveError> {
        let termination = match self.place(0, 0) {
            Flow::Continue => Termination::Exhausted,
            Flow::Stop(reason) => reason,
        };
        self.stats.elapsed = self.started.elapsed();
        info!(
            "Search stopped ({:?}) in {:.2?}: {} nodes, {} pruned, {} conflicts, {} complete schedules seen, {} kept",
            termination,
            self.stats.elapsed,
            self.stats.nodes,
            self.stats.pruned,
            self.stats.conflicts,
            self.stats.solutions,
            self.results.len()
        );

        if self.results.is_empty() {
            return Err(match termination {
                Termination::NodeLimit | Termination::TimeLimit => {
                    SolveError::SearchBudgetExhausted {
                        nodes: self.stats.nodes,
                    }
                }
                Termination::Exhausted | Termination::FirstFit => SolveError::NoFeasibleSchedule,
            });
        }

        let schedules = self
            .results
            .into_ranked()
            .into_iter()
            .map(|(_, schedule)| schedule)
            .collect();
        Ok(SolveResult {
            schedules,
            stats: self.stats,
            termination,
        })
    }

    /// Places `order[index..]` on top of the current buffer, which already scores `score`.
    fn place(&mut self, index: usize, score: Score) -> Flow {
        self.stats.nodes += 1;
        if let Some(reason) = self.check_limits() {
            return Flow::Stop(reason);
        }

        if index == self.order.len() {
            return self.record(score);
        }

        if let Some(threshold) = self.results.threshold() {
            if self.upper_bound(index, score) <= threshold {
                self.stats.pruned += 1;
                return Flow::Continue;
            }
        }

        let activity = self.order[index].index;
        for position in 0..self.order[index].candidates.len() {
            let candidate = self.order[index].candidates[position];
            if !self.allocate(activity, candidate) {
                self.stats.conflicts += 1;
                continue;
            }
            let flow = self.place(index + 1, score + candidate.score);
            // undo before looking at the outcome so every exit leaves the buffer clean
            self.deallocate(candidate);
            if let Flow::Stop(reason) = flow {
                return Flow::Stop(reason);
            }
        }
        Flow::Continue
    }

    /// Best score reachable if every remaining activity landed on max preference.
    fn upper_bound(&self, index: usize, score: Score) -> Score {
        score + self.remaining_slots[index] * Score::from(MAX_PREFERENCE)
    }

    fn record(&mut self, score: Score) -> Flow {
        self.stats.solutions += 1;
        debug_assert_eq!(self.buffer.recompute_score(self.grid), score);

        let beats_threshold = self
            .results
            .threshold()
            .is_none_or(|threshold| score > threshold);
        if beats_threshold {
            let mut snapshot = self.buffer.clone();
            snapshot.score = score;
            self.results.offer(score, snapshot);
            trace!("Kept complete schedule scoring {}", score);
        }

        match self.config.mode {
            SearchMode::Exhaustive => Flow::Continue,
            SearchMode::FirstFit => Flow::Stop(Termination::FirstFit),
        }
    }

    /// Occupies the candidate's slots. Leaves the buffer untouched and returns
    /// `false` if any of them is taken.
    fn allocate(&mut self, activity: ActivityIndex, candidate: Candidate) -> bool {
        let Some(labels) = self.buffer.days.get_mut(&candidate.day) else {
            return false;
        };
        let slots = &mut labels[candidate.slots()];
        if slots.iter().any(|label| !label.is_empty()) {
            return false;
        }
        slots.fill(SlotLabel::Occupied {
            activity,
            occurrence: candidate.occurrence,
        });
        true
    }

    fn deallocate(&mut self, candidate: Candidate) {
        if let Some(labels) = self.buffer.days.get_mut(&candidate.day) {
            labels[candidate.slots()].fill(SlotLabel::Empty);
        }
    }

    fn check_limits(&self) -> Option<Termination> {
        let limits = &self.config.limits;
        if limits
            .node_limit
            .is_some_and(|limit| self.stats.nodes > limit)
        {
            return Some(Termination::NodeLimit);
        }
        if let Some(limit) = limits.time_limit {
            if self.stats.nodes % TIME_CHECK_INTERVAL == 0 && self.started.elapsed() > limit {
                return Some(Termination::TimeLimit);
            }
        }
        None
    }
}
