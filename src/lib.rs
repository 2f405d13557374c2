//! Timetable recommendation: finds the best conflict-free ways to attend a set of
//! course activities under a weekly half-hour preference grid.

pub mod catalog;
pub mod config;
pub mod conversion;
pub mod data;
pub mod error;
pub mod grid;
pub mod server;
pub mod solver;
pub mod topk;
