use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::solver::{DEFAULT_MAX_RESULTS, SearchLimits, SearchMode, SolverConfig};

/// Timetable recommendation service.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about)]
pub struct Config {
    /// Address the HTTP server binds to
    #[arg(long, env = "TIMETABLE_ADDR", default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Number of ranked schedules returned per request
    #[arg(long, env = "TIMETABLE_MAX_RESULTS", default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: usize,

    /// Wall clock budget for one search, in milliseconds
    #[arg(long, env = "TIMETABLE_TIME_LIMIT_MS")]
    pub time_limit_ms: Option<u64>,

    /// Node budget for one search
    #[arg(long, env = "TIMETABLE_NODE_LIMIT")]
    pub node_limit: Option<u64>,

    /// Return the first complete schedule instead of the best ones
    #[arg(long, env = "TIMETABLE_FIRST_FIT")]
    pub first_fit: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "TIMETABLE_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            max_results: self.max_results,
            mode: if self.first_fit {
                SearchMode::FirstFit
            } else {
                SearchMode::Exhaustive
            },
            limits: SearchLimits {
                node_limit: self.node_limit,
                time_limit: self.time_limit_ms.map(Duration::from_millis),
            },
            ..SolverConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_build_solver_config() {
        let config = Config::try_parse_from([
            "timetable_solver",
            "--addr",
            "0.0.0.0:9000",
            "--max-results",
            "3",
            "--time-limit-ms",
            "250",
            "--first-fit",
        ])
        .unwrap();

        assert_eq!(config.addr.port(), 9000);
        let solver = config.solver_config();
        assert_eq!(solver.max_results, 3);
        assert_eq!(solver.mode, SearchMode::FirstFit);
        assert_eq!(solver.limits.time_limit, Some(Duration::from_millis(250)));
    }
}
