pub mod grid;
pub mod store;
pub mod occupancy;
pub mod history;
pub mod oracle;
pub mod prompts;
pub mod gemini;
pub mod classifier;
pub mod validator;
pub mod recommendation;
pub mod day_planner;
pub mod workload;

pub use store::{ScheduleStore, SupabaseScheduleStore};
pub use occupancy::OccupancyIndex;
pub use history::HistoryAnalyzer;
pub use oracle::{OracleError, PlanningOracle};
pub use gemini::GeminiOracle;
pub use classifier::ReasonClassifier;
pub use recommendation::RecommendationEngine;
pub use day_planner::DayPlanner;
pub use workload::WorkloadReporter;
