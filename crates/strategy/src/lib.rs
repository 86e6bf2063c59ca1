pub mod ma_crossover;
pub mod planner;
pub mod sizing;

pub use ma_crossover::{BracketRules, MaParams};
pub use planner::{Advisor, MaCrossoverPlanner, PlannerConfig};
