mod engine;
mod error;
mod inflation;
mod solver;
mod types;

pub use engine::{monthly_rate, project, terminal_value};
pub use error::{InputError, InputResult, MAX_YEARS};
pub use inflation::adjust_for_inflation;
pub use solver::{solve_required_contribution, solve_with_config};
pub use types::{
    GoalOutcome, GoalParams, GoalSolveIteration, GoalSolveResult, InfeasibleReason,
    InflationParams, InflationResult, MAX_SOLVER_ITERATIONS, MONTHS_PER_YEAR, ProjectionParams, ProjectionResult,
    SolverConfig,
};
