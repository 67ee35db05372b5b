use serde::Serialize;

use super::error::{InputError, InputResult, finite, non_negative, positive_years};

pub const MONTHS_PER_YEAR: u32 = 12;
pub const MAX_SOLVER_ITERATIONS: u32 = 100_000;
// Doubling past this overflows any finite f64 bound.
const MAX_BOUND_DOUBLINGS: u32 = 1_100;

/// Inputs to the compounding projector. Rates are annual decimals (0.09 = 9%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionParams {
    pub initial_capital: f64,
    pub initial_monthly_contribution: f64,
    pub contribution_growth_rate: f64,
    pub annual_return_rate: f64,
    pub years: u32,
}

impl ProjectionParams {
    pub fn new(
        initial_capital: f64,
        initial_monthly_contribution: f64,
        contribution_growth_rate: f64,
        annual_return_rate: f64,
        years: u32,
    ) -> InputResult<Self> {
        Ok(Self {
            initial_capital: non_negative("initial_capital", initial_capital)?,
            initial_monthly_contribution: non_negative(
                "initial_monthly_contribution",
                initial_monthly_contribution,
            )?,
            contribution_growth_rate: non_negative(
                "contribution_growth_rate",
                contribution_growth_rate,
            )?,
            annual_return_rate: non_negative("annual_return_rate", annual_return_rate)?,
            years: positive_years("years", years)?,
        })
    }

    pub fn months(&self) -> usize {
        self.years as usize * MONTHS_PER_YEAR as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    pub terminal_value: f64,
    pub total_contributed: f64,
    /// Balance at the end of each month, in order.
    pub series: Vec<f64>,
}

impl ProjectionResult {
    /// Balance at the end of each full year.
    pub fn yearly_values(&self) -> Vec<f64> {
        self.series
            .iter()
            .skip(MONTHS_PER_YEAR as usize - 1)
            .step_by(MONTHS_PER_YEAR as usize)
            .copied()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalParams {
    pub initial_capital: f64,
    pub target_value: f64,
    pub contribution_growth_rate: f64,
    pub annual_return_rate: f64,
    pub years: u32,
}

impl GoalParams {
    pub fn new(
        initial_capital: f64,
        target_value: f64,
        contribution_growth_rate: f64,
        annual_return_rate: f64,
        years: u32,
    ) -> InputResult<Self> {
        Ok(Self {
            initial_capital: non_negative("initial_capital", initial_capital)?,
            target_value: non_negative("target_value", target_value)?,
            contribution_growth_rate: non_negative(
                "contribution_growth_rate",
                contribution_growth_rate,
            )?,
            annual_return_rate: non_negative("annual_return_rate", annual_return_rate)?,
            years: positive_years("years", years)?,
        })
    }

    pub fn projection_with(&self, monthly_contribution: f64) -> ProjectionParams {
        ProjectionParams {
            initial_capital: self.initial_capital,
            initial_monthly_contribution: monthly_contribution,
            contribution_growth_rate: self.contribution_growth_rate,
            annual_return_rate: self.annual_return_rate,
            years: self.years,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Accepted distance between the projected terminal value and the target.
    pub tolerance: f64,
    pub max_iterations: u32,
    pub max_bound_doublings: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_iterations: 1000,
            max_bound_doublings: 64,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> InputResult<()> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(InputError::InvalidConfig(
                "tolerance must be > 0".to_string(),
            ));
        }
        if self.max_iterations == 0 || self.max_iterations > MAX_SOLVER_ITERATIONS {
            return Err(InputError::InvalidConfig(format!(
                "max_iterations must be between 1 and {MAX_SOLVER_ITERATIONS}"
            )));
        }
        if self.max_bound_doublings > MAX_BOUND_DOUBLINGS {
            return Err(InputError::InvalidConfig(format!(
                "max_bound_doublings must be <= {MAX_BOUND_DOUBLINGS}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub terminal_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum InfeasibleReason {
    /// Initial capital alone already overshoots the target.
    #[serde(rename_all = "camelCase")]
    ExceedsTargetWithoutContributions { terminal_value: f64 },
    /// No contribution up to `search_max` reaches the target.
    #[serde(rename_all = "camelCase")]
    SearchBoundExhausted { search_max: f64 },
    NotConverged { iterations: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum GoalOutcome {
    #[serde(rename_all = "camelCase")]
    Found {
        monthly_contribution: f64,
        terminal_value: f64,
    },
    Infeasible(InfeasibleReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub outcome: GoalOutcome,
    pub search_max: f64,
    pub iterations: Vec<GoalSolveIteration>,
}

impl GoalSolveResult {
    pub fn monthly_contribution(&self) -> Option<f64> {
        match self.outcome {
            GoalOutcome::Found {
                monthly_contribution,
                ..
            } => Some(monthly_contribution),
            GoalOutcome::Infeasible(_) => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self.outcome, GoalOutcome::Found { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationParams {
    pub amount: f64,
    pub annual_rate: f64,
    /// Elapsed years; fractional values are allowed and negative values
    /// compound the amount forward instead of discounting it.
    pub years: f64,
}

impl InflationParams {
    pub fn new(amount: f64, annual_rate: f64, years: f64) -> InputResult<Self> {
        Ok(Self {
            amount: non_negative("amount", amount)?,
            annual_rate: non_negative("annual_rate", annual_rate)?,
            years: finite("years", years)?,
        })
    }

    /// Value an amount quoted in `target_year` money in `base_year` money.
    pub fn between_years(
        amount: f64,
        annual_rate: f64,
        base_year: i32,
        target_year: i32,
    ) -> InputResult<Self> {
        Self::new(amount, annual_rate, f64::from(target_year - base_year))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationResult {
    pub adjusted_amount: f64,
}
