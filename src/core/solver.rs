use log::debug;

use super::engine::terminal_value;
use super::error::InputResult;
use super::types::{
    GoalOutcome, GoalParams, GoalSolveIteration, GoalSolveResult, InfeasibleReason, SolverConfig,
};

/// Finds the initial monthly contribution whose projection lands within
/// [`SolverConfig::default`] tolerance of the target.
pub fn solve_required_contribution(params: &GoalParams) -> GoalSolveResult {
    search(params, SolverConfig::default())
}

pub fn solve_with_config(
    params: &GoalParams,
    config: SolverConfig,
) -> InputResult<GoalSolveResult> {
    config.validate()?;
    Ok(search(params, config))
}

fn search(params: &GoalParams, config: SolverConfig) -> GoalSolveResult {
    let target = params.target_value;
    let evaluate = |contribution: f64| terminal_value(&params.projection_with(contribution));
    let within_tolerance = |value: f64| (value - target).abs() <= config.tolerance;

    let low_value = evaluate(0.0);
    if within_tolerance(low_value) {
        return finish(found(0.0, low_value), 0.0, Vec::new());
    }
    if low_value > target {
        return finish(
            GoalOutcome::Infeasible(InfeasibleReason::ExceedsTargetWithoutContributions {
                terminal_value: low_value,
            }),
            0.0,
            Vec::new(),
        );
    }

    let mut high = target;
    let mut high_value = evaluate(high);
    let mut doublings = 0;
    while high_value < target - config.tolerance {
        if doublings >= config.max_bound_doublings {
            let reason = InfeasibleReason::SearchBoundExhausted { search_max: high };
            return finish(GoalOutcome::Infeasible(reason), high, Vec::new());
        }
        high = if high > 0.0 { high * 2.0 } else { 1.0 };
        high_value = evaluate(high);
        doublings += 1;
        debug!("widened contribution search bound to {high} (terminal value {high_value})");
    }
    if within_tolerance(high_value) {
        return finish(found(high, high_value), high, Vec::new());
    }

    let search_max = high;
    let mut lo = 0.0;
    let mut hi = high;
    let mut iterations = Vec::new();
    for it in 1..=config.max_iterations {
        let mid = (lo + hi) * 0.5;
        let value = evaluate(mid);
        iterations.push(GoalSolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_value: mid,
            terminal_value: value,
        });

        if within_tolerance(value) {
            return finish(found(mid, value), search_max, iterations);
        } else if value < target {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    finish(
        GoalOutcome::Infeasible(InfeasibleReason::NotConverged {
            iterations: config.max_iterations,
        }),
        search_max,
        iterations,
    )
}

fn found(monthly_contribution: f64, terminal_value: f64) -> GoalOutcome {
    GoalOutcome::Found {
        monthly_contribution,
        terminal_value,
    }
}

fn finish(
    outcome: GoalOutcome,
    search_max: f64,
    iterations: Vec<GoalSolveIteration>,
) -> GoalSolveResult {
    debug!(
        "goal search finished after {} bisection steps: {outcome:?}",
        iterations.len()
    );
    GoalSolveResult {
        outcome,
        search_max,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::project;
    use crate::core::types::{MAX_SOLVER_ITERATIONS, ProjectionParams};
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn goal(
        initial_capital: f64,
        target_value: f64,
        contribution_growth_rate: f64,
        annual_return_rate: f64,
        years: u32,
    ) -> GoalParams {
        GoalParams::new(
            initial_capital,
            target_value,
            contribution_growth_rate,
            annual_return_rate,
            years,
        )
        .expect("valid goal")
    }

    #[test]
    fn zero_target_without_capital_needs_no_contribution() {
        let result = solve_required_contribution(&goal(0.0, 0.0, 0.0, 0.09, 1));
        assert!(result.is_feasible());
        assert_close(result.monthly_contribution().expect("found"), 0.0, 1e-12);
    }

    #[test]
    fn zero_rates_solve_to_even_split() {
        let result = solve_required_contribution(&goal(0.0, 12_000.0, 0.0, 0.0, 10));
        let contribution = result.monthly_contribution().expect("found");
        assert_close(contribution * 120.0, 12_000.0, 0.011);
    }

    #[test]
    fn retirement_goal_lands_within_tolerance() {
        let params = goal(50_000.0, 6_000_000.0, 0.0, 0.09, 40);
        let result = solve_required_contribution(&params);
        let contribution = result.monthly_contribution().expect("found");
        let projected = project(&params.projection_with(contribution)).terminal_value;
        assert_close(projected, 6_000_000.0, 0.01);
        assert!(contribution > 0.0 && contribution < 6_000_000.0);
        assert!(!result.iterations.is_empty());
    }

    #[test]
    fn iteration_trace_narrows_the_bracket() {
        let result = solve_required_contribution(&goal(0.0, 100_000.0, 0.05, 0.07, 20));
        assert!(result.is_feasible());
        for pair in result.iterations.windows(2) {
            let width_before = pair[0].upper_bound - pair[0].lower_bound;
            let width_after = pair[1].upper_bound - pair[1].lower_bound;
            assert!(width_after < width_before);
        }
        assert_eq!(result.search_max, 100_000.0);
    }

    #[test]
    fn capital_already_above_target_is_infeasible() {
        let result = solve_required_contribution(&goal(500_000.0, 100_000.0, 0.0, 0.05, 10));
        assert!(!result.is_feasible());
        assert!(result.monthly_contribution().is_none());
        assert!(matches!(
            result.outcome,
            GoalOutcome::Infeasible(InfeasibleReason::ExceedsTargetWithoutContributions { .. })
        ));
    }

    #[test]
    fn capital_exactly_reaching_target_needs_no_contribution() {
        let result = solve_required_contribution(&goal(10_000.0, 10_000.0, 0.0, 0.0, 5));
        assert_eq!(result.monthly_contribution(), Some(0.0));
        assert!(result.iterations.is_empty());
    }

    #[test]
    fn widens_search_bound_when_contribution_must_exceed_target() {
        // Constructed directly: a collapsing market and shrinking deposits mean
        // the first deposit has to be far larger than the target itself.
        let params = GoalParams {
            initial_capital: 0.0,
            target_value: 1_000.0,
            contribution_growth_rate: -0.999,
            annual_return_rate: -0.999,
            years: 1,
        };
        let result = solve_required_contribution(&params);
        let contribution = result.monthly_contribution().expect("found after widening");
        assert!(contribution > params.target_value);
        assert!(result.search_max > params.target_value);
        let projected = project(&params.projection_with(contribution)).terminal_value;
        assert_close(projected, 1_000.0, 0.01);
    }

    #[test]
    fn exhausted_bound_doublings_report_infeasible() {
        let params = GoalParams {
            initial_capital: 0.0,
            target_value: 1_000.0,
            contribution_growth_rate: -0.999,
            annual_return_rate: -0.999,
            years: 1,
        };
        let config = SolverConfig {
            max_bound_doublings: 2,
            ..SolverConfig::default()
        };
        let result = solve_with_config(&params, config).expect("valid config");
        assert_eq!(
            result.outcome,
            GoalOutcome::Infeasible(InfeasibleReason::SearchBoundExhausted { search_max: 4_000.0 })
        );
    }

    #[test]
    fn iteration_cap_reports_not_converged() {
        let config = SolverConfig {
            tolerance: 1e-9,
            max_iterations: 3,
            ..SolverConfig::default()
        };
        let result =
            solve_with_config(&goal(0.0, 1_000_000.0, 0.03, 0.06, 30), config).expect("valid");
        assert_eq!(
            result.outcome,
            GoalOutcome::Infeasible(InfeasibleReason::NotConverged { iterations: 3 })
        );
        assert_eq!(result.iterations.len(), 3);
    }

    #[test]
    fn oversized_iteration_budget_is_rejected_before_searching() {
        let config = SolverConfig {
            max_iterations: u32::MAX,
            ..SolverConfig::default()
        };
        let err = solve_with_config(&goal(0.0, 1_000.0, 0.0, 0.05, 10), config)
            .expect_err("must reject");
        assert!(matches!(err, crate::core::InputError::InvalidConfig(_)));
    }

    #[test]
    fn large_iteration_budget_only_records_steps_taken() {
        let config = SolverConfig {
            max_iterations: MAX_SOLVER_ITERATIONS,
            ..SolverConfig::default()
        };
        let result =
            solve_with_config(&goal(0.0, 100_000.0, 0.0, 0.05, 10), config).expect("valid");
        assert!(result.is_feasible());
        assert!(result.iterations.len() < 200);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SolverConfig {
            max_iterations: 0,
            ..SolverConfig::default()
        };
        assert!(solve_with_config(&goal(0.0, 1.0, 0.0, 0.0, 1), config).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_solver_recovers_known_contribution(
            capital in 0u32..200_000,
            contribution in 1u32..10_000,
            growth_bp in 0u32..1_000,
            return_bp in 0u32..1_200,
            years in 1u32..45
        ) {
            let growth = f64::from(growth_bp) / 10_000.0;
            let annual_return = f64::from(return_bp) / 10_000.0;
            let known = ProjectionParams::new(
                f64::from(capital),
                f64::from(contribution),
                growth,
                annual_return,
                years,
            )
            .expect("valid projection");
            let target = project(&known).terminal_value;

            let params = goal(f64::from(capital), target, growth, annual_return, years);
            let result = solve_required_contribution(&params);
            let solved = result.monthly_contribution();
            prop_assert!(solved.is_some());
            let solved = solved.unwrap_or_default();
            let projected = project(&params.projection_with(solved)).terminal_value;
            prop_assert!((projected - target).abs() <= 0.01);
        }
    }
}
