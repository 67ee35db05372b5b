use super::types::{MONTHS_PER_YEAR, ProjectionParams, ProjectionResult};

/// Monthly rate that compounds to `annual_rate` over twelve months.
pub fn monthly_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / f64::from(MONTHS_PER_YEAR)) - 1.0
}

#[derive(Debug, Clone, Copy)]
struct MonthStep {
    balance: f64,
    contribution_paid: f64,
}

/// Month-by-month balance recurrence. Each step grows the balance first and
/// then adds the contribution due for that month.
#[derive(Debug)]
struct Accumulation {
    balance: f64,
    contribution: f64,
    return_factor: f64,
    growth_factor: f64,
    remaining: usize,
}

impl Accumulation {
    fn new(params: &ProjectionParams) -> Self {
        Self {
            balance: params.initial_capital,
            contribution: params.initial_monthly_contribution,
            return_factor: 1.0 + monthly_rate(params.annual_return_rate),
            growth_factor: 1.0 + monthly_rate(params.contribution_growth_rate),
            remaining: params.months(),
        }
    }
}

impl Iterator for Accumulation {
    type Item = MonthStep;

    fn next(&mut self) -> Option<MonthStep> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let contribution_paid = self.contribution;
        self.balance = self.balance * self.return_factor + contribution_paid;
        self.contribution *= self.growth_factor;

        Some(MonthStep {
            balance: self.balance,
            contribution_paid,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

pub fn project(params: &ProjectionParams) -> ProjectionResult {
    let mut series = Vec::with_capacity(params.months());
    let mut total_contributed = 0.0;
    for step in Accumulation::new(params) {
        total_contributed += step.contribution_paid;
        series.push(step.balance);
    }

    ProjectionResult {
        terminal_value: series.last().copied().unwrap_or(params.initial_capital),
        total_contributed,
        series,
    }
}

/// Terminal balance only; same recurrence as [`project`] without keeping the series.
pub fn terminal_value(params: &ProjectionParams) -> f64 {
    Accumulation::new(params)
        .last()
        .map(|step| step.balance)
        .unwrap_or(params.initial_capital)
}
