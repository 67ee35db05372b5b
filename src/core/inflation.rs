use super::types::{InflationParams, InflationResult};

/// Discounts `amount` by `annual_rate` over `years`. Negative years compound forward.
pub fn adjust_for_inflation(params: &InflationParams) -> InflationResult {
    InflationResult {
        adjusted_amount: params.amount / (1.0 + params.annual_rate).powf(params.years),
    }
}
