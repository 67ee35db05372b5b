//! Time-value-of-money projections: compounding a monthly contribution
//! schedule, solving for the contribution that reaches a goal, and adjusting
//! lump sums for inflation.

pub mod api;
pub mod core;
