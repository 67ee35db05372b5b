use thiserror::Error;

/// Longest horizon a projection or goal may cover.
pub const MAX_YEARS: u32 = 100;

pub type InputResult<T> = Result<T, InputError>;

/// Rejection of a parameter record before any computation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be > 0")]
    ZeroYears { field: &'static str },

    #[error("{field} must be <= {max}, got {value}")]
    TooManyYears {
        field: &'static str,
        value: u32,
        max: u32,
    },

    #[error("invalid solver config: {0}")]
    InvalidConfig(String),
}

pub(crate) fn finite(field: &'static str, value: f64) -> InputResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NotFinite { field, value })
    }
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> InputResult<f64> {
    let value = finite(field, value)?;
    if value < 0.0 {
        return Err(InputError::Negative { field, value });
    }
    Ok(value)
}

pub(crate) fn positive_years(field: &'static str, years: u32) -> InputResult<u32> {
    if years == 0 {
        return Err(InputError::ZeroYears { field });
    }
    if years > MAX_YEARS {
        return Err(InputError::TooManyYears {
            field,
            value: years,
            max: MAX_YEARS,
        });
    }
    Ok(years)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_rejects_nan_before_sign() {
        let err = non_negative("amount", f64::NAN).expect_err("nan must be rejected");
        assert!(matches!(err, InputError::NotFinite { field: "amount", .. }));
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert_eq!(non_negative("amount", 0.0), Ok(0.0));
    }

    #[test]
    fn messages_name_the_field() {
        let err = non_negative("annual_return_rate", -0.5).expect_err("negative");
        assert_eq!(err.to_string(), "annual_return_rate must be >= 0, got -0.5");

        let err = positive_years("years", 0).expect_err("zero years");
        assert_eq!(err.to_string(), "years must be > 0");
    }

    #[test]
    fn positive_years_caps_the_horizon() {
        assert_eq!(positive_years("years", MAX_YEARS), Ok(MAX_YEARS));
        let err = positive_years("years", 4_000_000_000).expect_err("horizon too long");
        assert_eq!(
            err,
            InputError::TooManyYears {
                field: "years",
                value: 4_000_000_000,
                max: MAX_YEARS,
            }
        );
        assert_eq!(err.to_string(), "years must be <= 100, got 4000000000");
    }
}
