//! Numeric form input.
//!
//! Amounts typed into a form are either a finite, non-negative number or a
//! rejected input. Nothing is coerced to zero except an optional field left
//! blank.

use chrono::NaiveDate;

use crate::error::{HarvestError, Result};

/// Parse a required amount. Blank input is rejected.
pub fn parse_amount(field: &str, input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(HarvestError::Validation(format!("{field} is required")));
    }
    parse_non_negative(field, trimmed)
}

/// Parse an optional amount. Blank input means zero.
pub fn parse_optional_amount(field: &str, input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    parse_non_negative(field, trimmed)
}

fn parse_non_negative(field: &str, input: &str) -> Result<f64> {
    // Accept thousands separators and a leading peso sign as typed from receipts.
    let cleaned: String = input
        .trim_start_matches('₱')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let invalid = || HarvestError::InvalidAmount {
        field: field.to_string(),
        input: input.to_string(),
    };
    let value: f64 = cleaned.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value)
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| HarvestError::InvalidDate(trimmed.to_string()))
}

/// Parse a required date field, naming the field when it is blank.
pub fn parse_required_date(field: &str, input: &str) -> Result<NaiveDate> {
    if input.trim().is_empty() {
        return Err(HarvestError::Validation(format!("{field} is required")));
    }
    parse_date(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_plain_and_formatted() {
        assert_eq!(parse_amount("Sales", "1500").unwrap(), 1500.0);
        assert_eq!(parse_amount("Sales", " 12.5 ").unwrap(), 12.5);
        assert_eq!(parse_amount("Sales", "₱1,234.50").unwrap(), 1234.5);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        let err = parse_amount("Sales", "abc").unwrap_err();
        assert!(matches!(err, HarvestError::InvalidAmount { .. }));
        assert!(err.to_string().contains("Sales"));
    }

    #[test]
    fn test_parse_amount_rejects_negative_and_nan() {
        assert!(parse_amount("Kilos", "-3").is_err());
        assert!(parse_amount("Kilos", "NaN").is_err());
        assert!(parse_amount("Kilos", "inf").is_err());
    }

    #[test]
    fn test_required_blank_is_validation_error() {
        let err = parse_amount("Kilos", "   ").unwrap_err();
        assert!(matches!(err, HarvestError::Validation(_)));
    }

    #[test]
    fn test_optional_blank_is_zero() {
        assert_eq!(parse_optional_amount("Expenses", "").unwrap(), 0.0);
        assert!(parse_optional_amount("Expenses", "x").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("15/01/2025").is_err());
        assert!(matches!(
            parse_required_date("Date", "").unwrap_err(),
            HarvestError::Validation(_)
        ));
    }
}
