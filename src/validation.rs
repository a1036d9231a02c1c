// Client-side form validation
// Every check runs before any network call is made

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ClientError, Result};

/// 17 characters, letters I, O and Q are never used
static VIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap());

static EXPIRATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/?([0-9]{2})$").unwrap());

static CVV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3,4}$").unwrap());

/// Validate a vehicle identification number. Returns the canonical uppercase form.
pub fn validate_vin(vin: &str) -> Result<String> {
    let vin = vin.trim().to_ascii_uppercase();
    let length = vin.chars().count();
    if length != 17 {
        return Err(ClientError::validation(
            "vin",
            format!("must be 17 characters, got {}", length),
        ));
    }
    if !VIN_RE.is_match(&vin) {
        return Err(ClientError::validation(
            "vin",
            "may only contain letters and digits, excluding I, O and Q",
        ));
    }
    Ok(vin)
}

/// Luhn checksum over a digit string
fn luhn_valid(digits: &[u32]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Validate a card number (separators allowed). Returns the digits only.
pub fn validate_card_number(number: &str) -> Result<String> {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() < 13 || digits.len() > 19 {
        return Err(ClientError::validation(
            "card number",
            "must have between 13 and 19 digits",
        ));
    }
    if !luhn_valid(&digits) {
        return Err(ClientError::validation("card number", "checksum mismatch"));
    }

    Ok(digits
        .iter()
        .filter_map(|d| std::char::from_digit(*d, 10))
        .collect())
}

/// Card expiry as (month, four-digit year)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiration {
    pub month: u32,
    pub year: i32,
}

/// Validate an `MM/YY` (or `MMYY`) expiration against `today`.
/// A card is valid through the end of its expiry month.
pub fn validate_expiration(value: &str, today: NaiveDate) -> Result<Expiration> {
    let caps = EXPIRATION_RE
        .captures(value.trim())
        .ok_or_else(|| ClientError::validation("expiration date", "expected MM/YY"))?;

    let month: u32 = caps[1]
        .parse()
        .map_err(|_| ClientError::validation("expiration date", "bad month"))?;
    let yy: i32 = caps[2]
        .parse()
        .map_err(|_| ClientError::validation("expiration date", "bad year"))?;

    let century = today.year() - today.year() % 100;
    let expiration = Expiration {
        month,
        year: century + yy,
    };

    if (expiration.year, expiration.month) < (today.year(), today.month()) {
        return Err(ClientError::validation("expiration date", "card has expired"));
    }

    Ok(expiration)
}

pub fn validate_cvv(cvv: &str) -> Result<()> {
    if CVV_RE.is_match(cvv.trim()) {
        Ok(())
    } else {
        Err(ClientError::validation("cvv", "must be 3 or 4 digits"))
    }
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<()> {
    if password != confirmation {
        return Err(ClientError::validation("password", "passwords don't match"));
    }
    Ok(())
}

pub fn require_terms_accepted(accepted: bool) -> Result<()> {
    if !accepted {
        return Err(ClientError::validation(
            "terms",
            "you must accept the terms and conditions to proceed",
        ));
    }
    Ok(())
}

/// Reject blank required form fields
pub fn require_field(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::validation(field, "is required"));
    }
    Ok(())
}
