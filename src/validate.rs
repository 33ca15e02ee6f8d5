//! Input checks applied before a record is submitted to the store.

use crate::error::{Error, Result};
use crate::format::{pad_check_number, CHECK_NUMBER_DIGITS};
use crate::model::{Category, NewTransaction, TransactionType, TransactionUpdates};
use chrono::NaiveDate;

/// The maximum number of characters in a vendor name.
pub const MAX_VENDOR_CHARS: usize = 100;

/// A check number is exactly eight ASCII digits.
pub fn is_valid_check_number(value: &str) -> bool {
    value.len() == CHECK_NUMBER_DIGITS && value.chars().all(|c| c.is_ascii_digit())
}

pub fn is_valid_vendor_name(value: &str) -> bool {
    value.chars().count() <= MAX_VENDOR_CHARS
}

/// An amount is a finite, strictly positive number.
pub fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Turns a check number typed by a user into its stored form. The trimmed input must be one to
/// eight ASCII digits; it is then zero-padded to eight.
pub fn normalize_check_number(value: &str) -> Result<String> {
    let digits = value.trim();
    if digits.is_empty()
        || digits.len() > CHECK_NUMBER_DIGITS
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::validation(format!(
            "The check number must be 1 to {CHECK_NUMBER_DIGITS} digits, got '{value}'"
        )));
    }
    Ok(pad_check_number(digits))
}

/// A transaction date cannot be later than `today`.
pub fn is_valid_date(value: NaiveDate, today: NaiveDate) -> bool {
    value <= today
}

/// Checks every field of an insert payload.
pub fn validate_new_transaction(t: &NewTransaction, today: NaiveDate) -> Result<()> {
    check_amount(t.amount)?;
    check_date(t.date, today)?;
    check_required("description", &t.description)?;
    check_required("category", &t.category_id)?;
    if let Some(vendor) = &t.vendor {
        check_vendor(vendor)?;
    }
    if let Some(check_number) = &t.check_number {
        check_check_number(check_number)?;
    }
    Ok(())
}

/// Checks the fields that are set in a partial update. An empty vendor or check number clears the
/// stored value and is allowed.
pub fn validate_transaction_updates(u: &TransactionUpdates, today: NaiveDate) -> Result<()> {
    if let Some(amount) = u.amount {
        check_amount(amount)?;
    }
    if let Some(date) = u.date {
        check_date(date, today)?;
    }
    if let Some(description) = &u.description {
        check_required("description", description)?;
    }
    if let Some(category_id) = &u.category_id {
        check_required("category", category_id)?;
    }
    if let Some(vendor) = &u.vendor {
        check_vendor(vendor)?;
    }
    match &u.check_number {
        Some(check_number) if !check_number.is_empty() => check_check_number(check_number),
        _ => Ok(()),
    }
}

/// Checks that a transaction of type `r#type` can be filed under `category_id`: the category must
/// exist among `categories` and have the same type.
pub fn validate_category_choice(
    categories: &[Category],
    category_id: &str,
    r#type: TransactionType,
) -> Result<()> {
    let category = categories
        .iter()
        .find(|c| c.id == category_id)
        .ok_or_else(|| Error::validation(format!("Unknown category '{category_id}'")))?;
    if category.r#type != r#type {
        return Err(Error::validation(format!(
            "Category '{}' is for {} transactions, not {}",
            category.name, category.r#type, r#type
        )));
    }
    Ok(())
}

/// Checks a category name: it must not be blank and must not match, ignoring case, the name of
/// another category of the same type. `editing` is the ID of the category being renamed, which is
/// excluded from the duplicate check. Returns the trimmed name.
pub fn validate_category_name(
    categories: &[Category],
    name: &str,
    r#type: TransactionType,
    editing: Option<&str>,
) -> Result<String> {
    let trimmed = name.trim();
    check_required("category name", trimmed)?;
    let lower = trimmed.to_lowercase();
    let duplicate = categories.iter().any(|c| {
        c.r#type == r#type && c.name.to_lowercase() == lower && Some(c.id.as_str()) != editing
    });
    if duplicate {
        return Err(Error::validation(format!(
            "A {} category named '{trimmed}' already exists",
            r#type
        )));
    }
    Ok(trimmed.to_string())
}

fn check_amount(amount: f64) -> Result<()> {
    if is_valid_amount(amount) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "The amount must be a positive number, got {amount}"
        )))
    }
}

fn check_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
    if is_valid_date(date, today) {
        Ok(())
    } else {
        Err(Error::validation(format!("The date {date} is in the future")))
    }
}

fn check_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::validation(format!("The {field} is required")))
    } else {
        Ok(())
    }
}

fn check_vendor(vendor: &str) -> Result<()> {
    if is_valid_vendor_name(vendor) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "The vendor name cannot be longer than {MAX_VENDOR_CHARS} characters"
        )))
    }
}

fn check_check_number(check_number: &str) -> Result<()> {
    if is_valid_check_number(check_number) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "The check number must be exactly {CHECK_NUMBER_DIGITS} digits, got '{check_number}'"
        )))
    }
}
