//! Validation rules shared by the request DTOs.
//!
//! Length and range limits on plain fields are declared with
//! `#[derive(Validate)]`; the rules below need more than one field, the
//! current date, or a decimal bound, so they run after the derived checks and
//! are merged into the same `ValidationErrors`.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

pub const MIN_PRODUCT_PRICE: i64 = 1;
pub const MAX_PRODUCT_PRICE: i64 = 1_000_000;
/// Matches the `NUMERIC(18, 2)` price columns.
pub const PRICE_DECIMAL_PLACES: u32 = 2;
pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 1000;

pub(crate) fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Run the derived checks and return the collected errors (possibly empty).
pub(crate) fn derived_errors<T: Validate>(value: &T) -> ValidationErrors {
    match value.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    }
}

pub(crate) fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub(crate) fn require_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    display_name: &str,
    value: &str,
) {
    if value.trim().is_empty() {
        errors.add(field, error("required", format!("{} is required", display_name)));
    }
}

pub(crate) fn require_id(
    errors: &mut ValidationErrors,
    field: &'static str,
    display_name: &str,
    value: Uuid,
) {
    if value.is_nil() {
        errors.add(field, error("required", format!("{} is required", display_name)));
    }
}

/// Due dates are required and may not lie in the past.
pub(crate) fn check_due_date(errors: &mut ValidationErrors, due_date: Option<NaiveDate>) {
    let today = Utc::now().date_naive();
    match due_date {
        Some(date) if date >= today => {}
        _ => errors.add(
            "due_date",
            error("due_date", "Due Date should be newer than or equal to today"),
        ),
    }
}

/// Prices are required, carry at most two decimal places and lie in
/// [`MIN_PRODUCT_PRICE`, `MAX_PRODUCT_PRICE`].
pub(crate) fn check_product_price(errors: &mut ValidationErrors, price: Option<Decimal>) {
    let Some(price) = price else {
        errors.add("product_price", error("required", "Product Price is required"));
        return;
    };

    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        errors.add(
            "product_price",
            error(
                "scale",
                format!(
                    "Product Price must have at most {} decimal places",
                    PRICE_DECIMAL_PLACES
                ),
            ),
        );
    }

    if price < Decimal::from(MIN_PRODUCT_PRICE) || price > Decimal::from(MAX_PRODUCT_PRICE) {
        errors.add(
            "product_price",
            error(
                "range",
                format!(
                    "Product Price must be between {} and {}",
                    MIN_PRODUCT_PRICE, MAX_PRODUCT_PRICE
                ),
            ),
        );
    }
}

pub(crate) fn check_quantity(errors: &mut ValidationErrors, quantity: Option<i32>) {
    match quantity {
        None => errors.add("quantity", error("required", "Product Quantity is required")),
        Some(q) if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&q) => errors.add(
            "quantity",
            error(
                "range",
                format!(
                    "Product Quantity must be between {} and {}",
                    MIN_QUANTITY, MAX_QUANTITY
                ),
            ),
        ),
        Some(_) => {}
    }
}

/// Flatten validation errors into display messages, sorted by field name.
pub fn error_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect()
}
