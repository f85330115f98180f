//! Request body checks run on raw JSON, before deserializing.
//!
//! Checking the untyped value lets a wrong type (`"price": "abc"`) produce the
//! same `{error}` body as a missing field instead of a serde rejection.

use rentals_core::models::{Category, ListingDraft, ListingPatch};
use serde_json::{Map, Value};

use crate::error::AppError;

const TEXT_FIELDS: [(&str, &str); 5] = [
    ("title", "Title"),
    ("description", "Description"),
    ("owner", "Owner"),
    ("uploadDate", "Upload date"),
    ("location", "Location"),
];

/// Validate a create body and turn it into a draft.
pub fn parse_draft(mut body: Value) -> Result<ListingDraft, AppError> {
    let fields = as_object(&body)?;

    let missing = TEXT_FIELDS
        .iter()
        .map(|(name, _)| *name)
        .chain(["category", "price"])
        .any(|name| is_blank(fields.get(name)));
    if missing {
        return Err(AppError::bad_request("Missing required fields"));
    }

    if let Some(id) = fields.get("id") {
        if !id.as_str().is_some_and(|id| !id.trim().is_empty()) {
            return Err(AppError::bad_request("Id must be a non-empty string."));
        }
    }
    check_fields(fields)?;

    normalize_price(&mut body);
    serde_json::from_value(body).map_err(|error| AppError::bad_request(error.to_string()))
}

/// Validate an update body; only present fields are checked.
///
/// An `id` in the body is ignored.
pub fn parse_patch(mut body: Value) -> Result<ListingPatch, AppError> {
    let fields = as_object(&body)?;
    check_fields(fields)?;

    for (name, label) in TEXT_FIELDS {
        if let Some(Value::String(text)) = fields.get(name) {
            if text.trim().is_empty() {
                return Err(AppError::bad_request(format!("{label} must not be empty.")));
            }
        }
    }

    normalize_price(&mut body);
    serde_json::from_value(body).map_err(|error| AppError::bad_request(error.to_string()))
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::bad_request("Request body must be a JSON object."))
}

/// Integer value of `price`, accepting whole-number floats such as `12.0`.
#[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
fn integer_price(price: &Value) -> Option<i64> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

    price.as_i64().or_else(|| {
        price
            .as_f64()
            .filter(|value| value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER)
            .map(|value| value as i64)
    })
}

/// Rewrite a whole-number float price as an integer so it deserializes.
fn normalize_price(body: &mut Value) {
    if let Some(price) = body.get_mut("price") {
        if let Some(integer) = integer_price(price) {
            *price = Value::from(integer);
        }
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Type checks for every field present, in the order clients see errors.
fn check_fields(fields: &Map<String, Value>) -> Result<(), AppError> {
    if let Some(title) = fields.get("title") {
        if !title.is_string() {
            return Err(AppError::bad_request("Title must be a string."));
        }
    }

    if let Some(category) = fields.get("category") {
        let known = category
            .as_str()
            .is_some_and(|name| name.parse::<Category>().is_ok());
        if !known {
            return Err(AppError::bad_request(format!(
                "Category must be one of: {}.",
                Category::names().join(", ")
            )));
        }
    }

    if let Some(price) = fields.get("price") {
        if integer_price(price).is_none() {
            return Err(AppError::bad_request("Price must be an integer."));
        }
    }

    for (name, label) in TEXT_FIELDS.iter().skip(1) {
        if let Some(value) = fields.get(*name) {
            if !value.is_string() {
                return Err(AppError::bad_request(format!("{label} must be a string.")));
            }
        }
    }

    Ok(())
}
