//! Per-field coercion rules.
//!
//! Every function takes a non-null JSON value and returns `None` when the
//! value cannot be turned into something usable. Negative quantities are
//! treated as unusable rather than clamped.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::types::listing::{Currency, ListingType};

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
    static ref INTEGER: Regex = Regex::new(r"\d+").unwrap();
    static ref YEAR: Regex = Regex::new(r"\b(\d{4})\b").unwrap();
}

/// Oldest construction year accepted for `year_built`.
pub const MIN_YEAR_BUILT: i32 = 1800;

/// Address object keys, in join order.
const ADDRESS_PARTS: [&str; 5] = ["street", "district", "city", "region", "country"];

pub fn coerce_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p >= 0.0),
        Value::String(s) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse::<f64>().ok().filter(|p| p.is_finite())
        }
        _ => None,
    }
}

/// Pick the listing currency.
///
/// An explicit, recognised code wins. Otherwise the raw price string is
/// inspected: a written `MXN` beats any symbol, other written codes come
/// next, then `€`, `C$` and finally a bare `$` (read as USD). Anything else
/// falls back to MXN.
pub fn infer_currency(explicit: Option<&Value>, raw_price: Option<&Value>) -> Currency {
    if let Some(currency) = explicit.and_then(Value::as_str).and_then(Currency::from_code) {
        return currency;
    }

    let Some(price) = raw_price.and_then(Value::as_str) else {
        return Currency::default();
    };
    let upper = price.to_uppercase();

    if upper.contains("MXN") {
        return Currency::Mxn;
    }
    if let Some(currency) = [Currency::Usd, Currency::Eur, Currency::Cad]
        .into_iter()
        .find(|c| upper.contains(c.code()))
    {
        return currency;
    }
    if price.contains('€') {
        Currency::Eur
    } else if upper.contains("C$") {
        Currency::Cad
    } else if price.contains('$') {
        Currency::Usd
    } else {
        Currency::default()
    }
}

/// Bedroom and bathroom counts. Half baths are kept.
pub fn coerce_rooms(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|r| r.is_finite() && *r >= 0.0),
        Value::String(s) => DECIMAL.find(s)?.as_str().parse().ok(),
        _ => None,
    }
}

pub fn coerce_square_footage(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|a| a.is_finite() && *a >= 0.0 && *a <= u32::MAX as f64)
            .map(|a| a as u32),
        Value::String(s) => {
            let cleaned = s.replace(',', "");
            INTEGER.find(&cleaned)?.as_str().parse().ok()
        }
        _ => None,
    }
}

/// First plausible four-digit year between [`MIN_YEAR_BUILT`] and
/// `current_year`. Out-of-range years are dropped, not clamped.
pub fn coerce_year_built(value: &Value, current_year: i32) -> Option<i32> {
    let year = match value {
        Value::Number(n) => match n.as_i64() {
            Some(y) => i32::try_from(y).ok(),
            None => n
                .as_f64()
                .filter(|y| y.fract() == 0.0 && y.abs() < i32::MAX as f64)
                .map(|y| y as i32),
        },
        Value::String(s) => YEAR.captures(s)?.get(1)?.as_str().parse().ok(),
        _ => None,
    }?;

    (MIN_YEAR_BUILT..=current_year).contains(&year).then_some(year)
}

pub fn coerce_listing_type(value: &Value) -> Option<ListingType> {
    value.as_str().and_then(ListingType::from_synonym)
}

/// Plain strings are trimmed; address objects are flattened to
/// `street, district, city, region, country`, skipping absent parts.
pub fn coerce_address(value: &Value) -> Option<String> {
    match value {
        Value::Object(parts) => {
            let joined = ADDRESS_PARTS
                .iter()
                .filter_map(|key| parts.get(*key).and_then(coerce_text))
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        other => coerce_text(other),
    }
}

/// Trimmed non-empty text. Numbers are accepted and stringified.
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Arrays keep their scalar entries; a comma separated string is split.
pub fn coerce_amenities(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Bool(b) => Some(b.to_string()),
                other => coerce_text(other),
            })
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Merge the explicit `additional_info` object with unknown top-level keys.
///
/// Nested values are stored as compact JSON strings so the map only ever
/// holds scalars. Explicit entries win over folded top-level ones; folded
/// keys only carry scalars.
pub fn coerce_additional_info(
    explicit: Option<&Value>,
    extras: &Map<String, Value>,
) -> BTreeMap<String, Value> {
    let mut info = BTreeMap::new();

    if let Some(Value::Object(entries)) = explicit {
        for (key, value) in entries {
            match value {
                Value::Null => {}
                Value::Array(_) | Value::Object(_) => {
                    info.insert(key.clone(), Value::String(value.to_string()));
                }
                scalar => {
                    info.insert(key.clone(), scalar.clone());
                }
            }
        }
    }

    for (key, value) in extras {
        if matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_)) {
            info.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    info
}
