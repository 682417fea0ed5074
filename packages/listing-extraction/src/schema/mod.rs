//! Record schema: coercion of arbitrary listing-like JSON into
//! [`ListingRecord`].
//!
//! This is the one place field rules live. Freshly extracted candidates and
//! previously stored records go through the same function, so a record that
//! validates once validates again unchanged.

pub mod fields;

use chrono::Datelike;
use serde_json::{Map, Value};

use crate::error::{SchemaResult, SchemaViolation};
use crate::types::listing::ListingRecord;

/// Coerce `raw` into a canonical listing, or report why it is invalid.
pub fn normalize_record(raw: &Value) -> SchemaResult<ListingRecord> {
    normalize_record_at(raw, chrono::Utc::now().year())
}

/// Same as [`normalize_record`] with an explicit upper bound for `year_built`.
pub fn normalize_record_at(raw: &Value, current_year: i32) -> SchemaResult<ListingRecord> {
    let object = raw.as_object().ok_or(SchemaViolation::NotAnObject {
        found: json_kind(raw),
    })?;

    let field = |name: &str| object.get(name).filter(|v| !v.is_null());

    let price_value = field("price");

    let record = ListingRecord {
        address: field("address").and_then(fields::coerce_address),
        price: price_value.and_then(fields::coerce_price),
        currency: fields::infer_currency(field("currency"), price_value),
        bedrooms: field("bedrooms").and_then(fields::coerce_rooms),
        bathrooms: field("bathrooms").and_then(fields::coerce_rooms),
        square_footage: field("square_footage").and_then(fields::coerce_square_footage),
        property_type: field("property_type").and_then(fields::coerce_text),
        listing_type: field("listing_type").and_then(fields::coerce_listing_type),
        year_built: field("year_built").and_then(|v| fields::coerce_year_built(v, current_year)),
        description: field("description").and_then(fields::coerce_text),
        amenities: field("amenities")
            .map(fields::coerce_amenities)
            .unwrap_or_default(),
        url: field("url").and_then(fields::coerce_text),
        source: field("source").and_then(fields::coerce_text),
        listing_date: field("listing_date").and_then(fields::coerce_text),
        image_link: field("image_link").and_then(fields::coerce_text),
        additional_info: fields::coerce_additional_info(field("additional_info"), &extra_fields(object)),
    };

    let missing = missing_required(&record);
    if !missing.is_empty() {
        return Err(SchemaViolation::MissingRequired { fields: missing });
    }

    Ok(record)
}

/// Top-level keys that are not part of the canonical record.
fn extra_fields(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .filter(|(key, _)| !ListingRecord::FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn missing_required(record: &ListingRecord) -> Vec<&'static str> {
    let present = [
        ("address", record.address.is_some()),
        ("price", record.price.is_some()),
        ("bedrooms", record.bedrooms.is_some()),
        ("bathrooms", record.bathrooms.is_some()),
        ("listing_type", record.listing_type.is_some()),
        ("property_type", record.property_type.is_some()),
        ("description", record.description.is_some()),
        ("image_link", record.image_link.is_some()),
    ];

    present
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
