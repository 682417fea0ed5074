//! Canonical listing record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Currencies a listing price can be quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    #[default]
    Mxn,
    Eur,
    Cad,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Mxn, Currency::Eur, Currency::Cad];

    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Mxn => "MXN",
            Currency::Eur => "EUR",
            Currency::Cad => "CAD",
        }
    }

    /// Parse an ISO code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Whether a property is offered for rent or for sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Buy,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Rent => "rent",
            ListingType::Buy => "buy",
        }
    }

    /// Fold the synonyms scraped pages and models use onto the two values.
    pub fn from_synonym(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "rent" | "rental" => Some(ListingType::Rent),
            "buy" | "sale" => Some(ListingType::Buy),
            _ => None,
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated property listing.
///
/// Instances come out of [`crate::schema::normalize_record`] and are not
/// mutated afterwards. Absent optional fields serialize as `null` so every
/// record in an output file carries the same field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub address: Option<String>,
    pub price: Option<f64>,
    pub currency: Currency,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    pub square_footage: Option<u32>,
    pub property_type: Option<String>,
    pub listing_type: Option<ListingType>,
    pub year_built: Option<i32>,
    pub description: Option<String>,
    pub amenities: Vec<String>,
    pub url: Option<String>,
    pub source: Option<String>,
    pub listing_date: Option<String>,
    pub image_link: Option<String>,
    pub additional_info: BTreeMap<String, serde_json::Value>,
}

impl ListingRecord {
    /// Field names in serialization order.
    pub const FIELDS: [&'static str; 16] = [
        "address",
        "price",
        "currency",
        "bedrooms",
        "bathrooms",
        "square_footage",
        "property_type",
        "listing_type",
        "year_built",
        "description",
        "amenities",
        "url",
        "source",
        "listing_date",
        "image_link",
        "additional_info",
    ];

    /// Fields a listing cannot be published without.
    pub const REQUIRED_FIELDS: [&'static str; 9] = [
        "address",
        "price",
        "currency",
        "bedrooms",
        "bathrooms",
        "listing_type",
        "property_type",
        "description",
        "image_link",
    ];

    /// Label for log lines.
    pub fn display_address(&self) -> &str {
        self.address.as_deref().unwrap_or("Unknown address")
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
