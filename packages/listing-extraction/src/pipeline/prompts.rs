//! LLM prompts for the extraction and cleaning stages.
//!
//! Both stages ask for the same record shape; the field list is kept in one
//! place so the two prompts cannot drift apart.

/// Field guide shared by both stages.
const FIELD_GUIDE: &str = r#"Required fields:
- `address` (string)
- `price` (float)
- `currency` (string, one of USD, MXN, EUR, CAD)
- `bedrooms` (float)
- `bathrooms` (float)
- `listing_type` (string, "rent" or "buy")
- `property_type` (string, e.g. "house", "apartment")
- `description` (string)
- `image_link` (string, URL)
Optional fields:
- `square_footage` (integer or null)
- `year_built` (integer or null)
- `amenities` (array of strings)
- `additional_info` (object)"#;

/// System instruction for pulling listings out of page text.
pub const EXTRACT_SYSTEM_PROMPT: &str = "You are a strict and precise assistant tasked with \
extracting reliable real estate listings from text. Each listing must be a complete, \
legitimate property with structured details. Incomplete or unclear listings must be \
discarded. Required fields: address, price, currency, bedrooms, bathrooms, listing_type \
(rent or buy), property_type, description, image_link. Optional: square_footage, \
year_built, amenities, additional_info. Return a JSON array of valid listings.";

/// System instruction for re-validating a single stored record.
pub const CLEAN_SYSTEM_PROMPT: &str = "You are a data cleaning assistant. Clean and \
standardize the provided JSON object representing a single real estate listing. The input \
may have nested fields (e.g. 'address' as an object with 'country', 'region', 'city', \
'district'). Flatten the 'address' field into a single string ('district, city, region, \
country') if it is an object. Ensure all required fields are present and valid: address \
(string), price (float), currency (string), bedrooms (float), bathrooms (float), \
listing_type ('rent' or 'buy'), property_type (string), description (string), image_link \
(string). Optional fields: square_footage (integer), year_built (integer), amenities (array \
of strings), additional_info (object). If required fields are missing or invalid, return an \
empty object {}. Standardize formats (price as float, no extra text). Return a single \
cleaned JSON object.";

/// User message for one extraction chunk.
pub fn format_extract_prompt(chunk: &str) -> String {
    format!(
        "Extract real estate listings from the text below in JSON format.\n{FIELD_GUIDE}\n\
         Discard incomplete listings. Infer currency if needed (e.g. MXN for Mexico). Text:\n\n{chunk}"
    )
}

/// User message for one cleaning request.
pub fn format_clean_prompt(record_json: &str) -> String {
    format!("Clean this JSON listing:\n\n{record_json}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prompt_embeds_chunk_and_fields() {
        let prompt = format_extract_prompt("Casa en venta $2,000,000");
        assert!(prompt.ends_with("Casa en venta $2,000,000"));
        assert!(prompt.contains("`image_link`"));
        assert!(prompt.contains("Discard incomplete listings"));
    }

    #[test]
    fn test_clean_prompt_embeds_record() {
        let prompt = format_clean_prompt(r#"{"price":"1"}"#);
        assert!(prompt.contains(r#"{"price":"1"}"#));
    }

    #[test]
    fn test_clean_system_prompt_asks_for_empty_object() {
        assert!(CLEAN_SYSTEM_PROMPT.contains("empty object {}"));
    }
}
