//! Scraped page text cleanup.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref URL_REGEX: Regex = Regex::new(r"http\S+").unwrap();
    static ref BRACKET_REGEX: Regex = Regex::new(r"\[.*?\]").unwrap();
}

/// Strip markup, bare URLs and `[...]` annotations, then collapse whitespace.
///
/// Total and pure: any input yields a (possibly empty) single-spaced string.
pub fn normalize_text(text: &str) -> String {
    let text = TAG_REGEX.replace_all(text, "");
    let text = URL_REGEX.replace_all(&text, "");
    let text = BRACKET_REGEX.replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        assert_eq!(
            normalize_text("<div class=\"card\"><b>Casa</b> en venta</div>"),
            "Casa en venta"
        );
    }

    #[test]
    fn test_strips_urls_and_brackets() {
        let raw = "Photos https://cdn.example.com/a.jpg here [Image 3] and [link](x)";
        assert_eq!(normalize_text(raw), "Photos here and (x)");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize_text("  3 bed\n\n\t2  bath  "), "3 bed 2 bath");
    }

    #[test]
    fn test_empty_and_noise_only() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("<br/> [x] http://a.b"), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_text("<p>Lovely   home</p> [ad] $250,000");
        assert_eq!(normalize_text(&once), once);
    }
}
