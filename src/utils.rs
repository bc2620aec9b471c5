// src/utils.rs
use chrono::NaiveDate;

use crate::types::ValidationWarning;

/// Trim a form value, mapping blank input to `None`
pub fn trim_to_option(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a comma-delimited tag list, dropping blanks and repeats
pub fn split_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Flatten tags that still carry delimiters into single tags
pub fn flatten_tags(tags: &[String]) -> Vec<String> {
    split_tags(&tags.join(","))
}

/// Validate a "YYYY-MM" month value
pub fn parse_month(field: &'static str, value: &str) -> Result<String, ValidationWarning> {
    let trimmed = value.trim();
    let valid = trimmed.len() == 7
        && NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d").is_ok();

    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationWarning::InvalidMonth {
            field,
            value: trimmed.to_string(),
        })
    }
}

/// Same as [`parse_month`] but blank input is allowed
pub fn parse_optional_month(
    field: &'static str,
    value: &str,
) -> Result<Option<String>, ValidationWarning> {
    match trim_to_option(value) {
        Some(month) => parse_month(field, &month).map(Some),
        None => Ok(None),
    }
}

/// Normalize the login role carried across the OAuth round-trip
pub fn normalize_role(role: Option<&str>) -> String {
    match role.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("institution") | Some("college") => "institution".to_string(),
        Some("admin") => "admin".to_string(),
        _ => "student".to_string(),
    }
}

/// Shorten text for list cards, cutting on a char boundary
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_to_option() {
        assert_eq!(trim_to_option("  Rust "), Some("Rust".to_string()));
        assert_eq!(trim_to_option("   "), None);
        assert_eq!(trim_to_option(""), None);
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(
            split_tags("React, Node.js,,  MongoDB ,React"),
            vec!["React", "Node.js", "MongoDB"]
        );
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn test_flatten_tags() {
        let tags = vec!["Rust, Tokio".to_string(), " Serde ".to_string()];
        assert_eq!(flatten_tags(&tags), vec!["Rust", "Tokio", "Serde"]);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("start_date", "2024-06").unwrap(), "2024-06");
        assert!(parse_month("start_date", "2024-13").is_err());
        assert!(parse_month("start_date", "June 2024").is_err());
        assert_eq!(parse_optional_month("end_date", " ").unwrap(), None);
    }

    #[test]
    fn test_normalize_role() {
        assert_eq!(normalize_role(Some("Institution")), "institution");
        assert_eq!(normalize_role(Some("unknown")), "student");
        assert_eq!(normalize_role(None), "student");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a long description", 6), "a long...");
    }
}
