// src/types/warning.rs
//! User-facing validation warnings. These block a transition or a save but
//! leave every piece of state untouched, so the user can fix the form and retry.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    MissingField {
        section: &'static str,
        field: &'static str,
    },
    EmptyCollection {
        section: &'static str,
    },
    InvalidNumber {
        field: &'static str,
        value: String,
    },
    InvalidChoice {
        field: &'static str,
        value: String,
    },
    InvalidMonth {
        field: &'static str,
        value: String,
    },
    MissingTechnologyTags,
    NoSuchEntry {
        section: &'static str,
        index: usize,
    },
    EmptyQuery,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { section, field } => {
                write!(f, "Please fill in the {} field ({})", field, section)
            }
            Self::EmptyCollection { section } => {
                write!(f, "Please add at least one {} entry", section)
            }
            Self::InvalidNumber { field, value } => {
                write!(f, "'{}' is not a valid number for {}", value, field)
            }
            Self::InvalidChoice { field, value } => {
                write!(f, "'{}' is not a valid choice for {}", value, field)
            }
            Self::InvalidMonth { field, value } => {
                write!(f, "'{}' is not a valid month for {} (expected YYYY-MM)", value, field)
            }
            Self::MissingTechnologyTags => {
                write!(f, "Please add at least one technology tag")
            }
            Self::NoSuchEntry { section, index } => {
                write!(f, "No {} entry at position {}", section, index + 1)
            }
            Self::EmptyQuery => write!(f, "Please enter a question"),
        }
    }
}

impl std::error::Error for ValidationWarning {}
