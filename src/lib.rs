//! Typed client for the job-discovery portal backend: session handling,
//! the profile wizard, job browsing, notifications and analytics.

pub mod analytics;
pub mod auth;
pub mod core;
pub mod jobs;
pub mod notifications;
pub mod profile;
pub mod render;
pub mod types;
pub mod utils;
pub mod wizard;

pub use crate::core::{ApiClient, ConfigManager, LoggingNavigator, Navigator, Route, SessionStore};
pub use crate::types::{DraftProfile, ValidationWarning};
