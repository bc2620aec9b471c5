// src/types/mod.rs
pub mod profile;
pub mod response;
pub mod warning;

pub use profile::DraftProfile;
pub use warning::ValidationWarning;
