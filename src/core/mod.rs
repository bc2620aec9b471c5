// src/core/mod.rs
//! Shared plumbing: configuration, persisted session, navigation and the
//! authenticated HTTP client

pub mod config_manager;
pub mod fs_ops;
pub mod navigation;
pub mod service_client;
pub mod session;

pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use navigation::{LoggingNavigator, Navigator, Route};
pub use service_client::ApiClient;
pub use session::SessionStore;
