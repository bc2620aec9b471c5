// src/core/navigation.rs
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    CompleteProfile,
    StudentDashboard,
    InstitutionDashboard,
    Job(String),
    /// An absolute URL or app path supplied by the backend
    External(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::CompleteProfile => "/student/complete-profile".to_string(),
            Self::StudentDashboard => "/student/dashboard".to_string(),
            Self::InstitutionDashboard => "/institution/dashboard".to_string(),
            Self::Job(id) => format!("/student/jobs/{}", id),
            Self::External(url) => url.clone(),
        }
    }
}

/// Page navigation, the shape of `window.location`
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Logs every navigation and remembers the latest one
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    history: Mutex<Vec<Route>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<Route> {
        self.history.lock().ok()?.last().cloned()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &Route) {
        info!("Navigating to {}", route.path());
        if let Ok(mut history) = self.history.lock() {
            history.push(route.clone());
        }
    }
}
