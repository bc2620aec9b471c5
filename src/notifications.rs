// src/notifications.rs
//! Notification bell: unread badge, recent dropdown, and the background
//! unread-count poller.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{ApiClient, Navigator, Route};
use crate::types::response::{
    Ack, Notification, NotificationListResponse, NotificationStats, StatsEnvelope,
    UnreadCountResponse,
};

pub const RECENT_LIMIT: u32 = 10;
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
const BADGE_CAP: u64 = 99;

/// Badge label; hidden at zero
pub fn badge_text(count: u64) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_CAP => Some(format!("{}+", BADGE_CAP)),
        n => Some(n.to_string()),
    }
}

/// Relative age of a backend timestamp, e.g. "5m ago"
pub fn format_time_ago(created_at: &str, now: DateTime<Utc>) -> String {
    let parsed = DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        });

    let Ok(created) = parsed else {
        return created_at.to_string();
    };

    let elapsed = now.signed_duration_since(created);
    if elapsed.num_minutes() < 1 {
        "Just now".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        created.format("%Y-%m-%d").to_string()
    }
}

#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn unread_count(&self) -> Result<Option<u64>>;
    async fn recent(&self, limit: u32) -> Result<Option<Vec<Notification>>>;
    async fn mark_read(&self, ids: &[String]) -> Result<Option<()>>;
    async fn mark_all_read(&self) -> Result<Option<()>>;
    async fn delete_notification(&self, id: &str) -> Result<Option<()>>;
    async fn job_exists(&self, job_id: &str) -> Result<Option<bool>>;
}

#[async_trait]
impl NotificationSource for ApiClient {
    async fn unread_count(&self) -> Result<Option<u64>> {
        let response: Option<UnreadCountResponse> = self
            .get("/notifications/unread-count")
            .await
            .context("Failed to load unread notification count")?;
        Ok(response.map(|r| r.unread_count))
    }

    async fn recent(&self, limit: u32) -> Result<Option<Vec<Notification>>> {
        let response: Option<NotificationListResponse> = self
            .get_with_query("/notifications", &[("limit", limit)])
            .await
            .context("Failed to load notifications")?;
        Ok(response.map(|r| r.notifications))
    }

    async fn mark_read(&self, ids: &[String]) -> Result<Option<()>> {
        let ack: Option<Ack> = self
            .put_json("/notifications/mark-read", ids)
            .await
            .context("Failed to mark notifications as read")?;
        Ok(ack.map(|_| ()))
    }

    async fn mark_all_read(&self) -> Result<Option<()>> {
        let ack: Option<Ack> = self
            .put_empty("/notifications/mark-all-read")
            .await
            .context("Failed to mark all notifications as read")?;
        Ok(ack.map(|_| ()))
    }

    async fn delete_notification(&self, id: &str) -> Result<Option<()>> {
        let ack: Option<Ack> = self
            .delete(&format!("/notifications/{}", id))
            .await
            .with_context(|| format!("Failed to delete notification {}", id))?;
        Ok(ack.map(|_| ()))
    }

    async fn job_exists(&self, job_id: &str) -> Result<Option<bool>> {
        self.exists(&format!("/jobs/{}", job_id))
            .await
            .with_context(|| format!("Failed to look up job {}", job_id))
    }
}

impl ApiClient {
    pub async fn notification_stats(&self) -> Result<Option<NotificationStats>> {
        let response: Option<StatsEnvelope<NotificationStats>> = self
            .get("/notifications/stats")
            .await
            .context("Failed to load notification stats")?;
        Ok(response.map(|r| r.stats))
    }
}

/// Totals followed by the non-zero type and priority buckets
pub fn render_stats(stats: &NotificationStats) -> Vec<String> {
    let buckets = |counts: &std::collections::BTreeMap<String, u64>| {
        counts
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(name, n)| format!("{} {}", name.replace('_', " "), n))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut lines = vec![format!("{} notifications, {} unread", stats.total, stats.unread)];
    let by_type = buckets(&stats.by_type);
    if !by_type.is_empty() {
        lines.push(format!("  by type: {}", by_type));
    }
    let by_priority = buckets(&stats.by_priority);
    if !by_priority.is_empty() {
        lines.push(format!("  by priority: {}", by_priority));
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Navigated(Route),
    /// The referenced job is gone; stay on the current page
    Missing { job_id: String },
    NoTarget,
    Redirected,
}

pub struct NotificationCenter<S> {
    source: S,
    navigator: Arc<dyn Navigator>,
    unread: u64,
    recent: Vec<Notification>,
}

impl<S: NotificationSource> NotificationCenter<S> {
    pub fn new(source: S, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            source,
            navigator,
            unread: 0,
            recent: Vec::new(),
        }
    }

    pub fn unread(&self) -> u64 {
        self.unread
    }

    pub fn badge(&self) -> Option<String> {
        badge_text(self.unread)
    }

    pub fn recent(&self) -> &[Notification] {
        &self.recent
    }

    /// Overwrite the count with a value published by the poller
    pub fn set_unread(&mut self, count: u64) {
        self.unread = count;
    }

    pub async fn refresh_count(&mut self) -> Result<bool> {
        match self.source.unread_count().await? {
            Some(count) => {
                debug!("Unread notifications: {}", count);
                self.unread = count;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn load_recent(&mut self) -> Result<bool> {
        match self.source.recent(RECENT_LIMIT).await? {
            Some(notifications) => {
                self.recent = notifications;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mark read, then follow the notification's target if it still exists
    pub async fn open(&mut self, notification: &Notification) -> Result<OpenOutcome> {
        if !notification.is_read {
            if self
                .source
                .mark_read(std::slice::from_ref(&notification.id))
                .await?
                .is_none()
            {
                return Ok(OpenOutcome::Redirected);
            }
            self.unread = self.unread.saturating_sub(1);
            if let Some(local) = self.recent.iter_mut().find(|n| n.id == notification.id) {
                local.is_read = true;
            }
        }

        if let Some(job_id) = &notification.related_job_id {
            return match self.source.job_exists(job_id).await? {
                Some(true) => Ok(self.follow(Route::Job(job_id.clone()))),
                Some(false) => {
                    warn!("Job {} from notification {} no longer exists", job_id, notification.id);
                    Ok(OpenOutcome::Missing {
                        job_id: job_id.clone(),
                    })
                }
                None => Ok(OpenOutcome::Redirected),
            };
        }

        match &notification.action_url {
            Some(url) if !url.trim().is_empty() => Ok(self.follow(Route::External(url.clone()))),
            _ => Ok(OpenOutcome::NoTarget),
        }
    }

    fn follow(&self, route: Route) -> OpenOutcome {
        self.navigator.navigate(&route);
        OpenOutcome::Navigated(route)
    }

    pub async fn mark_all_read(&mut self) -> Result<bool> {
        if self.source.mark_all_read().await?.is_none() {
            return Ok(false);
        }
        info!("Marked all notifications as read");
        self.refresh().await
    }

    pub async fn delete(&mut self, id: &str) -> Result<bool> {
        if self.source.delete_notification(id).await?.is_none() {
            return Ok(false);
        }
        info!("Deleted notification {}", id);
        self.refresh().await
    }

    async fn refresh(&mut self) -> Result<bool> {
        Ok(self.refresh_count().await? && self.load_recent().await?)
    }

    /// Dropdown lines, unread entries marked with `*`
    pub fn render_dropdown(&self, now: DateTime<Utc>) -> Vec<String> {
        if self.recent.is_empty() {
            return vec!["No notifications".to_string()];
        }
        self.recent
            .iter()
            .map(|n| {
                let marker = if n.is_read { ' ' } else { '*' };
                let age = n
                    .created_at
                    .as_deref()
                    .map(|ts| format_time_ago(ts, now))
                    .unwrap_or_default();
                format!("{} {} ({})\n  {}", marker, n.title, age, n.message)
            })
            .collect()
    }
}

/// Poll the unread count every `period`, starting immediately. The task
/// stops once the session ends or every receiver is dropped.
pub fn spawn_unread_poller<S>(source: Arc<S>, period: Duration) -> (JoinHandle<()>, watch::Receiver<u64>)
where
    S: NotificationSource + ?Sized + 'static,
{
    let (tx, rx) = watch::channel(0);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match source.unread_count().await {
                Ok(Some(count)) => {
                    if tx.send(count).is_err() {
                        debug!("No badge listeners left, stopping poller");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Session ended, stopping notification poller");
                    break;
                }
                Err(e) => warn!("Unread count poll failed: {:#}", e),
            }
        }
    });

    (handle, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoggingNavigator;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeNotifications {
        count: AtomicU64,
        existing_jobs: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeNotifications {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSource for FakeNotifications {
        async fn unread_count(&self) -> Result<Option<u64>> {
            self.log("count");
            Ok(Some(self.count.fetch_add(1, Ordering::SeqCst) + 1))
        }

        async fn recent(&self, limit: u32) -> Result<Option<Vec<Notification>>> {
            self.log(format!("recent {}", limit));
            Ok(Some(vec![notification("n1", None, None)]))
        }

        async fn mark_read(&self, ids: &[String]) -> Result<Option<()>> {
            self.log(format!("read {}", ids.join(",")));
            Ok(Some(()))
        }

        async fn mark_all_read(&self) -> Result<Option<()>> {
            self.log("read all");
            Ok(Some(()))
        }

        async fn delete_notification(&self, id: &str) -> Result<Option<()>> {
            self.log(format!("delete {}", id));
            Ok(Some(()))
        }

        async fn job_exists(&self, job_id: &str) -> Result<Option<bool>> {
            self.log(format!("exists {}", job_id));
            Ok(Some(self.existing_jobs.iter().any(|j| j == job_id)))
        }
    }

    fn notification(id: &str, job: Option<&str>, url: Option<&str>) -> Notification {
        Notification {
            id: id.to_string(),
            notification_type: Some("new_job".to_string()),
            title: "New match".to_string(),
            message: "A job matches your profile".to_string(),
            priority: None,
            related_job_id: job.map(str::to_string),
            action_url: url.map(str::to_string),
            is_read: false,
            created_at: None,
        }
    }

    fn center(existing_jobs: &[&str]) -> (NotificationCenter<FakeNotifications>, Arc<LoggingNavigator>) {
        let navigator = Arc::new(LoggingNavigator::new());
        let source = FakeNotifications {
            existing_jobs: existing_jobs.iter().map(|j| j.to_string()).collect(),
            ..Default::default()
        };
        (NotificationCenter::new(source, navigator.clone()), navigator)
    }

    #[test]
    fn test_badge_text() {
        assert_eq!(badge_text(0), None);
        assert_eq!(badge_text(7), Some("7".to_string()));
        assert_eq!(badge_text(99), Some("99".to_string()));
        assert_eq!(badge_text(100), Some("99+".to_string()));
        assert_eq!(badge_text(250), Some("99+".to_string()));
    }

    #[test]
    fn test_time_ago() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(format_time_ago("2025-03-10T11:59:30Z", now), "Just now");
        assert_eq!(format_time_ago("2025-03-10T11:15:00+00:00", now), "45m ago");
        assert_eq!(format_time_ago("2025-03-10T06:59:00.123456", now), "5h ago");
        assert_eq!(format_time_ago("2025-03-08T12:00:00", now), "2d ago");
        assert_eq!(format_time_ago("2025-01-01T00:00:00Z", now), "2025-01-01");
        assert_eq!(format_time_ago("yesterday", now), "yesterday");
    }

    #[tokio::test]
    async fn test_open_existing_job_navigates() {
        let (mut center, navigator) = center(&["job-1"]);
        center.set_unread(3);

        let outcome = center
            .open(&notification("n1", Some("job-1"), None))
            .await
            .unwrap();
        assert_eq!(outcome, OpenOutcome::Navigated(Route::Job("job-1".to_string())));
        assert_eq!(navigator.last(), Some(Route::Job("job-1".to_string())));
        assert_eq!(center.unread(), 2);
        assert_eq!(center.source.calls(), vec!["read n1", "exists job-1"]);
    }

    #[tokio::test]
    async fn test_open_deleted_job_stays_put() {
        let (mut center, navigator) = center(&[]);
        let outcome = center
            .open(&notification("n1", Some("gone"), Some("/student/jobs/gone")))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            OpenOutcome::Missing {
                job_id: "gone".to_string()
            }
        );
        assert!(navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_open_read_notification_skips_mark_read() {
        let (mut center, navigator) = center(&[]);
        let mut read = notification("n2", None, Some("/student/dashboard"));
        read.is_read = true;

        let outcome = center.open(&read).await.unwrap();
        assert_eq!(
            outcome,
            OpenOutcome::Navigated(Route::External("/student/dashboard".to_string()))
        );
        assert_eq!(navigator.history().len(), 1);
        assert!(center.source.calls().is_empty());

        let plain = Notification {
            is_read: true,
            ..notification("n3", None, None)
        };
        assert_eq!(center.open(&plain).await.unwrap(), OpenOutcome::NoTarget);
    }

    #[tokio::test]
    async fn test_mark_all_and_delete_refresh_count_and_list() {
        let (mut center, _) = center(&[]);
        assert!(center.mark_all_read().await.unwrap());
        assert!(center.delete("n9").await.unwrap());
        assert_eq!(
            center.source.calls(),
            vec!["read all", "count", "recent 10", "delete n9", "count", "recent 10"]
        );
        assert_eq!(center.recent().len(), 1);
    }

    #[tokio::test]
    async fn test_dropdown_rendering() {
        let (mut center, _) = center(&[]);
        let now = Utc::now();
        assert_eq!(center.render_dropdown(now), vec!["No notifications"]);

        center.load_recent().await.unwrap();
        let lines = center.render_dropdown(now);
        assert!(lines[0].starts_with("* New match"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_publishes_on_interval() {
        let source = Arc::new(FakeNotifications::default());
        let start = tokio::time::Instant::now();
        let (handle, mut rx) = spawn_unread_poller(source.clone(), POLL_INTERVAL);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert!(start.elapsed() < POLL_INTERVAL);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 2);
        assert!(start.elapsed() >= POLL_INTERVAL);

        drop(rx);
        tokio::time::sleep(POLL_INTERVAL).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_notification_stats_decode_and_render() {
        use crate::core::service_client::test_server::{http_response, serve_once};
        use crate::core::SessionStore;

        let body = r#"{"success":true,"stats":{"total":12,"unread":3,
            "by_type":{"job_posted":10,"job_deadline":0,"system":2},
            "by_priority":{"low":0,"medium":11,"urgent":1}}}"#;
        let (base_url, request) = serve_once(http_response("200 OK", body)).await;
        let api = ApiClient::new(
            &base_url,
            5,
            SessionStore::in_memory(),
            Arc::new(LoggingNavigator::new()),
        )
        .unwrap();

        let stats = api.notification_stats().await.unwrap().unwrap();
        assert_eq!(
            render_stats(&stats),
            vec![
                "12 notifications, 3 unread",
                "  by type: job posted 10, system 2",
                "  by priority: medium 11, urgent 1",
            ]
        );
        assert!(request.await.unwrap().starts_with("GET /notifications/stats "));
    }

    #[tokio::test]
    async fn test_delete_after_session_end_reports_redirect() {
        use crate::core::service_client::test_server::{http_response, serve_once};
        use crate::core::SessionStore;

        let (base_url, request) = serve_once(http_response("401 Unauthorized", "{}")).await;
        let session = SessionStore::in_memory();
        session.set_token("expired").unwrap();
        let nav = Arc::new(LoggingNavigator::new());
        let api = ApiClient::new(&base_url, 5, session.clone(), nav.clone()).unwrap();
        let mut center = NotificationCenter::new(api, nav.clone());

        assert!(!center.delete("n1").await.unwrap());
        assert!(!session.is_logged_in());
        assert_eq!(nav.last(), Some(Route::Login));
        assert!(request.await.unwrap().starts_with("DELETE /notifications/n1 "));
    }
}
