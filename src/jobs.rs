// src/jobs.rs
//! Paginated job listing with filters, plus the per-job student actions

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::ApiClient;
use crate::types::response::{
    Ack, ApplicationListResponse, ApplicationStatus, JobApplication, JobCountResponse,
    JobDetailResponse, JobListResponse, JobSummary, Pagination, StatsEnvelope, StudentJobList,
    StudentJobStats,
};
use crate::utils::{trim_to_option, truncate_text};

pub const PAGE_SIZE: u32 = 20;
/// Default similarity floor for personalised matches, in percent
pub const DEFAULT_MIN_SCORE: u8 = 80;
const DESCRIPTION_PREVIEW: usize = 120;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilters {
    pub job_type: Option<String>,
    pub source: Option<String>,
    pub location: Option<String>,
}

impl JobFilters {
    pub fn new(job_type: &str, source: &str, location: &str) -> Self {
        Self {
            job_type: trim_to_option(job_type),
            source: trim_to_option(source),
            location: trim_to_option(location),
        }
    }

    /// Query pairs for one page; unset filters are left out entirely
    pub fn to_query(&self, page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.to_string()), ("limit", PAGE_SIZE.to_string())];
        for (key, value) in [
            ("job_type", &self.job_type),
            ("source", &self.source),
            ("location", &self.location),
        ] {
            if let Some(value) = value.as_deref().and_then(trim_to_option) {
                query.push((key, value));
            }
        }
        query
    }
}

#[derive(Debug, Clone)]
pub struct JobPage {
    pub jobs: Vec<JobSummary>,
    pub pagination: Pagination,
}

#[async_trait]
pub trait JobSource: Send + Sync {
    async fn fetch_page(&self, page: u32, filters: &JobFilters) -> Result<Option<JobPage>>;
}

#[async_trait]
impl JobSource for ApiClient {
    async fn fetch_page(&self, page: u32, filters: &JobFilters) -> Result<Option<JobPage>> {
        let query = filters.to_query(page);
        let response: Option<JobListResponse> = self
            .get_with_query("/jobs/list", &query)
            .await
            .with_context(|| format!("Failed to load jobs page {}", page))?;

        Ok(response.map(|response| {
            let total = response
                .total
                .unwrap_or(response.jobs.len() as u64);
            let pagination = response
                .pagination
                .unwrap_or_else(|| Pagination::from_total(page, PAGE_SIZE, total));
            JobPage {
                jobs: response.jobs,
                pagination,
            }
        }))
    }
}

impl ApiClient {
    pub async fn job_count(&self) -> Result<Option<u64>> {
        let response: Option<JobCountResponse> = self
            .get("/jobs/stats/count")
            .await
            .context("Failed to load job count")?;
        Ok(response.map(|r| r.count))
    }

    pub async fn job_details(&self, job_id: &str) -> Result<Option<JobSummary>> {
        let response: Option<JobDetailResponse> = self
            .get(&format!("/jobs/{}", job_id))
            .await
            .with_context(|| format!("Failed to load job {}", job_id))?;
        Ok(response.map(|r| r.job))
    }

    pub async fn apply_to_job(&self, job_id: &str) -> Result<Option<Ack>> {
        info!("Applying to job {}", job_id);
        self.post_json(&format!("/student/jobs/{}/apply", job_id), &serde_json::json!({}))
            .await
            .with_context(|| format!("Failed to apply to job {}", job_id))
    }

    pub async fn bookmark_job(&self, job_id: &str) -> Result<Option<Ack>> {
        self.post_json(
            &format!("/student/jobs/{}/bookmark", job_id),
            &serde_json::json!({}),
        )
        .await
        .with_context(|| format!("Failed to bookmark job {}", job_id))
    }

    pub async fn unbookmark_job(&self, job_id: &str) -> Result<Option<Ack>> {
        self.delete(&format!("/student/jobs/{}/bookmark", job_id))
            .await
            .with_context(|| format!("Failed to remove bookmark on job {}", job_id))
    }

    pub async fn application_status(&self, job_id: &str) -> Result<Option<ApplicationStatus>> {
        self.get(&format!("/student/jobs/{}/check-status", job_id))
            .await
            .with_context(|| format!("Failed to check status of job {}", job_id))
    }

    /// Run the requested actions in order, then report the job's status.
    /// Stops with `Ok(None)` at the first call that ends the session.
    pub async fn act_on_job(
        &self,
        job_id: &str,
        actions: JobActions,
    ) -> Result<Option<ApplicationStatus>> {
        if actions.apply && self.apply_to_job(job_id).await?.is_none() {
            return Ok(None);
        }
        if actions.bookmark && self.bookmark_job(job_id).await?.is_none() {
            return Ok(None);
        }
        if actions.unbookmark && self.unbookmark_job(job_id).await?.is_none() {
            return Ok(None);
        }
        self.application_status(job_id).await
    }

    /// Skill-matched listings, newest first
    pub async fn recommended_jobs(&self, limit: u32) -> Result<Option<StudentJobList>> {
        self.get_with_query("/student/jobs/recommended", &[("limit", limit)])
            .await
            .context("Failed to load recommended jobs")
    }

    pub async fn top_matches(&self, limit: u32) -> Result<Option<StudentJobList>> {
        self.get_with_query("/student/jobs/top-matches", &[("limit", limit)])
            .await
            .context("Failed to load top job matches")
    }

    /// One page of personalised matches at or above `min_score` percent
    pub async fn jobs_for_me(&self, page: u32, min_score: u8) -> Result<Option<StudentJobList>> {
        let query = [
            ("page", page.to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("min_score", min_score.min(100).to_string()),
        ];
        self.get_with_query("/student/jobs/for-me", &query)
            .await
            .with_context(|| format!("Failed to load personalised jobs page {}", page))
    }

    pub async fn my_applications(
        &self,
        status: Option<&str>,
    ) -> Result<Option<ApplicationListResponse>> {
        let mut query = Vec::new();
        if let Some(status) = status.and_then(trim_to_option) {
            query.push(("status", status));
        }
        self.get_with_query("/student/jobs/my-applications", &query)
            .await
            .context("Failed to load applications")
    }

    pub async fn bookmarked_jobs(&self) -> Result<Option<StudentJobList>> {
        self.get("/student/jobs/bookmarks")
            .await
            .context("Failed to load bookmarked jobs")
    }

    pub async fn student_job_stats(&self) -> Result<Option<StudentJobStats>> {
        let response: Option<StatsEnvelope<StudentJobStats>> = self
            .get("/student/jobs/stats")
            .await
            .context("Failed to load application stats")?;
        Ok(response.map(|r| r.stats))
    }
}

/// Personalised matches paged through [`JobsBrowser`]. The listing filters
/// do not apply to this feed.
#[derive(Clone)]
pub struct ForMeFeed {
    api: ApiClient,
    min_score: u8,
}

impl ForMeFeed {
    pub fn new(api: ApiClient, min_score: u8) -> Self {
        Self { api, min_score }
    }
}

#[async_trait]
impl JobSource for ForMeFeed {
    async fn fetch_page(&self, page: u32, _filters: &JobFilters) -> Result<Option<JobPage>> {
        let Some(list) = self.api.jobs_for_me(page, self.min_score).await? else {
            return Ok(None);
        };
        if list.has_quality_matches == Some(false) {
            if let Some(message) = &list.message {
                info!("{}", message);
            }
        }
        let total = list.total.unwrap_or(list.jobs.len() as u64);
        let pagination = list
            .pagination
            .unwrap_or_else(|| Pagination::from_total(page, PAGE_SIZE, total));
        Ok(Some(JobPage {
            jobs: list.jobs,
            pagination,
        }))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobActions {
    pub apply: bool,
    pub bookmark: bool,
    pub unbookmark: bool,
}

/// Page counter and filters; every move re-fetches, nothing is cached
pub struct JobsBrowser<S> {
    source: S,
    page: u32,
    filters: JobFilters,
    current: Option<JobPage>,
}

impl<S: JobSource> JobsBrowser<S> {
    pub fn new(source: S) -> Self {
        Self::with_filters(source, JobFilters::default())
    }

    pub fn with_filters(source: S, filters: JobFilters) -> Self {
        Self {
            source,
            page: 1,
            filters,
            current: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn filters(&self) -> &JobFilters {
        &self.filters
    }

    pub fn current(&self) -> Option<&JobPage> {
        self.current.as_ref()
    }

    /// Fetch the current page. `Ok(false)` after an auth redirect.
    pub async fn load(&mut self) -> Result<bool> {
        self.fetch(self.page).await
    }

    /// The page counter moves only once the target page has arrived
    async fn fetch(&mut self, page: u32) -> Result<bool> {
        debug!("Loading jobs page {} with {:?}", page, self.filters);
        match self.source.fetch_page(page, &self.filters).await? {
            Some(loaded) => {
                info!(
                    "Loaded {} jobs (page {} of {})",
                    loaded.jobs.len(),
                    loaded.pagination.page,
                    loaded.pagination.total_pages
                );
                self.page = page;
                self.current = Some(loaded);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn set_filters(&mut self, filters: JobFilters) -> Result<bool> {
        self.filters = filters;
        self.page = 1;
        self.load().await
    }

    pub async fn goto_page(&mut self, page: u32) -> Result<bool> {
        self.fetch(page.max(1)).await
    }

    /// Advance only when the last response reported a next page
    pub async fn next_page(&mut self) -> Result<bool> {
        let has_next = self
            .current
            .as_ref()
            .is_some_and(|page| page.pagination.has_next);
        if !has_next {
            return Ok(false);
        }
        self.fetch(self.page + 1).await
    }

    pub async fn prev_page(&mut self) -> Result<bool> {
        if self.page <= 1 {
            return Ok(false);
        }
        self.fetch(self.page - 1).await
    }

    pub fn render_cards(&self) -> Vec<String> {
        let Some(page) = &self.current else {
            return Vec::new();
        };
        page.jobs.iter().map(render_card).collect()
    }

    pub fn render_pagination(&self) -> String {
        let Some(page) = &self.current else {
            return String::new();
        };
        let p = &page.pagination;
        let mut out = format!(
            "Page {} of {} ({} jobs)",
            p.page,
            p.total_pages.max(1),
            p.total_count
        );
        if p.has_prev {
            out.push_str(" [prev]");
        }
        if p.has_next {
            out.push_str(" [next]");
        }
        out
    }
}

pub fn render_card(job: &JobSummary) -> String {
    let mut card = job.title.clone();
    if let Some(company) = &job.company {
        card.push_str(&format!(" @ {}", company));
    }

    let details: Vec<&str> = [&job.location, &job.job_type, &job.salary_range, &job.source]
        .into_iter()
        .filter_map(|field| field.as_deref())
        .collect();
    if !details.is_empty() {
        card.push_str(&format!("\n  {}", details.join(" | ")));
    }
    if let Some(description) = &job.description {
        card.push_str(&format!(
            "\n  {}",
            truncate_text(description, DESCRIPTION_PREVIEW)
        ));
    }
    card.push_str(&format!("\n  id: {}", job.id));
    card
}

pub fn render_application(application: &JobApplication) -> String {
    let title = match &application.job {
        Some(job) => match &job.company {
            Some(company) => format!("{} @ {}", job.title, company),
            None => job.title.clone(),
        },
        None => format!("Job {}", application.job_id.as_deref().unwrap_or("?")),
    };
    let mut line = format!(
        "{} [{}]",
        title,
        application.status.as_deref().unwrap_or("pending")
    );
    if let Some(applied_at) = &application.applied_at {
        line.push_str(&format!("\n  applied {}", applied_at));
    }
    line
}

pub fn render_job_stats(stats: &StudentJobStats) -> Vec<String> {
    vec![
        format!(
            "Applications: {} ({} pending, {} shortlisted, {} selected, {} rejected)",
            stats.total_applications,
            stats.pending_applications,
            stats.shortlisted,
            stats.selected,
            stats.rejected
        ),
        format!("Bookmarks: {}", stats.total_bookmarks),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingJobs {
        calls: Mutex<Vec<(u32, JobFilters)>>,
        total: u64,
        /// 1-based call number that fails with a transport error
        fail_on_call: Option<usize>,
    }

    #[async_trait]
    impl JobSource for CountingJobs {
        async fn fetch_page(&self, page: u32, filters: &JobFilters) -> Result<Option<JobPage>> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((page, filters.clone()));
                calls.len()
            };
            if self.fail_on_call == Some(call) {
                anyhow::bail!("connection reset");
            }
            let jobs = vec![JobSummary {
                id: format!("job-{}", page),
                title: "Backend Intern".to_string(),
                company: Some("Acme".to_string()),
                location: Some("Remote".to_string()),
                job_type: Some("Internship".to_string()),
                source: None,
                salary_range: None,
                experience_required: None,
                skills_required: None,
                description: None,
                posted_at: None,
                application_deadline: None,
                apply_url: None,
            }];
            Ok(Some(JobPage {
                jobs,
                pagination: Pagination::from_total(page, PAGE_SIZE, self.total),
            }))
        }
    }

    fn browser(total: u64) -> JobsBrowser<CountingJobs> {
        JobsBrowser::new(CountingJobs {
            total,
            ..Default::default()
        })
    }

    #[test]
    fn test_query_omits_empty_filters() {
        let filters = JobFilters::new("Internship", "  ", "");
        let query = filters.to_query(3);
        assert_eq!(
            query,
            vec![
                ("page", "3".to_string()),
                ("limit", "20".to_string()),
                ("job_type", "Internship".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_next_and_prev_fetch_once_with_same_filters() {
        let mut jobs = browser(45);
        let filters = JobFilters::new("", "linkedin", "Pune");
        jobs.set_filters(filters.clone()).await.unwrap();

        assert!(jobs.next_page().await.unwrap());
        assert_eq!(jobs.page(), 2);
        assert!(jobs.prev_page().await.unwrap());
        assert_eq!(jobs.page(), 1);

        let calls = jobs.source.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, f)| f == &filters));
        assert_eq!(
            calls.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
            vec![1, 2, 1]
        );
    }

    #[tokio::test]
    async fn test_prev_on_first_page_is_noop() {
        let mut jobs = browser(45);
        jobs.load().await.unwrap();
        assert!(!jobs.prev_page().await.unwrap());
        assert_eq!(jobs.page(), 1);
        assert_eq!(jobs.source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_next_stops_at_last_page() {
        let mut jobs = browser(30);
        jobs.load().await.unwrap();
        assert!(jobs.next_page().await.unwrap());
        assert!(!jobs.next_page().await.unwrap());
        assert_eq!(jobs.page(), 2);
        assert_eq!(jobs.source.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_next_keeps_page_and_retries_same_page() {
        let mut jobs = JobsBrowser::new(CountingJobs {
            total: 60,
            fail_on_call: Some(2),
            ..Default::default()
        });
        jobs.load().await.unwrap();

        assert!(jobs.next_page().await.is_err());
        assert_eq!(jobs.page(), 1);
        assert_eq!(jobs.current().unwrap().pagination.page, 1);

        assert!(jobs.next_page().await.unwrap());
        assert_eq!(jobs.page(), 2);
        let pages: Vec<u32> = jobs.source.calls.lock().unwrap().iter().map(|(p, _)| *p).collect();
        assert_eq!(pages, vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_failed_goto_keeps_page() {
        let mut jobs = JobsBrowser::new(CountingJobs {
            total: 100,
            fail_on_call: Some(1),
            ..Default::default()
        });
        assert!(jobs.goto_page(3).await.is_err());
        assert_eq!(jobs.page(), 1);
        assert!(jobs.current().is_none());
    }

    #[tokio::test]
    async fn test_filters_reset_page() {
        let mut jobs = browser(100);
        jobs.goto_page(4).await.unwrap();
        jobs.set_filters(JobFilters::new("Full-time", "", ""))
            .await
            .unwrap();
        assert_eq!(jobs.page(), 1);
    }

    #[tokio::test]
    async fn test_rendering() {
        let mut jobs = browser(45);
        assert!(jobs.render_cards().is_empty());
        jobs.goto_page(2).await.unwrap();

        let cards = jobs.render_cards();
        assert_eq!(cards.len(), 1);
        assert!(cards[0].starts_with("Backend Intern @ Acme\n  Remote | Internship"));
        assert_eq!(
            jobs.render_pagination(),
            "Page 2 of 3 (45 jobs) [prev] [next]"
        );
    }

    #[tokio::test]
    async fn test_client_sends_page_and_filters() {
        use crate::core::service_client::test_server::{http_response, serve_once};
        use crate::core::{LoggingNavigator, SessionStore};
        use std::sync::Arc;

        let body = r#"{"jobs": [{"_id": "j1", "title": "SRE"}], "total": 21}"#;
        let (base_url, request) = serve_once(http_response("200 OK", body)).await;
        let api = ApiClient::new(
            &base_url,
            5,
            SessionStore::in_memory(),
            Arc::new(LoggingNavigator::new()),
        )
        .unwrap();

        let page = api
            .fetch_page(1, &JobFilters::new("", "", "Delhi"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.jobs[0].id, "j1");
        assert_eq!(page.pagination.total_pages, 2);
        assert!(page.pagination.has_next);

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /jobs/list?page=1&limit=20&location=Delhi "));
    }

    fn api_for(base_url: &str) -> ApiClient {
        use crate::core::{LoggingNavigator, SessionStore};
        use std::sync::Arc;

        let session = SessionStore::in_memory();
        session.set_token("jwt").unwrap();
        ApiClient::new(base_url, 5, session, Arc::new(LoggingNavigator::new())).unwrap()
    }

    #[tokio::test]
    async fn test_job_actions_stop_when_session_ends() {
        use crate::core::service_client::test_server::{http_response, serve_once};
        use crate::core::{LoggingNavigator, Route, SessionStore};
        use std::sync::Arc;

        // a single connection is served; any follow-up call would fail to connect
        let (base_url, request) = serve_once(http_response("401 Unauthorized", "{}")).await;
        let session = SessionStore::in_memory();
        session.set_token("expired").unwrap();
        let nav = Arc::new(LoggingNavigator::new());
        let api = ApiClient::new(&base_url, 5, session.clone(), nav.clone()).unwrap();

        let actions = JobActions {
            apply: true,
            bookmark: true,
            unbookmark: false,
        };
        let status = api.act_on_job("j1", actions).await.unwrap();
        assert!(status.is_none());
        assert!(!session.is_logged_in());
        assert_eq!(nav.last(), Some(Route::Login));
        assert!(request.await.unwrap().starts_with("POST /student/jobs/j1/apply "));
    }

    #[tokio::test]
    async fn test_for_me_feed_pages_with_score_floor() {
        use crate::core::service_client::test_server::{http_response, serve_once};

        let body = r#"{"success":true,"has_quality_matches":true,"jobs":[{"_id":"m1","title":"ML Intern"}],
            "pagination":{"page":2,"limit":20,"total_count":41,"total_pages":3,"has_next":true,"has_prev":true}}"#;
        let (base_url, request) = serve_once(http_response("200 OK", body)).await;

        let mut browser = JobsBrowser::new(ForMeFeed::new(api_for(&base_url), 120));
        assert!(browser.goto_page(2).await.unwrap());
        assert_eq!(browser.page(), 2);
        assert_eq!(
            browser.render_pagination(),
            "Page 2 of 3 (41 jobs) [prev] [next]"
        );

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /student/jobs/for-me?page=2&limit=20&min_score=100 "));
    }

    #[tokio::test]
    async fn test_bookmarks_tolerate_missing_fields() {
        use crate::core::service_client::test_server::{http_response, serve_once};

        let body = r#"{"success":true,"jobs":[{"_id":"b1","title":"Data Analyst","company":"Acme",
            "bookmarked_at":"2026-01-04T10:00:00"}],"total":1}"#;
        let (base_url, request) = serve_once(http_response("200 OK", body)).await;

        let list = api_for(&base_url).bookmarked_jobs().await.unwrap().unwrap();
        assert_eq!(list.total, Some(1));
        assert!(render_card(&list.jobs[0]).starts_with("Data Analyst @ Acme"));
        assert!(request.await.unwrap().starts_with("GET /student/jobs/bookmarks "));
    }

    #[tokio::test]
    async fn test_applications_filter_by_status() {
        use crate::core::service_client::test_server::{http_response, serve_once};

        let body = r#"{"success":true,"total":2,"applications":[
            {"_id":"a1","job_id":"j1","status":"shortlisted","applied_at":"2026-02-01T09:30:00",
             "job":{"_id":"j1","title":"SRE","company":"Initech"}},
            {"_id":"a2","job_id":"j9","status":null}]}"#;
        let (base_url, request) = serve_once(http_response("200 OK", body)).await;

        let list = api_for(&base_url)
            .my_applications(Some(" shortlisted "))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(
            render_application(&list.applications[0]),
            "SRE @ Initech [shortlisted]\n  applied 2026-02-01T09:30:00"
        );
        assert_eq!(render_application(&list.applications[1]), "Job j9 [pending]");
        assert!(request
            .await
            .unwrap()
            .starts_with("GET /student/jobs/my-applications?status=shortlisted "));
    }

    #[test]
    fn test_render_job_stats() {
        let stats = StudentJobStats {
            total_applications: 5,
            pending_applications: 2,
            shortlisted: 1,
            selected: 1,
            rejected: 1,
            total_bookmarks: 7,
        };
        assert_eq!(
            render_job_stats(&stats),
            vec![
                "Applications: 5 (2 pending, 1 shortlisted, 1 selected, 1 rejected)",
                "Bookmarks: 7"
            ]
        );
    }
}
