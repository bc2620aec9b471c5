// src/types/response.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::profile::DraftProfile;

/// Treat an explicit `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ===== Auth =====

#[derive(Debug, Deserialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Serialize)]
pub struct OAuthCallbackRequest<'a> {
    pub code: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: StoredUser,
    #[serde(default)]
    pub message: Option<String>,
}

/// User record persisted next to the access token. Unknown fields are kept
/// so writing the record back does not lose anything the backend sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ===== Profile =====

#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub profile_data: Value,
}

#[derive(Debug, Serialize)]
pub struct ProfileEnvelope<'a> {
    pub profile_data: &'a DraftProfile,
}

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub count: Option<u64>,
}

// ===== Jobs =====

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobSummary {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub experience_required: Option<String>,
    #[serde(default)]
    pub skills_required: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub application_deadline: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

impl Pagination {
    /// Derive pagination from a total when the backend sends only counts
    pub fn from_total(page: u32, limit: u32, total_count: u64) -> Self {
        let limit = limit.max(1);
        let total_pages = u32::try_from(total_count.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);
        Self {
            page,
            limit,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobSummary>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct JobCountResponse {
    #[serde(alias = "total", alias = "total_jobs")]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct JobDetailResponse {
    pub job: JobSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationStatus {
    pub has_applied: bool,
    pub application_status: Option<String>,
    pub is_bookmarked: bool,
}

/// Shared shape of the student job feeds: recommended, for-me, top
/// matches and bookmarks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StudentJobList {
    #[serde(deserialize_with = "null_as_default")]
    pub jobs: Vec<JobSummary>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
    pub total: Option<u64>,
    pub count: Option<u64>,
    pub has_quality_matches: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobApplication {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub job: Option<JobSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub applications: Vec<JobApplication>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudentJobStats {
    pub total_applications: u64,
    pub pending_applications: u64,
    pub shortlisted: u64,
    pub selected: u64,
    pub rejected: u64,
    pub total_bookmarks: u64,
}

/// `{success, stats}` wrapper used by the stats endpoints
#[derive(Debug, Deserialize)]
pub struct StatsEnvelope<T> {
    pub stats: T,
}

// ===== Notifications =====

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub notification_type: Option<String>,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub related_job_id: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationListResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationStats {
    pub total: u64,
    pub unread: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
}

#[derive(Debug, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: u64,
}

// ===== Analytics =====

#[derive(Debug, Serialize)]
pub struct AnalyticsQueryRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyticsQueryResponse {
    #[serde(
        alias = "response",
        alias = "natural_language_response",
        deserialize_with = "null_as_default"
    )]
    pub answer: String,
    pub chart_type: Option<String>,
    pub chart_data: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub raw_data: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SuggestionsResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
}
