// src/types/profile.rs
//! Student profile draft and its typed decode from whatever shape the
//! backend has persisted.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::utils::{flatten_tags, split_tags, trim_to_option};

// ===== Enumerations =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "10th")]
    Tenth,
    #[serde(rename = "12th")]
    Twelfth,
    #[serde(rename = "UG")]
    Undergraduate,
    #[serde(rename = "PG")]
    Postgraduate,
    #[serde(rename = "PhD")]
    Doctorate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillProficiency {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    Internship,
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkMode {
    Remote,
    Onsite,
    Hybrid,
}

impl EducationLevel {
    pub const ALL: [EducationLevel; 5] = [
        Self::Tenth,
        Self::Twelfth,
        Self::Undergraduate,
        Self::Postgraduate,
        Self::Doctorate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenth => "10th",
            Self::Twelfth => "12th",
            Self::Undergraduate => "UG",
            Self::Postgraduate => "PG",
            Self::Doctorate => "PhD",
        }
    }
}

impl SkillProficiency {
    pub const ALL: [SkillProficiency; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 5] = [
        Self::Internship,
        Self::FullTime,
        Self::PartTime,
        Self::Contract,
        Self::Freelance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internship => "Internship",
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
            Self::Contract => "Contract",
            Self::Freelance => "Freelance",
        }
    }
}

impl WorkMode {
    pub const ALL: [WorkMode; 3] = [Self::Remote, Self::Onsite, Self::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "Remote",
            Self::Onsite => "Onsite",
            Self::Hybrid => "Hybrid",
        }
    }
}

macro_rules! choice_impls {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = String;

                /// Case-insensitive match against the display names
                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let wanted = s.trim();
                    Self::ALL
                        .iter()
                        .copied()
                        .find(|choice| choice.as_str().eq_ignore_ascii_case(wanted))
                        .ok_or_else(|| wanted.to_string())
                }
            }
        )*
    };
}

choice_impls!(EducationLevel, SkillProficiency, EmploymentType, WorkMode);

// ===== Sub-collection entries =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub level: EducationLevel,
    pub board_university: String,
    pub school_college: String,
    #[serde(deserialize_with = "int_from_any")]
    pub year: i32,
    #[serde(deserialize_with = "float_from_any")]
    pub percentage_cgpa: f64,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub proficiency: SkillProficiency,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "tech_stack",
        alias = "technology_tags",
        default,
        deserialize_with = "tags_from_any"
    )]
    pub technology_tags: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
    #[serde(default)]
    pub credential_url: Option<String>,
}

// ===== Sub-records =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerPreferences {
    pub employment_type: Vec<EmploymentType>,
    pub work_mode: Vec<WorkMode>,
    pub preferred_roles: Option<String>,
    pub preferred_industries: Option<String>,
    pub expected_salary: Option<String>,
    pub willing_to_relocate: Option<String>,
    pub notice_period: Option<String>,
    pub availability_date: Option<String>,
    pub preferred_locations: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialLinks {
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub portfolio: Option<String>,
    pub resume_link: Option<String>,
    pub twitter: Option<String>,
    pub leetcode: Option<String>,
}

impl SocialLinks {
    /// Present links as (label, url) pairs in display order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("LinkedIn", &self.linkedin),
            ("GitHub", &self.github),
            ("Portfolio", &self.portfolio),
            ("Resume", &self.resume_link),
            ("Twitter", &self.twitter),
            ("LeetCode", &self.leetcode),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.as_deref().map(|u| (label, u)))
        .collect()
    }
}

// ===== Draft profile =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftProfile {
    pub full_name: String,
    pub phone: String,
    pub location: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,

    pub education: Vec<Education>,

    pub skills: Vec<Skill>,
    pub domain_expertise: Option<String>,
    pub languages: Option<String>,

    pub experience: Vec<Experience>,
    pub total_experience_years: u32,
    pub current_role: String,
    pub current_company: Option<String>,

    pub projects: Vec<Project>,
    pub certifications: Vec<Certification>,

    pub preferences: CareerPreferences,
    pub links: SocialLinks,

    pub summary: Option<String>,
    pub achievements: Option<String>,
}

impl Default for DraftProfile {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone: String::new(),
            location: String::new(),
            gender: None,
            date_of_birth: None,
            education: Vec::new(),
            skills: Vec::new(),
            domain_expertise: None,
            languages: None,
            experience: Vec::new(),
            total_experience_years: 0,
            current_role: "Student".to_string(),
            current_company: None,
            projects: Vec::new(),
            certifications: Vec::new(),
            preferences: CareerPreferences::default(),
            links: SocialLinks::default(),
            summary: None,
            achievements: None,
        }
    }
}

impl DraftProfile {
    /// Build a draft from a persisted `profile_data` value of any shape.
    ///
    /// Non-object input yields an empty draft. Collections that are not
    /// arrays become empty, entries that fail to decode are dropped, and
    /// the sub-records always come back with every key present.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            debug!("profile_data is not an object, starting from an empty draft");
            return Self::default();
        };

        let defaults = Self::default();
        let mut draft = Self {
            full_name: string_field(obj, "full_name").unwrap_or_default(),
            phone: string_field(obj, "phone").unwrap_or_default(),
            location: string_field(obj, "location").unwrap_or_default(),
            gender: string_field(obj, "gender"),
            date_of_birth: string_field(obj, "date_of_birth"),
            education: collection(obj, "education"),
            skills: collection(obj, "skills"),
            domain_expertise: string_field(obj, "domain_expertise"),
            languages: string_field(obj, "languages"),
            experience: collection(obj, "experience"),
            total_experience_years: obj
                .get("total_experience_years")
                .and_then(value_as_u64)
                .and_then(|years| u32::try_from(years).ok())
                .unwrap_or(defaults.total_experience_years),
            current_role: string_field(obj, "current_role").unwrap_or(defaults.current_role),
            current_company: string_field(obj, "current_company"),
            projects: collection(obj, "projects"),
            certifications: collection(obj, "certifications"),
            preferences: preferences_from(obj.get("preferences")),
            links: links_from(obj.get("links")),
            summary: string_field(obj, "summary"),
            achievements: string_field(obj, "achievements"),
        };

        draft.sanitize();
        draft
    }

    /// Re-apply the in-memory invariants. Idempotent.
    pub fn sanitize(&mut self) {
        for project in &mut self.projects {
            project.technology_tags = flatten_tags(&project.technology_tags);
        }
        dedup_in_place(&mut self.preferences.employment_type);
        dedup_in_place(&mut self.preferences.work_mode);

        for field in [
            &mut self.gender,
            &mut self.date_of_birth,
            &mut self.domain_expertise,
            &mut self.languages,
            &mut self.current_company,
            &mut self.summary,
            &mut self.achievements,
        ] {
            blank_to_none(field);
        }

        let prefs = &mut self.preferences;
        for field in [
            &mut prefs.preferred_roles,
            &mut prefs.preferred_industries,
            &mut prefs.expected_salary,
            &mut prefs.willing_to_relocate,
            &mut prefs.notice_period,
            &mut prefs.availability_date,
            &mut prefs.preferred_locations,
        ] {
            blank_to_none(field);
        }

        let links = &mut self.links;
        for field in [
            &mut links.linkedin,
            &mut links.github,
            &mut links.portfolio,
            &mut links.resume_link,
            &mut links.twitter,
            &mut links.leetcode,
        ] {
            blank_to_none(field);
        }
    }

    /// True when nothing worth showing as a resume has been filled in
    pub fn is_blank(&self) -> bool {
        self.full_name.trim().is_empty()
            && self.education.is_empty()
            && self.skills.is_empty()
            && self.experience.is_empty()
            && self.projects.is_empty()
            && self.certifications.is_empty()
    }
}

// ===== Decode helpers =====

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => trim_to_option(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn collection<T: serde::de::DeserializeOwned>(obj: &Map<String, Value>, key: &str) -> Vec<T> {
    match obj.get(key) {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match T::deserialize(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Dropping {} entry {}: {}", key, index, e);
                    None
                }
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            debug!("Normalizing non-array {} ({}) to an empty list", key, kind_of(other));
            Vec::new()
        }
    }
}

fn preferences_from(value: Option<&Value>) -> CareerPreferences {
    let Some(obj) = value.and_then(Value::as_object) else {
        return CareerPreferences::default();
    };

    CareerPreferences {
        employment_type: choices_from(obj.get("employment_type")),
        work_mode: choices_from(obj.get("work_mode")),
        preferred_roles: string_field(obj, "preferred_roles"),
        preferred_industries: string_field(obj, "preferred_industries"),
        expected_salary: string_field(obj, "expected_salary"),
        willing_to_relocate: string_field(obj, "willing_to_relocate"),
        notice_period: string_field(obj, "notice_period"),
        availability_date: string_field(obj, "availability_date"),
        preferred_locations: string_field(obj, "preferred_locations"),
    }
}

fn links_from(value: Option<&Value>) -> SocialLinks {
    let Some(obj) = value.and_then(Value::as_object) else {
        return SocialLinks::default();
    };

    SocialLinks {
        linkedin: string_field(obj, "linkedin"),
        github: string_field(obj, "github"),
        portfolio: string_field(obj, "portfolio"),
        resume_link: string_field(obj, "resume_link"),
        twitter: string_field(obj, "twitter"),
        leetcode: string_field(obj, "leetcode"),
    }
}

/// Tag-set values may arrive as an array or a delimited string; unknown
/// choices are dropped.
fn choices_from<T: FromStr + PartialEq>(value: Option<&Value>) -> Vec<T> {
    let raw: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => split_tags(s),
        _ => Vec::new(),
    };

    let mut choices = Vec::new();
    for item in raw {
        match item.parse::<T>() {
            Ok(choice) if !choices.contains(&choice) => choices.push(choice),
            Ok(_) => {}
            Err(_) => debug!("Ignoring unknown preference value: {}", item),
        }
    }
    choices
}

fn dedup_in_place<T: PartialEq + Copy>(items: &mut Vec<T>) {
    let mut seen: Vec<T> = Vec::with_capacity(items.len());
    items.retain(|item| {
        if seen.contains(item) {
            false
        } else {
            seen.push(*item);
            true
        }
    });
}

fn blank_to_none(field: &mut Option<String>) {
    *field = field.as_deref().and_then(trim_to_option);
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn tags_from_any<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Delimited(String),
        Missing(()),
    }

    Ok(match Tags::deserialize(deserializer)? {
        Tags::List(tags) => flatten_tags(&tags),
        Tags::Delimited(raw) => split_tags(&raw),
        Tags::Missing(()) => Vec::new(),
    })
}

fn int_from_any<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value)))
}

fn float_from_any<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persisted() -> Value {
        json!({
            "full_name": "Asha Rao",
            "phone": "+919876543210",
            "location": "Bangalore",
            "education": [{
                "level": "UG",
                "board_university": "VTU",
                "school_college": "RVCE",
                "year": "2025",
                "percentage_cgpa": 8.4,
                "degree": "B.E."
            }],
            "skills": {"name": "Rust"},
            "experience": null,
            "projects": [{
                "title": "Portal",
                "description": "Job discovery portal",
                "technology_tags": "Rust, Tokio , ,Serde"
            }],
            "certifications": "none",
            "preferences": {"employment_type": ["Full-time", "Internship", "Full-time", "Gig"]},
            "links": null
        })
    }

    #[test]
    fn test_from_value_normalizes_shapes() {
        let draft = DraftProfile::from_value(&persisted());

        assert_eq!(draft.full_name, "Asha Rao");
        assert_eq!(draft.education.len(), 1);
        assert_eq!(draft.education[0].year, 2025);
        assert_eq!(draft.education[0].level, EducationLevel::Undergraduate);
        assert!(draft.skills.is_empty());
        assert!(draft.experience.is_empty());
        assert!(draft.certifications.is_empty());
        assert_eq!(draft.projects[0].technology_tags, vec!["Rust", "Tokio", "Serde"]);
        assert_eq!(
            draft.preferences.employment_type,
            vec![EmploymentType::FullTime, EmploymentType::Internship]
        );
        assert!(draft.preferences.work_mode.is_empty());
        assert_eq!(draft.links, SocialLinks::default());
        assert_eq!(draft.current_role, "Student");
    }

    #[test]
    fn test_from_value_non_object_is_empty() {
        assert_eq!(DraftProfile::from_value(&Value::Null), DraftProfile::default());
        assert_eq!(DraftProfile::from_value(&json!([1, 2])), DraftProfile::default());
        assert!(DraftProfile::default().is_blank());
    }

    #[test]
    fn test_invalid_entries_are_dropped() {
        let draft = DraftProfile::from_value(&json!({
            "skills": [
                {"name": "Rust", "proficiency": "Expert"},
                {"name": "Go", "proficiency": "Guru"},
                "Python"
            ]
        }));
        assert_eq!(draft.skills.len(), 1);
        assert_eq!(draft.skills[0].name, "Rust");
    }

    #[test]
    fn test_sub_records_serialize_every_key() {
        let value = serde_json::to_value(DraftProfile::default()).unwrap();
        let links = value["links"].as_object().unwrap();
        assert_eq!(links.len(), 6);
        assert!(links.values().all(Value::is_null));

        let prefs = value["preferences"].as_object().unwrap();
        assert_eq!(prefs["employment_type"], json!([]));
        assert_eq!(prefs["work_mode"], json!([]));
        assert!(prefs["expected_salary"].is_null());
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut draft = DraftProfile::from_value(&persisted());
        draft.projects[0].technology_tags = vec!["Axum, Tower".to_string(), "".to_string()];
        draft.summary = Some("   ".to_string());

        draft.sanitize();
        let once = draft.clone();
        draft.sanitize();

        assert_eq!(draft, once);
        assert_eq!(draft.projects[0].technology_tags, vec!["Axum", "Tower"]);
        assert_eq!(draft.summary, None);
    }

    #[test]
    fn test_round_trip_through_backend_shape() {
        let draft = DraftProfile::from_value(&persisted());
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(value["projects"][0]["tech_stack"], json!(["Rust", "Tokio", "Serde"]));
        assert_eq!(DraftProfile::from_value(&value), draft);
    }

    #[test]
    fn test_choice_parsing_is_case_insensitive() {
        assert_eq!("full-time".parse::<EmploymentType>(), Ok(EmploymentType::FullTime));
        assert_eq!("phd".parse::<EducationLevel>(), Ok(EducationLevel::Doctorate));
        assert!("Guru".parse::<SkillProficiency>().is_err());
    }
}
