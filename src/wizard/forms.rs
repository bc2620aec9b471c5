// src/wizard/forms.rs
//! Raw form state for each sub-collection, as typed by the user, and the
//! cleanup that turns it into a typed entry.

use crate::types::profile::{
    Certification, DraftProfile, Education, EducationLevel, Experience, Project, Skill,
    SkillProficiency,
};
use crate::types::ValidationWarning;
use crate::utils::{parse_month, parse_optional_month, split_tags, trim_to_option};
use crate::wizard::editors::{CollectionEditor, EditorSet};

/// A form bound to one sub-collection of the draft
pub trait EntryForm: Sized {
    type Entry: Clone;

    /// Section name used in warnings and list headers
    const SECTION: &'static str;

    fn blank() -> Self;
    fn from_entry(entry: &Self::Entry) -> Self;
    fn into_entry(self) -> Result<Self::Entry, ValidationWarning>;
    fn summary(entry: &Self::Entry) -> String;

    fn collection(draft: &DraftProfile) -> &Vec<Self::Entry>;
    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Self::Entry>;
    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self>;
}

fn required(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<String, ValidationWarning> {
    trim_to_option(value).ok_or(ValidationWarning::MissingField { section, field })
}

fn choice<T: std::str::FromStr>(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<T, ValidationWarning> {
    let value = required(section, field, value)?;
    value
        .parse()
        .map_err(|_| ValidationWarning::InvalidChoice { field, value })
}

fn number<T: std::str::FromStr>(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<T, ValidationWarning> {
    let value = required(section, field, value)?;
    value
        .parse()
        .map_err(|_| ValidationWarning::InvalidNumber { field, value })
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

// ===== Education =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EducationForm {
    pub level: String,
    pub board_university: String,
    pub school_college: String,
    pub year: String,
    pub percentage_cgpa: String,
    pub degree: String,
    pub branch: String,
}

impl EntryForm for EducationForm {
    type Entry = Education;
    const SECTION: &'static str = "education";

    fn blank() -> Self {
        Self::default()
    }

    fn from_entry(entry: &Education) -> Self {
        Self {
            level: entry.level.to_string(),
            board_university: entry.board_university.clone(),
            school_college: entry.school_college.clone(),
            year: entry.year.to_string(),
            percentage_cgpa: entry.percentage_cgpa.to_string(),
            degree: text(&entry.degree),
            branch: text(&entry.branch),
        }
    }

    fn into_entry(self) -> Result<Education, ValidationWarning> {
        let section = Self::SECTION;
        Ok(Education {
            level: choice::<EducationLevel>(section, "level", &self.level)?,
            board_university: required(section, "board/university", &self.board_university)?,
            school_college: required(section, "school/college", &self.school_college)?,
            year: number(section, "year", &self.year)?,
            percentage_cgpa: number(section, "percentage/CGPA", &self.percentage_cgpa)?,
            degree: trim_to_option(&self.degree),
            branch: trim_to_option(&self.branch),
        })
    }

    fn summary(entry: &Education) -> String {
        let mut line = format!(
            "{} - {} ({}), {}",
            entry.level, entry.school_college, entry.board_university, entry.year
        );
        if let Some(degree) = &entry.degree {
            line.push_str(&format!(", {}", degree));
            if let Some(branch) = &entry.branch {
                line.push_str(&format!(" in {}", branch));
            }
        }
        line.push_str(&format!(" | Score: {}", entry.percentage_cgpa));
        line
    }

    fn collection(draft: &DraftProfile) -> &Vec<Education> {
        &draft.education
    }

    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Education> {
        &mut draft.education
    }

    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self> {
        &mut editors.education
    }
}

// ===== Skills =====

#[derive(Debug, Clone, PartialEq)]
pub struct SkillForm {
    pub name: String,
    pub proficiency: String,
    pub category: String,
}

impl EntryForm for SkillForm {
    type Entry = Skill;
    const SECTION: &'static str = "skills";

    fn blank() -> Self {
        Self {
            name: String::new(),
            proficiency: SkillProficiency::Intermediate.to_string(),
            category: String::new(),
        }
    }

    fn from_entry(entry: &Skill) -> Self {
        Self {
            name: entry.name.clone(),
            proficiency: entry.proficiency.to_string(),
            category: text(&entry.category),
        }
    }

    fn into_entry(self) -> Result<Skill, ValidationWarning> {
        Ok(Skill {
            name: required(Self::SECTION, "skill name", &self.name)?,
            proficiency: choice(Self::SECTION, "proficiency", &self.proficiency)?,
            category: trim_to_option(&self.category),
        })
    }

    fn summary(entry: &Skill) -> String {
        match &entry.category {
            Some(category) => format!("{} ({}) - {}", entry.name, category, entry.proficiency),
            None => format!("{} - {}", entry.name, entry.proficiency),
        }
    }

    fn collection(draft: &DraftProfile) -> &Vec<Skill> {
        &draft.skills
    }

    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Skill> {
        &mut draft.skills
    }

    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self> {
        &mut editors.skills
    }
}

// ===== Experience =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceForm {
    pub company: String,
    pub role: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub description: String,
    pub location: String,
}

impl EntryForm for ExperienceForm {
    type Entry = Experience;
    const SECTION: &'static str = "experience";

    fn blank() -> Self {
        Self::default()
    }

    fn from_entry(entry: &Experience) -> Self {
        Self {
            company: entry.company.clone(),
            role: entry.role.clone(),
            start_date: entry.start_date.clone(),
            end_date: text(&entry.end_date),
            is_current: entry.is_current,
            description: entry.description.clone(),
            location: text(&entry.location),
        }
    }

    fn into_entry(self) -> Result<Experience, ValidationWarning> {
        let section = Self::SECTION;
        let start = required(section, "start date", &self.start_date)?;

        Ok(Experience {
            company: required(section, "company", &self.company)?,
            role: required(section, "role", &self.role)?,
            start_date: parse_month("start date", &start)?,
            // a current position has no end date
            end_date: if self.is_current {
                None
            } else {
                parse_optional_month("end date", &self.end_date)?
            },
            is_current: self.is_current,
            description: required(section, "description", &self.description)?,
            location: trim_to_option(&self.location),
        })
    }

    fn summary(entry: &Experience) -> String {
        let end = if entry.is_current {
            "Present".to_string()
        } else {
            entry.end_date.clone().unwrap_or_else(|| "-".to_string())
        };
        format!(
            "{} at {} ({} to {})",
            entry.role, entry.company, entry.start_date, end
        )
    }

    fn collection(draft: &DraftProfile) -> &Vec<Experience> {
        &draft.experience
    }

    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Experience> {
        &mut draft.experience
    }

    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self> {
        &mut editors.experience
    }
}

// ===== Projects =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    /// Comma-delimited, as typed
    pub technology_tags: String,
    pub link: String,
    pub github_link: String,
    pub start_date: String,
    pub end_date: String,
}

impl EntryForm for ProjectForm {
    type Entry = Project;
    const SECTION: &'static str = "projects";

    fn blank() -> Self {
        Self::default()
    }

    fn from_entry(entry: &Project) -> Self {
        Self {
            title: entry.title.clone(),
            description: entry.description.clone(),
            technology_tags: entry.technology_tags.join(", "),
            link: text(&entry.link),
            github_link: text(&entry.github_link),
            start_date: text(&entry.start_date),
            end_date: text(&entry.end_date),
        }
    }

    fn into_entry(self) -> Result<Project, ValidationWarning> {
        let section = Self::SECTION;
        let title = required(section, "project title", &self.title)?;
        let description = required(section, "description", &self.description)?;

        let technology_tags = split_tags(&self.technology_tags);
        if technology_tags.is_empty() {
            return Err(ValidationWarning::MissingTechnologyTags);
        }

        Ok(Project {
            title,
            description,
            technology_tags,
            link: trim_to_option(&self.link),
            github_link: trim_to_option(&self.github_link),
            start_date: parse_optional_month("start date", &self.start_date)?,
            end_date: parse_optional_month("end date", &self.end_date)?,
        })
    }

    fn summary(entry: &Project) -> String {
        format!("{} [{}]", entry.title, entry.technology_tags.join(", "))
    }

    fn collection(draft: &DraftProfile) -> &Vec<Project> {
        &draft.projects
    }

    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Project> {
        &mut draft.projects
    }

    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self> {
        &mut editors.projects
    }
}

// ===== Certifications =====

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificationForm {
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub credential_id: String,
    pub credential_url: String,
}

impl EntryForm for CertificationForm {
    type Entry = Certification;
    const SECTION: &'static str = "certifications";

    fn blank() -> Self {
        Self::default()
    }

    fn from_entry(entry: &Certification) -> Self {
        Self {
            name: entry.name.clone(),
            issuer: entry.issuer.clone(),
            issue_date: entry.issue_date.clone(),
            expiry_date: text(&entry.expiry_date),
            credential_id: text(&entry.credential_id),
            credential_url: text(&entry.credential_url),
        }
    }

    fn into_entry(self) -> Result<Certification, ValidationWarning> {
        let section = Self::SECTION;
        let issue_date = required(section, "issue date", &self.issue_date)?;

        Ok(Certification {
            name: required(section, "certification name", &self.name)?,
            issuer: required(section, "issuer", &self.issuer)?,
            issue_date: parse_month("issue date", &issue_date)?,
            expiry_date: parse_optional_month("expiry date", &self.expiry_date)?,
            credential_id: trim_to_option(&self.credential_id),
            credential_url: trim_to_option(&self.credential_url),
        })
    }

    fn summary(entry: &Certification) -> String {
        format!("{} - {} ({})", entry.name, entry.issuer, entry.issue_date)
    }

    fn collection(draft: &DraftProfile) -> &Vec<Certification> {
        &draft.certifications
    }

    fn collection_mut(draft: &mut DraftProfile) -> &mut Vec<Certification> {
        &mut draft.certifications
    }

    fn editor(editors: &mut EditorSet) -> &mut CollectionEditor<Self> {
        &mut editors.certifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_form_cleanup() {
        let form = EducationForm {
            level: "ug".to_string(),
            board_university: " VTU ".to_string(),
            school_college: "RVCE".to_string(),
            year: " 2025".to_string(),
            percentage_cgpa: "8.5".to_string(),
            degree: "  ".to_string(),
            branch: "CSE".to_string(),
        };
        let entry = form.into_entry().unwrap();
        assert_eq!(entry.level, EducationLevel::Undergraduate);
        assert_eq!(entry.board_university, "VTU");
        assert_eq!(entry.year, 2025);
        assert_eq!(entry.percentage_cgpa, 8.5);
        assert_eq!(entry.degree, None);
        assert_eq!(entry.branch.as_deref(), Some("CSE"));
    }

    #[test]
    fn test_education_form_rejects_bad_year() {
        let form = EducationForm {
            level: "UG".to_string(),
            board_university: "VTU".to_string(),
            school_college: "RVCE".to_string(),
            year: "twenty".to_string(),
            percentage_cgpa: "8".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.into_entry(),
            Err(ValidationWarning::InvalidNumber {
                field: "year",
                value: "twenty".to_string()
            })
        );
    }

    #[test]
    fn test_project_requires_a_tag() {
        let form = ProjectForm {
            title: "Portal".to_string(),
            description: "Job discovery".to_string(),
            technology_tags: " , ".to_string(),
            ..Default::default()
        };
        assert_eq!(form.into_entry(), Err(ValidationWarning::MissingTechnologyTags));
    }

    #[test]
    fn test_experience_current_drops_end_date() {
        let form = ExperienceForm {
            company: "Acme".to_string(),
            role: "Intern".to_string(),
            start_date: "2024-06".to_string(),
            end_date: "2024-08".to_string(),
            is_current: true,
            description: "Built the billing export".to_string(),
            location: String::new(),
        };
        let entry = form.into_entry().unwrap();
        assert_eq!(entry.end_date, None);
        assert_eq!(ExperienceForm::summary(&entry), "Intern at Acme (2024-06 to Present)");
    }

    #[test]
    fn test_form_round_trips_through_entry() {
        let skill = Skill {
            name: "Rust".to_string(),
            proficiency: SkillProficiency::Expert,
            category: Some("Language".to_string()),
        };
        let form = SkillForm::from_entry(&skill);
        assert_eq!(form.into_entry().unwrap(), skill);
    }

    #[test]
    fn test_certification_month_validation() {
        let form = CertificationForm {
            name: "AWS Developer".to_string(),
            issuer: "Amazon".to_string(),
            issue_date: "05/2024".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            form.into_entry(),
            Err(ValidationWarning::InvalidMonth { field: "issue date", .. })
        ));
    }
}
