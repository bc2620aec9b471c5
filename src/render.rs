// src/render.rs
//! Plain-text presentations of the draft: the read-only resume and the
//! active wizard step.

use crate::types::DraftProfile;
use crate::wizard::{
    CertificationForm, EducationForm, EntryForm, ExperienceForm, ProfileWizard, ProjectForm,
    SkillForm, WizardStep, TOTAL_STEPS,
};

/// Which of the two mutually exclusive profile views is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileView {
    Wizard,
    Resume,
}

impl ProfileView {
    pub fn for_loaded(draft: Option<&DraftProfile>) -> Self {
        match draft {
            Some(draft) if !draft.is_blank() => Self::Resume,
            _ => Self::Wizard,
        }
    }
}

fn section(out: &mut String, title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}\n{}\n", title, "-".repeat(title.len())));
    for line in lines {
        out.push_str(&format!("  {}\n", line));
    }
}

fn entries<F: EntryForm>(draft: &DraftProfile) -> Vec<String> {
    F::collection(draft).iter().map(F::summary).collect()
}

/// Render the resume view. The draft is sanitized on a copy first.
pub fn render_resume(draft: &DraftProfile) -> String {
    let mut draft = draft.clone();
    draft.sanitize();

    let mut out = String::new();
    out.push_str(&format!("{}\n", draft.full_name));

    let mut contact = vec![draft.phone.clone(), draft.location.clone()];
    contact.retain(|c| !c.is_empty());
    if !contact.is_empty() {
        out.push_str(&format!("{}\n", contact.join(" | ")));
    }

    let mut headline = draft.current_role.clone();
    if let Some(company) = &draft.current_company {
        headline.push_str(&format!(" at {}", company));
    }
    if draft.total_experience_years > 0 {
        headline.push_str(&format!(" ({} yrs)", draft.total_experience_years));
    }
    out.push_str(&format!("{}\n", headline));

    if let Some(summary) = &draft.summary {
        section(&mut out, "Summary", &[summary.clone()]);
    }

    section(&mut out, "Education", &entries::<EducationForm>(&draft));

    let mut skills = entries::<SkillForm>(&draft);
    if let Some(domain) = &draft.domain_expertise {
        skills.push(format!("Domain: {}", domain));
    }
    if let Some(languages) = &draft.languages {
        skills.push(format!("Languages: {}", languages));
    }
    section(&mut out, "Skills", &skills);

    let experience: Vec<String> = draft
        .experience
        .iter()
        .flat_map(|e| {
            let mut lines = vec![ExperienceForm::summary(e)];
            if !e.description.is_empty() {
                lines.push(format!("  {}", e.description));
            }
            lines
        })
        .collect();
    section(&mut out, "Experience", &experience);

    let projects: Vec<String> = draft
        .projects
        .iter()
        .flat_map(|p| {
            let mut lines = vec![ProjectForm::summary(p)];
            if !p.description.is_empty() {
                lines.push(format!("  {}", p.description));
            }
            if let Some(link) = p.link.as_ref().or(p.github_link.as_ref()) {
                lines.push(format!("  {}", link));
            }
            lines
        })
        .collect();
    section(&mut out, "Projects", &projects);

    section(&mut out, "Certifications", &entries::<CertificationForm>(&draft));

    let prefs = &draft.preferences;
    let mut preferences = Vec::new();
    if !prefs.employment_type.is_empty() {
        let types: Vec<&str> = prefs.employment_type.iter().map(|t| t.as_str()).collect();
        preferences.push(format!("Employment: {}", types.join(", ")));
    }
    if !prefs.work_mode.is_empty() {
        let modes: Vec<&str> = prefs.work_mode.iter().map(|m| m.as_str()).collect();
        preferences.push(format!("Work mode: {}", modes.join(", ")));
    }
    for (label, value) in [
        ("Roles", &prefs.preferred_roles),
        ("Industries", &prefs.preferred_industries),
        ("Locations", &prefs.preferred_locations),
        ("Expected salary", &prefs.expected_salary),
        ("Relocate", &prefs.willing_to_relocate),
        ("Notice period", &prefs.notice_period),
        ("Available from", &prefs.availability_date),
    ] {
        if let Some(value) = value {
            preferences.push(format!("{}: {}", label, value));
        }
    }
    section(&mut out, "Preferences", &preferences);

    let links: Vec<String> = draft
        .links
        .entries()
        .into_iter()
        .map(|(label, url)| format!("{}: {}", label, url))
        .collect();
    section(&mut out, "Links", &links);

    if let Some(achievements) = &draft.achievements {
        section(&mut out, "Achievements", &[achievements.clone()]);
    }

    out
}

/// Header plus the collection lists that belong to the active step
pub fn render_wizard_step(wizard: &mut ProfileWizard) -> String {
    let step = wizard.current_step();
    let mut out = format!("Step {} of {}: {}\n", wizard.step(), TOTAL_STEPS, step.title());

    let lists: Vec<(&str, Vec<String>)> = match step {
        WizardStep::Personal => {
            let draft = wizard.draft();
            let lines = [
                ("Full name", draft.full_name.as_str()),
                ("Phone", draft.phone.as_str()),
                ("Location", draft.location.as_str()),
            ]
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect();
            vec![("Details", lines)]
        }
        WizardStep::Education => vec![("Education", wizard.render_entries::<EducationForm>())],
        WizardStep::Skills => vec![("Skills", wizard.render_entries::<SkillForm>())],
        WizardStep::ExperienceAndProjects => vec![
            ("Experience", wizard.render_entries::<ExperienceForm>()),
            ("Projects", wizard.render_entries::<ProjectForm>()),
        ],
        WizardStep::CertificationsAndPreferences => vec![(
            "Certifications",
            wizard.render_entries::<CertificationForm>(),
        )],
    };

    for (title, lines) in lists {
        if lines.is_empty() {
            out.push_str(&format!("{}: (none yet)\n", title));
        } else {
            out.push_str(&format!("{}:\n", title));
            for line in lines {
                out.push_str(&format!("  {}\n", line));
            }
        }
    }
    out
}
