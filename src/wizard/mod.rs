// src/wizard/mod.rs
//! Five-step profile completion wizard over an in-memory draft

pub mod editors;
pub mod forms;

use tracing::{info, warn};

use crate::types::{DraftProfile, ValidationWarning};
pub use editors::{CollectionEditor, EditorSet};
pub use forms::{
    CertificationForm, EducationForm, EntryForm, ExperienceForm, ProjectForm, SkillForm,
};

pub const FIRST_STEP: u8 = 1;
pub const TOTAL_STEPS: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Personal = 1,
    Education = 2,
    Skills = 3,
    ExperienceAndProjects = 4,
    CertificationsAndPreferences = 5,
}

impl WizardStep {
    pub fn from_number(step: u8) -> Option<Self> {
        match step {
            1 => Some(Self::Personal),
            2 => Some(Self::Education),
            3 => Some(Self::Skills),
            4 => Some(Self::ExperienceAndProjects),
            5 => Some(Self::CertificationsAndPreferences),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Personal => "Personal Information",
            Self::Education => "Education",
            Self::Skills => "Skills",
            Self::ExperienceAndProjects => "Experience & Projects",
            Self::CertificationsAndPreferences => "Certifications, Preferences & Links",
        }
    }

    /// Check the step's required fields against the draft
    pub fn validate(&self, draft: &DraftProfile) -> Result<(), ValidationWarning> {
        match self {
            Self::Personal => {
                let section = "personal information";
                for (field, value) in [
                    ("full name", &draft.full_name),
                    ("phone", &draft.phone),
                    ("location", &draft.location),
                ] {
                    if value.trim().is_empty() {
                        return Err(ValidationWarning::MissingField { section, field });
                    }
                }
                Ok(())
            }
            Self::Education if draft.education.is_empty() => {
                Err(ValidationWarning::EmptyCollection {
                    section: "education",
                })
            }
            Self::Skills if draft.skills.is_empty() => {
                Err(ValidationWarning::EmptyCollection { section: "skill" })
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// First-time completion
    Complete,
    Update,
}

impl SubmitMode {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Complete => "/students/profile/complete",
            Self::Update => "/students/profile/update",
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::Complete => "POST",
            Self::Update => "PUT",
        }
    }
}

#[derive(Debug)]
pub struct ProfileWizard {
    step: u8,
    draft: DraftProfile,
    mode: SubmitMode,
    editors: EditorSet,
}

impl ProfileWizard {
    pub fn new(draft: DraftProfile, mode: SubmitMode) -> Self {
        let mut draft = draft;
        draft.sanitize();
        Self {
            step: FIRST_STEP,
            draft,
            mode,
            editors: EditorSet::default(),
        }
    }

    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn current_step(&self) -> WizardStep {
        WizardStep::from_number(self.step).unwrap_or(WizardStep::Personal)
    }

    pub fn is_last_step(&self) -> bool {
        self.step == TOTAL_STEPS
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    pub fn draft(&self) -> &DraftProfile {
        &self.draft
    }

    /// Scalar field bindings write straight into the draft
    pub fn draft_mut(&mut self) -> &mut DraftProfile {
        &mut self.draft
    }

    pub fn into_draft(self) -> DraftProfile {
        self.draft
    }

    /// Advance one step if the current step is satisfied
    pub fn next(&mut self) -> Result<u8, ValidationWarning> {
        let step = self.current_step();
        step.validate(&self.draft).inspect_err(|w| {
            warn!("Cannot leave step {} ({}): {}", self.step, step.title(), w);
        })?;

        if self.step < TOTAL_STEPS {
            self.step += 1;
            info!("Wizard moved to step {}", self.step);
        }
        Ok(self.step)
    }

    pub fn prev(&mut self) -> u8 {
        if self.step > FIRST_STEP {
            self.step -= 1;
        }
        self.step
    }

    /// Validate the current step only and package the whole draft
    pub fn submit(&mut self) -> Result<ProfileSubmission, ValidationWarning> {
        self.current_step().validate(&self.draft)?;
        self.draft.sanitize();
        Ok(ProfileSubmission {
            mode: self.mode,
            draft: self.draft.clone(),
        })
    }

    /// Called once the backend accepted a submission
    pub fn mark_submitted(&mut self) {
        self.mode = SubmitMode::Update;
    }

    // ===== Sub-collection editing =====

    pub fn open_for_create<F: EntryForm>(&mut self) -> F {
        F::editor(&mut self.editors).open_for_create()
    }

    pub fn open_for_edit<F: EntryForm>(&mut self, index: usize) -> Result<F, ValidationWarning> {
        self.draft.sanitize();
        F::editor(&mut self.editors).open_for_edit(&self.draft, index)
    }

    pub fn save_entry<F: EntryForm>(&mut self, form: F) -> Result<Vec<String>, ValidationWarning> {
        F::editor(&mut self.editors).save(&mut self.draft, form)
    }

    pub fn delete_entry<F: EntryForm>(
        &mut self,
        index: usize,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, ValidationWarning> {
        F::editor(&mut self.editors).delete(&mut self.draft, index, confirm)
    }

    pub fn render_entries<F: EntryForm>(&mut self) -> Vec<String> {
        F::editor(&mut self.editors).render(&self.draft)
    }

    pub fn editors(&self) -> &EditorSet {
        &self.editors
    }
}

#[derive(Debug, Clone)]
pub struct ProfileSubmission {
    pub mode: SubmitMode,
    pub draft: DraftProfile,
}
