// src/profile.rs
//! Loading the student profile page and submitting the wizard

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::core::{ApiClient, SessionStore};
use crate::render::ProfileView;
use crate::types::response::{Ack, ProfileEnvelope, ProfileResponse};
use crate::types::{DraftProfile, ValidationWarning};
use crate::wizard::{ProfileWizard, SubmitMode};

const PROFILE_ENDPOINT: &str = "/students/profile";

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<Option<ProfileResponse>>;
    async fn send_profile(&self, mode: SubmitMode, draft: &DraftProfile) -> Result<Option<Ack>>;
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_profile(&self) -> Result<Option<ProfileResponse>> {
        self.get(PROFILE_ENDPOINT)
            .await
            .context("Failed to load student profile")
    }

    async fn send_profile(&self, mode: SubmitMode, draft: &DraftProfile) -> Result<Option<Ack>> {
        let payload = ProfileEnvelope {
            profile_data: draft,
        };
        let endpoint = mode.endpoint();
        info!("Submitting profile via {} {}", mode.method(), endpoint);

        let result = match mode {
            SubmitMode::Complete => self.post_json(endpoint, &payload).await,
            SubmitMode::Update => self.put_json(endpoint, &payload).await,
        };
        result.context("Failed to save student profile")
    }
}

/// State of the profile page after a load or a save
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub view: ProfileView,
    pub draft: DraftProfile,
    pub profile_completed: bool,
}

impl ProfilePage {
    fn from_draft(draft: DraftProfile, profile_completed: bool) -> Self {
        Self {
            view: ProfileView::for_loaded(Some(&draft)),
            draft,
            profile_completed,
        }
    }

    /// Open the wizard on this page's draft
    pub fn wizard(&self) -> ProfileWizard {
        let mode = if self.profile_completed {
            SubmitMode::Update
        } else {
            SubmitMode::Complete
        };
        ProfileWizard::new(self.draft.clone(), mode)
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(ProfilePage),
    Blocked(ValidationWarning),
    /// The session ended and the user was sent to login
    Redirected,
}

/// Fetch and decode the profile; `Ok(None)` after an auth redirect
pub async fn load_profile<S>(source: &S) -> Result<Option<ProfilePage>>
where
    S: ProfileSource + ?Sized,
{
    let Some(response) = source.fetch_profile().await? else {
        return Ok(None);
    };

    let draft = DraftProfile::from_value(&response.profile_data);
    let page = ProfilePage::from_draft(draft, response.profile_completed);
    info!("Loaded profile, showing {:?} view", page.view);
    Ok(Some(page))
}

/// Submit the wizard's draft and switch to the resume built from it
pub async fn submit_profile<S>(
    source: &S,
    session: &SessionStore,
    wizard: &mut ProfileWizard,
) -> Result<SubmitOutcome>
where
    S: ProfileSource + ?Sized,
{
    let submission = match wizard.submit() {
        Ok(submission) => submission,
        Err(warning) => {
            warn!("Profile submission blocked: {}", warning);
            return Ok(SubmitOutcome::Blocked(warning));
        }
    };

    let ack = match source.send_profile(submission.mode, &submission.draft).await {
        Ok(Some(ack)) => ack,
        Ok(None) => return Ok(SubmitOutcome::Redirected),
        Err(e) => {
            error!("Profile submission failed: {:#}", e);
            return Err(e);
        }
    };

    if let Some(message) = &ack.message {
        info!("{}", message);
    }
    if submission.mode == SubmitMode::Complete {
        session.mark_profile_completed()?;
    }
    wizard.mark_submitted();

    Ok(SubmitOutcome::Saved(ProfilePage::from_draft(
        submission.draft,
        true,
    )))
}
