// src/wizard/editors.rs
//! Create/update/delete editing of one sub-collection, bound by index into
//! the draft.

use std::marker::PhantomData;
use tracing::{debug, info, warn};

use crate::types::{DraftProfile, ValidationWarning};
use crate::wizard::forms::{
    CertificationForm, EducationForm, EntryForm, ExperienceForm, ProjectForm, SkillForm,
};

#[derive(Debug)]
pub struct CollectionEditor<F> {
    /// `None` while creating, `Some(i)` while editing entry `i`
    editing: Option<usize>,
    open: bool,
    _form: PhantomData<F>,
}

impl<F> Default for CollectionEditor<F> {
    fn default() -> Self {
        Self {
            editing: None,
            open: false,
            _form: PhantomData,
        }
    }
}

impl<F: EntryForm> CollectionEditor<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn open_for_create(&mut self) -> F {
        self.editing = None;
        self.open = true;
        F::blank()
    }

    pub fn open_for_edit(
        &mut self,
        draft: &DraftProfile,
        index: usize,
    ) -> Result<F, ValidationWarning> {
        let entry = F::collection(draft)
            .get(index)
            .ok_or(ValidationWarning::NoSuchEntry {
                section: F::SECTION,
                index,
            })?;

        self.editing = Some(index);
        self.open = true;
        Ok(F::from_entry(entry))
    }

    /// Clean up the form and store it. On success the editor closes and the
    /// freshly rendered list is returned; on a warning nothing changes.
    pub fn save(
        &mut self,
        draft: &mut DraftProfile,
        form: F,
    ) -> Result<Vec<String>, ValidationWarning> {
        let entry = form.into_entry().inspect_err(|w| {
            warn!("Rejected {} entry: {}", F::SECTION, w);
        })?;

        let items = F::collection_mut(draft);
        match self.editing {
            Some(index) if index < items.len() => {
                items[index] = entry;
                info!("Updated {} entry {}", F::SECTION, index);
            }
            Some(index) => {
                return Err(ValidationWarning::NoSuchEntry {
                    section: F::SECTION,
                    index,
                });
            }
            None => {
                items.push(entry);
                info!("Added {} entry {}", F::SECTION, items.len() - 1);
            }
        }

        self.close();
        Ok(self.render(draft))
    }

    /// Remove entry `index` once `confirm` agrees. Returns whether it was removed.
    pub fn delete(
        &mut self,
        draft: &mut DraftProfile,
        index: usize,
        confirm: impl FnOnce() -> bool,
    ) -> Result<bool, ValidationWarning> {
        let items = F::collection_mut(draft);
        if index >= items.len() {
            return Err(ValidationWarning::NoSuchEntry {
                section: F::SECTION,
                index,
            });
        }

        if !confirm() {
            debug!("Deletion of {} entry {} cancelled", F::SECTION, index);
            return Ok(false);
        }

        items.remove(index);
        info!("Deleted {} entry {}", F::SECTION, index);

        // an edit in progress points at a stale position now
        match self.editing {
            Some(editing) if editing == index => self.close(),
            Some(editing) if editing > index => self.editing = Some(editing - 1),
            _ => {}
        }
        Ok(true)
    }

    pub fn close(&mut self) {
        self.editing = None;
        self.open = false;
    }

    /// Regenerate the whole display list
    pub fn render(&self, draft: &DraftProfile) -> Vec<String> {
        F::collection(draft)
            .iter()
            .enumerate()
            .map(|(i, entry)| format!("{}. {}", i + 1, F::summary(entry)))
            .collect()
    }
}

/// One editor per sub-collection
#[derive(Debug, Default)]
pub struct EditorSet {
    pub education: CollectionEditor<EducationForm>,
    pub skills: CollectionEditor<SkillForm>,
    pub experience: CollectionEditor<ExperienceForm>,
    pub projects: CollectionEditor<ProjectForm>,
    pub certifications: CollectionEditor<CertificationForm>,
}
