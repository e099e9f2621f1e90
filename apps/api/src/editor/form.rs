//! Form state controller: owns the live editable document during a session.
//!
//! Every mutation produces a new immutable snapshot via `snapshot()`; the
//! preview and the autosave watcher each get their own copy, never an alias
//! into the live draft.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::import;
use crate::schema::{
    CreationMode, EducationEntry, ExperienceEntry, ProjectEntry, ResumeContent, SocialLink,
};

/// The editable unit: document metadata the toolbar owns plus the content
/// body the form fields own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDraft {
    pub title: String,
    pub template_id: String,
    pub content: ResumeContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A scalar path the controller does not know. Programming error at the
    /// UI seam, surfaced to the caller rather than panicking.
    #[error("unknown field path '{0}'")]
    UnknownField(String),
}

/// The ordered list sections a reorder/remove can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSection {
    Experience,
    Education,
    Projects,
    Skills,
    SocialLinks,
}

/// An item appended to one of the list sections. The variant determines the
/// target list.
#[derive(Debug, Clone)]
pub enum ListItem {
    Experience(ExperienceEntry),
    Education(EducationEntry),
    Project(ProjectEntry),
    Skill(String),
    SocialLink(SocialLink),
}

pub struct FormState {
    draft: DocumentDraft,
}

impl FormState {
    pub fn new(draft: DocumentDraft) -> Self {
        Self { draft }
    }

    /// Returns an owned copy of the current draft.
    pub fn snapshot(&self) -> DocumentDraft {
        self.draft.clone()
    }

    /// Writes a scalar field addressed by path ("title", "template_id",
    /// "personal_info.full_name", ...).
    pub fn set_field(&mut self, path: &str, value: &str) -> Result<(), FormError> {
        let info = &mut self.draft.content.personal_info;
        match path {
            "title" => self.draft.title = value.to_string(),
            "template_id" => self.draft.template_id = value.to_string(),
            "personal_info.full_name" => info.full_name = value.to_string(),
            "personal_info.job_title" => info.job_title = value.to_string(),
            "personal_info.email" => info.email = value.to_string(),
            "personal_info.phone" => info.phone = value.to_string(),
            "personal_info.address" => info.address = value.to_string(),
            "personal_info.summary" => info.summary = value.to_string(),
            "personal_info.profile_image" => info.profile_image = value.to_string(),
            "personal_info.custom_text" => info.custom_text = value.to_string(),
            _ => return Err(FormError::UnknownField(path.to_string())),
        }
        Ok(())
    }

    /// Latches the creation mode on first use of an editing surface. A mode
    /// that is already set is never changed.
    pub fn mark_creation_mode(&mut self, mode: CreationMode) {
        if self.draft.content.creation_mode == CreationMode::Unset {
            self.draft.content.creation_mode = mode;
        }
    }

    /// Appends an item to the list section matching its variant. Record
    /// entries keep their client-generated id, or get a fresh one if empty.
    pub fn push_item(&mut self, item: ListItem) {
        let content = &mut self.draft.content;
        match item {
            ListItem::Experience(mut entry) => {
                ensure_id(&mut entry.id);
                content.experience.push(entry);
            }
            ListItem::Education(mut entry) => {
                ensure_id(&mut entry.id);
                content.education.push(entry);
            }
            ListItem::Project(mut entry) => {
                ensure_id(&mut entry.id);
                content.projects.push(entry);
            }
            ListItem::Skill(skill) => content.skills.push(skill),
            ListItem::SocialLink(link) => content.personal_info.social_links.push(link),
        }
    }

    /// Removes the item at `index`; out-of-range is a no-op.
    pub fn remove_item(&mut self, section: ListSection, index: usize) {
        let content = &mut self.draft.content;
        match section {
            ListSection::Experience => remove_at(&mut content.experience, index),
            ListSection::Education => remove_at(&mut content.education, index),
            ListSection::Projects => remove_at(&mut content.projects, index),
            ListSection::Skills => remove_at(&mut content.skills, index),
            ListSection::SocialLinks => {
                remove_at(&mut content.personal_info.social_links, index)
            }
        }
    }

    /// Moves the item at `from` to `to`. `to` is clamped into range and an
    /// out-of-range `from` is a no-op, never an error. All other items keep
    /// their relative order and every id is preserved.
    pub fn move_item(&mut self, section: ListSection, from: usize, to: usize) {
        let content = &mut self.draft.content;
        match section {
            ListSection::Experience => move_within(&mut content.experience, from, to),
            ListSection::Education => move_within(&mut content.education, from, to),
            ListSection::Projects => move_within(&mut content.projects, from, to),
            ListSection::Skills => move_within(&mut content.skills, from, to),
            ListSection::SocialLinks => {
                move_within(&mut content.personal_info.social_links, from, to)
            }
        }
    }

    /// Bulk-replaces the whole draft, used after loading a persisted
    /// document.
    pub fn replace(&mut self, draft: DocumentDraft) {
        self.draft = draft;
    }

    /// Bulk-replaces only the content body.
    pub fn replace_content(&mut self, content: ResumeContent) {
        self.draft.content = content;
    }

    /// Merges a parsed import into the live draft per the import merge
    /// contract.
    pub fn apply_import(&mut self, parsed: ResumeContent) {
        import::merge_import(&mut self.draft.content, parsed);
    }
}

fn ensure_id(id: &mut String) {
    if id.is_empty() {
        *id = Uuid::new_v4().to_string();
    }
}

fn remove_at<T>(list: &mut Vec<T>, index: usize) {
    if index < list.len() {
        list.remove(index);
    }
}

fn move_within<T>(list: &mut Vec<T>, from: usize, to: usize) {
    if from >= list.len() {
        return;
    }
    let to = to.min(list.len() - 1);
    if from == to {
        return;
    }
    let item = list.remove(from);
    list.insert(to, item);
}
