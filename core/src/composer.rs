use crate::{api::ApiError, files::PendingFile};
use feed_api::{Attachment, NewPost};
use parking_lot::Mutex;
use std::sync::Arc;

/// Unsaved composer input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub files: Vec<PendingFile>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty() && self.files.is_empty()
    }

    /// Request body for this draft once its files have been uploaded.
    pub fn to_new_post(&self, attachments: Vec<Attachment>) -> NewPost {
        NewPost {
            title: self.title.clone(),
            content: self.content.clone(),
            attachments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Publishing,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("sign in to publish")]
    SignedOut,

    #[error("a publish is already in flight")]
    AlreadyPublishing,

    #[error("upload failed: {0}")]
    Upload(#[source] ApiError),

    #[error("create failed: {0}")]
    Create(#[source] ApiError),
}

/// Draft plus the publishing flag.
#[derive(Debug, Default)]
pub struct Composer {
    draft: Draft,
    phase: Phase,
}

impl Composer {
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.draft.content = content.into();
    }

    /// Replace the file selection wholesale.
    pub fn select_files(&mut self, files: Vec<PendingFile>) {
        self.draft.files = files;
    }

    pub fn reset_draft(&mut self) {
        self.draft = Draft::default();
    }

    pub fn button_label(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "Publish",
            Phase::Publishing => "Publishing…",
        }
    }

    /// Move `idle → publishing` and snapshot the draft. The returned guard
    /// moves the composer back to idle when dropped, whatever the outcome.
    pub fn begin(composer: &Arc<Mutex<Composer>>) -> Result<(Draft, PublishingGuard), PublishError> {
        let mut guard = composer.lock();
        if guard.phase == Phase::Publishing {
            return Err(PublishError::AlreadyPublishing);
        }
        guard.phase = Phase::Publishing;
        let draft = guard.draft.clone();
        drop(guard);
        Ok((
            draft,
            PublishingGuard {
                composer: composer.clone(),
            },
        ))
    }
}

/// Returns the composer to [`Phase::Idle`] on drop.
#[derive(Debug)]
pub struct PublishingGuard {
    composer: Arc<Mutex<Composer>>,
}

impl Drop for PublishingGuard {
    fn drop(&mut self) {
        self.composer.lock().phase = Phase::Idle;
    }
}
