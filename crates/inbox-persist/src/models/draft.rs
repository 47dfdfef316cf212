use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::address::Address;
use super::block::FileRef;
use super::tag::TagRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftState {
    Draft,
    /// Queued for the delivery pipeline
    Sending,
    Sent,
}

/// One revision of an unsent message.
///
/// Revisions form a chain rooted at `root_id`; every revision but the
/// newest points at the newest one through `most_recent_revision_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub namespace_id: String,
    pub thread_id: String,
    pub root_id: String,
    pub parent_draft_id: Option<String>,
    pub most_recent_revision_id: Option<String>,
    pub reply_to_thread_id: Option<String>,
    pub subject: Option<String>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub body: String,
    pub files: Vec<FileRef>,
    pub state: DraftState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a brand-new draft
#[derive(Debug, Clone, Default)]
pub struct NewDraft {
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub files: Vec<FileRef>,
    pub tags: Vec<TagRef>,
    /// Thread the draft replies to; a new thread is started when `None`
    pub reply_to_thread: Option<String>,
}

/// Fields for a new revision; `None` keeps the parent's value
#[derive(Debug, Clone, Default)]
pub struct DraftUpdate {
    pub to: Option<Vec<Address>>,
    pub cc: Option<Vec<Address>>,
    pub bcc: Option<Vec<Address>>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub files: Option<Vec<FileRef>>,
    pub tags: Vec<TagRef>,
}

impl Draft {
    pub fn from_new(namespace_id: &str, thread_id: &str, new: &NewDraft) -> Self {
        let id = crate::public_id::generate();
        let now = Utc::now();
        Self {
            root_id: id.clone(),
            id,
            namespace_id: namespace_id.to_string(),
            thread_id: thread_id.to_string(),
            parent_draft_id: None,
            most_recent_revision_id: None,
            reply_to_thread_id: new.reply_to_thread.clone(),
            subject: new.subject.clone(),
            to: new.to.clone(),
            cc: new.cc.clone(),
            bcc: new.bcc.clone(),
            body: new.body.clone().unwrap_or_default(),
            files: new.files.clone(),
            state: DraftState::Draft,
            created_at: now,
            updated_at: now,
        }
    }
    
    pub fn is_latest(&self) -> bool {
        self.most_recent_revision_id.is_none()
    }
    
    pub fn is_sent(&self) -> bool {
        self.state == DraftState::Sent
    }
    
    pub fn is_draft(&self) -> bool {
        !self.is_sent()
    }
    
    /// Next revision of this draft; the caller is responsible for
    /// re-pointing older revisions at it
    pub fn revise(&self, update: &DraftUpdate) -> Draft {
        let now = Utc::now();
        Draft {
            id: crate::public_id::generate(),
            namespace_id: self.namespace_id.clone(),
            thread_id: self.thread_id.clone(),
            root_id: self.root_id.clone(),
            parent_draft_id: Some(self.id.clone()),
            most_recent_revision_id: None,
            reply_to_thread_id: self.reply_to_thread_id.clone(),
            subject: update.subject.clone().or_else(|| self.subject.clone()),
            to: update.to.clone().unwrap_or_else(|| self.to.clone()),
            cc: update.cc.clone().unwrap_or_else(|| self.cc.clone()),
            bcc: update.bcc.clone().unwrap_or_else(|| self.bcc.clone()),
            body: update.body.clone().unwrap_or_else(|| self.body.clone()),
            files: update.files.clone().unwrap_or_else(|| self.files.clone()),
            state: DraftState::Draft,
            created_at: now,
            updated_at: now,
        }
    }
    
    /// All recipients, used for thread participants
    pub fn recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(self.cc.iter()).chain(self.bcc.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revise_inherits_missing_fields() {
        let parent = Draft::from_new("ns", "thread", &NewDraft {
            to: vec![Address::new(None, "a@example.com")],
            subject: Some("Plans".into()),
            body: Some("first".into()),
            ..Default::default()
        });
        
        let child = parent.revise(&DraftUpdate {
            body: Some("second".into()),
            ..Default::default()
        });
        
        assert_ne!(child.id, parent.id);
        assert_eq!(child.root_id, parent.id);
        assert_eq!(child.parent_draft_id.as_deref(), Some(parent.id.as_str()));
        assert_eq!(child.subject.as_deref(), Some("Plans"));
        assert_eq!(child.to, parent.to);
        assert_eq!(child.body, "second");
        assert!(child.is_latest());
        assert!(child.is_draft());
    }
}
