use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Longest string the store will index (tag names, for instance)
pub const MAX_INDEXABLE_LENGTH: usize = 191;

/// Tags every namespace is created with. Their public id is their name.
pub const CANONICAL_TAG_NAMES: &[&str] = &[
    "inbox",
    "archive",
    "drafts",
    "sending",
    "sent",
    "spam",
    "starred",
    "unread",
    "unseen",
    "trash",
    "attachment",
    "replied",
    "file",
    "send",
    "all",
];

const USER_ADDABLE: &[&str] = &["inbox", "archive", "starred", "unread", "spam", "trash"];

const USER_REMOVABLE: &[&str] = &["inbox", "archive", "starred", "unread", "unseen", "spam", "trash"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub namespace_id: String,
    pub name: String,
    pub user_created: bool,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Build one of the system tags for a namespace
    pub fn canonical(namespace_id: &str, name: &str) -> Self {
        Self {
            id: name.to_string(),
            namespace_id: namespace_id.to_string(),
            name: name.to_string(),
            user_created: false,
            created_at: Utc::now(),
        }
    }
    
    /// Build a user-created tag with a fresh public id
    pub fn user(namespace_id: &str, name: &str) -> Self {
        Self {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            name: name.to_string(),
            user_created: true,
            created_at: Utc::now(),
        }
    }
    
    /// Full canonical tag set for a freshly created namespace
    pub fn canonical_set(namespace_id: &str) -> Vec<Tag> {
        CANONICAL_TAG_NAMES
            .iter()
            .map(|name| Tag::canonical(namespace_id, name))
            .collect()
    }
    
    pub fn user_addable(&self) -> bool {
        self.user_created || USER_ADDABLE.contains(&self.name.as_str())
    }
    
    pub fn user_removable(&self) -> bool {
        self.user_created || USER_REMOVABLE.contains(&self.name.as_str())
    }
    
    pub fn to_ref(&self) -> TagRef {
        TagRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
    
    /// Matches either the public id or the name
    pub fn is(&self, name_or_id: &str) -> bool {
        self.id == name_or_id || self.name == name_or_id
    }
}

/// Reserved names can never be claimed by a user tag
pub fn is_reserved_name(name: &str) -> bool {
    CANONICAL_TAG_NAMES.contains(&name)
}

/// Denormalised tag reference stored on threads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: String,
    pub name: String,
}

impl TagRef {
    /// Reference to a system tag, whose id is its name
    pub fn canonical(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_set_uses_names_as_ids() {
        let tags = Tag::canonical_set("ns");
        assert_eq!(tags.len(), CANONICAL_TAG_NAMES.len());
        assert!(tags.iter().all(|t| t.id == t.name && !t.user_created));
    }

    #[test]
    fn test_system_tag_permissions() {
        let unseen = Tag::canonical("ns", "unseen");
        assert!(!unseen.user_addable());
        assert!(unseen.user_removable());
        
        let sent = Tag::canonical("ns", "sent");
        assert!(!sent.user_addable());
        assert!(!sent.user_removable());
        
        let starred = Tag::canonical("ns", "starred");
        assert!(starred.user_addable());
        assert!(starred.user_removable());
    }

    #[test]
    fn test_user_tags_are_fully_mutable() {
        let tag = Tag::user("ns", "receipts");
        assert!(tag.user_addable());
        assert!(tag.user_removable());
        assert!(tag.is("receipts"));
        assert!(tag.is(&tag.id.clone()));
        assert!(!is_reserved_name("receipts"));
        assert!(is_reserved_name("inbox"));
    }
}
