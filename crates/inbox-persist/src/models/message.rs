use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::address::{any_matches, Address};
use super::block::{FileRef, NewBlock};

const SNIPPET_LENGTH: usize = 191;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub namespace_id: String,
    pub thread_id: String,
    pub subject: Option<String>,
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub date: DateTime<Utc>,
    pub body: String,
    pub snippet: String,
    pub is_read: bool,
    pub files: Vec<FileRef>,
    pub created_at: DateTime<Utc>,
}

/// A message handed to the store by the mail sync engine
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Existing thread to append to; a new thread is started when `None`
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from: Vec<Address>,
    pub to: Vec<Address>,
    pub cc: Vec<Address>,
    pub bcc: Vec<Address>,
    pub date: DateTime<Utc>,
    pub body: String,
    pub is_read: bool,
    pub files: Vec<NewBlock>,
}

impl Default for NewMessage {
    fn default() -> Self {
        Self {
            thread_id: None,
            subject: None,
            from: Vec::new(),
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            date: Utc::now(),
            body: String::new(),
            is_read: false,
            files: Vec::new(),
        }
    }
}

impl Message {
    pub fn from_new(namespace_id: &str, thread_id: &str, new: &NewMessage, files: Vec<FileRef>) -> Self {
        let id = crate::public_id::generate();
        let files = files
            .into_iter()
            .map(|f| FileRef { message_id: Some(id.clone()), ..f })
            .collect();
        
        Self {
            id,
            namespace_id: namespace_id.to_string(),
            thread_id: thread_id.to_string(),
            subject: new.subject.clone(),
            from: new.from.clone(),
            to: new.to.clone(),
            cc: new.cc.clone(),
            bcc: new.bcc.clone(),
            date: new.date,
            snippet: snippet(&new.body),
            body: new.body.clone(),
            is_read: new.is_read,
            files,
            created_at: Utc::now(),
        }
    }
    
    /// True when `email` appears in any address header
    pub fn involves(&self, email: &str) -> bool {
        any_matches(&self.from, email)
            || any_matches(&self.to, email)
            || any_matches(&self.cc, email)
            || any_matches(&self.bcc, email)
    }
    
    pub fn has_file_named(&self, filename: &str) -> bool {
        self.files
            .iter()
            .any(|f| f.filename.as_deref() == Some(filename))
    }
    
    /// Every address on the message, senders first
    pub fn participants(&self) -> impl Iterator<Item = &Address> {
        self.from
            .iter()
            .chain(self.to.iter())
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
    }
}

/// Whitespace-collapsed prefix of a body
pub fn snippet(body: &str) -> String {
    body.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(SNIPPET_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_collapses_whitespace() {
        assert_eq!(snippet("  hello\n\n  world\t!"), "hello world !");
        assert_eq!(snippet(&"x".repeat(500)).len(), SNIPPET_LENGTH);
    }

    #[test]
    fn test_involves_is_case_insensitive() {
        let new = NewMessage {
            from: vec![Address::new(Some("Ben"), "ben@example.com")],
            cc: vec![Address::new(None, "Carol@Example.com")],
            ..Default::default()
        };
        let msg = Message::from_new("ns", "thread", &new, Vec::new());
        
        assert!(msg.involves("BEN@example.com"));
        assert!(msg.involves("carol@example.com"));
        assert!(!msg.involves("dave@example.com"));
        assert_eq!(msg.participants().count(), 2);
    }
}
