use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::address::Address;
use super::message::Message;
use super::tag::TagRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub namespace_id: String,
    pub subject: Option<String>,
    pub first_message_timestamp: DateTime<Utc>,
    pub last_message_timestamp: DateTime<Utc>,
    pub snippet: String,
    pub participants: Vec<Address>,
    pub tags: Vec<TagRef>,
    /// Message ids in arrival order
    pub messages: Vec<String>,
    /// Ids of the latest revision of each draft on the thread
    pub drafts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(namespace_id: &str, subject: Option<String>, at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            subject,
            first_message_timestamp: at,
            last_message_timestamp: at,
            snippet: String::new(),
            participants: Vec::new(),
            tags: Vec::new(),
            messages: Vec::new(),
            drafts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
    
    pub fn has_tag(&self, name_or_id: &str) -> bool {
        self.tags
            .iter()
            .any(|t| t.id == name_or_id || t.name == name_or_id)
    }
    
    /// Returns whether the tag set changed
    pub fn apply_tag(&mut self, tag: &TagRef) -> bool {
        if self.tags.iter().any(|t| t.id == tag.id) {
            return false;
        }
        self.tags.push(tag.clone());
        self.updated_at = Utc::now();
        true
    }
    
    /// Returns whether the tag set changed
    pub fn remove_tag(&mut self, tag_id: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t.id != tag_id);
        let changed = self.tags.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
    
    pub fn add_participants<'a>(&mut self, addresses: impl IntoIterator<Item = &'a Address>) {
        for address in addresses {
            if !self.participants.iter().any(|p| p.matches(&address.email)) {
                self.participants.push(address.clone());
            }
        }
    }
    
    /// Fold a newly stored message into the thread's summary fields
    pub fn absorb_message(&mut self, message: &Message) {
        if self.messages.is_empty() || message.date < self.first_message_timestamp {
            self.first_message_timestamp = message.date;
        }
        if self.messages.is_empty() || message.date >= self.last_message_timestamp {
            self.last_message_timestamp = message.date;
            self.snippet = message.snippet.clone();
        }
        if self.subject.is_none() {
            self.subject = message.subject.clone();
        }
        self.add_participants(message.participants());
        self.messages.push(message.id.clone());
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewMessage;
    use chrono::TimeZone;

    #[test]
    fn test_tag_set_semantics() {
        let mut thread = Thread::new("ns", None, Utc::now());
        let inbox = TagRef { id: "inbox".into(), name: "inbox".into() };
        
        assert!(thread.apply_tag(&inbox));
        assert!(!thread.apply_tag(&inbox));
        assert!(thread.has_tag("inbox"));
        assert!(thread.remove_tag("inbox"));
        assert!(!thread.remove_tag("inbox"));
    }

    #[test]
    fn test_absorb_message_tracks_time_bounds() {
        let early = Utc.timestamp_opt(1_000, 0).unwrap();
        let late = Utc.timestamp_opt(2_000, 0).unwrap();
        let mut thread = Thread::new("ns", None, late);
        
        let first = NewMessage {
            subject: Some("Hello".into()),
            date: late,
            body: "later body".into(),
            from: vec![Address::new(None, "a@example.com")],
            ..Default::default()
        };
        let second = NewMessage {
            date: early,
            body: "earlier body".into(),
            from: vec![Address::new(None, "A@example.com")],
            ..Default::default()
        };
        
        thread.absorb_message(&Message::from_new("ns", &thread.id.clone(), &first, Vec::new()));
        thread.absorb_message(&Message::from_new("ns", &thread.id.clone(), &second, Vec::new()));
        
        assert_eq!(thread.first_message_timestamp, early);
        assert_eq!(thread.last_message_timestamp, late);
        assert_eq!(thread.snippet, "later body");
        assert_eq!(thread.subject.as_deref(), Some("Hello"));
        assert_eq!(thread.participants.len(), 1);
        assert_eq!(thread.messages.len(), 2);
    }
}
