//! Query filters shared by the thread and message listing endpoints.
//!
//! Parsing happens once per request; both backends then run the same
//! matching, ordering and paging over their candidate sets.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::{PersistError, Result};
use crate::models::{Message, Thread};

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    /// Newest first
    #[default]
    Date,
    Subject,
    /// Contact relevance; threads and messages fall back to date order
    Rank,
}

/// Raw, unvalidated query-string values
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub subject: Option<String>,
    pub thread: Option<String>,
    pub to: Option<String>,
    pub from: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub any_email: Option<String>,
    pub started_before: Option<String>,
    pub started_after: Option<String>,
    pub last_message_before: Option<String>,
    pub last_message_after: Option<String>,
    pub filename: Option<String>,
    pub tag: Option<String>,
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub namespace_id: String,
    pub subject: Option<String>,
    pub thread_id: Option<String>,
    pub to_addr: Option<String>,
    pub from_addr: Option<String>,
    pub cc_addr: Option<String>,
    pub bcc_addr: Option<String>,
    pub any_email: Option<String>,
    pub started_before: Option<DateTime<Utc>>,
    pub started_after: Option<DateTime<Utc>>,
    pub last_message_before: Option<DateTime<Utc>>,
    pub last_message_after: Option<DateTime<Utc>>,
    pub filename: Option<String>,
    pub tag: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub order_by: OrderBy,
}

impl Filter {
    /// Unrestricted filter over a namespace
    pub fn new(namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            subject: None,
            thread_id: None,
            to_addr: None,
            from_addr: None,
            cc_addr: None,
            bcc_addr: None,
            any_email: None,
            started_before: None,
            started_after: None,
            last_message_before: None,
            last_message_after: None,
            filename: None,
            tag: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
            order_by: OrderBy::Date,
        }
    }
    
    /// Validate query-string values into a filter
    pub fn parse(
        namespace_id: impl Into<String>,
        params: &FilterParams,
        limit: usize,
        offset: usize,
    ) -> Result<Self> {
        let order_by = match params.order_by.as_deref() {
            None | Some("date") => OrderBy::Date,
            Some("subject") => OrderBy::Subject,
            Some("rank") => OrderBy::Rank,
            Some(other) => {
                return Err(PersistError::InvalidFilter(format!(
                    "Invalid order_by parameter: {}",
                    other
                )))
            }
        };
        
        let filter = Self {
            subject: params.subject.clone(),
            thread_id: params.thread.as_deref().map(str::to_lowercase),
            to_addr: params.to.clone(),
            from_addr: params.from.clone(),
            cc_addr: params.cc.clone(),
            bcc_addr: params.bcc.clone(),
            any_email: params.any_email.clone(),
            started_before: parse_timestamp("started_before", params.started_before.as_deref())?,
            started_after: parse_timestamp("started_after", params.started_after.as_deref())?,
            last_message_before: parse_timestamp("last_message_before", params.last_message_before.as_deref())?,
            last_message_after: parse_timestamp("last_message_after", params.last_message_after.as_deref())?,
            filename: params.filename.clone(),
            tag: params.tag.clone(),
            order_by,
            ..Self::new(namespace_id)
        };
        Ok(filter.with_page(limit, offset))
    }
    
    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
    
    /// Whether matching needs to look at the messages of a thread
    pub fn needs_messages(&self) -> bool {
        self.to_addr.is_some()
            || self.from_addr.is_some()
            || self.cc_addr.is_some()
            || self.bcc_addr.is_some()
            || self.any_email.is_some()
            || self.filename.is_some()
    }
    
    fn matches_thread_fields(&self, thread: &Thread) -> bool {
        if thread.namespace_id != self.namespace_id {
            return false;
        }
        if let Some(ref subject) = self.subject {
            if thread.subject.as_deref() != Some(subject.as_str()) {
                return false;
            }
        }
        if let Some(ref thread_id) = self.thread_id {
            if &thread.id != thread_id {
                return false;
            }
        }
        if let Some(ref tag) = self.tag {
            if !thread.has_tag(tag) {
                return false;
            }
        }
        if self.started_before.is_some_and(|t| thread.first_message_timestamp >= t) {
            return false;
        }
        if self.started_after.is_some_and(|t| thread.first_message_timestamp <= t) {
            return false;
        }
        if self.last_message_before.is_some_and(|t| thread.last_message_timestamp >= t) {
            return false;
        }
        if self.last_message_after.is_some_and(|t| thread.last_message_timestamp <= t) {
            return false;
        }
        true
    }
    
    /// Thread-level match: every message-based criterion must be met by
    /// at least one message of the thread
    pub fn matches_thread(&self, thread: &Thread, messages: &[&Message]) -> bool {
        if !self.matches_thread_fields(thread) {
            return false;
        }
        if let Some(ref addr) = self.to_addr {
            if !any_message(messages, |m: &Message| m.to.iter().any(|a| a.matches(addr))) {
                return false;
            }
        }
        if let Some(ref addr) = self.from_addr {
            if !any_message(messages, |m: &Message| m.from.iter().any(|a| a.matches(addr))) {
                return false;
            }
        }
        if let Some(ref addr) = self.cc_addr {
            if !any_message(messages, |m: &Message| m.cc.iter().any(|a| a.matches(addr))) {
                return false;
            }
        }
        if let Some(ref addr) = self.bcc_addr {
            if !any_message(messages, |m: &Message| m.bcc.iter().any(|a| a.matches(addr))) {
                return false;
            }
        }
        if let Some(ref email) = self.any_email {
            if !any_message(messages, |m: &Message| m.involves(email)) {
                return false;
            }
        }
        if let Some(ref filename) = self.filename {
            if !any_message(messages, |m: &Message| m.has_file_named(filename)) {
                return false;
            }
        }
        true
    }
    
    /// Message-level match; thread criteria are checked against the
    /// message's thread
    pub fn matches_message(&self, message: &Message, thread: &Thread) -> bool {
        if message.namespace_id != self.namespace_id || !self.matches_thread_fields(thread) {
            return false;
        }
        if self.to_addr.as_ref().is_some_and(|a| !message.to.iter().any(|x| x.matches(a))) {
            return false;
        }
        if self.from_addr.as_ref().is_some_and(|a| !message.from.iter().any(|x| x.matches(a))) {
            return false;
        }
        if self.cc_addr.as_ref().is_some_and(|a| !message.cc.iter().any(|x| x.matches(a))) {
            return false;
        }
        if self.bcc_addr.as_ref().is_some_and(|a| !message.bcc.iter().any(|x| x.matches(a))) {
            return false;
        }
        if self.any_email.as_ref().is_some_and(|e| !message.involves(e)) {
            return false;
        }
        if self.filename.as_ref().is_some_and(|f| !message.has_file_named(f)) {
            return false;
        }
        true
    }
    
    /// Match, order and page a candidate set of threads
    pub fn apply_threads(&self, threads: Vec<Thread>, messages: &[Message]) -> Vec<Thread> {
        let mut by_thread: HashMap<&str, Vec<&Message>> = HashMap::new();
        for message in messages {
            by_thread.entry(message.thread_id.as_str()).or_default().push(message);
        }
        let empty = Vec::new();
        
        let mut matched: Vec<Thread> = threads
            .into_iter()
            .filter(|t| {
                let msgs = by_thread.get(t.id.as_str()).unwrap_or(&empty);
                self.matches_thread(t, msgs)
            })
            .collect();
        
        match self.order_by {
            OrderBy::Date | OrderBy::Rank => {
                matched.sort_by(|a, b| b.last_message_timestamp.cmp(&a.last_message_timestamp))
            }
            OrderBy::Subject => matched.sort_by(|a, b| {
                a.subject
                    .cmp(&b.subject)
                    .then(b.last_message_timestamp.cmp(&a.last_message_timestamp))
            }),
        }
        
        matched.into_iter().skip(self.offset).take(self.limit).collect()
    }
    
    /// Match, order and page a candidate set of messages
    pub fn apply_messages(&self, messages: Vec<Message>, threads: &[Thread]) -> Vec<Message> {
        let threads: HashMap<&str, &Thread> = threads.iter().map(|t| (t.id.as_str(), t)).collect();
        
        let mut matched: Vec<Message> = messages
            .into_iter()
            .filter(|m| {
                threads
                    .get(m.thread_id.as_str())
                    .is_some_and(|t| self.matches_message(m, t))
            })
            .collect();
        
        match self.order_by {
            OrderBy::Date | OrderBy::Rank => matched.sort_by(|a, b| b.date.cmp(&a.date)),
            OrderBy::Subject => matched.sort_by(|a, b| a.subject.cmp(&b.subject).then(b.date.cmp(&a.date))),
        }
        
        matched.into_iter().skip(self.offset).take(self.limit).collect()
    }
}

fn any_message(messages: &[&Message], pred: impl Fn(&Message) -> bool) -> bool {
    messages.iter().any(|m| pred(*m))
}

fn parse_timestamp(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let invalid = || PersistError::InvalidFilter(format!("Invalid timestamp value for {}: {}", name, value));
    
    let seconds: i64 = value.trim().parse().map_err(|_| invalid())?;
    Utc.timestamp_opt(seconds, 0).single().map(Some).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let filter = Filter::parse("ns", &FilterParams::default(), 10, 0).unwrap();
        assert_eq!(filter, Filter::new("ns"));
        assert!(!filter.needs_messages());
    }

    #[test]
    fn test_parse_rejects_bad_timestamps() {
        let params = FilterParams {
            started_before: Some("yesterday".into()),
            ..Default::default()
        };
        let err = Filter::parse("ns", &params, 10, 0).unwrap_err();
        assert!(matches!(err, PersistError::InvalidFilter(_)));
    }

    #[test]
    fn test_parse_order_by() {
        let params = FilterParams {
            order_by: Some("subject".into()),
            thread: Some("ABC".into()),
            last_message_after: Some("1400000000".into()),
            ..Default::default()
        };
        let filter = Filter::parse("ns", &params, 5, 2).unwrap();
        assert_eq!(filter.order_by, OrderBy::Subject);
        assert_eq!(filter.thread_id.as_deref(), Some("abc"));
        assert_eq!(filter.last_message_after.unwrap().timestamp(), 1_400_000_000);
        assert_eq!((filter.limit, filter.offset), (5, 2));
        
        let bad = FilterParams {
            order_by: Some("size".into()),
            ..Default::default()
        };
        assert!(Filter::parse("ns", &bad, 10, 0).is_err());
    }
}
