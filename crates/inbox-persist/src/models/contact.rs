use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactSource {
    /// Created through the API
    Local,
    /// Pulled from the provider's address book
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub namespace_id: String,
    pub account_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: ContactSource,
    pub created_at: DateTime<Utc>,
}

impl Contact {
    pub fn new(
        namespace_id: &str,
        account_id: &str,
        name: Option<String>,
        email: Option<String>,
        source: ContactSource,
    ) -> Self {
        Self {
            id: crate::public_id::generate(),
            namespace_id: namespace_id.to_string(),
            account_id: account_id.to_string(),
            name,
            email,
            source,
            created_at: Utc::now(),
        }
    }
    
    /// Relevance of this contact for a free-text query; 0 means no match
    pub fn rank(&self, query: &str) -> u32 {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return 1;
        }
        
        [self.email.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(|field| {
                let field = field.to_lowercase();
                if field == query {
                    3
                } else if field.starts_with(&query) {
                    2
                } else if field.contains(&query) {
                    1
                } else {
                    0
                }
            })
            .max()
            .unwrap_or(0)
    }
}

/// Rank-ordered page of contacts matching `query`, ties kept in insertion order
pub fn rank_search(contacts: Vec<Contact>, query: &str, limit: usize, offset: usize) -> Vec<Contact> {
    let mut scored: Vec<(u32, Contact)> = contacts
        .into_iter()
        .map(|c| (c.rank(query), c))
        .filter(|(score, _)| *score > 0)
        .collect();
    // stable sort keeps insertion order within a score
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|(_, c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str) -> Contact {
        Contact::new("ns", "acct", Some(name.into()), Some(email.into()), ContactSource::Local)
    }

    #[test]
    fn test_rank_prefers_exact_then_prefix() {
        let c = contact("Alice Smith", "alice@example.com");
        assert_eq!(c.rank("alice@example.com"), 3);
        assert_eq!(c.rank("ALICE"), 2);
        assert_eq!(c.rank("smith"), 1);
        assert_eq!(c.rank("bob"), 0);
    }

    #[test]
    fn test_rank_search_orders_and_pages() {
        let contacts = vec![
            contact("Bob Alison", "bob@example.com"),
            contact("Alice", "alice@example.com"),
            contact("Carol", "carol@example.com"),
        ];
        
        let results = rank_search(contacts.clone(), "ali", 10, 0);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name.as_deref(), Some("Alice"));
        
        let paged = rank_search(contacts, "ali", 1, 1);
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].name.as_deref(), Some("Bob Alison"));
    }
}
