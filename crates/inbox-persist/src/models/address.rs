use serde::{Deserialize, Serialize};

/// A `(name, email)` pair as it appears in From/To/Cc/Bcc headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
}

impl Address {
    pub fn new(name: Option<&str>, email: impl Into<String>) -> Self {
        Self {
            name: name.map(str::to_string),
            email: email.into(),
        }
    }
    
    /// Case-insensitive email comparison
    pub fn matches(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

pub(crate) fn any_matches(addresses: &[Address], email: &str) -> bool {
    addresses.iter().any(|a| a.matches(email))
}
