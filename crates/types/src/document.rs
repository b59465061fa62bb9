use serde::{Deserialize, Serialize};

/// Title and author embedded in the merged artifact's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

impl DocumentInfo {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self { title: title.into(), author: author.into() }
    }

    /// Fills empty fields from `fallback`.
    pub fn or(self, fallback: &DocumentInfo) -> Self {
        Self {
            title: if self.title.is_empty() { fallback.title.clone() } else { self.title },
            author: if self.author.is_empty() { fallback.author.clone() } else { self.author },
        }
    }
}
