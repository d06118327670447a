use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Lowercase email -> CRM contact id, supplied per run by the download
/// collaborator. Lookups lowercase the query, so callers can pass contact
/// emails exactly as the feed spells them.
#[derive(Debug, Clone, Default)]
pub struct ContactDirectory {
    by_email: HashMap<String, String>,
}

impl ContactDirectory {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        let by_email = entries
            .into_iter()
            .map(|(email, id)| (email.to_ascii_lowercase(), id))
            .collect();
        Self { by_email }
    }

    pub fn contact_id(&self, email: &str) -> Option<&str> {
        self.by_email
            .get(&email.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}

impl<'de> Deserialize<'de> for ContactDirectory {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let map = HashMap::<String, String>::deserialize(de)?;
        Ok(Self::new(map))
    }
}
