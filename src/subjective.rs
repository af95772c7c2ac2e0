//! User-local annotations on products: rating, tags and notes.
//!
//! Stored in a single JSON file next to the user's settings, never in the
//! catalog files. Keys are `"<brand>/<product id>"`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectiveFields {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubjectiveFields {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.tags.is_empty() && self.notes.is_empty()
    }
}

pub fn product_key(brand_id: &str, product_id: &str) -> String {
    format!("{}/{}", brand_id, product_id)
}

pub struct SubjectiveStore {
    path: PathBuf,
    entries: BTreeMap<String, SubjectiveFields>,
}

impl SubjectiveStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, key: &str) -> Option<&SubjectiveFields> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&mut self, key: &str) -> &mut SubjectiveFields {
        let fields = self.entries.entry(key.to_string()).or_default();
        fields.updated_at = Some(Utc::now());
        fields
    }

    fn prune(&mut self, key: &str) {
        if self.entries.get(key).is_some_and(SubjectiveFields::is_empty) {
            self.entries.remove(key);
        }
    }

    /// Set (1–5) or clear (`None`) the rating.
    pub fn set_rating(&mut self, key: &str, rating: Option<u8>) -> Result<()> {
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                bail!("rating must be between 1 and 5, got {}", r);
            }
        }
        self.entry(key).rating = rating;
        self.prune(key);
        Ok(())
    }

    /// Add a tag (trimmed, lower-cased, deduplicated). Returns false if the
    /// tag was empty or already present.
    pub fn add_tag(&mut self, key: &str, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return false;
        }
        let fields = self.entry(key);
        if fields.tags.contains(&tag) {
            return false;
        }
        fields.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, key: &str, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        let Some(fields) = self.entries.get_mut(key) else {
            return false;
        };
        let before = fields.tags.len();
        fields.tags.retain(|t| *t != tag);
        let removed = fields.tags.len() != before;
        if removed {
            fields.updated_at = Some(Utc::now());
        }
        self.prune(key);
        removed
    }

    pub fn set_notes(&mut self, key: &str, notes: &str) {
        self.entry(key).notes = notes.trim().to_string();
        self.prune(key);
    }

    pub fn clear(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Write the store back to its file, creating parent directories.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let body = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/subjective.json");
        let key = product_key("roland", "r1");

        let mut store = SubjectiveStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set_rating(&key, Some(4)).unwrap();
        assert!(store.add_tag(&key, "  Studio "));
        assert!(!store.add_tag(&key, "studio"));
        store.set_notes(&key, "Great for pads");
        store.save().unwrap();

        let reopened = SubjectiveStore::open(&path).unwrap();
        let fields = reopened.get(&key).unwrap();
        assert_eq!(fields.rating, Some(4));
        assert_eq!(fields.tags, vec!["studio"]);
        assert_eq!(fields.notes, "Great for pads");
        assert!(fields.updated_at.is_some());
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = SubjectiveStore::open(&tmp.path().join("s.json")).unwrap();
        assert!(store.set_rating("nord/n1", Some(6)).is_err());
        assert!(store.set_rating("nord/n1", Some(0)).is_err());
        assert!(store.get("nord/n1").is_none());
    }

    #[test]
    fn test_emptied_entries_are_pruned() {
        let tmp = TempDir::new().unwrap();
        let mut store = SubjectiveStore::open(&tmp.path().join("s.json")).unwrap();
        store.add_tag("nord/n1", "live");
        assert!(store.remove_tag("nord/n1", "LIVE"));
        assert!(store.get("nord/n1").is_none());

        store.set_rating("nord/n1", Some(2)).unwrap();
        store.set_rating("nord/n1", None).unwrap();
        assert!(store.is_empty());
    }
}
