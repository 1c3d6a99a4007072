pub mod storage;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use storage::KeyValueStorage;

/// Slot name the verse list is persisted under
pub const STORAGE_KEY: &str = "verses";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    pub text: String,
    pub book: String,
    pub chapter: String,
    #[serde(alias = "verse")]
    pub verse_number: String,
    #[serde(default)]
    pub theme: String,
}

impl Verse {
    pub fn new(
        text: impl Into<String>,
        book: impl Into<String>,
        chapter: impl Into<String>,
        verse_number: impl Into<String>,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            book: book.into(),
            chapter: chapter.into(),
            verse_number: verse_number.into(),
            theme: theme.into(),
        }
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.text.is_empty() {
            missing.push("text");
        }
        if self.book.is_empty() {
            missing.push("book");
        }
        if self.chapter.is_empty() {
            missing.push("chapter");
        }
        if self.verse_number.is_empty() {
            missing.push("verse");
        }
        missing
    }

    /// "Book chapter:verse"
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse_number)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Please fill in all fields (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("No verse at position {0}")]
    IndexOutOfRange(usize),

    #[error("Failed to save verses: {0}")]
    Storage(#[source] anyhow::Error),
}

impl StoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::MissingFields(_))
    }
}

/// Ordered verse list mirrored to a key-value slot after every change.
///
/// New verses go to the front. The store also owns the edit cursor (which
/// entry the next submit overwrites) and the theme filter applied to
/// [`VerseStore::displayed`].
pub struct VerseStore<S: KeyValueStorage> {
    storage: S,
    verses: Vec<Verse>,
    editing: Option<usize>,
    theme_filter: Option<String>,
}

impl<S: KeyValueStorage> VerseStore<S> {
    /// Load the persisted list; anything unreadable counts as an empty list
    pub fn load(storage: S) -> Self {
        let verses = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Verse>>(&raw) {
                Ok(verses) => verses,
                Err(e) => {
                    tracing::warn!("Ignoring malformed verse list: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read verse list: {:#}", e);
                Vec::new()
            }
        };

        tracing::debug!("Loaded {} verses", verses.len());

        Self {
            storage,
            verses,
            editing: None,
            theme_filter: None,
        }
    }

    #[cfg(test)]
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    pub fn get(&self, index: usize) -> Option<&Verse> {
        self.verses.get(index)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn editing(&self) -> Option<usize> {
        self.editing
    }

    pub fn theme_filter(&self) -> Option<&str> {
        self.theme_filter.as_deref()
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Label for the form's submit action
    pub fn submit_label(&self) -> &'static str {
        if self.editing.is_some() {
            "Save changes"
        } else {
            "Add"
        }
    }

    /// Prepend a new verse
    pub fn add(&mut self, verse: Verse) -> Result<(), StoreError> {
        Self::validate(&verse)?;

        self.verses.insert(0, verse);
        self.editing = None;
        self.persist()
    }

    /// Replace the verse at `index` in place
    pub fn edit(&mut self, index: usize, verse: Verse) -> Result<(), StoreError> {
        Self::validate(&verse)?;

        let slot = self
            .verses
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange(index))?;
        *slot = verse;
        self.editing = None;
        self.persist()
    }

    /// Add or edit depending on whether an edit is in progress
    pub fn submit(&mut self, verse: Verse) -> Result<(), StoreError> {
        match self.editing {
            Some(index) => self.edit(index, verse),
            None => self.add(verse),
        }
    }

    /// Start editing the verse at `index`, returning a copy for the form
    pub fn begin_edit(&mut self, index: usize) -> Option<Verse> {
        let verse = self.verses.get(index)?.clone();
        self.editing = Some(index);
        Some(verse)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Remove the verse at `index`
    pub fn delete(&mut self, index: usize) -> Result<Verse, StoreError> {
        if index >= self.verses.len() {
            return Err(StoreError::IndexOutOfRange(index));
        }

        let removed = self.verses.remove(index);

        // Keep the cursor on the same verse, or drop it if that verse is gone
        self.editing = match self.editing {
            Some(cursor) if cursor == index => None,
            Some(cursor) if cursor > index => Some(cursor - 1),
            other => other,
        };

        self.persist()?;
        Ok(removed)
    }

    /// Restrict `displayed` to one theme; an empty string clears the filter
    pub fn filter_by_theme(&mut self, theme: &str) {
        self.theme_filter = if theme.is_empty() {
            None
        } else {
            Some(theme.to_string())
        };
    }

    pub fn clear_filter(&mut self) {
        self.theme_filter = None;
    }

    /// Visible verses paired with their index in the full list
    pub fn displayed(&self) -> Vec<(usize, &Verse)> {
        self.verses
            .iter()
            .enumerate()
            .filter(|(_, v)| match &self.theme_filter {
                Some(theme) => &v.theme == theme,
                None => true,
            })
            .collect()
    }

    /// Unique non-empty themes in first-seen order
    pub fn distinct_themes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.verses
            .iter()
            .filter(|v| !v.theme.is_empty())
            .filter(|v| seen.insert(v.theme.as_str()))
            .map(|v| v.theme.clone())
            .collect()
    }

    fn validate(verse: &Verse) -> Result<(), StoreError> {
        let missing = verse.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::MissingFields(missing))
        }
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.verses)
            .map_err(|e| StoreError::Storage(e.into()))?;
        self.storage
            .set(STORAGE_KEY, &json)
            .map_err(StoreError::Storage)?;
        tracing::debug!("Persisted {} verses", self.verses.len());
        Ok(())
    }
}
