//! Profile persistence
//!
//! The form state lives in a flat string key/value store: one entry per
//! profile field, plus the dash-joined `reasons` and the
//! `typeNationality` category. Backends implement [`KeyValueStore`];
//! [`ProfileStore`] adds the profile-shaped operations on top.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AttestationError;
use crate::profile::{strip_field_prefix, Category, Profile, ReasonSet, NO_REASON};

/// Storage key holding the dash-joined reason codes
pub const REASONS_KEY: &str = "reasons";
/// Storage key holding the category code
pub const CATEGORY_KEY: &str = "typeNationality";

/// Flat, durable string store
pub trait KeyValueStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AttestationError>;
    fn get_item(&self, key: &str) -> Result<Option<String>, AttestationError>;
    fn keys(&self) -> Result<Vec<String>, AttestationError>;
    fn clear(&mut self) -> Result<(), AttestationError>;
}

/// In-process store, used by tests and as a scratch backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AttestationError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, AttestationError> {
        Ok(self.entries.get(key).cloned())
    }

    fn keys(&self) -> Result<Vec<String>, AttestationError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), AttestationError> {
        self.entries.clear();
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// A missing file reads as an empty store. Every write rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, AttestationError> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                AttestationError::Storage(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(AttestationError::Storage(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), AttestationError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AttestationError::Storage(e.to_string()))?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| AttestationError::SerializationError(e.to_string()))?;
        fs::write(&self.path, json)
            .map_err(|e| AttestationError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}

impl KeyValueStore for FileStore {
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), AttestationError> {
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, AttestationError> {
        Ok(self.read()?.remove(key))
    }

    fn keys(&self) -> Result<Vec<String>, AttestationError> {
        Ok(self.read()?.into_keys().collect())
    }

    fn clear(&mut self) -> Result<(), AttestationError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AttestationError::Storage(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// Profile-shaped view over a key/value backend
#[derive(Debug, Clone, Default)]
pub struct ProfileStore<S> {
    backend: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Write every profile field under its field name
    pub fn save(&mut self, profile: &Profile) -> Result<(), AttestationError> {
        for (name, value) in profile.fields() {
            self.backend.set_item(name, value)?;
        }
        Ok(())
    }

    /// Write raw form inputs, keyed by input id without the `field-` prefix
    pub fn save_form_fields<'a, I>(&mut self, inputs: I) -> Result<(), AttestationError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (id, value) in inputs {
            self.backend.set_item(strip_field_prefix(id), value)?;
        }
        Ok(())
    }

    pub fn save_category(&mut self, category: &Category) -> Result<(), AttestationError> {
        self.backend.set_item(CATEGORY_KEY, category.code())
    }

    pub fn save_reasons(&mut self, reasons: &ReasonSet) -> Result<(), AttestationError> {
        self.backend.set_item(REASONS_KEY, &reasons.joined())
    }

    /// Category plus reasons; nationals store the `N/A` placeholder
    pub fn save_selection(
        &mut self,
        category: &Category,
        reasons: &ReasonSet,
    ) -> Result<(), AttestationError> {
        self.save_category(category)?;
        if category.is_national() {
            self.backend.set_item(REASONS_KEY, NO_REASON)
        } else {
            self.save_reasons(reasons)
        }
    }

    /// Every stored entry, selection keys included
    pub fn load_fields(&self) -> Result<BTreeMap<String, String>, AttestationError> {
        let mut fields = BTreeMap::new();
        for key in self.backend.keys()? {
            if let Some(value) = self.backend.get_item(&key)? {
                fields.insert(key, value);
            }
        }
        Ok(fields)
    }

    pub fn load(&self) -> Result<Profile, AttestationError> {
        Ok(Profile::from_fields(&self.load_fields()?))
    }

    /// Stored category and reasons. An absent category reads as `None`.
    pub fn load_selection(&self) -> Result<(Option<Category>, ReasonSet), AttestationError> {
        let category = self.backend.get_item(CATEGORY_KEY)?.map(Category::from);
        let reasons = match self.backend.get_item(REASONS_KEY)? {
            Some(joined) => joined.parse()?,
            None => ReasonSet::new(),
        };
        Ok((category, reasons))
    }

    pub fn clear(&mut self) -> Result<(), AttestationError> {
        self.backend.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Reason;

    fn sample() -> Profile {
        Profile {
            firstname: "Lea".into(),
            lastname: "Moreau".into(),
            birthday: "30/04/2001".into(),
            nationality: "French".into(),
            address: "1 place Bellecour".into(),
            zipcode: "69002".into(),
            town: "Lyon".into(),
            country: "France".into(),
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let mut store = ProfileStore::new(MemoryStore::new());
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_clear_after_save_leaves_nothing() {
        let mut store = ProfileStore::new(MemoryStore::new());
        store.save(&sample()).unwrap();
        store.save_category(&Category::EuNational).unwrap();
        store.clear().unwrap();
        assert!(store.load_fields().unwrap().is_empty());
        assert_eq!(store.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_form_fields_are_stripped() {
        let mut store = ProfileStore::new(MemoryStore::new());
        store
            .save_form_fields([("field-firstname", "Lea"), ("field-town", "Lyon")])
            .unwrap();
        let fields = store.load_fields().unwrap();
        assert_eq!(fields.get("firstname").map(String::as_str), Some("Lea"));
        assert_eq!(fields.get("town").map(String::as_str), Some("Lyon"));
        assert!(!fields.contains_key("field-town"));
    }

    #[test]
    fn test_national_selection_stores_placeholder() {
        let mut store = ProfileStore::new(MemoryStore::new());
        let reasons = ReasonSet::from_codes(["transit"]).unwrap();
        store.save_selection(&Category::National, &reasons).unwrap();

        let fields = store.load_fields().unwrap();
        assert_eq!(fields.get(REASONS_KEY).map(String::as_str), Some("N/A"));
        let (category, stored) = store.load_selection().unwrap();
        assert_eq!(category, Some(Category::National));
        assert!(stored.is_empty());
    }

    #[test]
    fn test_selection_round_trip() {
        let mut store = ProfileStore::new(MemoryStore::new());
        let reasons = ReasonSet::from_codes(["equipage", "transit"]).unwrap();
        store.save_category(&Category::ForeignNational).unwrap();
        store.save_reasons(&reasons).unwrap();

        let fields = store.load_fields().unwrap();
        assert_eq!(fields.get(REASONS_KEY).map(String::as_str), Some("equipage-transit"));
        assert_eq!(fields.get(CATEGORY_KEY).map(String::as_str), Some("tiers"));

        let (category, loaded) = store.load_selection().unwrap();
        assert_eq!(category, Some(Category::ForeignNational));
        assert!(loaded.contains(Reason::Crew));
        assert_eq!(loaded, reasons);
    }

    #[test]
    fn test_empty_selection() {
        let store = ProfileStore::new(MemoryStore::new());
        let (category, reasons) = store.load_selection().unwrap();
        assert!(category.is_none());
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_file_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profile.json");

        let mut first = ProfileStore::new(FileStore::new(&path));
        first.save(&sample()).unwrap();

        let second = ProfileStore::new(FileStore::new(&path));
        assert_eq!(second.load().unwrap(), sample());
    }

    #[test]
    fn test_file_store_missing_file_is_empty_and_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProfileStore::new(FileStore::new(dir.path().join("absent.json")));
        assert!(store.load_fields().unwrap().is_empty());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = ProfileStore::new(FileStore::new(&path));
        assert!(matches!(
            store.load_fields(),
            Err(AttestationError::Storage(_))
        ));
    }
}
