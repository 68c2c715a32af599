//! Intermediate contact store.
//!
//! A single JSON file holding a pretty-printed (2-space indent) array of
//! canonical contacts in admission order. Written once per ingest run
//! (overwrite), read once per upload run. This file is the only integration
//! surface between the two stages, so the round-trip must be lossless and
//! deterministic: the same contact set always produces the same bytes.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use contactpipe_shared::{CanonicalContact, ContactPipeError, Result};

/// File-backed store of canonical contacts.
pub struct ContactStore {
    path: PathBuf,
}

impl ContactStore {
    /// Create a handle for the store at `path`. Nothing is touched on disk
    /// until the first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store's file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the store with the full contact set, in the given order.
    pub fn write(&self, contacts: &[CanonicalContact]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ContactPipeError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(contacts)
            .map_err(|e| ContactPipeError::Store(format!("serialize contacts: {e}")))?;

        std::fs::write(&self.path, format!("{json}\n"))
            .map_err(|e| ContactPipeError::io(&self.path, e))?;

        info!(path = %self.path.display(), count = contacts.len(), "intermediate store written");
        Ok(())
    }

    /// Load the full contact set in stored order.
    ///
    /// JSON `null` property values normalize to `""` on the way in, keeping
    /// the never-null invariant for everything downstream.
    pub fn read(&self) -> Result<Vec<CanonicalContact>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ContactPipeError::io(&self.path, e))?;

        let contacts: Vec<CanonicalContact> = serde_json::from_str(&content).map_err(|e| {
            ContactPipeError::Store(format!("{}: invalid store file: {e}", self.path.display()))
        })?;

        debug!(path = %self.path.display(), count = contacts.len(), "intermediate store loaded");
        Ok(contacts)
    }

    /// SHA-256 hex digest of the store file's bytes, for idempotence
    /// reporting across runs.
    pub fn content_hash(&self) -> Result<String> {
        let bytes =
            std::fs::read(&self.path).map_err(|e| ContactPipeError::io(&self.path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contactpipe_shared::{ContactProperties, ID_PROPERTY_EMAIL, RunId};

    fn contact(email: &str) -> CanonicalContact {
        CanonicalContact {
            properties: ContactProperties {
                email: email.into(),
                firstname: "Test".into(),
                ..Default::default()
            },
            id: email.into(),
            id_property: ID_PROPERTY_EMAIL.into(),
        }
    }

    fn temp_store() -> (PathBuf, ContactStore) {
        let dir = std::env::temp_dir().join(format!("cp-store-test-{}", RunId::new()));
        let path = dir.join("contacts.json");
        (dir, ContactStore::new(&path))
    }

    #[test]
    fn roundtrip_preserves_order_and_values() {
        let (dir, store) = temp_store();

        let contacts = vec![contact("a@x.com"), contact("b@x.com"), contact("c@x.com")];
        store.write(&contacts).unwrap();

        let loaded = store.read().unwrap();
        assert_eq!(loaded, contacts);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn rewrite_is_byte_identical() {
        let (dir, store) = temp_store();

        let contacts = vec![contact("a@x.com"), contact("b@x.com")];
        store.write(&contacts).unwrap();
        let first_hash = store.content_hash().unwrap();

        store.write(&contacts).unwrap();
        assert_eq!(store.content_hash().unwrap(), first_hash);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn write_overwrites_previous_content() {
        let (dir, store) = temp_store();

        store.write(&[contact("a@x.com"), contact("b@x.com")]).unwrap();
        store.write(&[contact("c@x.com")]).unwrap();

        let loaded = store.read().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].properties.email, "c@x.com");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn store_is_pretty_printed_with_two_space_indent() {
        let (dir, store) = temp_store();

        store.write(&[contact("a@x.com")]).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {"));
        assert!(raw.contains("\n    \"properties\""));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let (dir, store) = temp_store();
        let err = store.read().unwrap_err();
        assert!(matches!(err, ContactPipeError::Io { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn null_fields_in_store_normalize_on_read() {
        let (dir, store) = temp_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"[{"properties": {"email": "a@x.com", "phone": null}, "id": "a@x.com", "idProperty": "email"}]"#,
        )
        .unwrap();

        let loaded = store.read().unwrap();
        assert_eq!(loaded[0].properties.phone, "");
        assert_eq!(loaded[0].properties.email, "a@x.com");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
