use quill_types::Credential;
use tracing::debug;

use crate::database::Database;
use crate::error::{StoreError, StoreResult};
use crate::schema::Key;
use crate::traits::CredentialStore;

fn decode_list(data: Option<Vec<u8>>) -> StoreResult<Vec<Credential>> {
    match data {
        Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
        _ => Ok(Vec::new()),
    }
}

impl CredentialStore for Database {
    fn add(&self, credential: &Credential) -> StoreResult<()> {
        let len = self.update_raw(Key::Credentials, |data| {
            let mut list = decode_list(data)?;
            list.push(credential.clone());
            Ok((serde_json::to_vec(&list)?, list.len()))
        })?;
        debug!(name = %credential.name, len, "credential added");
        Ok(())
    }

    fn remove(&self, credential: &Credential) -> StoreResult<()> {
        let len = self.update_raw(Key::Credentials, |data| {
            let mut list = decode_list(data)?;
            let index = list
                .iter()
                .position(|c| c == credential)
                .ok_or(StoreError::NoMatchingCredential)?;
            list.remove(index);
            Ok((serde_json::to_vec(&list)?, list.len()))
        })?;
        debug!(name = %credential.name, len, "credential removed");
        Ok(())
    }

    fn all(&self) -> StoreResult<Vec<Credential>> {
        self.load(Key::Credentials)
    }

    fn by_index(&self, index: usize) -> StoreResult<Credential> {
        let mut list = self.all()?;
        if index >= list.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: list.len(),
            });
        }
        Ok(list.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::migration::NoMigration;
    use quill_types::CredentialKind;
    use std::sync::Arc;
    use std::thread;

    fn open(dir: &tempfile::TempDir) -> Database {
        Database::open_with(dir.path(), StoreConfig::default(), &NoMigration).unwrap()
    }

    fn user(name: &str) -> Credential {
        Credential::new(name, format!("token-{name}"), CredentialKind::Oauth).unwrap()
    }

    #[test]
    fn empty_store_has_no_credentials() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open(&dir).all().unwrap().is_empty());
    }

    #[test]
    fn add_keeps_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        db.add(&user("a")).unwrap();
        db.add(&user("b")).unwrap();
        assert_eq!(db.all().unwrap(), vec![user("a"), user("b")]);
    }

    #[test]
    fn remove_then_lookup_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        db.add(&user("a")).unwrap();
        db.add(&user("b")).unwrap();

        db.remove(&user("a")).unwrap();
        assert_eq!(db.all().unwrap(), vec![user("b")]);
        assert_eq!(db.by_index(0).unwrap(), user("b"));
        assert!(matches!(
            db.by_index(1),
            Err(StoreError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn removing_only_record_leaves_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        db.add(&user("solo")).unwrap();
        db.remove(&user("solo")).unwrap();
        assert!(db.all().unwrap().is_empty());
    }

    #[test]
    fn remove_without_match_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        db.add(&user("a")).unwrap();

        let mut other = user("a");
        other.kind = CredentialKind::Sandbox;
        assert!(matches!(db.remove(&other), Err(StoreError::NoMatchingCredential)));
        assert_eq!(db.all().unwrap(), vec![user("a")]);
    }

    #[test]
    fn remove_from_empty_store_reports_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        assert!(matches!(db.remove(&user("a")), Err(StoreError::NoMatchingCredential)));
    }

    #[test]
    fn duplicates_are_kept_and_removed_one_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        db.add(&user("a")).unwrap();
        db.add(&user("a")).unwrap();
        assert_eq!(db.all().unwrap().len(), 2);

        db.remove(&user("a")).unwrap();
        assert_eq!(db.all().unwrap(), vec![user("a")]);
    }

    #[test]
    fn by_index_on_empty_store_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open(&dir).by_index(0),
            Err(StoreError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn by_index_returns_the_right_record() {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir);
        for name in ["a", "b", "c"] {
            db.add(&user(name)).unwrap();
        }
        assert_eq!(db.by_index(0).unwrap(), user("a"));
        assert_eq!(db.by_index(2).unwrap(), user("c"));
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(open(&dir));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    for i in 0..10 {
                        db.add(&user(&format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(db.all().unwrap().len(), 40);
    }
}
