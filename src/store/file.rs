//! Simple file-backed [`TokenStore`] mirroring the browser-local persistence the client
//! replaces: the credential survives process restarts but never leaves the machine.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{StoreError, StoreFuture, TokenStore},
};

/// Persists the credential to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<Credential>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn load_snapshot(path: &Path) -> Result<Option<Credential>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let credential = serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})?;

		Ok(Some(credential))
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Option<Credential>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		match contents {
			Some(credential) => {
				let serialized =
					serde_json::to_vec_pretty(credential).map_err(|e| StoreError::Serialization {
						message: format!("Failed to serialize credential snapshot: {e}"),
					})?;
				let mut tmp_path = self.path.clone();

				tmp_path.set_extension("tmp");

				{
					let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
						message: format!("Failed to create {}: {e}", tmp_path.display()),
					})?;

					file.write_all(&serialized).map_err(|e| StoreError::Backend {
						message: format!("Failed to write {}: {e}", tmp_path.display()),
					})?;
				}

				fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
					message: format!("Failed to move snapshot into {}: {e}", self.path.display()),
				})
			},
			None =>
				if self.path.exists() {
					fs::remove_file(&self.path).map_err(|e| StoreError::Backend {
						message: format!("Failed to remove {}: {e}", self.path.display()),
					})
				} else {
					Ok(())
				},
		}
	}
}
impl TokenStore for FileStore {
	fn get(&self) -> StoreFuture<'_, Option<Credential>> {
		let inner = self.inner.clone();

		Box::pin(async move { Ok(inner.read().clone()) })
	}

	fn set(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let this = self.clone();

		Box::pin(async move {
			let mut slot = this.inner.write();

			*slot = Some(credential);

			this.persist_locked(&slot)
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let this = self.clone();

		Box::pin(async move {
			let mut slot = this.inner.write();

			*slot = None;

			this.persist_locked(&slot)
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use tempfile::TempDir;
	// self
	use super::*;

	fn credential_fixture(token: &str) -> Credential {
		Credential::builder()
			.access_token(token)
			.issued_now()
			.expires_in(Duration::minutes(30))
			.build()
			.expect("Credential fixture should build successfully.")
	}

	#[tokio::test]
	async fn snapshot_survives_reopen() {
		let dir = TempDir::new().expect("Temporary directory should be created for the store.");
		let path = dir.path().join("credential.json");
		let store = FileStore::open(&path).expect("Opening a fresh file store should succeed.");

		store
			.set(credential_fixture("persisted"))
			.await
			.expect("Writing the credential snapshot should succeed.");

		let reopened = FileStore::open(&path).expect("Reopening the file store should succeed.");
		let loaded = reopened
			.get()
			.await
			.expect("Reading the reopened store should succeed.")
			.expect("Snapshot should survive a reopen.");

		assert_eq!(loaded.access_token.expose(), "persisted");
	}

	#[tokio::test]
	async fn clear_removes_the_snapshot_file() {
		let dir = TempDir::new().expect("Temporary directory should be created for the store.");
		let path = dir.path().join("credential.json");
		let store = FileStore::open(&path).expect("Opening a fresh file store should succeed.");

		store
			.set(credential_fixture("ephemeral"))
			.await
			.expect("Writing the credential snapshot should succeed.");

		assert!(path.exists());

		store.clear().await.expect("Clearing the store should succeed.");

		assert!(!path.exists());
		assert!(
			store.get().await.expect("Reading the cleared store should succeed.").is_none(),
			"Cleared store must not return a credential.",
		);
	}

	#[tokio::test]
	async fn empty_file_loads_as_absent() {
		let dir = TempDir::new().expect("Temporary directory should be created for the store.");
		let path = dir.path().join("credential.json");

		fs::write(&path, b"").expect("Empty fixture file should be written.");

		let store = FileStore::open(&path).expect("Opening an empty file store should succeed.");

		assert!(store.get().await.expect("Reading the empty store should succeed.").is_none());
	}
}
