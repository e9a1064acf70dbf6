//! Thread-safe in-memory [`TokenStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{StoreFuture, TokenStore},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Keeps the credential in-process; the default store for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Returns `true` when no credential is present.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_none()
	}

	fn get_now(slot: &Slot) -> Option<Credential> {
		slot.read().clone()
	}

	fn set_now(slot: &Slot, credential: Credential) {
		*slot.write() = Some(credential);
	}

	fn clear_now(slot: &Slot) {
		*slot.write() = None;
	}
}
impl TokenStore for MemoryStore {
	fn get(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::get_now(&slot)) })
	}

	fn set(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::set_now(&slot, credential);

			Ok(())
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			Self::clear_now(&slot);

			Ok(())
		})
	}
}
