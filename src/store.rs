//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage contract for the single credential the client attaches to requests.
///
/// The surrounding application owns the store: logins and logouts mutate it directly. The
/// client only reads it per request, writes it from a successful refresh cycle, and clears
/// it when a cycle fails terminally. No other concurrent writer may exist.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if one is present.
	fn get(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Replaces the stored credential.
	fn set(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Removes the stored credential.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_serializes_for_diagnostics() {
		let error = StoreError::Serialization { message: "bad snapshot".into() };
		let payload =
			serde_json::to_string(&error).expect("Store error should serialize to JSON.");
		let round_trip: StoreError =
			serde_json::from_str(&payload).expect("Serialized error should deserialize.");

		assert_eq!(round_trip, error);
	}
}
