//! Single-flight coordination for credential refresh cycles.
//!
//! Every request that hits an authorization failure enters the coordinator instead of racing
//! its own refresh call. The first caller becomes the cycle leader and performs the
//! round-trip; callers arriving while the cycle is in flight enqueue as waiters and receive
//! the leader's outcome in FIFO order. The `refreshing` flag is checked and claimed under
//! one lock acquisition, so two callers can never both observe an idle coordinator.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::Credential, error::RefreshError};

/// Outcome published to the leader and every queued waiter when a cycle completes.
pub(crate) type RefreshOutcome = Result<Credential, RefreshError>;

type Waiter = oneshot::Sender<RefreshOutcome>;

/// Serializes refresh cycles and fans each outcome out to queued waiters in FIFO order.
#[derive(Debug, Default)]
pub(crate) struct RefreshCoordinator {
	state: Mutex<RefreshState>,
}

#[derive(Debug, Default)]
struct RefreshState {
	refreshing: bool,
	waiters: VecDeque<Waiter>,
}

/// Role assigned to a caller entering the refresh protocol.
#[derive(Debug)]
pub(crate) enum Ticket<'a> {
	/// Caller must perform the refresh round-trip and complete the cycle.
	Leader(LeaderGuard<'a>),
	/// Caller waits for the in-flight leader's outcome.
	Follower(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
	/// Joins the current cycle, claiming leadership when none is in flight.
	pub(crate) fn join(&self) -> Ticket<'_> {
		let mut state = self.state.lock();

		if state.refreshing {
			let (sender, receiver) = oneshot::channel();

			state.waiters.push_back(sender);

			Ticket::Follower(receiver)
		} else {
			state.refreshing = true;

			Ticket::Leader(LeaderGuard { coordinator: self, completed: false })
		}
	}

	/// Drains the queue in FIFO order, then resets the flag, within one critical section.
	fn finish(&self, outcome: &RefreshOutcome) {
		let mut state = self.state.lock();

		for waiter in state.waiters.drain(..) {
			// A follower that stopped awaiting has dropped its receiver; delivery is best
			// effort and a closed channel is not an error here.
			let _ = waiter.send(outcome.clone());
		}

		state.refreshing = false;
	}

	#[cfg(test)]
	pub(crate) fn is_idle(&self) -> bool {
		let state = self.state.lock();

		!state.refreshing && state.waiters.is_empty()
	}
}

/// Leadership token for one refresh cycle.
///
/// Dropping the guard without calling [`LeaderGuard::complete`] rejects every waiter with
/// [`RefreshError::Aborted`], so a cancelled leader cannot strand the queue.
#[derive(Debug)]
pub(crate) struct LeaderGuard<'a> {
	coordinator: &'a RefreshCoordinator,
	completed: bool,
}
impl LeaderGuard<'_> {
	/// Publishes the cycle outcome to every queued waiter and closes the cycle.
	pub(crate) fn complete(mut self, outcome: &RefreshOutcome) {
		self.completed = true;
		self.coordinator.finish(outcome);
	}
}
impl Drop for LeaderGuard<'_> {
	fn drop(&mut self) {
		if !self.completed {
			self.coordinator.finish(&Err(RefreshError::Aborted));
		}
	}
}
