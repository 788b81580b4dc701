use crate::error::ChannelError;
use crate::types::SourceRef;
use std::future::Future;
use std::pin::Pin;

/// Deferred load of a source, resolved off the reactor thread
pub type PrepareFuture<C> = Pin<Box<dyn Future<Output = Result<C, ChannelError>> + Send + 'static>>;

/// Host playback primitive wrapped by an [`AudioChannel`](super::AudioChannel).
///
/// `prepare` is the only asynchronous step; everything else runs
/// synchronously on the reactor thread.
pub trait PlaybackBackend {
	type Clip: Send + 'static;

	/// Load and decode-check a source
	fn prepare(&self, source: &SourceRef) -> PrepareFuture<Self::Clip>;

	/// Begin audible output of a prepared clip, replacing anything current
	fn start(&mut self, clip: Self::Clip, looped: bool, volume: f32) -> Result<(), ChannelError>;

	/// Pause and rewind; idempotent
	fn halt(&mut self);

	fn set_volume(&mut self, volume: f32);

	fn is_audible(&self) -> bool;
}

#[cfg(test)]
pub mod mock {
	use super::*;
	use parking_lot::{Mutex, MutexGuard};
	use std::collections::HashSet;
	use std::sync::Arc;
	use tokio::sync::oneshot;

	type Gate = oneshot::Sender<Result<SourceRef, ChannelError>>;

	#[derive(Default)]
	pub struct MockState {
		/// Source currently producing output
		pub audible: Option<SourceRef>,
		/// Every source handed to `start`, in order
		pub started: Vec<SourceRef>,
		/// Times `start` was called while something was still audible
		pub overlaps: usize,
		pub volume: f32,
		pub looped: bool,
		/// Hold every prepare until released by the test
		pub gated: bool,
		/// Fail `start` as a blocked-autoplay host would
		pub refuse: bool,
		/// Sources whose prepare fails
		pub missing: HashSet<String>,
		gates: Vec<(SourceRef, Gate)>,
	}

	/// Scriptable backend; clones share state so tests can observe a channel's backend.
	#[derive(Clone, Default)]
	pub struct MockBackend {
		state: Arc<Mutex<MockState>>,
	}

	impl MockBackend {
		pub fn new() -> Self {
			Self::default()
		}

		pub fn gated() -> Self {
			let backend = Self::default();
			backend.state().gated = true;
			backend
		}

		pub fn state(&self) -> MutexGuard<'_, MockState> {
			self.state.lock()
		}

		pub fn audible(&self) -> Option<String> {
			self.state().audible.as_ref().map(|s| s.as_str().to_owned())
		}

		/// Resolve the oldest pending prepare for `source`
		pub fn release(&self, source: &str) {
			let (pending, gate) = {
				let mut state = self.state();
				let index = state
					.gates
					.iter()
					.position(|(s, _)| s.as_str() == source)
					.unwrap_or_else(|| panic!("no pending prepare for {}", source));
				state.gates.remove(index)
			};
			let _ = gate.send(Ok(pending));
		}

		pub fn pending_gates(&self) -> usize {
			self.state().gates.len()
		}
	}

	impl PlaybackBackend for MockBackend {
		type Clip = SourceRef;

		fn prepare(&self, source: &SourceRef) -> PrepareFuture<SourceRef> {
			let source = source.clone();
			let mut state = self.state();
			if state.missing.contains(source.as_str()) {
				return Box::pin(async move {
					Err(ChannelError::SourceUnavailable {
						reference: source.to_string(),
						reason: "not found".into(),
					})
				});
			}
			if state.gated {
				let (tx, rx) = oneshot::channel();
				state.gates.push((source, tx));
				return Box::pin(async move {
					rx.await
						.unwrap_or_else(|_| Err(ChannelError::PlaybackRefused("gate dropped".into())))
				});
			}
			Box::pin(async move { Ok(source) })
		}

		fn start(&mut self, clip: SourceRef, looped: bool, volume: f32) -> Result<(), ChannelError> {
			let mut state = self.state();
			if state.refuse {
				return Err(ChannelError::PlaybackRefused("user gesture required".into()));
			}
			if state.audible.is_some() {
				state.overlaps += 1;
			}
			state.started.push(clip.clone());
			state.audible = Some(clip);
			state.looped = looped;
			state.volume = volume;
			Ok(())
		}

		fn halt(&mut self) {
			self.state().audible = None;
		}

		fn set_volume(&mut self, volume: f32) {
			self.state().volume = volume;
		}

		fn is_audible(&self) -> bool {
			self.state().audible.is_some()
		}
	}
}
