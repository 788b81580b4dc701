pub mod backend;
pub mod device;
pub mod fetch;
pub mod output;

pub use backend::PlaybackBackend;

use crate::error::ChannelError;
use crate::reactor::{AudioEvent, ComponentResponse, Event};
use crate::types::{ChannelKind, SourceRef};
use tokio::sync::mpsc;

/// A prepare future that resolved, tagged with the request that spawned it
struct Settled<C> {
	generation: u64,
	source: SourceRef,
	result: Result<C, ChannelError>,
}

#[derive(Debug, Clone, PartialEq)]
enum Playback {
	Stopped,
	Pending { source: SourceRef },
	Playing { source: SourceRef },
}

/// Result of a play request once it settled and was still current
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
	Started {
		source: SourceRef,
	},
	Failed {
		source: SourceRef,
		error: ChannelError,
	},
}

/// One playback line with at most one audible source.
///
/// Every `play` and `stop` bumps the channel generation. A prepare that
/// settles under an older generation is dropped without touching the
/// backend, so a superseded or cancelled request can never become audible.
pub struct AudioChannel<B: PlaybackBackend> {
	kind: ChannelKind,
	backend: B,
	playback: Playback,
	generation: u64,
	looped: bool,
	volume: f32,
	enabled: bool,
	in_flight: usize,
	sender: mpsc::Sender<Settled<B::Clip>>,
	receiver: mpsc::Receiver<Settled<B::Clip>>,
}

impl<B: PlaybackBackend> AudioChannel<B> {
	pub fn new(kind: ChannelKind, backend: B) -> Self {
		let (sender, receiver) = mpsc::channel(100);
		Self {
			kind,
			backend,
			playback: Playback::Stopped,
			generation: 0,
			looped: false,
			volume: 1.0,
			enabled: true,
			in_flight: 0,
			sender,
			receiver,
		}
	}

	/// Request playback; returns the generation of the request.
	///
	/// Must be called from within a tokio runtime.
	pub fn play(&mut self, source: SourceRef, looped: bool, volume: f32) -> Result<u64, ChannelError> {
		if !self.enabled {
			log::debug!("[{}] play ignored while disabled: {}", self.kind, source);
			return Err(ChannelError::Disabled);
		}
		let volume = volume.clamp(0.0, 1.0);

		// Keep an already-running loop of the same source instead of restarting it
		let same_loop = matches!(&self.playback, Playback::Playing { source: current } if *current == source);
		if same_loop && looped && self.looped && self.backend.is_audible() {
			log::debug!("[{}] {} already looping", self.kind, source);
			self.set_volume(volume);
			return Ok(self.generation);
		}

		self.backend.halt();
		self.generation += 1;
		self.looped = looped;
		self.volume = volume;
		self.playback = Playback::Pending {
			source: source.clone(),
		};

		let generation = self.generation;
		log::info!(
			"[{}] play {} (gen={}, loop={}, volume={:.2})",
			self.kind,
			source,
			generation,
			looped,
			volume
		);

		let future = self.backend.prepare(&source);
		let sender = self.sender.clone();
		self.in_flight += 1;
		tokio::spawn(async move {
			let result = future.await;
			let _ = sender
				.send(Settled {
					generation,
					source,
					result,
				})
				.await;
		});

		Ok(generation)
	}

	/// Pause and rewind; cancels any in-flight play
	pub fn stop(&mut self) {
		self.generation += 1;
		self.backend.halt();
		if self.playback != Playback::Stopped {
			log::debug!("[{}] stopped (gen={})", self.kind, self.generation);
		}
		self.playback = Playback::Stopped;
	}

	pub fn set_volume(&mut self, volume: f32) {
		self.volume = volume.clamp(0.0, 1.0);
		self.backend.set_volume(self.volume);
	}

	/// Disabling stops immediately; enabling never resumes on its own
	pub fn set_enabled(&mut self, enabled: bool) {
		if self.enabled == enabled {
			return;
		}
		log::info!("[{}] {}", self.kind, if enabled { "enabled" } else { "disabled" });
		self.enabled = enabled;
		if !enabled {
			self.stop();
		}
	}

	/// Drain settled requests, starting the ones that are still current
	pub fn poll(&mut self) -> Vec<ChannelOutcome> {
		let mut outcomes = Vec::new();
		while let Ok(settled) = self.receiver.try_recv() {
			self.in_flight = self.in_flight.saturating_sub(1);
			outcomes.extend(self.apply(settled));
		}
		outcomes
	}

	/// Wait for the next in-flight request to settle, then drain.
	///
	/// Returns immediately when nothing is in flight.
	pub async fn settle(&mut self) -> Vec<ChannelOutcome> {
		if self.in_flight == 0 {
			return self.poll();
		}
		let mut outcomes = Vec::new();
		if let Some(settled) = self.receiver.recv().await {
			self.in_flight = self.in_flight.saturating_sub(1);
			outcomes.extend(self.apply(settled));
		}
		outcomes.extend(self.poll());
		outcomes
	}

	pub async fn settle_all(&mut self) -> Vec<ChannelOutcome> {
		let mut outcomes = Vec::new();
		while self.in_flight > 0 {
			outcomes.extend(self.settle().await);
		}
		outcomes
	}

	fn apply(&mut self, settled: Settled<B::Clip>) -> Option<ChannelOutcome> {
		let Settled {
			generation,
			source,
			result,
		} = settled;

		if generation != self.generation {
			log::debug!(
				"[{}] discarding stale {} (gen={}, current={})",
				self.kind,
				source,
				generation,
				self.generation
			);
			return None;
		}

		let outcome = match result {
			Ok(clip) => {
				self.backend.halt();
				match self.backend.start(clip, self.looped, self.volume) {
					Ok(()) => {
						log::info!("[{}] started {}", self.kind, source);
						self.playback = Playback::Playing {
							source: source.clone(),
						};
						ChannelOutcome::Started { source }
					}
					Err(error) => {
						self.playback = Playback::Stopped;
						ChannelOutcome::Failed { source, error }
					}
				}
			}
			Err(error) => {
				self.playback = Playback::Stopped;
				ChannelOutcome::Failed { source, error }
			}
		};
		Some(outcome)
	}

	pub fn kind(&self) -> ChannelKind {
		self.kind
	}

	/// Source that is audible right now, if any
	pub fn current_source(&self) -> Option<&SourceRef> {
		match &self.playback {
			Playback::Playing { source } if self.backend.is_audible() => Some(source),
			_ => None,
		}
	}

	/// Source requested but not yet started
	pub fn pending_source(&self) -> Option<&SourceRef> {
		match &self.playback {
			Playback::Pending { source } => Some(source),
			_ => None,
		}
	}

	pub fn is_playing(&self) -> bool {
		self.current_source().is_some()
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	pub fn is_looped(&self) -> bool {
		self.looped
	}

	pub fn volume(&self) -> f32 {
		self.volume
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn in_flight(&self) -> usize {
		self.in_flight
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}
}

/// Owns the voice and background channels; the only path to audio output
pub struct ChannelManager<B: PlaybackBackend> {
	voice: AudioChannel<B>,
	background: AudioChannel<B>,
}

impl<B: PlaybackBackend> ChannelManager<B> {
	pub fn new(voice: B, background: B) -> Self {
		log::info!("[Audio] Initializing voice and background channels");
		Self {
			voice: AudioChannel::new(ChannelKind::Voice, voice),
			background: AudioChannel::new(ChannelKind::Background, background),
		}
	}

	pub fn channel(&self, kind: ChannelKind) -> &AudioChannel<B> {
		match kind {
			ChannelKind::Voice => &self.voice,
			ChannelKind::Background => &self.background,
		}
	}

	pub fn channel_mut(&mut self, kind: ChannelKind) -> &mut AudioChannel<B> {
		match kind {
			ChannelKind::Voice => &mut self.voice,
			ChannelKind::Background => &mut self.background,
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Audio(AudioEvent::Play {
				channel,
				source,
				looped,
				volume,
			}) => {
				if let Err(e) = self
					.channel_mut(*channel)
					.play(source.clone(), *looped, *volume)
				{
					log::debug!("[Audio] {} play rejected: {}", channel, e);
				}
			}
			Event::Audio(AudioEvent::Stop { channel }) => self.channel_mut(*channel).stop(),
			Event::Audio(AudioEvent::SetVolume { channel, volume }) => {
				self.channel_mut(*channel).set_volume(*volume)
			}
			Event::Audio(AudioEvent::SetEnabled { channel, enabled }) => {
				self.channel_mut(*channel).set_enabled(*enabled)
			}
			_ => {}
		}
		ComponentResponse::none()
	}

	pub fn poll(&mut self) -> ComponentResponse {
		let mut responses = Vec::new();
		for kind in [ChannelKind::Voice, ChannelKind::Background] {
			for outcome in self.channel_mut(kind).poll() {
				responses.push(Self::outcome_event(kind, outcome));
			}
		}
		if responses.is_empty() {
			ComponentResponse::none()
		} else {
			ComponentResponse::emit_many(responses)
		}
	}

	/// Wait until every in-flight request on both channels has settled
	pub async fn settle_all(&mut self) -> ComponentResponse {
		let mut responses = Vec::new();
		for kind in [ChannelKind::Voice, ChannelKind::Background] {
			for outcome in self.channel_mut(kind).settle_all().await {
				responses.push(Self::outcome_event(kind, outcome));
			}
		}
		ComponentResponse::emit_many(responses)
	}

	pub fn stop_all(&mut self) {
		self.voice.stop();
		self.background.stop();
	}

	fn outcome_event(channel: ChannelKind, outcome: ChannelOutcome) -> Event {
		match outcome {
			ChannelOutcome::Started { source } => {
				Event::Audio(AudioEvent::Started { channel, source })
			}
			ChannelOutcome::Failed { source, error } => Event::Audio(AudioEvent::Failed {
				channel,
				source,
				error: error.to_string(),
			}),
		}
	}
}
