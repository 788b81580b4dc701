pub mod event;
pub mod queue;
pub mod scheduler;

pub use event::{
	AudioEvent, CatalogueEvent, ComponentResponse, Event, SessionEvent, SettingsEvent,
};
pub use queue::EventQueue;
pub use scheduler::Scheduler;

use crate::audio::{ChannelManager, PlaybackBackend};
use crate::catalogue::Catalogue;
use crate::error::ConfigError;
use crate::session::{AudioLevels, SessionController, SessionSnapshot};
use crate::settings::{Config, SettingsManager};
use std::time::Instant;

const MAX_ITERATIONS: usize = 1000;

/// Single-threaded owner of every component; all state changes happen in [`Reactor::tick`].
pub struct Reactor<B: PlaybackBackend> {
	queue: EventQueue,
	scheduler: Scheduler,
	now: Instant,

	pub audio: ChannelManager<B>,
	pub session: SessionController,
	pub catalogue: Catalogue,
	pub settings: SettingsManager,
}

impl<B: PlaybackBackend> Reactor<B> {
	pub fn new(
		config: &Config,
		catalogue: Catalogue,
		voice: B,
		background: B,
	) -> Result<Self, ConfigError> {
		log::info!("Initializing all components");
		let durations = config.timing.durations()?;
		let mut reactor = Self {
			queue: EventQueue::new(),
			scheduler: Scheduler::new(),
			now: Instant::now(),
			audio: ChannelManager::new(voice, background),
			session: SessionController::new(durations, AudioLevels::from(&config.audio)),
			catalogue,
			settings: SettingsManager::new(config),
		};

		// Push initial toggles before any session starts
		reactor.process_response(reactor.settings.init());
		log::info!("Initialization complete");

		Ok(reactor)
	}

	/// Queue an event for the next tick
	pub fn dispatch(&mut self, event: Event) {
		log::trace!("Dispatch: {:?}", event);
		self.queue.push(event);
	}

	fn process_response(&mut self, response: ComponentResponse) {
		for e in response.events {
			self.queue.push(e);
		}
		for (e, d) in response.scheduled {
			self.scheduler.schedule(e, d, self.now);
		}
	}

	pub fn tick(&mut self, now: Instant) {
		self.now = now;

		// Drain scheduled events
		self.scheduler.tick(now, &mut self.queue);

		// Settled playback requests and phase boundaries
		let audio_response = self.audio.poll();
		self.process_response(audio_response);
		let session_response = self.session.advance(now);
		self.process_response(session_response);

		// Process event queue until empty
		let mut iterations = 0;
		while let Some(event) = self.queue.pop() {
			log::trace!("Processing event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);

			iterations += 1;
			if iterations > MAX_ITERATIONS {
				log::warn!("Event loop exceeded {} iterations, breaking", MAX_ITERATIONS);
				break;
			}
		}
	}

	/// Wait for every in-flight play to settle, then run a tick at `now`
	pub async fn settle(&mut self, now: Instant) {
		let response = self.audio.settle_all().await;
		self.process_response(response);
		self.tick(now);
	}

	fn route(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Session(SessionEvent::Start { id, duration_secs }) => {
				self.handle_start(Some(id.as_str()), *duration_secs)
			}
			Event::Session(SessionEvent::StartSelected { duration_secs }) => {
				self.handle_start(None, *duration_secs)
			}
			Event::Session(_) => self.session.handle(event, self.now),
			Event::Audio(AudioEvent::Started { .. } | AudioEvent::Failed { .. }) => {
				self.session.handle(event, self.now)
			}
			Event::Audio(_) => self.audio.handle(event),
			Event::Catalogue(_) => self.catalogue.handle(event),
			Event::Settings(_) => self.settings.handle(event),
		}
	}

	fn handle_start(&mut self, id: Option<&str>, duration_secs: Option<u32>) -> ComponentResponse {
		if let Some(id) = id {
			if !self.catalogue.select(id) {
				log::warn!("Start ignored: unknown exercise '{}'", id);
				return ComponentResponse::none();
			}
		}
		let Some(definition) = self.catalogue.current().cloned() else {
			log::warn!("Start ignored: catalogue is empty");
			return ComponentResponse::none();
		};

		let duration = duration_secs
			.or(definition.duration_secs)
			.unwrap_or_else(|| self.settings.default_duration(definition.category));
		self.session.start(definition, duration, self.now)
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		self.session.snapshot()
	}

	pub fn pending_scheduled(&self) -> usize {
		self.scheduler.pending()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audio::backend::mock::MockBackend;
	use crate::session::SessionStatus;
	use crate::types::{ChannelKind, NavDirection, Phase};
	use std::time::Duration;

	fn reactor(voice: &MockBackend, background: &MockBackend) -> Reactor<MockBackend> {
		Reactor::new(
			&Config::default(),
			Catalogue::builtin().unwrap(),
			voice.clone(),
			background.clone(),
		)
		.unwrap()
	}

	fn at(t0: Instant, secs: u64) -> Instant {
		t0 + Duration::from_secs(secs)
	}

	fn start_calm(reactor: &mut Reactor<MockBackend>, duration: u32) {
		reactor.dispatch(Event::Session(SessionEvent::Start {
			id: "calm-breath".into(),
			duration_secs: Some(duration),
		}));
	}

	#[tokio::test]
	async fn breathing_session_end_to_end() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);
		reactor.settle(t0).await;

		assert_eq!(
			background.audible().as_deref(),
			Some("music/breathing-ambient.mp3")
		);
		assert_eq!(voice.audible().as_deref(), Some("voice/inhale-intro.mp3"));

		for s in 1..=12 {
			reactor.tick(at(t0, s));
			reactor.settle(at(t0, s)).await;
		}

		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.status, SessionStatus::Playing);
		assert_eq!(snapshot.phase, Some(Phase::Inhale));
		assert_eq!(snapshot.remaining_secs, 108);
		assert_eq!(snapshot.elapsed_secs, 12);
		assert_eq!(voice.audible().as_deref(), Some("voice/inhale.mp3"));
		assert_eq!(voice.state().overlaps, 0);
		assert_eq!(background.state().started.len(), 1);
	}

	#[tokio::test]
	async fn countdown_keeps_pace_at_frame_rate() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let frame = Duration::from_millis(16);
		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);

		// 750 frames of 16ms = 12s
		for k in 1..=750u32 {
			reactor.tick(t0 + frame * k);
		}
		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.phase, Some(Phase::Inhale));
		assert_eq!(snapshot.cycles_completed, 1);
		assert_eq!(snapshot.remaining_secs, 108);

		for k in 751..=7500u32 {
			reactor.tick(t0 + frame * k);
		}
		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.status, SessionStatus::Idle);
		assert_eq!(snapshot.remaining_secs, 0);
		assert_eq!(reactor.pending_scheduled(), 0);
	}

	#[tokio::test]
	async fn pause_then_resume_restores_background() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);
		reactor.settle(t0).await;

		reactor.tick(at(t0, 1));
		assert_eq!(reactor.snapshot().remaining_secs, 119);

		// The tick due at 2s lands behind the pause and is dropped
		reactor.dispatch(Event::Session(SessionEvent::TogglePause));
		reactor.tick(at(t0, 2));
		assert!(background.audible().is_none());
		assert!(voice.audible().is_none());
		assert_eq!(reactor.snapshot().status, SessionStatus::Paused);

		// Long pause: countdown and phase stay put
		reactor.tick(at(t0, 30));
		assert_eq!(reactor.snapshot().remaining_secs, 119);

		reactor.dispatch(Event::Session(SessionEvent::TogglePause));
		reactor.tick(at(t0, 30));
		reactor.settle(at(t0, 30)).await;

		assert_eq!(
			background.audible().as_deref(),
			Some("music/breathing-ambient.mp3")
		);
		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.status, SessionStatus::Playing);
		assert_eq!(snapshot.phase, Some(Phase::Inhale));
		assert!((snapshot.phase_progress - 0.5).abs() < 1e-3);
	}

	#[tokio::test]
	async fn pause_while_music_is_loading_stays_silent() {
		let voice = MockBackend::new();
		let background = MockBackend::gated();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);
		reactor.dispatch(Event::Session(SessionEvent::TogglePause));
		reactor.tick(t0);

		background.release("music/breathing-ambient.mp3");
		reactor.settle(t0).await;
		assert!(background.audible().is_none());
		assert!(background.state().started.is_empty());
	}

	#[tokio::test]
	async fn countdown_end_silences_both_channels() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 3);
		reactor.tick(t0);
		reactor.settle(t0).await;
		assert!(background.audible().is_some());

		for s in 1..=5 {
			reactor.tick(at(t0, s));
		}
		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.status, SessionStatus::Idle);
		assert_eq!(snapshot.remaining_secs, 0);
		assert!(background.audible().is_none());
		assert!(voice.audible().is_none());
		assert_eq!(reactor.pending_scheduled(), 0);
	}

	#[tokio::test]
	async fn start_selected_uses_definition_duration() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		reactor.dispatch(Event::Catalogue(CatalogueEvent::Navigate(NavDirection::Skip(2))));
		reactor.tick(Instant::now());
		reactor.dispatch(Event::Session(SessionEvent::StartSelected {
			duration_secs: None,
		}));
		reactor.tick(Instant::now());

		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.exercise_id.as_deref(), Some("parked-reset"));
		assert_eq!(snapshot.duration_secs, 300);
		assert_eq!(snapshot.phase, None);
	}

	#[tokio::test]
	async fn unknown_exercise_is_ignored() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		reactor.dispatch(Event::Session(SessionEvent::Start {
			id: "nope".into(),
			duration_secs: None,
		}));
		reactor.tick(Instant::now());
		assert_eq!(reactor.snapshot().status, SessionStatus::Idle);
	}

	#[tokio::test]
	async fn select_then_start_switches_exercise() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);

		reactor.dispatch(Event::Catalogue(CatalogueEvent::Select {
			id: "evening-unwind".into(),
		}));
		reactor.tick(t0);
		reactor.dispatch(Event::Session(SessionEvent::StartSelected {
			duration_secs: None,
		}));
		reactor.tick(t0);

		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.exercise_id.as_deref(), Some("evening-unwind"));
		assert_eq!(snapshot.duration_secs, 600);
		assert_eq!(snapshot.status, SessionStatus::Playing);
	}

	#[tokio::test]
	async fn refused_start_leaves_reactor_idle() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		start_calm(&mut reactor, 0);
		reactor.tick(Instant::now());
		assert_eq!(reactor.snapshot().status, SessionStatus::Idle);
		assert_eq!(reactor.pending_scheduled(), 0);
		assert!(background.state().started.is_empty());
	}

	#[tokio::test]
	async fn music_toggle_round_trip() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);
		reactor.settle(t0).await;

		reactor.dispatch(Event::Settings(SettingsEvent::ToggleMusic));
		reactor.tick(t0);
		assert!(background.audible().is_none());
		assert!(!reactor.audio.channel(ChannelKind::Background).is_enabled());

		reactor.dispatch(Event::Settings(SettingsEvent::ToggleMusic));
		reactor.tick(t0);
		reactor.settle(t0).await;
		assert_eq!(
			background.audible().as_deref(),
			Some("music/breathing-ambient.mp3")
		);
	}

	#[tokio::test]
	async fn refused_playback_keeps_session_running() {
		let voice = MockBackend::new();
		let background = MockBackend::new();
		background.state().refuse = true;
		voice.state().refuse = true;
		let mut reactor = reactor(&voice, &background);

		let t0 = Instant::now();
		start_calm(&mut reactor, 120);
		reactor.tick(t0);
		reactor.settle(t0).await;
		for s in 1..=4 {
			reactor.tick(at(t0, s));
			reactor.settle(at(t0, s)).await;
		}

		let snapshot = reactor.snapshot();
		assert_eq!(snapshot.status, SessionStatus::Playing);
		assert_eq!(snapshot.phase, Some(Phase::Hold));
		assert_eq!(snapshot.remaining_secs, 116);
		assert!(background.audible().is_none());
	}
}
