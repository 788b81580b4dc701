pub mod cues;

use crate::breathing::{PhaseClock, PhaseDurations};
use crate::catalogue::ExerciseDefinition;
use crate::reactor::{AudioEvent, ComponentResponse, Event, SessionEvent};
use crate::settings::config::AudioConfig;
use crate::types::{Category, ChannelKind, Phase, SourceRef};
use cues::SegmentTracker;
use std::time::{Duration, Instant};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
	Idle,
	Playing,
	Paused,
}

/// Playback volumes applied by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioLevels {
	pub voice: f32,
	pub breathing_music: f32,
	pub meditation_music: f32,
}

impl AudioLevels {
	pub fn music(&self, category: Category) -> f32 {
		match category {
			Category::Breathing => self.breathing_music,
			Category::Meditation => self.meditation_music,
		}
	}
}

impl Default for AudioLevels {
	fn default() -> Self {
		Self::from(&AudioConfig::default())
	}
}

impl From<&AudioConfig> for AudioLevels {
	fn from(config: &AudioConfig) -> Self {
		Self {
			voice: config.voice_volume,
			breathing_music: config.breathing_music_volume,
			meditation_music: config.meditation_music_volume,
		}
	}
}

/// Read-only view of the session for renderers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
	pub status: SessionStatus,
	pub exercise_id: Option<String>,
	pub category: Option<Category>,
	/// Breathing sessions only
	pub phase: Option<Phase>,
	pub phase_progress: f32,
	pub cycles_completed: u64,
	pub is_first_cycle: bool,
	pub duration_secs: u32,
	pub remaining_secs: u32,
	pub elapsed_secs: u32,
}

/// Binds one exercise definition to the phase clock and the audio channels.
///
/// The controller never touches a channel; every audio effect is returned
/// as an [`AudioEvent`] for the reactor to route. The countdown runs on
/// scheduled [`SessionEvent::Tick`] events stamped with the current epoch,
/// so ticks scheduled before a pause, restart or stop are ignored.
pub struct SessionController {
	clock: PhaseClock,
	status: SessionStatus,
	definition: Option<ExerciseDefinition>,
	phase: Phase,
	duration_secs: u32,
	remaining_secs: u32,
	is_first_cycle: bool,
	segments: SegmentTracker,
	epoch: u64,
	/// Instant the next countdown tick is due; ticks advance from here, not from when they ran
	next_due: Option<Instant>,
	voice_enabled: bool,
	music_enabled: bool,
	levels: AudioLevels,
}

impl SessionController {
	pub fn new(durations: PhaseDurations, levels: AudioLevels) -> Self {
		Self {
			clock: PhaseClock::new(durations),
			status: SessionStatus::Idle,
			definition: None,
			phase: Phase::Inhale,
			duration_secs: 0,
			remaining_secs: 0,
			is_first_cycle: true,
			segments: SegmentTracker::default(),
			epoch: 0,
			next_due: None,
			voice_enabled: true,
			music_enabled: true,
			levels,
		}
	}

	pub fn handle(&mut self, event: &Event, now: Instant) -> ComponentResponse {
		match event {
			Event::Session(SessionEvent::TogglePause) => self.toggle_pause(now),
			Event::Session(SessionEvent::Restart) => self.restart(now),
			Event::Session(SessionEvent::Stop) => self.stop(),
			Event::Session(SessionEvent::Tick { epoch }) => self.on_tick(*epoch, now),
			Event::Session(SessionEvent::Guidance { voice, music }) => {
				self.set_guidance(*voice, *music)
			}
			Event::Audio(AudioEvent::Started { channel, source }) => {
				log::debug!("[Session] {} channel playing {}", channel, source);
				ComponentResponse::none()
			}
			Event::Audio(AudioEvent::Failed {
				channel,
				source,
				error,
			}) => {
				// Session keeps running silently
				log::warn!("[Session] {} playback of {} failed: {}", channel, source, error);
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	pub fn start(
		&mut self,
		definition: ExerciseDefinition,
		duration_secs: u32,
		now: Instant,
	) -> ComponentResponse {
		if duration_secs == 0 {
			log::warn!("[Session] Refusing to start '{}' with zero duration", definition.id);
			return ComponentResponse::none();
		}

		let mut response = self.stop();

		log::info!(
			"[Session] Starting '{}' ({:?}, {}s)",
			definition.id,
			definition.category,
			duration_secs
		);
		self.definition = Some(definition);
		self.duration_secs = duration_secs;
		response.merge(self.begin(now));
		response
	}

	/// Reset countdown, cue state and clock, then issue the opening audio
	fn begin(&mut self, now: Instant) -> ComponentResponse {
		let Some(definition) = self.definition.as_ref() else {
			return ComponentResponse::none();
		};
		let category = definition.category;

		self.epoch += 1;
		self.next_due = None;
		self.status = SessionStatus::Playing;
		self.remaining_secs = self.duration_secs;
		self.is_first_cycle = true;
		self.segments.reset();
		self.phase = Phase::Inhale;
		self.clock.reset(Phase::Inhale);

		let mut response = ComponentResponse::none();
		response.events.extend(self.background_play());
		if category == Category::Breathing {
			self.clock.start(Phase::Inhale, now);
			response.events.extend(self.phase_voice(Phase::Inhale));
		}
		response.scheduled.push(self.next_tick(now));
		response
	}

	/// Invoked for every phase boundary the clock crosses
	pub fn on_phase_change(&mut self, phase: Phase) -> ComponentResponse {
		if self.status == SessionStatus::Idle {
			return ComponentResponse::none();
		}
		log::debug!("[Session] Phase -> {:?} (first cycle: {})", phase, self.is_first_cycle);
		self.phase = phase;

		let mut response = ComponentResponse::none();
		response.events.extend(self.phase_voice(phase));

		if phase == Phase::Exhale && self.is_first_cycle {
			self.is_first_cycle = false;
		}
		response
	}

	/// Step the phase clock to `now`
	pub fn advance(&mut self, now: Instant) -> ComponentResponse {
		let mut response = ComponentResponse::none();
		if self.status != SessionStatus::Playing {
			return response;
		}
		for phase in self.clock.step(now) {
			response.merge(self.on_phase_change(phase));
		}
		response
	}

	pub fn toggle_pause(&mut self, now: Instant) -> ComponentResponse {
		match self.status {
			SessionStatus::Idle => {
				log::debug!("[Session] toggle_pause ignored: no session");
				ComponentResponse::none()
			}
			SessionStatus::Playing => {
				log::info!("[Session] Paused with {}s remaining", self.remaining_secs);
				self.status = SessionStatus::Paused;
				self.epoch += 1;
				self.next_due = None;
				self.clock.pause();
				ComponentResponse::emit_many(stop_both())
			}
			SessionStatus::Paused => {
				log::info!("[Session] Resumed");
				self.status = SessionStatus::Playing;
				self.clock.resume(now);
				let mut response = ComponentResponse::emit_many(self.background_play().into_iter().collect());
				response.scheduled.push(self.next_tick(now));
				response
			}
		}
	}

	pub fn restart(&mut self, now: Instant) -> ComponentResponse {
		if self.status == SessionStatus::Idle {
			log::debug!("[Session] restart ignored: no session");
			return ComponentResponse::none();
		}
		log::info!("[Session] Restarting");
		let mut response = ComponentResponse::emit_many(stop_both());
		response.merge(self.begin(now));
		response
	}

	/// One second of countdown; no-op unless playing
	pub fn tick(&mut self) -> ComponentResponse {
		if self.status != SessionStatus::Playing {
			return ComponentResponse::none();
		}
		self.remaining_secs = self.remaining_secs.saturating_sub(1);
		if self.remaining_secs == 0 {
			log::info!("[Session] Complete");
			return self.finish();
		}

		let mut response = ComponentResponse::none();
		if self.category() == Some(Category::Meditation) {
			response.events.extend(self.segment_voice());
		}
		response
	}

	fn on_tick(&mut self, epoch: u64, now: Instant) -> ComponentResponse {
		if epoch != self.epoch || self.status != SessionStatus::Playing {
			log::trace!("[Session] Dropping stale tick (epoch {} vs {})", epoch, self.epoch);
			return ComponentResponse::none();
		}
		let mut response = self.tick();
		if self.status == SessionStatus::Playing {
			response.scheduled.push(self.next_tick(now));
		}
		response
	}

	/// Explicit exit, independent of remaining time
	pub fn stop(&mut self) -> ComponentResponse {
		if self.status == SessionStatus::Idle {
			return ComponentResponse::none();
		}
		log::info!("[Session] Stopped with {}s remaining", self.remaining_secs);
		self.finish()
	}

	fn finish(&mut self) -> ComponentResponse {
		self.status = SessionStatus::Idle;
		self.epoch += 1;
		self.next_due = None;
		self.remaining_secs = 0;
		self.clock.stop();
		self.definition = None;
		ComponentResponse::emit_many(stop_both())
	}

	/// Voice/music toggles from settings
	pub fn set_guidance(&mut self, voice: bool, music: bool) -> ComponentResponse {
		let music_reenabled = music && !self.music_enabled;
		self.voice_enabled = voice;
		self.music_enabled = music;

		if music_reenabled && self.status == SessionStatus::Playing {
			return ComponentResponse::emit_many(self.background_play().into_iter().collect());
		}
		ComponentResponse::none()
	}

	fn background_play(&self) -> Option<Event> {
		if !self.music_enabled {
			return None;
		}
		let definition = self.definition.as_ref()?;
		Some(Event::Audio(AudioEvent::Play {
			channel: ChannelKind::Background,
			source: definition.background.clone(),
			looped: true,
			volume: self.levels.music(definition.category),
		}))
	}

	fn phase_voice(&self, phase: Phase) -> Option<Event> {
		if !self.voice_enabled {
			return None;
		}
		let definition = self.definition.as_ref()?;
		let source = cues::phase_cue(definition, phase, self.is_first_cycle)?;
		Some(self.voice_play(source.clone()))
	}

	fn segment_voice(&mut self) -> Option<Event> {
		let elapsed = self.elapsed_secs();
		let segment = self.segments.due(elapsed, self.duration_secs)?;
		self.segments.mark(segment);
		log::debug!("[Session] Meditation {:?} cue at {}s", segment, elapsed);

		if !self.voice_enabled {
			return None;
		}
		let source = self.definition.as_ref()?.voice.segments.get(segment)?.clone();
		Some(self.voice_play(source))
	}

	fn voice_play(&self, source: SourceRef) -> Event {
		Event::Audio(AudioEvent::Play {
			channel: ChannelKind::Voice,
			source,
			looped: false,
			volume: self.levels.voice,
		})
	}

	/// Next countdown tick, one interval after the previous due instant
	fn next_tick(&mut self, now: Instant) -> (Event, Duration) {
		let due = match self.next_due {
			Some(due) => due + TICK_INTERVAL,
			None => now + TICK_INTERVAL,
		};
		self.next_due = Some(due);
		(
			Event::Session(SessionEvent::Tick { epoch: self.epoch }),
			due.saturating_duration_since(now),
		)
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		let breathing = self.category() == Some(Category::Breathing);
		SessionSnapshot {
			status: self.status,
			exercise_id: self.definition.as_ref().map(|d| d.id.clone()),
			category: self.category(),
			phase: breathing.then_some(self.phase),
			phase_progress: if breathing { self.clock.progress() } else { 0.0 },
			cycles_completed: self.clock.cycles_completed(),
			is_first_cycle: self.is_first_cycle,
			duration_secs: self.duration_secs,
			remaining_secs: self.remaining_secs,
			elapsed_secs: self.elapsed_secs(),
		}
	}

	// Accessors
	pub fn status(&self) -> SessionStatus {
		self.status
	}

	pub fn is_active(&self) -> bool {
		self.status != SessionStatus::Idle
	}

	pub fn is_paused(&self) -> bool {
		self.status == SessionStatus::Paused
	}

	pub fn current_phase(&self) -> Phase {
		self.phase
	}

	pub fn is_first_cycle(&self) -> bool {
		self.is_first_cycle
	}

	pub fn time_remaining(&self) -> u32 {
		self.remaining_secs
	}

	pub fn session_duration(&self) -> u32 {
		self.duration_secs
	}

	pub fn elapsed_secs(&self) -> u32 {
		self.duration_secs.saturating_sub(self.remaining_secs)
	}

	pub fn definition(&self) -> Option<&ExerciseDefinition> {
		self.definition.as_ref()
	}

	pub fn category(&self) -> Option<Category> {
		self.definition.as_ref().map(|d| d.category)
	}

	pub fn clock(&self) -> &PhaseClock {
		&self.clock
	}
}

fn stop_both() -> Vec<Event> {
	vec![
		Event::Audio(AudioEvent::Stop {
			channel: ChannelKind::Voice,
		}),
		Event::Audio(AudioEvent::Stop {
			channel: ChannelKind::Background,
		}),
	]
}
