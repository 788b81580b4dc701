use crate::error::ConfigError;
use crate::types::Phase;
use std::time::{Duration, Instant};

/// Per-phase durations for the breathing cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseDurations {
	inhale: Duration,
	hold: Duration,
	exhale: Duration,
}

impl PhaseDurations {
	/// Every phase must be strictly positive, otherwise the cycle never advances past it.
	pub fn new(inhale: Duration, hold: Duration, exhale: Duration) -> Result<Self, ConfigError> {
		for (phase, duration) in [
			(Phase::Inhale, inhale),
			(Phase::Hold, hold),
			(Phase::Exhale, exhale),
		] {
			if duration.is_zero() {
				return Err(ConfigError::Invalid(format!(
					"{} duration must be greater than zero",
					phase.label()
				)));
			}
		}
		Ok(Self {
			inhale,
			hold,
			exhale,
		})
	}

	pub fn from_secs_f32(inhale: f32, hold: f32, exhale: f32) -> Result<Self, ConfigError> {
		let to_duration = |phase: Phase, secs: f32| {
			Duration::try_from_secs_f32(secs).map_err(|_| {
				ConfigError::Invalid(format!("{} duration {} is out of range", phase.label(), secs))
			})
		};
		Self::new(
			to_duration(Phase::Inhale, inhale)?,
			to_duration(Phase::Hold, hold)?,
			to_duration(Phase::Exhale, exhale)?,
		)
	}

	pub fn get(&self, phase: Phase) -> Duration {
		match phase {
			Phase::Inhale => self.inhale,
			Phase::Hold => self.hold,
			Phase::Exhale => self.exhale,
		}
	}

	pub fn cycle(&self) -> Duration {
		self.inhale + self.hold + self.exhale
	}
}

impl Default for PhaseDurations {
	fn default() -> Self {
		Self {
			inhale: Duration::from_secs(4),
			hold: Duration::from_secs(4),
			exhale: Duration::from_secs(4),
		}
	}
}

/// Free-running breathing timer driven by wall-clock deltas.
///
/// The owner calls [`PhaseClock::step`] as often as it likes (every frame,
/// every reactor tick); each call accumulates the time since the previous
/// step and reports every phase boundary crossed.
pub struct PhaseClock {
	durations: PhaseDurations,
	phase: Phase,
	elapsed: Duration,
	running: bool,
	paused: bool,
	last_step: Option<Instant>,
	cycles_completed: u64,
}

impl PhaseClock {
	pub fn new(durations: PhaseDurations) -> Self {
		Self {
			durations,
			phase: Phase::Inhale,
			elapsed: Duration::ZERO,
			running: false,
			paused: false,
			last_step: None,
			cycles_completed: 0,
		}
	}

	pub fn start(&mut self, initial: Phase, now: Instant) {
		if self.running {
			log::debug!("[Clock] start ignored: already running");
			return;
		}
		log::debug!("[Clock] Starting at {:?}", initial);
		self.phase = initial;
		self.elapsed = Duration::ZERO;
		self.cycles_completed = 0;
		self.running = true;
		self.paused = false;
		self.last_step = Some(now);
	}

	pub fn pause(&mut self) {
		if !self.running || self.paused {
			log::debug!("[Clock] pause ignored: not advancing");
			return;
		}
		self.paused = true;
		self.last_step = None;
	}

	pub fn resume(&mut self, now: Instant) {
		if !self.running || !self.paused {
			log::debug!("[Clock] resume ignored: not paused");
			return;
		}
		self.paused = false;
		// Re-base so the paused interval is never counted
		self.last_step = Some(now);
	}

	pub fn reset(&mut self, initial: Phase) {
		self.stop();
		self.phase = initial;
		self.elapsed = Duration::ZERO;
		self.cycles_completed = 0;
	}

	pub fn stop(&mut self) {
		self.running = false;
		self.paused = false;
		self.last_step = None;
	}

	/// Advance to `now`, returning the phases entered, in order.
	pub fn step(&mut self, now: Instant) -> Vec<Phase> {
		let mut entered = Vec::new();
		if !self.running || self.paused {
			return entered;
		}
		let Some(last) = self.last_step else {
			self.last_step = Some(now);
			return entered;
		};

		self.elapsed += now.saturating_duration_since(last);
		self.last_step = Some(now);

		loop {
			let duration = self.durations.get(self.phase);
			if self.elapsed < duration {
				break;
			}
			self.elapsed -= duration;
			self.phase = self.phase.next();
			if self.phase == Phase::Inhale {
				self.cycles_completed += 1;
			}
			log::trace!("[Clock] Phase boundary -> {:?}", self.phase);
			entered.push(self.phase);
		}

		entered
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Fraction of the current phase elapsed, in [0, 1)
	pub fn progress(&self) -> f32 {
		let duration = self.durations.get(self.phase);
		(self.elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
	}

	pub fn cycles_completed(&self) -> u64 {
		self.cycles_completed
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn is_paused(&self) -> bool {
		self.paused
	}

	pub fn durations(&self) -> &PhaseDurations {
		&self.durations
	}
}

impl Default for PhaseClock {
	fn default() -> Self {
		Self::new(PhaseDurations::default())
	}
}
