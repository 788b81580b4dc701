use crate::types::{Category, ChannelKind, NavDirection, SourceRef};
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum Event {
	Session(SessionEvent),
	Audio(AudioEvent),
	Catalogue(CatalogueEvent),
	Settings(SettingsEvent),
}

impl Event {
	pub fn priority(&self) -> Priority {
		match self {
			Event::Session(SessionEvent::Stop) => Priority::Critical,
			Event::Session(SessionEvent::Tick { .. }) => Priority::High,
			Event::Session(_) => Priority::High,
			Event::Audio(AudioEvent::Started { .. }) => Priority::Low,
			Event::Audio(AudioEvent::Failed { .. }) => Priority::Low,
			Event::Audio(_) => Priority::Normal,
			Event::Catalogue(_) => Priority::Normal,
			Event::Settings(_) => Priority::Normal,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
	Critical = 0,
	High = 1,
	Normal = 2,
	Low = 3,
}

impl Priority {
	pub fn as_index(&self) -> usize {
		*self as usize
	}
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
	/// Start the named exercise; duration falls back to the definition, then settings
	Start {
		id: String,
		duration_secs: Option<u32>,
	},
	/// Start whatever the catalogue cursor points at
	StartSelected {
		duration_secs: Option<u32>,
	},
	TogglePause,
	Restart,
	Stop,
	/// Countdown tick, stamped with the session epoch it was scheduled in
	Tick {
		epoch: u64,
	},
	/// Voice/music toggles changed
	Guidance {
		voice: bool,
		music: bool,
	},
}

#[derive(Clone, Debug)]
pub enum AudioEvent {
	Play {
		channel: ChannelKind,
		source: SourceRef,
		looped: bool,
		volume: f32,
	},
	Stop {
		channel: ChannelKind,
	},
	SetVolume {
		channel: ChannelKind,
		volume: f32,
	},
	SetEnabled {
		channel: ChannelKind,
		enabled: bool,
	},
	/// A play request settled and the source is audible
	Started {
		channel: ChannelKind,
		source: SourceRef,
	},
	/// A play request failed; the session keeps running silently
	Failed {
		channel: ChannelKind,
		source: SourceRef,
		error: String,
	},
}

#[derive(Clone, Debug)]
pub enum CatalogueEvent {
	Navigate(NavDirection),
	Select { id: String },
}

#[derive(Clone, Debug)]
pub enum SettingsEvent {
	ToggleVoice,
	ToggleMusic,
	/// Adjust the default session length for a category by delta
	AdjustDuration { category: Category, delta_secs: i64 },
}

/// Response from component.handle()
#[derive(Default)]
pub struct ComponentResponse {
	/// Events to dispatch immediately
	pub events: Vec<Event>,
	/// Events to schedule (event, delay)
	pub scheduled: Vec<(Event, Duration)>,
}

impl ComponentResponse {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn emit_many(events: Vec<Event>) -> Self {
		Self {
			events,
			scheduled: vec![],
		}
	}

	pub fn merge(&mut self, other: ComponentResponse) {
		self.events.extend(other.events);
		self.scheduled.extend(other.scheduled);
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty() && self.scheduled.is_empty()
	}
}
