pub mod config;

pub use config::Config;

use crate::reactor::{AudioEvent, ComponentResponse, Event, SessionEvent, SettingsEvent};
use crate::types::{Category, ChannelKind};

const MIN_DURATION_SECS: i64 = 30;
const MAX_DURATION_SECS: i64 = 3600;

/// Runtime guidance toggles and default session lengths
pub struct SettingsManager {
	voice_enabled: bool,
	music_enabled: bool,
	breathing_secs: u32,
	meditation_secs: u32,
}

impl SettingsManager {
	pub fn new(config: &Config) -> Self {
		Self {
			voice_enabled: config.audio.voice_enabled,
			music_enabled: config.audio.music_enabled,
			breathing_secs: config.session.breathing_secs,
			meditation_secs: config.session.meditation_secs,
		}
	}

	/// Push the initial toggles to the channels and the session
	pub fn init(&self) -> ComponentResponse {
		let mut events = self.channel_events();
		events.push(self.guidance_event());
		ComponentResponse::emit_many(events)
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Settings(SettingsEvent::ToggleVoice) => {
				self.voice_enabled = !self.voice_enabled;
				log::info!("Voice guidance {}", on_off(self.voice_enabled));
				ComponentResponse::emit_many(vec![
					Event::Audio(AudioEvent::SetEnabled {
						channel: ChannelKind::Voice,
						enabled: self.voice_enabled,
					}),
					self.guidance_event(),
				])
			}
			Event::Settings(SettingsEvent::ToggleMusic) => {
				self.music_enabled = !self.music_enabled;
				log::info!("Background music {}", on_off(self.music_enabled));
				// Channel must be enabled before the session re-requests music
				ComponentResponse::emit_many(vec![
					Event::Audio(AudioEvent::SetEnabled {
						channel: ChannelKind::Background,
						enabled: self.music_enabled,
					}),
					self.guidance_event(),
				])
			}
			Event::Settings(SettingsEvent::AdjustDuration {
				category,
				delta_secs,
			}) => {
				let current = self.default_duration(*category) as i64;
				let adjusted = (current + delta_secs).clamp(MIN_DURATION_SECS, MAX_DURATION_SECS) as u32;
				match category {
					Category::Breathing => self.breathing_secs = adjusted,
					Category::Meditation => self.meditation_secs = adjusted,
				}
				log::debug!("Default {:?} duration: {}s -> {}s", category, current, adjusted);
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	/// Copy every value that changed since `baseline` into `target`.
	///
	/// `baseline` is the config the manager started from (CLI overrides
	/// included), `target` the file contents to persist. Returns whether
	/// anything was written.
	pub fn write_changes(&self, baseline: &Config, target: &mut Config) -> bool {
		let mut changed = false;
		if self.voice_enabled != baseline.audio.voice_enabled {
			target.audio.voice_enabled = self.voice_enabled;
			changed = true;
		}
		if self.music_enabled != baseline.audio.music_enabled {
			target.audio.music_enabled = self.music_enabled;
			changed = true;
		}
		if self.breathing_secs != baseline.session.breathing_secs {
			target.session.breathing_secs = self.breathing_secs;
			changed = true;
		}
		if self.meditation_secs != baseline.session.meditation_secs {
			target.session.meditation_secs = self.meditation_secs;
			changed = true;
		}
		changed
	}

	fn channel_events(&self) -> Vec<Event> {
		vec![
			Event::Audio(AudioEvent::SetEnabled {
				channel: ChannelKind::Voice,
				enabled: self.voice_enabled,
			}),
			Event::Audio(AudioEvent::SetEnabled {
				channel: ChannelKind::Background,
				enabled: self.music_enabled,
			}),
		]
	}

	fn guidance_event(&self) -> Event {
		Event::Session(SessionEvent::Guidance {
			voice: self.voice_enabled,
			music: self.music_enabled,
		})
	}

	// Accessors for the front end
	pub fn voice_enabled(&self) -> bool {
		self.voice_enabled
	}

	pub fn music_enabled(&self) -> bool {
		self.music_enabled
	}

	pub fn default_duration(&self, category: Category) -> u32 {
		match category {
			Category::Breathing => self.breathing_secs,
			Category::Meditation => self.meditation_secs,
		}
	}
}

impl Default for SettingsManager {
	fn default() -> Self {
		Self::new(&Config::default())
	}
}

fn on_off(enabled: bool) -> &'static str {
	if enabled { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn toggle_voice_disables_channel_and_informs_session() {
		let mut settings = SettingsManager::default();
		let response = settings.handle(&Event::Settings(SettingsEvent::ToggleVoice));

		assert!(!settings.voice_enabled());
		assert!(matches!(
			response.events.as_slice(),
			[
				Event::Audio(AudioEvent::SetEnabled {
					channel: ChannelKind::Voice,
					enabled: false
				}),
				Event::Session(SessionEvent::Guidance {
					voice: false,
					music: true
				})
			]
		));
	}

	#[test]
	fn toggle_music_twice_restores() {
		let mut settings = SettingsManager::default();
		settings.handle(&Event::Settings(SettingsEvent::ToggleMusic));
		assert!(!settings.music_enabled());
		settings.handle(&Event::Settings(SettingsEvent::ToggleMusic));
		assert!(settings.music_enabled());
	}

	#[test]
	fn duration_adjustment_is_clamped() {
		let mut settings = SettingsManager::default();
		settings.handle(&Event::Settings(SettingsEvent::AdjustDuration {
			category: Category::Breathing,
			delta_secs: 60,
		}));
		assert_eq!(settings.default_duration(Category::Breathing), 180);

		settings.handle(&Event::Settings(SettingsEvent::AdjustDuration {
			category: Category::Breathing,
			delta_secs: -1000,
		}));
		assert_eq!(settings.default_duration(Category::Breathing), 30);

		settings.handle(&Event::Settings(SettingsEvent::AdjustDuration {
			category: Category::Meditation,
			delta_secs: 10_000,
		}));
		assert_eq!(settings.default_duration(Category::Meditation), 3600);
	}

	#[test]
	fn only_runtime_changes_are_written_back() {
		// Started with --no-voice on top of the file defaults
		let file = Config::default();
		let mut baseline = file.clone();
		baseline.audio.voice_enabled = false;

		let mut settings = SettingsManager::new(&baseline);
		let mut target = file.clone();
		assert!(!settings.write_changes(&baseline, &mut target));
		assert_eq!(target, file);

		settings.handle(&Event::Settings(SettingsEvent::ToggleMusic));
		settings.handle(&Event::Settings(SettingsEvent::AdjustDuration {
			category: Category::Meditation,
			delta_secs: 60,
		}));
		assert!(settings.write_changes(&baseline, &mut target));
		assert!(target.audio.voice_enabled);
		assert!(!target.audio.music_enabled);
		assert_eq!(target.session.meditation_secs, 360);
		assert_eq!(target.session.breathing_secs, 120);
	}

	#[test]
	fn init_reflects_config() {
		let mut config = Config::default();
		config.audio.music_enabled = false;
		let settings = SettingsManager::new(&config);
		let response = settings.init();
		assert_eq!(response.events.len(), 3);
		assert!(matches!(
			response.events[1],
			Event::Audio(AudioEvent::SetEnabled {
				channel: ChannelKind::Background,
				enabled: false
			})
		));
	}
}
