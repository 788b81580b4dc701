use crate::breathing::PhaseDurations;
use crate::error::ConfigError;
use crate::types::Category;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn project_dirs() -> Option<ProjectDirs> {
	ProjectDirs::from("", "", "dashcalm")
}

/// Persisted configuration, `config.toml` in the platform config directory.
///
/// Every section uses `#[serde(default)]` so partial files load cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
	/// Catalogue file replacing the built-in one
	#[serde(skip_serializing_if = "Option::is_none")]
	pub catalogue: Option<PathBuf>,
	pub timing: TimingConfig,
	pub audio: AudioConfig,
	pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
	pub inhale_secs: f32,
	pub hold_secs: f32,
	pub exhale_secs: f32,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			inhale_secs: 4.0,
			hold_secs: 4.0,
			exhale_secs: 4.0,
		}
	}
}

impl TimingConfig {
	pub fn durations(&self) -> Result<PhaseDurations, ConfigError> {
		PhaseDurations::from_secs_f32(self.inhale_secs, self.hold_secs, self.exhale_secs)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
	pub voice_enabled: bool,
	pub music_enabled: bool,
	pub voice_volume: f32,
	pub breathing_music_volume: f32,
	pub meditation_music_volume: f32,
	/// Output device name; default device when absent or not found
	#[serde(skip_serializing_if = "Option::is_none")]
	pub output_device: Option<String>,
	/// Base directory for relative source references
	#[serde(skip_serializing_if = "Option::is_none")]
	pub media_dir: Option<PathBuf>,
}

impl Default for AudioConfig {
	fn default() -> Self {
		Self {
			voice_enabled: true,
			music_enabled: true,
			voice_volume: 0.8,
			breathing_music_volume: 0.3,
			meditation_music_volume: 0.5,
			output_device: None,
			media_dir: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	pub breathing_secs: u32,
	pub meditation_secs: u32,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			breathing_secs: 120,
			meditation_secs: 300,
		}
	}
}

impl SessionConfig {
	pub fn default_duration(&self, category: Category) -> u32 {
		match category {
			Category::Breathing => self.breathing_secs,
			Category::Meditation => self.meditation_secs,
		}
	}
}

impl Config {
	pub fn default_path() -> Option<PathBuf> {
		project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
	}

	/// Load from `path`; a missing file yields defaults
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = match std::fs::read_to_string(path) {
			Ok(text) => text,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				log::info!("No config at {}, using defaults", path.display());
				return Ok(Self::default());
			}
			Err(e) => return Err(e.into()),
		};
		let config: Config = toml::from_str(&text)?;
		config.validate()?;
		log::info!("Loaded config from {}", path.display());
		Ok(config)
	}

	pub fn load_default() -> Result<Self, ConfigError> {
		match Self::default_path() {
			Some(path) => Self::load(&path),
			None => {
				log::warn!("No platform config directory, using defaults");
				Ok(Self::default())
			}
		}
	}

	pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
		self.validate()?;
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, toml::to_string_pretty(self)?)?;
		log::info!("Saved config to {}", path.display());
		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		self.timing.durations()?;
		for (name, volume) in [
			("voice_volume", self.audio.voice_volume),
			("breathing_music_volume", self.audio.breathing_music_volume),
			("meditation_music_volume", self.audio.meditation_music_volume),
		] {
			if !(0.0..=1.0).contains(&volume) {
				return Err(ConfigError::Invalid(format!(
					"{} must be within 0.0..=1.0, got {}",
					name, volume
				)));
			}
		}
		if self.session.breathing_secs == 0 || self.session.meditation_secs == 0 {
			return Err(ConfigError::Invalid(
				"session durations must be greater than zero".into(),
			));
		}
		Ok(())
	}

	/// Media directory: configured, else the platform data directory, else `./media`
	pub fn media_dir(&self) -> PathBuf {
		if let Some(dir) = &self.audio.media_dir {
			return dir.clone();
		}
		project_dirs()
			.map(|dirs| dirs.data_dir().join("media"))
			.unwrap_or_else(|| PathBuf::from("media"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn missing_file_yields_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let config = Config::load(&dir.path().join("config.toml")).unwrap();
		assert_eq!(config, Config::default());
		assert_eq!(
			config.timing.durations().unwrap().cycle(),
			Duration::from_secs(12)
		);
	}

	#[test]
	fn partial_file_fills_in_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(
			&path,
			"[timing]\nhold_secs = 7.0\n\n[audio]\nvoice_enabled = false\noutput_device = \"Car Speakers\"\n",
		)
		.unwrap();

		let config = Config::load(&path).unwrap();
		assert_eq!(config.timing.hold_secs, 7.0);
		assert_eq!(config.timing.inhale_secs, 4.0);
		assert!(!config.audio.voice_enabled);
		assert!(config.audio.music_enabled);
		assert_eq!(config.audio.output_device.as_deref(), Some("Car Speakers"));
		assert_eq!(config.session.default_duration(Category::Meditation), 300);
	}

	#[test]
	fn save_then_load_preserves_values() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/config.toml");

		let mut config = Config::default();
		config.catalogue = Some(PathBuf::from("/etc/dashcalm/catalogue.json"));
		config.audio.meditation_music_volume = 0.4;
		config.session.breathing_secs = 90;
		config.save(&path).unwrap();

		assert_eq!(Config::load(&path).unwrap(), config);
	}

	#[test]
	fn zero_hold_is_rejected() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[timing]\nhold_secs = 0.0\n").unwrap();
		assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
	}

	#[test]
	fn out_of_range_volume_is_rejected() {
		let mut config = Config::default();
		config.audio.voice_volume = 1.5;
		assert!(config.validate().is_err());
	}

	#[test]
	fn malformed_toml_is_reported() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("config.toml");
		std::fs::write(&path, "[timing\n").unwrap();
		assert!(matches!(Config::load(&path), Err(ConfigError::Toml(_))));
	}
}
