use thiserror::Error;

/// Playback failures reported by an audio channel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
	/// Host refused to start output (no device, autoplay policy, etc.)
	#[error("playback refused: {0}")]
	PlaybackRefused(String),

	/// Referenced audio could not be loaded or decoded
	#[error("source unavailable: {reference}: {reason}")]
	SourceUnavailable { reference: String, reason: String },

	/// Channel is disabled and ignores play requests
	#[error("channel disabled")]
	Disabled,
}

/// Config file and catalogue loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid TOML: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("failed to serialize config: {0}")]
	Serialize(#[from] toml::ser::Error),

	#[error("invalid catalogue: {0}")]
	Json(#[from] serde_json::Error),

	#[error("invalid value: {0}")]
	Invalid(String),
}
