use serde::{Deserialize, Serialize};
use std::fmt;

/// Breathing timer phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
	Inhale,
	Hold,
	Exhale,
}

impl Phase {
	pub const ALL: [Phase; 3] = [Phase::Inhale, Phase::Hold, Phase::Exhale];

	/// Next phase in the cycle
	pub fn next(self) -> Phase {
		match self {
			Phase::Inhale => Phase::Hold,
			Phase::Hold => Phase::Exhale,
			Phase::Exhale => Phase::Inhale,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Phase::Inhale => "Inhale",
			Phase::Hold => "Hold",
			Phase::Exhale => "Exhale",
		}
	}
}

/// Exercise category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
	Breathing,
	Meditation,
}

/// Independent audio output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
	Voice,      // Foreground guidance
	Background, // Looped ambient music
}

impl fmt::Display for ChannelKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ChannelKind::Voice => f.write_str("voice"),
			ChannelKind::Background => f.write_str("background"),
		}
	}
}

/// One-shot meditation guidance windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeditationSegment {
	Intro,
	Middle,
	End,
}

impl MeditationSegment {
	pub const ALL: [MeditationSegment; 3] = [
		MeditationSegment::Intro,
		MeditationSegment::Middle,
		MeditationSegment::End,
	];

	pub fn as_index(self) -> usize {
		self as usize
	}
}

/// Audio source reference: a media-relative path or an http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
	pub fn new(reference: impl Into<String>) -> Self {
		Self(reference.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_remote(&self) -> bool {
		self.0.starts_with("http://") || self.0.starts_with("https://")
	}
}

impl fmt::Display for SourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for SourceRef {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// Navigation direction
#[derive(Debug, Clone, Copy)]
pub enum NavDirection {
	Next,
	Prev,
	Skip(i32),
}
