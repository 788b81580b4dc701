use crate::types::{Category, MeditationSegment, Phase, SourceRef};
use serde::{Deserialize, Serialize};

/// Static exercise or meditation entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub description: String,
	pub category: Category,
	pub background: SourceRef,
	#[serde(default)]
	pub voice: VoiceCues,
	#[serde(default)]
	pub video: Option<SourceRef>,
	#[serde(default)]
	pub thumbnail: Option<SourceRef>,
	/// Suggested length; settings supply one when absent
	#[serde(default)]
	pub duration_secs: Option<u32>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCues {
	#[serde(default)]
	pub phases: PhaseCues,
	#[serde(default)]
	pub segments: SegmentCues,
}

/// Detailed clip for the first traversal, terse clip afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCue {
	pub detailed: SourceRef,
	pub steady: SourceRef,
}

impl PhaseCue {
	pub fn select(&self, first_cycle: bool) -> &SourceRef {
		if first_cycle {
			&self.detailed
		} else {
			&self.steady
		}
	}
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCues {
	pub inhale: Option<PhaseCue>,
	pub hold: Option<PhaseCue>,
	pub exhale: Option<PhaseCue>,
}

impl PhaseCues {
	pub fn get(&self, phase: Phase) -> Option<&PhaseCue> {
		match phase {
			Phase::Inhale => self.inhale.as_ref(),
			Phase::Hold => self.hold.as_ref(),
			Phase::Exhale => self.exhale.as_ref(),
		}
	}
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentCues {
	pub intro: Option<SourceRef>,
	pub middle: Option<SourceRef>,
	pub end: Option<SourceRef>,
}

impl SegmentCues {
	pub fn get(&self, segment: MeditationSegment) -> Option<&SourceRef> {
		match segment {
			MeditationSegment::Intro => self.intro.as_ref(),
			MeditationSegment::Middle => self.middle.as_ref(),
			MeditationSegment::End => self.end.as_ref(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct CatalogueFile {
	pub exercises: Vec<ExerciseDefinition>,
}
