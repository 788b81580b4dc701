use crate::catalogue::ExerciseDefinition;
use crate::types::{MeditationSegment, Phase, SourceRef};

/// Voice clip for entering `phase`
pub fn phase_cue(definition: &ExerciseDefinition, phase: Phase, first_cycle: bool) -> Option<&SourceRef> {
	definition
		.voice
		.phases
		.get(phase)
		.map(|cue| cue.select(first_cycle))
}

/// Tracks which one-shot meditation cues already fired this session
#[derive(Debug, Default, Clone)]
pub struct SegmentTracker {
	played: [bool; 3],
}

impl SegmentTracker {
	pub fn reset(&mut self) {
		self.played = [false; 3];
	}

	pub fn mark(&mut self, segment: MeditationSegment) {
		self.played[segment.as_index()] = true;
	}

	pub fn has_played(&self, segment: MeditationSegment) -> bool {
		self.played[segment.as_index()]
	}

	/// First segment whose window contains `elapsed` and has not fired yet
	pub fn due(&self, elapsed: u32, duration: u32) -> Option<MeditationSegment> {
		MeditationSegment::ALL
			.into_iter()
			.find(|segment| !self.has_played(*segment) && in_window(*segment, elapsed, duration))
	}
}

/// Intro 2..=7s elapsed, middle within 2s of halfway, end 10..=5s remaining
fn in_window(segment: MeditationSegment, elapsed: u32, duration: u32) -> bool {
	match segment {
		MeditationSegment::Intro => (2..=7).contains(&elapsed),
		MeditationSegment::Middle => {
			let half = duration / 2;
			(half.saturating_sub(2)..=half + 2).contains(&elapsed)
		}
		MeditationSegment::End => {
			let remaining = duration.saturating_sub(elapsed);
			(5..=10).contains(&remaining)
		}
	}
}
