pub mod definition;

pub use definition::{ExerciseDefinition, PhaseCue, PhaseCues, SegmentCues, VoiceCues};

use crate::error::ConfigError;
use crate::reactor::{CatalogueEvent, ComponentResponse, Event};
use crate::types::{Category, NavDirection};
use definition::CatalogueFile;
use indexmap::IndexMap;
use std::path::Path;

const BUILTIN: &str = include_str!("../../assets/catalogue.json");

/// Read-only exercise list with a selection cursor
pub struct Catalogue {
	entries: IndexMap<String, ExerciseDefinition>,
	current_index: usize,
}

impl Catalogue {
	pub fn from_definitions(definitions: Vec<ExerciseDefinition>) -> Result<Self, ConfigError> {
		let mut entries = IndexMap::with_capacity(definitions.len());
		for definition in definitions {
			let id = definition.id.clone();
			if entries.insert(id.clone(), definition).is_some() {
				return Err(ConfigError::Invalid(format!("duplicate exercise id '{}'", id)));
			}
		}
		log::info!("[Catalogue] {} exercises loaded", entries.len());
		Ok(Self {
			entries,
			current_index: 0,
		})
	}

	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		let file: CatalogueFile = serde_json::from_str(text)?;
		Self::from_definitions(file.exercises)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		log::info!("[Catalogue] Loading {}", path.display());
		let text = std::fs::read_to_string(path)?;
		Self::from_json(&text)
	}

	pub fn builtin() -> Result<Self, ConfigError> {
		Self::from_json(BUILTIN)
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Catalogue(CatalogueEvent::Navigate(direction)) => {
				self.navigate(*direction);
			}
			Event::Catalogue(CatalogueEvent::Select { id }) => {
				if !self.select(id) {
					log::warn!("[Catalogue] Unknown exercise '{}'", id);
				}
			}
			_ => {}
		}
		ComponentResponse::none()
	}

	pub fn navigate(&mut self, direction: NavDirection) {
		if self.entries.is_empty() {
			log::debug!("Navigate ignored: empty catalogue");
			return;
		}

		let old_index = self.current_index;
		let len = self.entries.len();
		match direction {
			NavDirection::Next => {
				self.current_index = (self.current_index + 1) % len;
			}
			NavDirection::Prev => {
				if self.current_index == 0 {
					self.current_index = len - 1;
				} else {
					self.current_index -= 1;
				}
			}
			NavDirection::Skip(count) => {
				if count > 0 {
					self.current_index = (self.current_index + count as usize).min(len - 1);
				} else {
					self.current_index = self.current_index.saturating_sub(count.unsigned_abs() as usize);
				}
			}
		}
		log::debug!(
			"Navigate {:?}: {} -> {} (of {})",
			direction,
			old_index,
			self.current_index,
			len
		);
	}

	/// Move the cursor to `id`; false if unknown
	pub fn select(&mut self, id: &str) -> bool {
		match self.entries.get_index_of(id) {
			Some(index) => {
				self.current_index = index;
				true
			}
			None => false,
		}
	}

	pub fn current(&self) -> Option<&ExerciseDefinition> {
		self.entries.get_index(self.current_index).map(|(_, d)| d)
	}

	pub fn get(&self, id: &str) -> Option<&ExerciseDefinition> {
		self.entries.get(id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
		self.entries.values()
	}

	pub fn by_category(&self, category: Category) -> impl Iterator<Item = &ExerciseDefinition> {
		self.entries.values().filter(move |d| d.category == category)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
