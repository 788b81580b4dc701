//! Session coordinator for guided breathing and meditation.
//!
//! A [`reactor::Reactor`] owns the breathing phase clock, the voice and
//! background audio channels, and the session controller that ties them
//! to an exercise from the [`catalogue::Catalogue`].

pub mod audio;
pub mod breathing;
pub mod catalogue;
pub mod error;
pub mod reactor;
pub mod session;
pub mod settings;
pub mod types;
