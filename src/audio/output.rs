use super::backend::{PlaybackBackend, PrepareFuture};
use super::fetch::{FetchedClip, SourceFetcher};
use crate::error::ChannelError;
use crate::types::SourceRef;
use rodio::{Decoder, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::sync::Arc;

/// rodio-backed playback primitive; one per channel, sharing an output handle
pub struct RodioBackend {
	handle: OutputStreamHandle,
	fetcher: Arc<SourceFetcher>,
	sink: Option<Sink>,
}

impl RodioBackend {
	pub fn new(handle: OutputStreamHandle, fetcher: Arc<SourceFetcher>) -> Self {
		Self {
			handle,
			fetcher,
			sink: None,
		}
	}
}

fn decode_error(reference: &SourceRef, e: rodio::decoder::DecoderError) -> ChannelError {
	ChannelError::SourceUnavailable {
		reference: reference.to_string(),
		reason: e.to_string(),
	}
}

impl PlaybackBackend for RodioBackend {
	type Clip = FetchedClip;

	fn prepare(&self, source: &SourceRef) -> PrepareFuture<FetchedClip> {
		let fetcher = self.fetcher.clone();
		let source = source.clone();
		Box::pin(async move { fetcher.fetch(&source).await })
	}

	fn start(&mut self, clip: FetchedClip, looped: bool, volume: f32) -> Result<(), ChannelError> {
		let FetchedClip { reference, bytes } = clip;

		// A stopped rodio sink stays stopped, so every start gets a fresh one
		let sink =
			Sink::try_new(&self.handle).map_err(|e| ChannelError::PlaybackRefused(e.to_string()))?;

		let cursor = Cursor::new(bytes);
		if looped {
			let decoder = Decoder::new_looped(cursor).map_err(|e| decode_error(&reference, e))?;
			sink.append(decoder);
		} else {
			let decoder = Decoder::new(cursor).map_err(|e| decode_error(&reference, e))?;
			sink.append(decoder);
		}
		sink.set_volume(volume);
		sink.play();

		if let Some(previous) = self.sink.replace(sink) {
			previous.stop();
		}
		log::debug!("[Output] Playing {} (loop={}, volume={:.2})", reference, looped, volume);
		Ok(())
	}

	fn halt(&mut self) {
		if let Some(sink) = self.sink.take() {
			sink.stop();
		}
	}

	fn set_volume(&mut self, volume: f32) {
		if let Some(sink) = &self.sink {
			sink.set_volume(volume);
		}
	}

	fn is_audible(&self) -> bool {
		self.sink
			.as_ref()
			.is_some_and(|sink| !sink.is_paused() && !sink.empty())
	}
}
