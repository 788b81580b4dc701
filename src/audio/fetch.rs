use crate::error::ChannelError;
use crate::types::SourceRef;
use std::path::{Path, PathBuf};

/// Raw bytes of a loaded source, ready for decoding
pub struct FetchedClip {
	pub reference: SourceRef,
	pub bytes: Vec<u8>,
}

/// Loads audio sources from the media directory or over HTTP
pub struct SourceFetcher {
	client: reqwest::Client,
	media_dir: PathBuf,
}

impl SourceFetcher {
	pub fn new(media_dir: impl Into<PathBuf>) -> Result<Self, reqwest::Error> {
		let client = reqwest::Client::builder()
			.user_agent(concat!("dashcalm/", env!("CARGO_PKG_VERSION")))
			.build()?;
		Ok(Self {
			client,
			media_dir: media_dir.into(),
		})
	}

	pub fn media_dir(&self) -> &Path {
		&self.media_dir
	}

	pub async fn fetch(&self, source: &SourceRef) -> Result<FetchedClip, ChannelError> {
		let result = if source.is_remote() {
			self.fetch_remote(source.as_str()).await
		} else {
			let path = self.resolve(source);
			log::debug!("[Fetch] Reading {}", path.display());
			tokio::fs::read(&path).await.map_err(anyhow::Error::from)
		};

		match result {
			Ok(bytes) => {
				log::debug!("[Fetch] Loaded {} ({} bytes)", source, bytes.len());
				Ok(FetchedClip {
					reference: source.clone(),
					bytes,
				})
			}
			Err(e) => {
				log::error!("[Fetch] Failed to load {}: {}", source, e);
				Err(ChannelError::SourceUnavailable {
					reference: source.to_string(),
					reason: e.to_string(),
				})
			}
		}
	}

	fn resolve(&self, source: &SourceRef) -> PathBuf {
		let path = Path::new(source.as_str());
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.media_dir.join(path)
		}
	}

	async fn fetch_remote(&self, url: &str) -> anyhow::Result<Vec<u8>> {
		log::info!("[Fetch] Downloading {}", url);
		let response = self.client.get(url).send().await?;

		let status = response.status();
		if !status.is_success() {
			anyhow::bail!("Request failed with status: {}", status);
		}

		let bytes = response.bytes().await?;
		Ok(bytes.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn reads_relative_sources_from_media_dir() {
		let dir = tempfile::tempdir().unwrap();
		std::fs::create_dir_all(dir.path().join("voice")).unwrap();
		std::fs::write(dir.path().join("voice/inhale.mp3"), b"ID3fake").unwrap();

		let fetcher = SourceFetcher::new(dir.path()).unwrap();
		let clip = fetcher.fetch(&SourceRef::from("voice/inhale.mp3")).await.unwrap();
		assert_eq!(clip.bytes, b"ID3fake");
		assert_eq!(clip.reference.as_str(), "voice/inhale.mp3");
	}

	#[tokio::test]
	async fn missing_source_is_unavailable() {
		let dir = tempfile::tempdir().unwrap();
		let fetcher = SourceFetcher::new(dir.path()).unwrap();
		let err = fetcher
			.fetch(&SourceRef::from("nowhere.mp3"))
			.await
			.err()
			.unwrap();
		assert!(matches!(
			err,
			ChannelError::SourceUnavailable { ref reference, .. } if reference == "nowhere.mp3"
		));
	}
}
