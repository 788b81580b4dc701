use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait};
use rodio::{OutputStream, OutputStreamHandle};

/// Enumerate all available output devices
pub fn output_device_names() -> Vec<String> {
	let host = cpal::default_host();
	let mut names = Vec::new();
	match host.output_devices() {
		Ok(devices) => {
			for device in devices {
				if let Ok(name) = device.name() {
					names.push(name);
				}
			}
		}
		Err(e) => log::error!("Failed to enumerate devices: {}", e),
	}
	log::info!("Enumerated {} audio output devices", names.len());
	for name in &names {
		log::debug!("  Audio device: {}", name);
	}
	names
}

/// Open an output stream on the named device, falling back to the default.
///
/// The returned `OutputStream` must be kept alive for as long as any
/// handle is used.
pub fn open_output(name: Option<&str>) -> anyhow::Result<(OutputStream, OutputStreamHandle)> {
	if let Some(name) = name {
		match open_named(name) {
			Some(output) => return Ok(output),
			None => log::warn!("Audio device '{}' not found, falling back to default", name),
		}
	}
	open_default()
}

fn open_default() -> anyhow::Result<(OutputStream, OutputStreamHandle)> {
	let host = cpal::default_host();
	if let Some(device) = host.default_output_device() {
		let name = device.name().unwrap_or_else(|_| "unknown".into());
		log::info!("Using default audio output: {}", name);
	}
	OutputStream::try_default().context("no usable default audio output")
}

fn open_named(name: &str) -> Option<(OutputStream, OutputStreamHandle)> {
	let host = cpal::default_host();
	let devices = match host.output_devices() {
		Ok(d) => d,
		Err(e) => {
			log::error!("Failed to enumerate devices: {}", e);
			return None;
		}
	};
	for device in devices {
		if let Ok(dev_name) = device.name() {
			if dev_name == name {
				log::info!("Using audio device: {}", name);
				return match OutputStream::try_from_device(&device) {
					Ok(output) => Some(output),
					Err(e) => {
						log::error!("Failed to open audio device '{}': {}", name, e);
						None
					}
				};
			}
		}
	}
	None
}
