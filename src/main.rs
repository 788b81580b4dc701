use anyhow::Context;
use clap::Parser;
use dashcalm::audio::device;
use dashcalm::audio::fetch::SourceFetcher;
use dashcalm::audio::output::RodioBackend;
use dashcalm::audio::PlaybackBackend;
use dashcalm::catalogue::Catalogue;
use dashcalm::reactor::{CatalogueEvent, Event, Reactor, SessionEvent, SettingsEvent};
use dashcalm::session::{SessionSnapshot, SessionStatus};
use dashcalm::settings::Config;
use dashcalm::types::{Category, NavDirection};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const DURATION_STEP_SECS: i64 = 60;

const HELP: &str = "Commands: [p]ause/resume  [r]estart  [v]oice  [m]usic  [q]uit\n          \
	[n]ext/[b]ack exercise  select <id>  [g]o (start selected)  +/- default length";

#[derive(Parser, Debug)]
#[command(name = "dashcalm", about = "Guided breathing and meditation sessions")]
struct Args {
	/// Exercise id to start (defaults to the first catalogue entry)
	#[arg(short, long)]
	exercise: Option<String>,

	/// Session length in seconds
	#[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
	duration: Option<u32>,

	/// List catalogue entries and exit
	#[arg(long)]
	list: bool,

	/// List audio output devices and exit
	#[arg(long)]
	list_devices: bool,

	/// Config file (defaults to the platform config directory)
	#[arg(long)]
	config: Option<PathBuf>,

	/// Catalogue JSON replacing the built-in one
	#[arg(long)]
	catalogue: Option<PathBuf>,

	/// Output device name
	#[arg(long)]
	device: Option<String>,

	/// Start with voice guidance off
	#[arg(long)]
	no_voice: bool,

	/// Start with background music off
	#[arg(long)]
	no_music: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let args = Args::parse();

	if args.list_devices {
		for name in device::output_device_names() {
			println!("{}", name);
		}
		return Ok(());
	}

	let config_path = args.config.clone().or_else(Config::default_path);
	let file_config = match &config_path {
		Some(path) => Config::load(path),
		None => Config::load_default(),
	}
	.context("failed to load config")?;
	let mut config = file_config.clone();
	if args.no_voice {
		config.audio.voice_enabled = false;
	}
	if args.no_music {
		config.audio.music_enabled = false;
	}
	if args.device.is_some() {
		config.audio.output_device = args.device.clone();
	}

	let catalogue = match args.catalogue.as_ref().or(config.catalogue.as_ref()) {
		Some(path) => Catalogue::load(path),
		None => Catalogue::builtin(),
	}
	.context("failed to load catalogue")?;

	if args.list {
		for definition in catalogue.iter() {
			println!(
				"{:<20} {:<11} {:>5}s  {}",
				definition.id,
				format!("{:?}", definition.category).to_lowercase(),
				definition.duration_secs.unwrap_or_else(|| config.session.default_duration(definition.category)),
				definition.title
			);
		}
		return Ok(());
	}

	if let Some(id) = &args.exercise {
		if catalogue.get(id).is_none() {
			anyhow::bail!("unknown exercise '{}' (try --list)", id);
		}
	}

	// Stream must outlive both backends
	let (_stream, handle) = device::open_output(config.audio.output_device.as_deref())?;
	let fetcher = Arc::new(SourceFetcher::new(config.media_dir()).context("failed to build HTTP client")?);
	log::info!("Media directory: {}", fetcher.media_dir().display());

	let voice = RodioBackend::new(handle.clone(), fetcher.clone());
	let background = RodioBackend::new(handle, fetcher);
	let mut reactor = Reactor::new(&config, catalogue, voice, background)?;

	reactor.dispatch(Event::Session(match args.exercise {
		Some(id) => SessionEvent::Start {
			id,
			duration_secs: args.duration,
		},
		None => SessionEvent::StartSelected {
			duration_secs: args.duration,
		},
	}));
	reactor.tick(Instant::now());
	if reactor.snapshot().status == SessionStatus::Idle {
		anyhow::bail!("session did not start (see log)");
	}

	println!("{}", HELP);
	let ending = run(&mut reactor).await;
	println!("{}", ending.message());

	if let Some(path) = &config_path {
		let mut persisted = file_config;
		if reactor.settings.write_changes(&config, &mut persisted) {
			if let Err(e) = persisted.save(path) {
				log::warn!("Could not save settings: {}", e);
			}
		}
	}

	Ok(())
}

/// How the main loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
	Completed,
	Stopped,
	Interrupted,
}

impl Ending {
	fn message(self) -> &'static str {
		match self {
			Ending::Completed => "Session complete",
			Ending::Stopped => "Session stopped",
			Ending::Interrupted => "Interrupted",
		}
	}
}

async fn run<B: PlaybackBackend>(reactor: &mut Reactor<B>) -> Ending {
	let mut frames = tokio::time::interval(FRAME_INTERVAL);
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut stdin_open = true;
	let mut last_status: Option<String> = None;
	let mut requested: Option<Ending> = None;

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);
	let mut ctrl_c_armed = true;

	loop {
		tokio::select! {
			_ = frames.tick() => {
				reactor.tick(Instant::now());
				let snapshot = reactor.snapshot();
				if snapshot.status == SessionStatus::Idle {
					return requested.unwrap_or(Ending::Completed);
				}
				let status = format_status(&snapshot);
				if last_status.as_ref() != Some(&status) {
					println!("{}", status);
					last_status = Some(status);
				}
			}
			line = lines.next_line(), if stdin_open => match line {
				Ok(Some(line)) => {
					let category = current_category(reactor);
					match command_event(line.trim(), category) {
						Some(event) => {
							let feedback = matches!(
								event,
								Event::Catalogue(_) | Event::Settings(SettingsEvent::AdjustDuration { .. })
							);
							if matches!(event, Event::Session(SessionEvent::Stop)) {
								requested = Some(Ending::Stopped);
							}
							reactor.dispatch(event);
							reactor.tick(Instant::now());
							if feedback {
								println!("{}", format_selection(reactor));
							}
						}
						None if line.trim().is_empty() => {}
						None => println!("Unknown command '{}'\n{}", line.trim(), HELP),
					}
				}
				Ok(None) => stdin_open = false,
				Err(e) => {
					log::error!("stdin error: {}", e);
					stdin_open = false;
				}
			},
			result = &mut ctrl_c, if ctrl_c_armed => {
				ctrl_c_armed = false;
				if let Err(e) = result {
					log::error!("Ctrl-C listener failed: {}", e);
					continue;
				}
				requested = Some(Ending::Interrupted);
				reactor.dispatch(Event::Session(SessionEvent::Stop));
			}
		}
	}
}

fn current_category<B: PlaybackBackend>(reactor: &Reactor<B>) -> Category {
	reactor
		.catalogue
		.current()
		.map(|definition| definition.category)
		.unwrap_or(Category::Breathing)
}

/// Map a stdin line to an event; `category` is the one `+`/`-` adjust
fn command_event(command: &str, category: Category) -> Option<Event> {
	if let Some(id) = command.strip_prefix("select ") {
		return Some(Event::Catalogue(CatalogueEvent::Select {
			id: id.trim().to_owned(),
		}));
	}
	match command {
		"p" | "pause" => Some(Event::Session(SessionEvent::TogglePause)),
		"r" | "restart" => Some(Event::Session(SessionEvent::Restart)),
		"q" | "quit" | "stop" => Some(Event::Session(SessionEvent::Stop)),
		"g" | "go" => Some(Event::Session(SessionEvent::StartSelected {
			duration_secs: None,
		})),
		"v" | "voice" => Some(Event::Settings(SettingsEvent::ToggleVoice)),
		"m" | "music" => Some(Event::Settings(SettingsEvent::ToggleMusic)),
		"n" | "next" => Some(Event::Catalogue(CatalogueEvent::Navigate(NavDirection::Next))),
		"b" | "back" => Some(Event::Catalogue(CatalogueEvent::Navigate(NavDirection::Prev))),
		"+" => Some(Event::Settings(SettingsEvent::AdjustDuration {
			category,
			delta_secs: DURATION_STEP_SECS,
		})),
		"-" => Some(Event::Settings(SettingsEvent::AdjustDuration {
			category,
			delta_secs: -DURATION_STEP_SECS,
		})),
		_ => None,
	}
}

fn format_selection<B: PlaybackBackend>(reactor: &Reactor<B>) -> String {
	match reactor.catalogue.current() {
		Some(definition) => format!(
			"Selected {} ({}), default length {}s",
			definition.id,
			definition.title,
			reactor.settings.default_duration(definition.category)
		),
		None => "Catalogue is empty".to_owned(),
	}
}

/// One status line; changes at most once per phase or second
fn format_status(snapshot: &SessionSnapshot) -> String {
	let id = snapshot.exercise_id.as_deref().unwrap_or("-");
	let remaining = format!("{:02}:{:02}", snapshot.remaining_secs / 60, snapshot.remaining_secs % 60);
	let paused = if snapshot.status == SessionStatus::Paused {
		"  (paused)"
	} else {
		""
	};
	match snapshot.phase {
		Some(phase) => format!(
			"[{}] {:<6} cycle {}  {} remaining{}",
			id,
			phase.label(),
			snapshot.cycles_completed + 1,
			remaining,
			paused
		),
		None => format!("[{}] {} remaining{}", id, remaining, paused),
	}
}
