//! Recipe Scanner entry point.
//!
//! Opens a camera, waits for a QR code, and prints a generated recipe for
//! whatever the code says.
//!
//! # Usage
//!
//! ```text
//! recipe-scanner [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --endpoint <URL>       Recipe endpoint URL
//!   --timeout-secs <SECS>  Request timeout (none by default)
//!   --log-level <FILTER>   Log filter when RUST_LOG is unset
//!   --device <ID>          Camera to open first (e.g. /dev/video2)
//!   --dedupe               Ignore repeated scans of the displayed subject
//!   --demo <TEXT>          Use the mock camera, "showing" TEXT (repeatable)
//!   --init-config          Write the effective config file and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable          | Overrides      |
//! |-------------------|----------------|
//! | `RECIPE_CONFIG`   | `--config`     |
//! | `RECIPE_ENDPOINT` | `--endpoint`   |
//! | `RECIPE_LOG`      | `--log-level`  |
//!
//! Command-line flags win over environment variables, which win over the
//! config file.  `RUST_LOG`, when set, replaces the log filter entirely.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ CameraSessionManager  -- list devices, open first, decode loop
//!  └─ RecipeRenderer        -- HTTP request, parse, display
//!  └─ dispatch loop (tokio::select!)
//!       ├─ ScanEvent (current token)  -> spawn renderer.handle_scan
//!       ├─ ScanEvent (stale token)    -> dropped
//!       ├─ Trigger::SwitchCamera      -> session.switch_to_next_device
//!       ├─ Trigger::RefreshRecipe     -> spawn renderer.refresh
//!       └─ Trigger::Quit / Ctrl+C     -> session.stop, exit
//! ```
//!
//! Recipe requests run on their own tasks so the camera can be switched
//! while a slow request is still in flight.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use recipe_scanner::application::{
    camera_session::{BarcodeDecoder, CameraSessionManager, MediaBackend, SwitchOutcome},
    render_recipe::{DisplaySurface, RecipeRenderer},
};
use recipe_scanner::infrastructure::{
    decoder::mock::{text_frame, TextFrameDecoder},
    display::terminal::TerminalDisplay,
    media::mock::MockMediaBackend,
    recipe_api::HttpRecipeClient,
    storage::config::{
        config_file_path, load_config_from, save_config_to, AppConfig, CameraConfig,
    },
    triggers::{spawn_stdin_triggers, Trigger, HELP_TEXT},
};

/// Subject shown by the mock camera when `--demo` is given without text.
const DEFAULT_DEMO_SUBJECT: &str = "Banana Bread";
/// Pause between mock frames in demo mode.
const DEMO_FRAME_INTERVAL: Duration = Duration::from_secs(3);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Scan a QR code and get a recipe for it.
#[derive(Debug, Parser)]
#[command(
    name = "recipe-scanner",
    about = "Scans a QR code with a camera and shows a generated recipe",
    version
)]
struct Cli {
    /// Config file to read instead of the platform default.
    #[arg(long, env = "RECIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Recipe generation endpoint (POST, JSON).
    #[arg(long, env = "RECIPE_ENDPOINT")]
    endpoint: Option<String>,

    /// Give up on a recipe request after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// `tracing` filter used when `RUST_LOG` is unset.
    #[arg(long, env = "RECIPE_LOG")]
    log_level: Option<String>,

    /// Device id of the camera to open first.
    #[arg(long)]
    device: Option<String>,

    /// Ignore a scan whose text matches the recipe already shown.
    #[arg(long)]
    dedupe: bool,

    /// Run with the mock camera, which "sees" a QR code with this text.
    ///
    /// Repeat to cycle through several subjects.  Always on in builds
    /// without the `v4l2` feature.
    #[arg(long = "demo", value_name = "TEXT", num_args = 0..=1, default_missing_value = DEFAULT_DEMO_SUBJECT)]
    demo_subjects: Vec<String>,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// The config file this run reads (and `--init-config` writes).
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("cannot locate the config file"),
        }
    }

    /// Applies command-line and environment overrides on top of the file.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(url) = &self.endpoint {
            config.endpoint.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.endpoint.timeout_secs = Some(secs);
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(device) = &self.device {
            config.camera.preferred_device = Some(device.clone());
        }
        if self.dedupe {
            config.scanner.dedupe_repeated_scans = true;
        }
    }
}

// ── Camera selection ──────────────────────────────────────────────────────────

#[cfg_attr(
    not(all(target_os = "linux", feature = "v4l2")),
    allow(unused_variables)
)]
fn build_camera(
    cli: &Cli,
    camera: &CameraConfig,
) -> (Arc<dyn MediaBackend>, Arc<dyn BarcodeDecoder>) {
    #[cfg(all(target_os = "linux", feature = "v4l2"))]
    if cli.demo_subjects.is_empty() {
        use recipe_scanner::infrastructure::{decoder::qr::QrDecoder, media::NativeMediaBackend};
        info!("Using V4L2 cameras at {}x{}", camera.width, camera.height);
        return (
            Arc::new(NativeMediaBackend::new(camera.width, camera.height)),
            Arc::new(QrDecoder),
        );
    }

    let subjects: Vec<&str> = if cli.demo_subjects.is_empty() {
        vec![DEFAULT_DEMO_SUBJECT]
    } else {
        cli.demo_subjects.iter().map(String::as_str).collect()
    };
    info!("Using the mock camera; it will show {subjects:?}");
    let frames = subjects.into_iter().map(text_frame).collect();
    let backend = MockMediaBackend::with_cameras(2)
        .with_frames(frames)
        .with_frame_interval(DEMO_FRAME_INTERVAL);
    (Arc::new(backend), Arc::new(TextFrameDecoder))
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. CLI arguments are parsed and the config file is loaded; flags and
///    environment variables override file values.
/// 2. `tracing_subscriber` is initialised.  `RUST_LOG` wins; otherwise the
///    configured `log_level` is used.
/// 3. Cameras are enumerated.  If access is denied or none exist, the error
///    is reported and the program exits without opening a stream.
/// 4. The preferred (or first) camera is opened and its decode loop starts.
/// 5. The dispatch loop runs until `q`, end of input, or Ctrl+C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_overrides(&mut config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.general.log_level))
        .with_context(|| format!("invalid log level {:?}", config.general.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.init_config {
        save_config_to(&config_path, &config)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        info!("Wrote configuration to {}", config_path.display());
        return Ok(());
    }

    info!(
        "Recipe Scanner starting; endpoint={}, config={}",
        config.endpoint.url,
        config_path.display()
    );

    // ── Use cases ─────────────────────────────────────────────────────────────
    let display = Arc::new(TerminalDisplay::stdout());
    let source = HttpRecipeClient::new(config.endpoint.url.clone(), config.endpoint.timeout())
        .context("failed to build the HTTP client")?;
    let renderer = Arc::new(
        RecipeRenderer::new(Arc::new(source), display.clone())
            .with_dedupe(config.scanner.dedupe_repeated_scans),
    );

    let (media, decoder) = build_camera(&cli, &config.camera);
    let (mut session, mut scans) =
        CameraSessionManager::new(media, decoder, config.scanner.event_buffer);

    // ── Camera startup ────────────────────────────────────────────────────────
    let devices = match session.list_video_devices().await {
        Ok(devices) => devices,
        Err(e) => {
            error!("Error accessing camera: {e}");
            display.show_notice("Error accessing camera.");
            session.stop().await;
            return Ok(());
        }
    };
    if devices.is_empty() {
        error!("No video input devices found.");
        display.show_notice("No video input devices found.");
        session.stop().await;
        return Ok(());
    }

    let preferred = config.camera.preferred_device.as_deref().and_then(|id| {
        let found = devices.iter().find(|d| d.device_id == id).cloned();
        if found.is_none() {
            warn!("Preferred camera {id} not found; using {}", devices[0]);
        }
        found
    });
    match session.start_session(preferred).await {
        Ok(token) => {
            if let Some(device) = session.active_device() {
                info!("Scanning with {device} (stream {token})");
                display.show_notice(&format!("Scanning with {device}"));
            }
        }
        Err(e) => {
            error!("{e}");
            display.show_notice("Could not open the camera; enter n to try the next one.");
        }
    }
    display.show_notice(HELP_TEXT);

    // ── Main dispatch loop ────────────────────────────────────────────────────
    let mut triggers = spawn_stdin_triggers();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = scans.recv() => {
                if !session.is_current(event.token) {
                    debug!("Ignoring scan from stale stream {}", event.token);
                    continue;
                }
                let renderer = Arc::clone(&renderer);
                tokio::spawn(async move {
                    let outcome = renderer.handle_scan(&event.payload.text).await;
                    debug!("Scan of {:?} finished: {outcome:?}", event.payload.text);
                });
            }

            Some(trigger) = triggers.recv() => match trigger {
                Trigger::SwitchCamera => match session.switch_to_next_device().await {
                    Ok(SwitchOutcome::Switched { device, .. }) => {
                        display.show_notice(&format!("Switched to {device}"));
                    }
                    Ok(SwitchOutcome::NotEnoughDevices { known }) => {
                        warn!("Not enough cameras to switch ({known} found)");
                        display.show_notice("Not enough cameras to switch.");
                    }
                    Err(e) => {
                        error!("{e}");
                        display.show_notice("Could not open that camera; enter n to try the next one.");
                    }
                },
                Trigger::RefreshRecipe => {
                    let renderer = Arc::clone(&renderer);
                    tokio::spawn(async move {
                        renderer.refresh().await;
                    });
                }
                Trigger::Quit => {
                    info!("Quit requested");
                    break;
                }
            },

            result = &mut ctrl_c => {
                match result {
                    Ok(()) => info!("received Ctrl+C; shutting down"),
                    Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
                }
                break;
            }

            else => break,
        }
    }

    session.stop().await;
    info!("Recipe Scanner stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_core::DecodedPayload;
    use recipe_scanner::infrastructure::storage::config::DEFAULT_ENDPOINT;

    #[test]
    fn test_cli_without_flags_keeps_file_values() {
        // Arrange
        let cli = Cli::parse_from(["recipe-scanner"]);
        let mut config = AppConfig::default();
        config.endpoint.url = "http://file-endpoint/generate-recipe".to_string();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.endpoint.url, "http://file-endpoint/generate-recipe");
        assert!(!config.scanner.dedupe_repeated_scans);
        assert!(cli.demo_subjects.is_empty());
        assert!(!cli.init_config);
    }

    #[test]
    fn test_cli_flags_override_file_values() {
        // Arrange
        let cli = Cli::parse_from([
            "recipe-scanner",
            "--endpoint",
            "http://localhost:3000/generate-recipe",
            "--timeout-secs",
            "20",
            "--log-level",
            "debug",
            "--device",
            "/dev/video2",
            "--dedupe",
        ]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.endpoint.url, "http://localhost:3000/generate-recipe");
        assert_eq!(config.endpoint.timeout(), Some(Duration::from_secs(20)));
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.camera.preferred_device.as_deref(), Some("/dev/video2"));
        assert!(config.scanner.dedupe_repeated_scans);
    }

    #[test]
    fn test_default_endpoint_survives_partial_overrides() {
        let cli = Cli::parse_from(["recipe-scanner", "--timeout-secs", "5"]);
        let mut config = AppConfig::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.endpoint.url, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_demo_flag_without_value_uses_default_subject() {
        let cli = Cli::parse_from(["recipe-scanner", "--demo"]);
        assert_eq!(cli.demo_subjects, vec![DEFAULT_DEMO_SUBJECT]);
    }

    #[test]
    fn test_demo_flag_is_repeatable() {
        let cli = Cli::parse_from(["recipe-scanner", "--demo", "Omelette", "--demo", "Pancakes"]);
        assert_eq!(cli.demo_subjects, vec!["Omelette", "Pancakes"]);
    }

    #[tokio::test]
    async fn test_demo_mode_uses_two_mock_cameras_and_text_decoder() {
        // Arrange
        let cli = Cli::parse_from(["recipe-scanner", "--demo", "Omelette"]);

        // Act
        let (media, decoder) = build_camera(&cli, &CameraConfig::default());
        let devices = media.enumerate_devices().await.expect("enumerate");
        let decoded = decoder.decode(&text_frame("Omelette")).expect("decode");

        // Assert
        assert_eq!(devices.len(), 2);
        assert_eq!(decoded, Some(DecodedPayload::new("Omelette")));
    }

    #[test]
    fn test_explicit_config_path_is_used() {
        let cli = Cli::parse_from(["recipe-scanner", "--config", "/tmp/scanner.toml"]);
        assert_eq!(
            cli.config_path().expect("path"),
            PathBuf::from("/tmp/scanner.toml")
        );
    }
}
