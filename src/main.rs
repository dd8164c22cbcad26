//! GPIO Camera CLI
//!
//! Runs the button-triggered capture service until Ctrl-C. With
//! `--simulate`, the button and camera are mocked and each line read from
//! stdin counts as a button press (`c` requests a manual capture instead).

use clap::Parser;
use gpio_camera::{
    capture::{Camera, MockCamera},
    config::FileConfig,
    error::{AppError, Disposition, ErrorPolicy},
    gpio::{MockGpioHandle, MockPeripheralManager, PeripheralManager},
    lifecycle::{Controller, DevicePermission, PermissionChecker, StaticPermission, Startup},
    metrics::{MetricsRegistry, MetricsSnapshot},
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "gpio-camera", version, about = "Take a picture when a button is pressed")]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use a mocked button and camera driven from stdin.
    #[arg(long)]
    simulate: bool,
}

enum Signal {
    Stop,
    Press,
    Capture,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("GPIO Camera v{}", gpio_camera::VERSION);

    let config = match &args.config {
        Some(path) => FileConfig::from_file(path).unwrap_or_else(|e| {
            error!(path = %path.display(), "Configuration not loaded");
            abort(e.into())
        }),
        None => FileConfig::default(),
    };

    let (mut controller, button) = build_controller(&args, &config).unwrap_or_else(|e| abort(e));

    let (signal_tx, signal_rx) = mpsc::channel();
    let ctrlc_tx = signal_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Signal::Stop);
    }) {
        error!("Failed to install Ctrl-C handler: {}", e);
        std::process::exit(1);
    }

    match controller.on_create() {
        Ok(Startup::Started) => info!("Waiting for button presses, Ctrl-C to stop"),
        Ok(startup) => {
            warn!(?startup, "Capture service not started");
            std::process::exit(2);
        }
        Err(e) => abort(e.into()),
    }

    if args.simulate {
        spawn_stdin_reader(signal_tx);
    }

    let registry = match MetricsRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to create metrics registry: {}", e);
            std::process::exit(1);
        }
    };
    let exporter = start_exporter(&config, registry);
    exporter.update(&MetricsSnapshot::from_controller(&controller));

    let policy = ErrorPolicy::default();
    loop {
        match signal_rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Signal::Press) => match &button {
                Some(button) => {
                    button.fire_edge();
                }
                None => warn!("No simulated button"),
            },
            Ok(Signal::Capture) => {
                if let Err(e) = controller.request_capture() {
                    if policy.handle(&e.into()) == Disposition::Halt {
                        break;
                    }
                }
            }
            Ok(Signal::Stop) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
        exporter.update(&MetricsSnapshot::from_controller(&controller));
    }

    info!("Stopping");
    controller.on_destroy();
    if let Err(e) = controller.join_worker() {
        policy.handle(&e.into());
    }

    let snapshot = MetricsSnapshot::from_controller(&controller);
    info!(
        "Done. {} presses, {} captures, {} errors",
        snapshot.button_edges, snapshot.frames_delivered, snapshot.errors
    );
}

/// Startup has nothing to fall back on, so every failure is fatal.
fn abort(error: AppError) -> ! {
    ErrorPolicy::strict().handle(&error);
    std::process::exit(1);
}

fn build_controller(
    args: &Args,
    config: &FileConfig,
) -> Result<(Controller, Option<MockGpioHandle>), AppError> {
    let (permissions, peripherals, camera, button): (
        Box<dyn PermissionChecker>,
        Box<dyn PeripheralManager>,
        Box<dyn Camera>,
        Option<MockGpioHandle>,
    ) = if args.simulate {
        let peripherals = MockPeripheralManager::new();
        let handle = peripherals.handle();
        (
            Box::new(StaticPermission::granted()),
            Box::new(peripherals),
            Box::new(MockCamera::new(config.capture.clone())),
            Some(handle),
        )
    } else {
        (
            Box::new(DevicePermission::new(config.capture.device_path())),
            hardware_peripherals(config)?,
            hardware_camera(config)?,
            None,
        )
    };

    let mut controller = Controller::new(permissions, peripherals, camera)
        .with_max_frames(config.capture.max_frames);
    if let Some(pin) = &config.button.pin {
        controller = controller.with_button_pin(pin.clone());
    } else if args.simulate {
        controller = controller.with_button_pin("BCM21");
    }
    Ok((controller, button))
}

#[cfg(feature = "gpio")]
fn hardware_peripherals(config: &FileConfig) -> Result<Box<dyn PeripheralManager>, AppError> {
    Ok(Box::new(gpio_camera::gpio::RppalPeripheralManager::new(
        config.button.pull_up,
    )))
}

#[cfg(not(feature = "gpio"))]
fn hardware_peripherals(_config: &FileConfig) -> Result<Box<dyn PeripheralManager>, AppError> {
    Err(gpio_camera::gpio::GpioError::Unsupported(
        "built without the `gpio` feature; rebuild with it or use --simulate",
    )
    .into())
}

#[cfg(feature = "camera")]
fn hardware_camera(config: &FileConfig) -> Result<Box<dyn Camera>, AppError> {
    Ok(Box::new(gpio_camera::capture::NokhwaCamera::new(
        config.capture.clone(),
    )))
}

#[cfg(not(feature = "camera"))]
fn hardware_camera(_config: &FileConfig) -> Result<Box<dyn Camera>, AppError> {
    Err(gpio_camera::capture::CameraError::OpenFailed(
        "built without the `camera` feature; rebuild with it or use --simulate".into(),
    )
    .into())
}

fn spawn_stdin_reader(signals: mpsc::Sender<Signal>) {
    let spawned = std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let signal = if line.trim() == "c" {
                    Signal::Capture
                } else {
                    Signal::Press
                };
                if signals.send(signal).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start stdin reader: {}", e);
    }
}

/// Where metrics snapshots go: the HTTP exporter when built with `metrics`,
/// otherwise just the local registry.
enum Exporter {
    Local(MetricsRegistry),
    #[cfg(feature = "metrics")]
    Served(std::sync::Arc<tokio::sync::RwLock<gpio_camera::metrics::MetricsState>>),
}

impl Exporter {
    fn update(&self, snapshot: &MetricsSnapshot) {
        match self {
            Exporter::Local(registry) => registry.update(snapshot),
            #[cfg(feature = "metrics")]
            Exporter::Served(state) => state.blocking_read().update(snapshot),
        }
    }
}

#[cfg(feature = "metrics")]
fn start_exporter(config: &FileConfig, registry: MetricsRegistry) -> Exporter {
    use gpio_camera::metrics::{MetricsServer, MetricsServerConfig};

    if config.metrics.port == 0 {
        return Exporter::Local(registry);
    }
    let server = MetricsServer::new(MetricsServerConfig::with_port(config.metrics.port), registry);
    let state = server.state();
    let spawned = std::thread::Builder::new()
        .name("metrics".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to start metrics runtime: {}", e);
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server.run()) {
                warn!("Metrics server stopped: {}", e);
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to start metrics thread: {}", e);
    }
    Exporter::Served(state)
}

#[cfg(not(feature = "metrics"))]
fn start_exporter(_config: &FileConfig, registry: MetricsRegistry) -> Exporter {
    Exporter::Local(registry)
}
