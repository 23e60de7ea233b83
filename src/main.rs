//! # Ambient Clock Application Entry Point
//!
//! Loads the configuration, opens the diagnostic log, builds the layer set
//! and runs the frame loop until SIGTERM, SIGINT or a window close.
//!
//! ## Modes
//! - default: run the frame loop (desktop window with `--features simulator`,
//!   ASCII art in the terminal once a minute otherwise)
//! - `--stdout`: render one frame and print it as ASCII art; add
//!   `--at 2022-06-15T12:30` to preview a chosen time
//! - `--write-config`: write the effective configuration and exit
//! - `--config <path>`: read a configuration file other than
//!   `clock-config.toml`

use ambient_clock_lib::assets::{FreetypeRasterizer, RasterImageLoader};
use ambient_clock_lib::backend::SoftwareRenderer;
use ambient_clock_lib::clock::{FixedClock, HostClock, LocalClock, TimeSource};
use ambient_clock_lib::config::{Config, DEFAULT_CONFIG_PATH};
use ambient_clock_lib::diagnostics::{install_panic_hook, Diagnostics, FileSink};
use ambient_clock_lib::renderer::draw_ascii;
use ambient_clock_lib::{signals, Compositor};
use anyhow::Context;
use chrono::NaiveDateTime;
use embedded_graphics::prelude::Size;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

/// Value following `flag` on the command line, if any.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn build_compositor(
    config: &Config,
    diagnostics: &Diagnostics,
) -> anyhow::Result<Compositor<SoftwareRenderer>> {
    let size = Size::new(config.display.width, config.display.height);
    Compositor::new(
        SoftwareRenderer::new(size),
        config.assets.clone(),
        Rc::new(RasterImageLoader),
        Rc::new(FreetypeRasterizer),
        diagnostics.clone(),
    )
    .map_err(|e| {
        diagnostics.error(format!("Failed to build ui components: {e}"));
        e
    })
    .context("failed to build ui components")
}

/// Render a single frame and print it.
fn preview<C: HostClock>(compositor: &mut Compositor<SoftwareRenderer>, time: &TimeSource<C>) {
    compositor.draw(time.reading());
    draw_ascii(compositor.backend().front_buffer(), time.reading());
}

/// Frame loop presenting into a desktop window.
#[cfg(feature = "simulator")]
fn run(
    compositor: &mut Compositor<SoftwareRenderer>,
    time: &mut TimeSource<LocalClock>,
    config: &Config,
) -> anyhow::Result<()> {
    use ambient_clock_lib::renderer::present_to;
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics_simulator::{
        OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    };
    use std::time::{Duration, Instant};

    let size = Size::new(config.display.width, config.display.height);
    let frame_duration = Duration::from_millis(config.display.frame_interval_ms);
    let mut display = SimulatorDisplay::<Rgb888>::new(size);
    let output_settings = OutputSettingsBuilder::new()
        .scale(config.display.scale.max(1))
        .build();
    let mut window = Window::new(&config.display.title, &output_settings);

    while !signals::stop_requested() {
        let frame_start = Instant::now();

        time.refresh();
        compositor.draw(time.reading());
        present_to(compositor.backend().front_buffer(), &mut display)?;

        // The SDL window is created by the first update, before any events
        window.update(&display);
        for event in window.events() {
            if let SimulatorEvent::Quit = event {
                signals::request_stop();
            }
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
    Ok(())
}

/// Frame loop without a window: each new minute is printed as ASCII art.
#[cfg(not(feature = "simulator"))]
fn run(
    compositor: &mut Compositor<SoftwareRenderer>,
    time: &mut TimeSource<LocalClock>,
    config: &Config,
) -> anyhow::Result<()> {
    use ambient_clock_lib::renderer::TerminalOutput;

    eprintln!("Window support not enabled. Rebuild with --features simulator for a desktop window.");
    eprintln!("Showing ASCII output instead:");

    let frame_duration = std::time::Duration::from_millis(config.display.frame_interval_ms);
    let mut output = TerminalOutput::new();

    while !signals::stop_requested() {
        time.refresh();
        compositor.draw(time.reading());
        output.present(compositor.backend().front_buffer(), time.reading());
        std::thread::sleep(frame_duration);
    }
    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    // Development mode: render to stdout for testing without a display
    let development_mode = args.iter().any(|arg| arg == "--stdout");
    let config_path =
        PathBuf::from(flag_value(&args, "--config").unwrap_or(DEFAULT_CONFIG_PATH));
    let config = Config::load_from_path(&config_path);

    if args.iter().any(|arg| arg == "--write-config") {
        return config.save_to_path(&config_path);
    }

    if development_mode {
        let diagnostics = Diagnostics::console();
        let mut compositor = build_compositor(&config, &diagnostics)?;

        match flag_value(&args, "--at") {
            Some(at) => {
                let instant = NaiveDateTime::parse_from_str(at, "%Y-%m-%dT%H:%M")
                    .with_context(|| format!("invalid --at value {at:?}, expected YYYY-MM-DDTHH:MM"))?;
                preview(&mut compositor, &TimeSource::new(FixedClock::at(instant)));
            }
            None => preview(&mut compositor, &TimeSource::new(LocalClock)),
        }
        return Ok(());
    }

    let sink = FileSink::open(
        &config.logging.log_file,
        &config.logging.backtrace_file,
        config.logging.print_cli,
    );
    let diagnostics = Diagnostics::new(Arc::new(sink));
    install_panic_hook(diagnostics.clone());
    diagnostics.info(format!(
        "Starting ambient clock ({}x{})",
        config.display.width, config.display.height
    ));

    signals::install().context("failed to install signal handlers")?;

    let mut compositor = build_compositor(&config, &diagnostics)?;
    let mut time = TimeSource::new(LocalClock);
    run(&mut compositor, &mut time, &config)?;

    diagnostics.info("Stop requested, shutting down");
    drop(compositor);
    diagnostics.info("Ambient clock stopped");
    Ok(())
}
