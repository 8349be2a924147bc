//! # Sky Clock Application Entry Point
//!
//! This binary crate hosts the face engine for development: it wires the
//! controller to a tokio-backed timer host and renders every requested
//! frame to the terminal. It supports a one-shot development mode
//! (`--stdout`) and a live mode that ticks once per second until Ctrl-C.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Result;
use env_logger::Env;
use log::{debug, info};
use std::env;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sky_clock_lib::clock::{system_utc_offset, SystemTimeSource};
use sky_clock_lib::config::Config;
use sky_clock_lib::controller::DisplayModeController;
use sky_clock_lib::layout::LayoutEngine;
use sky_clock_lib::render::TermSurface;
use sky_clock_lib::scheduler::{FaceHost, TimerError, TimerToken};
use sky_clock_lib::weather::{BuiltinIcons, WeatherKind, WeatherSnapshot};
use sky_clock_lib::DisplayGeometry;

/// Everything the single-threaded event loop reacts to.
enum FaceEvent {
    /// The engine asked for a repaint
    Redraw,
    /// An armed one-shot timer expired
    TimerFired(TimerToken),
}

/// Production [`FaceHost`]: redraw requests and timer fires become events on
/// the loop's channel; the one-shot timer is a spawned sleep task.
///
/// Cancellation aborts the sleep task, so a canceled timer can never send.
/// The one unavoidable race (a fire already sitting in the channel when the
/// cancel lands) is handled by the scheduler's token check, which drops
/// fires for anything but the currently armed token.
struct TokioFaceHost {
    events: mpsc::UnboundedSender<FaceEvent>,
    pending: Option<(TimerToken, JoinHandle<()>)>,
}

impl TokioFaceHost {
    fn new(events: mpsc::UnboundedSender<FaceEvent>) -> Self {
        Self {
            events,
            pending: None,
        }
    }
}

impl FaceHost for TokioFaceHost {
    fn request_redraw(&mut self) {
        // Receiver gone means the loop is shutting down; nothing to repaint
        let _ = self.events.send(FaceEvent::Redraw);
    }

    fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> Result<(), TimerError> {
        // arena-of-one: replace any previous task instead of leaking it
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(FaceEvent::TimerFired(token));
        });
        self.pending = Some((token, handle));
        Ok(())
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some((pending_token, handle)) = self.pending.take() {
            if pending_token == token {
                handle.abort();
            } else {
                self.pending = Some((pending_token, handle));
            }
        }
    }
}

/// Host for one-shot rendering: no event loop, so effects go nowhere.
struct NullHost;

impl FaceHost for NullHost {
    fn request_redraw(&mut self) {}

    fn schedule_once(&mut self, _delay: Duration, _token: TimerToken) -> Result<(), TimerError> {
        Ok(())
    }

    fn cancel(&mut self, _token: TimerToken) {}
}

/// Placeholder weather until a real resolver is wired up.
fn demo_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        condition: WeatherKind::Clear,
        high_temp: 75,
        low_temp: 60,
    }
}

fn build_controller(config: &Config) -> Result<DisplayModeController<SystemTimeSource>> {
    let geometry = DisplayGeometry::new(
        config.display.width,
        config.display.height,
        config.display.shape,
    )?;
    Ok(DisplayModeController::new(
        geometry,
        LayoutEngine::from_config(config),
        SystemTimeSource,
        system_utc_offset(),
    ))
}

/// Render the current frame to a fresh terminal grid and print it.
fn present(controller: &DisplayModeController<SystemTimeSource>, icons: &BuiltinIcons) -> Result<()> {
    let mut surface = TermSurface::new(controller.geometry());
    controller.render_into(&mut surface, icons)?;
    println!("{}", surface);
    Ok(())
}

/// Development mode: one interactive frame, one ambient frame, exit.
fn render_once(config: &Config) -> Result<()> {
    let icons = BuiltinIcons::new();
    let mut host = NullHost;
    let mut controller = build_controller(config)?;
    controller.set_weather(demo_weather(), &mut host)?;
    controller.set_visible(true, &mut host)?;

    println!("interactive:");
    present(&controller, &icons)?;

    controller.set_ambient(true, &mut host)?;
    println!("ambient:");
    present(&controller, &icons)?;

    controller.teardown(&mut host);
    Ok(())
}

/// Live mode: the engine drives itself via the timer host until Ctrl-C.
async fn run_live(config: &Config) -> Result<()> {
    let icons = BuiltinIcons::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut host = TokioFaceHost::new(tx);
    let mut controller = build_controller(config)?;

    controller.set_weather(demo_weather(), &mut host)?;
    controller.set_visible(true, &mut host)?;
    info!("face visible, ticking once per second; Ctrl-C to exit");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = rx.recv() => match event {
                Some(FaceEvent::Redraw) => present(&controller, &icons)?,
                Some(FaceEvent::TimerFired(token)) => {
                    debug!("timer fired: token {}", token);
                    controller.on_timer_fired(token, &mut host)?;
                }
                None => break,
            }
        }
    }

    // Cancel pending work before the engine goes away
    controller.teardown(&mut host);
    Ok(())
}

/// Main application entry point.
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Development mode: render two frames to stdout and exit
    let development_mode = env::args().any(|arg| arg == "--stdout");

    let config = Config::load();

    if development_mode {
        return render_once(&config);
    }

    // All state mutation and rendering happens on this one thread; the only
    // async primitive is the host's one-shot sleep task
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run_live(&config))
}
