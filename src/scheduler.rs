//! # Mode-Aware Redraw Scheduling
//!
//! A small state machine that decides whether the once-per-second redraw
//! timer should exist, and when exactly it should fire. Two states:
//!
//! - **Stopped**: no pending timer, no redraws originate here. Ambient mode
//!   lives in this state; its once-per-minute refresh comes from an external
//!   time tick, not from this machine.
//! - **Running**: exactly one deferred task is outstanding at any moment,
//!   armed to fire on the next whole wall-clock second.
//!
//! Delays are recomputed from a fresh clock reading on every (re)arm, so the
//! tick never drifts even when a redraw takes nonzero time: the next frame
//! lands on the next second *boundary*, not one second after the last frame.
//!
//! The single correctness property every caller depends on: driving
//! [`RedrawScheduler::update`] is idempotent. Re-asserting the current state
//! never double-arms a timer, and at most one timer token is live at a time
//! (the arena-of-one: replace, never leak).

use std::time::Duration;
use thiserror::Error;

/// Identifier for one armed deferred task.
///
/// Tokens are never reused; a stale fire can always be told apart from the
/// currently armed one.
pub type TimerToken = u64;

/// Errors surfaced by the host's timer sink.
///
/// The scheduler has no recovery path for a sink that cannot arm: it reports
/// the failure and remains Stopped.
#[derive(Error, Debug)]
pub enum TimerError {
    /// The deferred-task sink refused or failed to arm
    #[error("failed to arm redraw timer: {0}")]
    ArmFailed(String),
}

/// The ports the face drives: a redraw sink and a cancelable one-shot timer.
///
/// Cancellation is strict: after `cancel(token)` returns, the host must
/// guarantee that no fire for `token` will be delivered. Hosts backed by a
/// task queue abort the task rather than letting a dead fire race the next
/// state change.
pub trait FaceHost {
    /// Ask the embedder to schedule a repaint of the face.
    fn request_redraw(&mut self);

    /// Arm a one-shot deferred task that calls back with `token` after `delay`.
    fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> Result<(), TimerError>;

    /// Strictly cancel a previously armed task.
    fn cancel(&mut self, token: TimerToken);
}

/// Delay from a position inside the current second to the next boundary.
///
/// Exactly at a boundary the full second is returned (1000 ms), matching the
/// `1000 - (now % 1000)` convention: the frame for the *current* second was
/// just drawn, the timer targets the next one.
pub fn next_second_delay(subsec_millis: u32) -> Duration {
    Duration::from_millis(1000 - (subsec_millis as u64 % 1000))
}

/// The two-state redraw timer machine.
///
/// Owns nothing but its own state; all effects go through the [`FaceHost`]
/// passed into each call, which keeps the machine synchronous and testable.
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    running: bool,
    pending: Option<TimerToken>,
    next_token: TimerToken,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the machine is in the Running state.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The currently armed token, if any. Mostly for assertions.
    pub fn pending_token(&self) -> Option<TimerToken> {
        self.pending
    }

    /// Drive the machine toward `should_run`.
    ///
    /// Entering Running requests an immediate redraw and arms the boundary
    /// timer. Entering Stopped cancels the pending timer. Re-asserting the
    /// current state does nothing at all.
    ///
    /// `subsec_millis` is the caller's fresh read of the wall clock's
    /// position inside the current second.
    pub fn update<H: FaceHost + ?Sized>(
        &mut self,
        should_run: bool,
        subsec_millis: u32,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if should_run == self.running {
            return Ok(());
        }

        if should_run {
            self.running = true;
            host.request_redraw();
            if let Err(e) = self.arm(subsec_millis, host) {
                // No recovery: fall back to Stopped and report
                self.running = false;
                return Err(e);
            }
        } else {
            self.running = false;
            if let Some(token) = self.pending.take() {
                host.cancel(token);
            }
        }
        Ok(())
    }

    /// Deliver a timer fire.
    ///
    /// Fires carry their token; anything but the currently armed token is
    /// dropped, so a host that fails strict cancellation still cannot
    /// resurrect a stopped machine. A live fire requests a redraw and
    /// re-arms against a fresh clock reading.
    pub fn on_timer_fired<H: FaceHost + ?Sized>(
        &mut self,
        token: TimerToken,
        subsec_millis: u32,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if !self.running || self.pending != Some(token) {
            return Ok(());
        }
        self.pending = None;
        host.request_redraw();
        if let Err(e) = self.arm(subsec_millis, host) {
            self.running = false;
            return Err(e);
        }
        Ok(())
    }

    /// Replace any pending task with one armed for the next boundary.
    fn arm<H: FaceHost + ?Sized>(
        &mut self,
        subsec_millis: u32,
        host: &mut H,
    ) -> Result<(), TimerError> {
        // cancel-before-rearm, never assume exclusivity
        if let Some(old) = self.pending.take() {
            host.cancel(old);
        }
        let token = self.next_token;
        self.next_token += 1;
        host.schedule_once(next_second_delay(subsec_millis), token)?;
        self.pending = Some(token);
        Ok(())
    }
}
