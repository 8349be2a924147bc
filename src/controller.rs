//! # Display Mode Control
//!
//! The long-lived engine object behind one face instance. It owns the
//! mutable pieces (visibility, ambient/low-bit flags, the current weather
//! snapshot, geometry, the UTC offset) plus the redraw scheduler, and it is
//! the only writer of any of them.
//!
//! Every platform callback funnels into a mutator here. A mutator that
//! actually changes a value does exactly three things: store the value,
//! request a redraw through the host, re-evaluate the scheduler. A mutator
//! handed the current value is a complete no-op, which is what keeps
//! repeated platform callbacks (the ambient broadcast loves to repeat
//! itself) from restarting the timer or flooding the redraw sink.
//!
//! Teardown is explicit: the embedder calls [`DisplayModeController::teardown`]
//! before dropping the engine, which cancels all pending deferred work. No
//! callback can reach a torn-down instance because nothing remains armed.

use crate::clock::{ClockReading, TimeSource};
use crate::layout::{LayoutEngine, RenderPlan, TextMetrics};
use crate::render::{execute_plan, Surface};
use crate::scheduler::{FaceHost, RedrawScheduler, TimerError, TimerToken};
use crate::weather::{IconLookup, WeatherSnapshot};
use crate::{DisplayGeometry, DisplayMode};
use chrono::FixedOffset;
use log::debug;

/// Owns face state and decides when redraws happen.
///
/// Generic over the [`TimeSource`] so tests can pin the clock. All effects
/// flow through the [`FaceHost`] passed into each call; the controller never
/// holds a reference to the embedder.
pub struct DisplayModeController<T: TimeSource> {
    time_source: T,
    utc_offset: FixedOffset,
    geometry: DisplayGeometry,
    layout: LayoutEngine,
    mode: DisplayMode,
    visible: bool,
    weather: WeatherSnapshot,
    scheduler: RedrawScheduler,
}

impl<T: TimeSource> DisplayModeController<T> {
    /// A new controller: not visible, interactive mode, default weather.
    pub fn new(
        geometry: DisplayGeometry,
        layout: LayoutEngine,
        time_source: T,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            time_source,
            utc_offset,
            geometry,
            layout,
            mode: DisplayMode::default(),
            visible: false,
            weather: WeatherSnapshot::default(),
            scheduler: RedrawScheduler::new(),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn weather(&self) -> WeatherSnapshot {
        self.weather
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    /// Whether the per-second timer machine is currently running.
    pub fn scheduler_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// The timer should run exactly while the face is on screen at full power.
    fn should_run(&self) -> bool {
        self.visible && self.mode.is_interactive()
    }

    fn subsec_millis(&self) -> u32 {
        self.time_source.now_utc().timestamp_subsec_millis()
    }

    fn sync_scheduler<H: FaceHost + ?Sized>(&mut self, host: &mut H) -> Result<(), TimerError> {
        self.scheduler
            .update(self.should_run(), self.subsec_millis(), host)
    }

    /// Visibility change from the platform.
    pub fn set_visible<H: FaceHost + ?Sized>(
        &mut self,
        visible: bool,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if visible == self.visible {
            return Ok(());
        }
        debug!("visibility -> {}", visible);
        self.visible = visible;
        host.request_redraw();
        self.sync_scheduler(host)
    }

    /// Ambient-mode change from the platform.
    pub fn set_ambient<H: FaceHost + ?Sized>(
        &mut self,
        ambient: bool,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if ambient == self.mode.ambient {
            return Ok(());
        }
        debug!("ambient -> {}", ambient);
        self.mode.ambient = ambient;
        host.request_redraw();
        self.sync_scheduler(host)
    }

    /// Low-bit capability flag, delivered with the panel properties.
    pub fn set_low_bit_ambient<H: FaceHost + ?Sized>(
        &mut self,
        low_bit: bool,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if low_bit == self.mode.low_bit_ambient {
            return Ok(());
        }
        self.mode.low_bit_ambient = low_bit;
        host.request_redraw();
        self.sync_scheduler(host)
    }

    /// Fresh weather snapshot from the external resolver.
    pub fn set_weather<H: FaceHost + ?Sized>(
        &mut self,
        weather: WeatherSnapshot,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if weather == self.weather {
            return Ok(());
        }
        debug!(
            "weather -> {} {}\u{00B0}/{}\u{00B0}",
            weather.condition, weather.high_temp, weather.low_temp
        );
        self.weather = weather;
        host.request_redraw();
        self.sync_scheduler(host)
    }

    /// New geometry from the inset/shape provider.
    pub fn set_geometry<H: FaceHost + ?Sized>(
        &mut self,
        geometry: DisplayGeometry,
        host: &mut H,
    ) -> Result<(), TimerError> {
        if geometry == self.geometry {
            return Ok(());
        }
        self.geometry = geometry;
        host.request_redraw();
        self.sync_scheduler(host)
    }

    /// Timezone-change notification.
    ///
    /// The subscription itself is the embedder's job (subscribe while
    /// visible, unsubscribe otherwise); the face just adopts the new offset
    /// and repaints so the next frame shows the new local time.
    pub fn on_timezone_changed<H: FaceHost + ?Sized>(
        &mut self,
        utc_offset: FixedOffset,
        host: &mut H,
    ) {
        self.utc_offset = utc_offset;
        host.request_redraw();
    }

    /// External once-per-minute tick while ambient.
    ///
    /// Repaint only; the per-second machine is intentionally not consulted.
    pub fn on_time_tick<H: FaceHost + ?Sized>(&self, host: &mut H) {
        host.request_redraw();
    }

    /// Timer fire delivered by the host.
    pub fn on_timer_fired<H: FaceHost + ?Sized>(
        &mut self,
        token: TimerToken,
        host: &mut H,
    ) -> Result<(), TimerError> {
        let subsec = self.subsec_millis();
        self.scheduler.on_timer_fired(token, subsec, host)
    }

    /// Cancel all pending deferred work before the engine is dropped.
    ///
    /// After this returns no timer fire or redraw request will originate
    /// from this instance.
    pub fn teardown<H: FaceHost + ?Sized>(&mut self, host: &mut H) {
        // Stopping never arms, so the error path is unreachable
        let _ = self.scheduler.update(false, 0, host);
        debug!("engine torn down");
    }

    /// Lay out one frame against a fresh clock reading.
    ///
    /// The reading is derived here, on every call, never cached, so the
    /// frame always shows the wall clock at render time.
    pub fn compute_plan<M, I>(&self, metrics: &M, icons: &I) -> RenderPlan
    where
        M: TextMetrics + ?Sized,
        I: IconLookup + ?Sized,
    {
        let reading = ClockReading::derive(self.time_source.now_utc(), self.utc_offset);
        self.layout.compute(
            self.geometry,
            self.mode,
            &reading,
            &self.weather,
            metrics,
            icons,
        )
    }

    /// Compute a frame and replay it onto `surface`.
    pub fn render_into<S, I>(&self, surface: &mut S, icons: &I) -> Result<(), S::Error>
    where
        S: Surface + ?Sized,
        I: IconLookup + ?Sized,
    {
        let plan = self.compute_plan(surface, icons);
        execute_plan(&plan, surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DrawOp, FontRole};
    use crate::scheduler::TimerError;
    use crate::weather::{IconInfo, IconLookup, WeatherKind};
    use crate::ScreenShape;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingHost {
        redraws: usize,
        armed: Vec<(TimerToken, Duration)>,
        live: Vec<TimerToken>,
    }

    impl FaceHost for RecordingHost {
        fn request_redraw(&mut self) {
            self.redraws += 1;
        }

        fn schedule_once(&mut self, delay: Duration, token: TimerToken) -> Result<(), TimerError> {
            self.armed.push((token, delay));
            self.live.push(token);
            Ok(())
        }

        fn cancel(&mut self, token: TimerToken) {
            self.live.retain(|&t| t != token);
        }
    }

    struct StepTime(RefCell<DateTime<Utc>>);

    impl StepTime {
        fn at(h: u32, m: u32, s: u32) -> Self {
            Self(RefCell::new(
                Utc.with_ymd_and_hms(2026, 8, 7, h, m, s).unwrap(),
            ))
        }

        fn advance(&self, seconds: i64) {
            let mut t = self.0.borrow_mut();
            *t = *t + chrono::Duration::seconds(seconds);
        }
    }

    impl TimeSource for &StepTime {
        fn now_utc(&self) -> DateTime<Utc> {
            *self.0.borrow()
        }
    }

    struct AllIcons;

    impl IconLookup for AllIcons {
        fn lookup(&self, _: WeatherKind) -> Option<IconInfo> {
            Some(IconInfo {
                width: 24.0,
                height: 24.0,
            })
        }
    }

    struct UnitMetrics;

    impl TextMetrics for UnitMetrics {
        fn text_width(&self, text: &str, _style: &crate::layout::TextStyle) -> f32 {
            text.chars().count() as f32 * 10.0
        }

        fn text_bounds(&self, text: &str, style: &crate::layout::TextStyle) -> crate::layout::TextBounds {
            crate::layout::TextBounds {
                width: self.text_width(text, style),
                height: 12.0,
            }
        }
    }

    fn controller(time: &StepTime) -> DisplayModeController<&StepTime> {
        DisplayModeController::new(
            DisplayGeometry::new(320, 320, ScreenShape::Round).unwrap(),
            LayoutEngine::default(),
            time,
            FixedOffset::east_opt(0).unwrap(),
        )
    }

    #[test]
    fn timer_runs_iff_visible_and_interactive() {
        let time = StepTime::at(10, 0, 0);
        let cases = [
            (false, false, false),
            (false, true, false),
            (true, false, true),
            (true, true, false),
        ];
        for (visible, ambient, expect_running) in cases {
            let mut host = RecordingHost::default();
            let mut ctrl = controller(&time);
            ctrl.set_visible(visible, &mut host).unwrap();
            ctrl.set_ambient(ambient, &mut host).unwrap();
            assert_eq!(
                ctrl.scheduler_running(),
                expect_running,
                "visible={} ambient={}",
                visible,
                ambient
            );
            assert_eq!(host.live.len(), usize::from(expect_running));
        }
    }

    #[test]
    fn redundant_mutator_calls_are_no_ops() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);

        ctrl.set_visible(true, &mut host).unwrap();
        let redraws = host.redraws;
        let armed = host.armed.len();

        // Same values again: nothing may happen
        ctrl.set_visible(true, &mut host).unwrap();
        ctrl.set_ambient(false, &mut host).unwrap();
        ctrl.set_low_bit_ambient(false, &mut host).unwrap();
        ctrl.set_weather(WeatherSnapshot::default(), &mut host).unwrap();

        assert_eq!(host.redraws, redraws);
        assert_eq!(host.armed.len(), armed);
        assert_eq!(host.live.len(), 1);
    }

    #[test]
    fn ambient_entry_cancels_the_timer_and_exit_restarts_it() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);

        ctrl.set_visible(true, &mut host).unwrap();
        assert_eq!(host.live.len(), 1);

        ctrl.set_ambient(true, &mut host).unwrap();
        assert!(host.live.is_empty());
        assert!(!ctrl.scheduler_running());

        ctrl.set_ambient(false, &mut host).unwrap();
        assert_eq!(host.live.len(), 1);
        assert!(ctrl.scheduler_running());
    }

    #[test]
    fn weather_update_redraws_without_touching_the_timer() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);
        ctrl.set_visible(true, &mut host).unwrap();
        let token = host.live[0];
        let redraws = host.redraws;

        ctrl.set_weather(
            WeatherSnapshot {
                condition: WeatherKind::Snow,
                high_temp: 30,
                low_temp: 20,
            },
            &mut host,
        )
        .unwrap();

        assert_eq!(host.redraws, redraws + 1);
        assert_eq!(host.live, vec![token], "weather must not re-arm the timer");
        assert_eq!(ctrl.weather().condition, WeatherKind::Snow);
    }

    #[test]
    fn timezone_change_redraws_and_shifts_the_clock() {
        let time = StepTime::at(23, 30, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);

        let plan = ctrl.compute_plan(&UnitMetrics, &AllIcons);
        assert_eq!(plan.texts_with_role(FontRole::HoursMinutes), vec!["11:30"]);

        ctrl.on_timezone_changed(FixedOffset::east_opt(3600).unwrap(), &mut host);
        assert_eq!(host.redraws, 1);

        let plan = ctrl.compute_plan(&UnitMetrics, &AllIcons);
        assert_eq!(plan.texts_with_role(FontRole::HoursMinutes), vec!["12:30"]);
    }

    #[test]
    fn time_tick_redraws_without_arming() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let ctrl = controller(&time);

        ctrl.on_time_tick(&mut host);

        assert_eq!(host.redraws, 1);
        assert!(host.live.is_empty());
    }

    #[test]
    fn timer_fire_rearms_through_the_controller() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);
        ctrl.set_visible(true, &mut host).unwrap();
        let token = host.live[0];

        host.cancel(token); // host delivered the fire
        time.advance(1);
        ctrl.on_timer_fired(token, &mut host).unwrap();

        // showing the face redraws twice (mutator + scheduler entry), the
        // fire adds a third
        assert_eq!(host.redraws, 3);
        assert_eq!(host.live.len(), 1);
        assert_ne!(host.live[0], token);
    }

    #[test]
    fn teardown_cancels_everything() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);
        ctrl.set_visible(true, &mut host).unwrap();
        assert_eq!(host.live.len(), 1);

        ctrl.teardown(&mut host);

        assert!(host.live.is_empty());
        assert!(!ctrl.scheduler_running());
    }

    #[test]
    fn plan_reflects_a_fresh_reading_every_call() {
        let time = StepTime::at(10, 0, 58);
        let ctrl = controller(&time);

        let plan = ctrl.compute_plan(&UnitMetrics, &AllIcons);
        assert_eq!(plan.texts_with_role(FontRole::HoursMinutes), vec!["10:00"]);

        time.advance(2);
        let plan = ctrl.compute_plan(&UnitMetrics, &AllIcons);
        assert_eq!(plan.texts_with_role(FontRole::HoursMinutes), vec!["10:01"]);
    }

    #[test]
    fn geometry_change_repositions_the_next_frame() {
        let time = StepTime::at(10, 0, 0);
        let mut host = RecordingHost::default();
        let mut ctrl = controller(&time);

        let wide = DisplayGeometry::new(400, 300, ScreenShape::Rectangular).unwrap();
        ctrl.set_geometry(wide, &mut host).unwrap();
        assert_eq!(host.redraws, 1);

        let plan = ctrl.compute_plan(&UnitMetrics, &AllIcons);
        let center = plan
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { left, text, style, .. }
                    if style.role == FontRole::HoursMinutes =>
                {
                    Some(left + UnitMetrics.text_width(text, style) / 2.0)
                }
                _ => None,
            })
            .unwrap();
        assert!((center - 200.0).abs() < 1e-3);

        // Same geometry again is a no-op
        ctrl.set_geometry(wide, &mut host).unwrap();
        assert_eq!(host.redraws, 1);
    }
}
