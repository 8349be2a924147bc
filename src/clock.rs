//! # Clock Reading Derivation
//!
//! Turns an instant plus a UTC offset into the values the face actually
//! draws: 12-hour clock digits and an abbreviated date line. A reading is
//! recomputed on every layout pass and never cached across frames, so the
//! layout path always reflects the wall clock at the moment it runs,
//! including across timezone changes delivered mid-session.

use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike, Utc};

/// Point-in-time snapshot of everything the face shows about the clock.
///
/// Hours are already folded into the 1–12 range (midnight and noon both read
/// 12, never 0), so consumers can format without re-deriving calendar rules.
///
/// # Example
/// ```
/// use chrono::{FixedOffset, TimeZone, Utc};
/// use sky_clock_lib::clock::ClockReading;
///
/// let utc = Utc.with_ymd_and_hms(2026, 8, 7, 0, 5, 9).unwrap();
/// let reading = ClockReading::derive(utc, FixedOffset::east_opt(0).unwrap());
/// assert_eq!(reading.hours_minutes_text(), "12:05");
/// assert_eq!(reading.seconds_text(), "09");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockReading {
    /// Hour on a 12-hour dial, 1–12
    pub hours: u32,
    /// Minute of the hour, 0–59
    pub minutes: u32,
    /// Second of the minute, 0–59
    pub seconds: u32,
    /// Abbreviated weekday/month/day/year line, e.g. "Fri, Aug 7, 2026"
    pub date_text: String,
}

impl ClockReading {
    /// Derive a reading for `utc` as seen from `offset`.
    pub fn derive(utc: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = utc.with_timezone(&offset);

        // hour12() already maps hour 0 to 12 on the dial
        let (_, hours) = local.hour12();

        ClockReading {
            hours,
            minutes: local.minute(),
            seconds: local.second(),
            date_text: format_date(&local),
        }
    }

    /// Clock digits as drawn: no leading zero on hours, zero-padded minutes.
    pub fn hours_minutes_text(&self) -> String {
        format!("{}:{:02}", self.hours, self.minutes)
    }

    /// Seconds as drawn: always two digits.
    pub fn seconds_text(&self) -> String {
        format!("{:02}", self.seconds)
    }
}

/// Abbreviated weekday + abbreviated month/day + year.
fn format_date(local: &DateTime<FixedOffset>) -> String {
    format!(
        "{}, {} {}, {}",
        local.format("%a"),
        local.format("%b"),
        local.day(),
        local.year()
    )
}

/// Where the current instant comes from.
///
/// The production implementation reads the system clock; tests pin time to
/// fixed instants so second-boundary math and hour folding are checkable
/// without sleeping.
pub trait TimeSource {
    /// Current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock time source for production use.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Current UTC offset of the machine's configured timezone.
///
/// The face tracks timezone as a plain offset; the embedder re-reads this
/// and calls the controller's timezone handler when the platform broadcasts
/// a change.
pub fn system_utc_offset() -> FixedOffset {
    *Local::now().offset()
}
