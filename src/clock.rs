//! # Wall-Clock Time Source
//!
//! The display only cares about the current minute, hour and calendar date,
//! plus two pre-formatted strings for the info panel. This module reads those
//! from a [`HostClock`] once per frame and hands out an immutable
//! [`ClockReading`] snapshot that every layer borrows for the duration of the
//! frame.
//!
//! ## Formatting
//! - Time: `HH:MM`, both fields zero-padded (`05:03`)
//! - Date: `DD.MM.YYYY`, day and month zero-padded, year printed in full
//!   (`01.02.2022`)

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use std::cell::Cell;

/// Immutable snapshot of the wall clock taken at the start of a frame.
///
/// All fields are captured together; a reading is never partially updated.
/// The formatted strings are computed once on construction so layers can
/// borrow them without allocating.
///
/// # Example
/// ```
/// use ambient_clock_lib::clock::ClockReading;
///
/// let reading = ClockReading::new(5, 3, 1, 2, 2022);
/// assert_eq!(reading.time_string(), "05:03");
/// assert_eq!(reading.date_string(), "01.02.2022");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockReading {
    minutes: u32,
    hours: u32,
    day: u32,
    month: u32,
    year: i32,
    time_string: String,
    date_string: String,
}

impl ClockReading {
    /// Build a reading from its broken-down components.
    pub fn new(hours: u32, minutes: u32, day: u32, month: u32, year: i32) -> Self {
        Self {
            minutes,
            hours,
            day,
            month,
            year,
            time_string: format!("{:02}:{:02}", hours, minutes),
            date_string: format!("{:02}.{:02}.{}", day, month, year),
        }
    }

    /// Build a reading from any chrono value carrying both date and time.
    pub fn from_datetime<T: Datelike + Timelike>(value: &T) -> Self {
        Self::new(
            value.hour(),
            value.minute(),
            value.day(),
            value.month(),
            value.year(),
        )
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Time of day as `HH:MM`.
    pub fn time_string(&self) -> &str {
        &self.time_string
    }

    /// Calendar date as `DD.MM.YYYY`.
    pub fn date_string(&self) -> &str {
        &self.date_string
    }
}

impl Default for ClockReading {
    /// Midnight on 1 January 1900, the earliest date the display accepts.
    fn default() -> Self {
        Self::new(0, 0, 1, 1, 1900)
    }
}

/// Source of local wall-clock time.
///
/// Reading the host clock is treated as infallible; the host clock is
/// authoritative and there is nothing meaningful to do if it misbehaves.
pub trait HostClock {
    fn now(&self) -> ClockReading;
}

/// Local time from the operating system via `chrono::Local`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl HostClock for LocalClock {
    fn now(&self) -> ClockReading {
        ClockReading::from_datetime(&Local::now())
    }
}

/// A clock that replays a fixed list of instants.
///
/// Each call to [`HostClock::now`] advances to the next instant and the last
/// one repeats forever. Used for previews at a chosen time and in tests that
/// step the display across minute boundaries.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instants: Vec<NaiveDateTime>,
    cursor: Cell<usize>,
}

impl FixedClock {
    /// A clock frozen at a single instant.
    pub fn at(instant: NaiveDateTime) -> Self {
        Self::sequence(vec![instant])
    }

    /// A clock stepping through `instants` in order.
    ///
    /// An empty list behaves like [`ClockReading::default`].
    pub fn sequence(instants: Vec<NaiveDateTime>) -> Self {
        Self {
            instants,
            cursor: Cell::new(0),
        }
    }

    /// Convenience constructor from calendar components.
    ///
    /// Returns `None` if the components do not form a valid date/time.
    pub fn from_components(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .map(Self::at)
    }
}

impl HostClock for FixedClock {
    fn now(&self) -> ClockReading {
        let index = self.cursor.get();
        let Some(instant) = self
            .instants
            .get(index)
            .or_else(|| self.instants.last())
        else {
            return ClockReading::default();
        };
        if index + 1 < self.instants.len() {
            self.cursor.set(index + 1);
        }
        ClockReading::from_datetime(instant)
    }
}

/// Per-frame read model over a [`HostClock`].
///
/// [`TimeSource::refresh`] replaces the whole snapshot at once; the accessors
/// always return values from the same refresh.
pub struct TimeSource<C: HostClock = LocalClock> {
    clock: C,
    reading: ClockReading,
}

impl<C: HostClock> TimeSource<C> {
    /// Create a time source and take the first reading immediately.
    pub fn new(clock: C) -> Self {
        let reading = clock.now();
        Self { clock, reading }
    }

    /// Re-read the host clock, replacing every field of the snapshot.
    pub fn refresh(&mut self) {
        self.reading = self.clock.now();
    }

    /// The last-refreshed snapshot.
    pub fn reading(&self) -> &ClockReading {
        &self.reading
    }

    pub fn minutes(&self) -> u32 {
        self.reading.minutes()
    }

    pub fn hours(&self) -> u32 {
        self.reading.hours()
    }

    pub fn day(&self) -> u32 {
        self.reading.day()
    }

    pub fn month(&self) -> u32 {
        self.reading.month()
    }

    pub fn year(&self) -> i32 {
        self.reading.year()
    }

    pub fn time_string(&self) -> &str {
        self.reading.time_string()
    }

    pub fn date_string(&self) -> &str {
        self.reading.date_string()
    }
}

impl Default for TimeSource<LocalClock> {
    fn default() -> Self {
        Self::new(LocalClock)
    }
}
