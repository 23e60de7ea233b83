//! # Day/Night Model
//!
//! Pure functions that turn an hour and minute into the sky tint and the
//! position of the sun or moon on its arc.
//!
//! ## Periods
//! The day is split into four periods, each with an anchor color:
//!
//! | Period  | Begins | Anchor color      |
//! |---------|--------|-------------------|
//! | Morning | 06     | `(247, 186, 0)`   |
//! | Day     | 07     | `(0, 161, 254)`   |
//! | Evening | 19     | `(238, 94, 73)`   |
//! | Night   | 20     | `(0, 43, 72)`     |
//!
//! Only the first hour of each period blends from the previous anchor to the
//! next one; every other hour is a solid anchor color. Transitions are
//! deliberately coarse.
//!
//! ## Solar arc
//! The sun travels from 06:00 to 20:59 and the moon from 21:00 to 05:59
//! across a half circle whose radius is half the layer width, rising at the
//! bottom-left corner and setting at the bottom-right.

use core::f64::consts::PI;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{Point, Size};

pub const NIGHT: Rgb888 = Rgb888::new(0, 43, 72);
pub const MORNING: Rgb888 = Rgb888::new(247, 186, 0);
pub const DAY: Rgb888 = Rgb888::new(0, 161, 254);
pub const EVENING: Rgb888 = Rgb888::new(238, 94, 73);

pub const MORNING_BEGIN: u32 = 6;
pub const DAY_BEGIN: u32 = 7;
pub const EVENING_BEGIN: u32 = 19;
pub const EVENING_END: u32 = 20;
pub const NIGHT_BEGIN: u32 = 20;
pub const NIGHT_END: u32 = 6;

/// Which sprite rides the arc for a given hour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolarBody {
    Sun,
    Moon,
}

impl SolarBody {
    /// Select the body for `hour`.
    ///
    /// The sun's window `[06, 20]` is checked before the moon's, so the sun
    /// wins both shared boundary hours.
    pub fn for_hour(hour: u32) -> Self {
        if is_sun_hour(hour) {
            SolarBody::Sun
        } else {
            SolarBody::Moon
        }
    }
}

fn is_sun_hour(hour: u32) -> bool {
    (MORNING_BEGIN..=EVENING_END).contains(&hour)
}

fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_BEGIN || hour <= NIGHT_END
}

/// Per-channel linear blend, truncated back to a byte.
///
/// Computed in single precision so results match the reference palette
/// bit for bit.
fn mix_channel(current: u8, next: u8, percent: f32) -> u8 {
    (current as f32 * (1.0 - percent) + next as f32 * percent) as u8
}

/// Blend two anchor colors; `percent` is clamped into `[0, 1]`.
pub fn mix(current: Rgb888, next: Rgb888, percent: f32) -> Rgb888 {
    let percent = percent.clamp(0.0, 1.0);
    Rgb888::new(
        mix_channel(current.r(), next.r(), percent),
        mix_channel(current.g(), next.g(), percent),
        mix_channel(current.b(), next.b(), percent),
    )
}

/// Sky tint for the given time of day.
pub fn tint_color(hour: u32, minutes: u32) -> Rgb888 {
    let percent = minutes as f32 / 60.0;

    match hour {
        MORNING_BEGIN => mix(NIGHT, MORNING, percent),
        DAY_BEGIN => mix(MORNING, DAY, percent),
        EVENING_BEGIN => mix(DAY, EVENING, percent),
        NIGHT_BEGIN => mix(EVENING, NIGHT, percent),
        h if is_night_hour(h) => NIGHT,
        _ => DAY,
    }
}

/// Fraction of the current body's journey completed, `0.0` at rise and
/// `1.0` at set.
pub fn arc_progress(hour: u32, minutes: u32) -> f32 {
    let (interval_hours, offset_hours) = if is_sun_hour(hour) {
        (EVENING_END - MORNING_BEGIN, hour - MORNING_BEGIN)
    } else {
        let interval = (24 - NIGHT_BEGIN) + NIGHT_END;
        // 23 -> 0 wraps, so early-morning hours continue the evening count
        let offset = if hour >= NIGHT_BEGIN {
            hour - NIGHT_BEGIN
        } else {
            hour + (24 - NIGHT_BEGIN)
        };
        (interval, offset)
    };

    let minutes_moved = offset_hours * 60 + minutes;
    minutes_moved as f32 / (interval_hours as f32 * 60.0)
}

/// Center of the solar body inside a layer of `layer_size`.
///
/// The body moves along a half circle of radius `width / 2` whose center
/// sits on the bottom edge of the layer. At 0% progress it is at the
/// bottom-left corner, at 50% it is at `(width / 2, height - width / 2)`,
/// and at 100% it is at the bottom-right corner.
pub fn solar_body_position(hour: u32, minutes: u32, layer_size: Size) -> Point {
    let move_percent = arc_progress(hour, minutes) as f64;
    let angle = PI * move_percent + PI / 2.0;

    let half_width = (layer_size.width / 2) as i32;
    let height = layer_size.height as i32;

    let x = half_width - (half_width as f64 * angle.sin()) as i32;
    let y = height + (half_width as f64 * angle.cos()) as i32;
    Point::new(x, y)
}
