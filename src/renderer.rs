//! # Frame Output
//!
//! Pushes presented frames to real displays and to the terminal.
//!
//! - [`present_to`] streams a frame into any `embedded-graphics` draw target
//!   (the desktop simulator window, or a panel driver).
//! - [`draw_ascii`] prints a coarse luminance preview for development on a
//!   machine without a display, selected with `--stdout`.
//! - [`TerminalOutput`] is the frame loop's output when no window is built
//!   in: it prints the preview each time the displayed minute changes.

use crate::canvas::Canvas;
use crate::clock::ClockReading;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

/// Characters from darkest to brightest.
const RAMP: &[u8] = b" .:-=+*#%@";

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;

/// Copy `frame` into `display`, top-left aligned.
pub fn present_to<D>(frame: &Canvas, display: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    let area = Rectangle::new(Point::zero(), frame.size());
    display.fill_contiguous(&area, frame.pixels().iter().map(|p| p.rgb()))
}

/// Perceived brightness, 0 to 255.
fn luma(color: Rgb888) -> u32 {
    (color.r() as u32 * 299 + color.g() as u32 * 587 + color.b() as u32 * 114) / 1000
}

/// Downsample `frame` into lines of ASCII art `columns` characters wide.
pub fn render_ascii(frame: &Canvas, columns: u32) -> Vec<String> {
    if frame.width() == 0 || frame.height() == 0 || columns == 0 {
        return Vec::new();
    }

    let columns = columns.min(frame.width());
    let cell_width = frame.width().div_ceil(columns);
    let cell_height = (cell_width * CELL_ASPECT).min(frame.height());
    let rows = frame.height().div_ceil(cell_height);

    (0..rows)
        .map(|row| {
            (0..columns)
                .map(|column| {
                    let x0 = column * cell_width;
                    let y0 = row * cell_height;
                    let mut total = 0;
                    let mut count = 0;
                    for y in y0..(y0 + cell_height).min(frame.height()) {
                        for x in x0..(x0 + cell_width).min(frame.width()) {
                            if let Some(pixel) = frame.pixel(x, y) {
                                total += luma(pixel.rgb());
                                count += 1;
                            }
                        }
                    }
                    let level = if count == 0 { 0 } else { total / count };
                    RAMP[(level as usize * (RAMP.len() - 1)) / 255] as char
                })
                .collect()
        })
        .collect()
}

/// Print `frame` to the terminal with the reading it shows.
pub fn draw_ascii(frame: &Canvas, reading: &ClockReading) {
    println!("{}  {}\n", reading.time_string(), reading.date_string());
    for line in render_ascii(frame, 96) {
        println!("{}", line);
    }
}

/// Terminal stand-in for a display in the frame loop.
///
/// Frames are presented far more often than their content changes, so only
/// the first frame of every minute is printed.
#[derive(Debug, Default)]
pub struct TerminalOutput {
    shown: Option<(u32, u32)>,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print `frame` if it shows a different minute than the last one
    /// printed. Returns whether anything was printed.
    pub fn present(&mut self, frame: &Canvas, reading: &ClockReading) -> bool {
        let minute = (reading.hours(), reading.minutes());
        if self.shown == Some(minute) {
            return false;
        }
        self.shown = Some(minute);
        draw_ascii(frame, reading);
        true
    }
}
