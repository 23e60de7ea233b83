//! # Ambient Clock Core Library
//!
//! A full-screen clock meant to run unattended on a kiosk display. The screen
//! shows a sky that is tinted by the time of day, a sun or moon travelling
//! across it, two foreground silhouettes, and the current time and date in
//! large type.
//!
//! ## Design Philosophy
//!
//! ### Redraw once a minute, present every frame
//! Everything on screen changes at most once a minute. Each layer renders
//! into its own off-screen target and only redraws when the minute changes;
//! every frame just composites the cached targets and presents.
//!
//! ### Degrade instead of crashing
//! Once the clock is running, a failed draw or query is logged and that one
//! element is skipped for the frame. Only a missing asset or font at start-up
//! is fatal, because there is nothing sensible to show without it.
//!
//! ### Everything external behind a trait
//! The renderer ([`backend::RenderBackend`]), image decoding
//! ([`assets::ImageLoader`]), text rasterization ([`assets::TextRasterizer`]),
//! the wall clock ([`clock::HostClock`]) and the log sink
//! ([`diagnostics::DiagnosticSink`]) can each be swapped out, and the tests
//! do exactly that.
//!
//! ## Data Flow
//! 1. [`clock::TimeSource`] snapshots the wall clock into a [`ClockReading`]
//! 2. [`compositor::Compositor::draw`] hands the reading to every layer
//! 3. [`background::BackgroundLayer`] and [`info::InfoLayer`] redraw if the
//!    minute changed
//! 4. The compositor blits the layer targets onto a black screen and presents
//!
//! ## Example
//! ```
//! use ambient_clock_lib::daylight::{tint_color, SolarBody, DAY, NIGHT};
//!
//! assert_eq!(tint_color(12, 30), DAY);
//! assert_eq!(tint_color(23, 59), NIGHT);
//! assert_eq!(SolarBody::for_hour(20), SolarBody::Sun);
//! ```

pub mod assets;
pub mod backend;
pub mod background;
pub mod canvas;
pub mod clock;
pub mod component;
pub mod compositor;
pub mod config;
pub mod daylight;
pub mod diagnostics;
pub mod info;
pub mod renderer;
pub mod signals;

pub use clock::{ClockReading, TimeSource};
pub use compositor::Compositor;
pub use config::Config;

#[cfg(test)]
mod tests;
