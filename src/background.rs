//! # Background Layer
//!
//! Full-screen scenery: a tinted sky, the sun or moon riding its arc, and two
//! tinted foreground silhouettes anchored to the bottom corners.
//!
//! All five images are loaded once, when the layer is built. Each minute the
//! layer redraws into its own target using the tint and arc position from
//! [`crate::daylight`].

use crate::assets::ImageLoader;
use crate::backend::{RenderBackend, TextureId};
use crate::canvas::Rgba;
use crate::clock::ClockReading;
use crate::component::{ComponentError, LayerSurface, VisualComponent};
use crate::daylight::{self, SolarBody};
use crate::diagnostics::Diagnostics;
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use std::path::Path;

/// Image files loaded from the asset directory, in load order.
pub const ASSET_MANIFEST: [&str; 5] = [
    "Background.png",
    "Foreground_Left.png",
    "Foreground_Right.png",
    "Sun.png",
    "Moon.png",
];

const BACKGROUND: usize = 0;
const FOREGROUND_LEFT: usize = 1;
const FOREGROUND_RIGHT: usize = 2;
const SUN: usize = 3;
const MOON: usize = 4;

pub struct BackgroundLayer {
    surface: LayerSurface,
    assets: [TextureId; 5],
    diagnostics: Diagnostics,
}

impl BackgroundLayer {
    /// Build the layer and upload every manifest image from `asset_dir`.
    ///
    /// On failure every texture created so far is destroyed again.
    pub fn new(
        backend: &mut dyn RenderBackend,
        placement: Rectangle,
        asset_dir: &Path,
        loader: &dyn ImageLoader,
        diagnostics: Diagnostics,
    ) -> Result<Self, ComponentError> {
        let mut surface = LayerSurface::new(backend, placement)?;

        let mut loaded = Vec::with_capacity(ASSET_MANIFEST.len());
        for name in ASSET_MANIFEST {
            match Self::load_asset(backend, loader, &asset_dir.join(name)) {
                Ok(texture) => loaded.push(texture),
                Err(e) => {
                    for texture in loaded {
                        backend.destroy_texture(texture);
                    }
                    surface.release(backend);
                    return Err(e);
                }
            }
        }

        let assets = [loaded[0], loaded[1], loaded[2], loaded[3], loaded[4]];
        Ok(Self {
            surface,
            assets,
            diagnostics,
        })
    }

    fn load_asset(
        backend: &mut dyn RenderBackend,
        loader: &dyn ImageLoader,
        path: &Path,
    ) -> Result<TextureId, ComponentError> {
        let pixels = loader
            .load(path)
            .map_err(|e| ComponentError::asset(path.to_path_buf(), &e))?;
        backend
            .create_texture(pixels)
            .map_err(|e| ComponentError::AssetLoad {
                path: path.to_path_buf(),
                reason: format!("failed to create texture: {e}"),
            })
    }

    fn redraw(&self, backend: &mut dyn RenderBackend, target: TextureId, reading: &ClockReading) {
        let size = self.surface.placement().size;
        let tint = daylight::tint_color(reading.hours(), reading.minutes());

        if let Err(e) = backend.set_target(Some(target)) {
            self.diagnostics
                .error(format!("Failed to select background target: {e}"));
            return;
        }
        if let Err(e) = backend.clear(Rgba::TRANSPARENT) {
            self.diagnostics
                .error(format!("Failed to clear background target: {e}"));
        }

        let full = Rectangle::new(Point::zero(), size);
        if let Err(e) = backend.copy(self.assets[BACKGROUND], &full, Some(tint)) {
            self.diagnostics
                .error(format!("Failed to draw background texture: {e}"));
        }

        // Drawn before the foreground so the hills cover it near the horizon
        self.draw_solar_body(backend, reading, size);
        self.draw_foreground(backend, size, tint);

        if let Err(e) = backend.set_target(None) {
            self.diagnostics
                .error(format!("Failed to reset render target: {e}"));
        }
    }

    fn draw_solar_body(&self, backend: &mut dyn RenderBackend, reading: &ClockReading, size: Size) {
        let texture = match SolarBody::for_hour(reading.hours()) {
            SolarBody::Sun => self.assets[SUN],
            SolarBody::Moon => self.assets[MOON],
        };

        let body = match backend.query(texture) {
            Ok(body) => body,
            Err(e) => {
                self.diagnostics
                    .error(format!("Failed to query solar body texture: {e}"));
                return;
            }
        };

        let center = daylight::solar_body_position(reading.hours(), reading.minutes(), size);
        let top_left = Point::new(
            center.x - (body.width / 2) as i32,
            center.y - (body.height / 2) as i32,
        );
        if let Err(e) = backend.copy(texture, &Rectangle::new(top_left, body), None) {
            self.diagnostics
                .error(format!("Failed to draw solar body texture: {e}"));
        }
    }

    fn draw_foreground(&self, backend: &mut dyn RenderBackend, size: Size, tint: Rgb888) {
        let left = backend.query(self.assets[FOREGROUND_LEFT]);
        let right = backend.query(self.assets[FOREGROUND_RIGHT]);
        let (left, right) = match (left, right) {
            (Ok(left), Ok(right)) => (left, right),
            (Err(e), _) | (_, Err(e)) => {
                self.diagnostics
                    .error(format!("Failed to query foreground textures: {e}"));
                return;
            }
        };

        let width = size.width as i32;
        let height = size.height as i32;
        let left_rect = Rectangle::new(Point::new(0, height - left.height as i32), left);
        let right_rect = Rectangle::new(
            Point::new(width - right.width as i32, height - right.height as i32),
            right,
        );

        let drawn = backend
            .copy(self.assets[FOREGROUND_LEFT], &left_rect, Some(tint))
            .and_then(|_| backend.copy(self.assets[FOREGROUND_RIGHT], &right_rect, Some(tint)));
        if let Err(e) = drawn {
            self.diagnostics
                .error(format!("Failed to draw foreground textures: {e}"));
        }
    }
}

impl VisualComponent for BackgroundLayer {
    fn update(&mut self, backend: &mut dyn RenderBackend, reading: &ClockReading) {
        if !self.surface.begin_redraw(reading.minutes()) {
            return;
        }
        match self.surface.target() {
            Some(target) => self.redraw(backend, target, reading),
            None => self.diagnostics.error("Background target texture missing"),
        }
    }

    fn target(&self) -> Option<TextureId> {
        self.surface.target()
    }

    fn placement(&self) -> Rectangle {
        self.surface.placement()
    }

    fn release(mut self: Box<Self>, backend: &mut dyn RenderBackend) {
        for texture in self.assets {
            backend.destroy_texture(texture);
        }
        self.surface.release(backend);
    }
}
