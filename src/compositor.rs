//! # Compositor
//!
//! Owns the render backend and the ordered list of layers, and turns a clock
//! reading into a presented frame.
//!
//! ## Layer layout
//! ```text
//! +---------------------------------------+
//! | background (full screen)              |
//! |          +-----------------+          |
//! |          | info            |          |
//! |          | (w/4, h/4,      |          |
//! |          |  w/2 x h/2)     |          |
//! |          +-----------------+          |
//! |                                       |
//! +---------------------------------------+
//! ```
//!
//! ## Failure policy
//! Building the first layer set in [`Compositor::new`] is all or nothing: an
//! error is returned and the clock cannot start. Rebuilding after a resize is
//! best effort: the error is logged and whatever layers were built stay.
//! Per-frame drawing never fails; broken elements are logged and skipped.

use crate::assets::{ImageLoader, TextRasterizer};
use crate::backend::RenderBackend;
use crate::background::BackgroundLayer;
use crate::canvas::Rgba;
use crate::clock::ClockReading;
use crate::component::{ComponentError, VisualComponent};
use crate::config::AssetsConfig;
use crate::diagnostics::Diagnostics;
use crate::info::InfoLayer;
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use std::rc::Rc;

/// Placement of the info panel: the middle half of the screen in both
/// directions.
pub fn info_placement(screen: Size) -> Rectangle {
    Rectangle::new(
        Point::new((screen.width / 4) as i32, (screen.height / 4) as i32),
        Size::new(screen.width / 2, screen.height / 2),
    )
}

pub struct Compositor<B: RenderBackend> {
    backend: B,
    layers: Vec<Box<dyn VisualComponent>>,
    size: Option<Size>,
    assets: AssetsConfig,
    loader: Rc<dyn ImageLoader>,
    rasterizer: Rc<dyn TextRasterizer>,
    diagnostics: Diagnostics,
}

impl<B: RenderBackend> Compositor<B> {
    /// Build the layer set for the backend's current output size.
    pub fn new(
        backend: B,
        assets: AssetsConfig,
        loader: Rc<dyn ImageLoader>,
        rasterizer: Rc<dyn TextRasterizer>,
        diagnostics: Diagnostics,
    ) -> Result<Self, ComponentError> {
        let size = backend.output_size();
        let mut compositor = Self {
            backend,
            layers: Vec::new(),
            size: None,
            assets,
            loader,
            rasterizer,
            diagnostics,
        };

        // Layers built before a failure are released when `compositor` drops
        compositor.build_layers(size)?;
        compositor.size = Some(size);
        Ok(compositor)
    }

    fn build_layers(&mut self, size: Size) -> Result<(), ComponentError> {
        let background = BackgroundLayer::new(
            &mut self.backend,
            Rectangle::new(Point::zero(), size),
            &self.assets.asset_dir,
            self.loader.as_ref(),
            self.diagnostics.clone(),
        )?;
        self.layers.push(Box::new(background));

        let info = InfoLayer::new(
            &mut self.backend,
            info_placement(size),
            self.assets.font_path.clone(),
            Rc::clone(&self.rasterizer),
            self.diagnostics.clone(),
        )?
        .with_point_sizes(self.assets.time_point_size, self.assets.date_point_size);
        self.layers.push(Box::new(info));

        Ok(())
    }

    fn release_layers(&mut self) {
        for layer in self.layers.drain(..) {
            layer.release(&mut self.backend);
        }
    }

    /// Rebuild the layers for a new screen size.
    ///
    /// Does nothing when the size is unchanged.
    pub fn resize(&mut self, size: Size) {
        if self.size == Some(size) {
            return;
        }

        self.release_layers();
        self.size = Some(size);
        if let Err(e) = self.build_layers(size) {
            self.diagnostics.error(format!(
                "Failed to rebuild ui components for {}x{}: {}",
                size.width, size.height, e
            ));
        }
    }

    /// Update every layer for `reading`, composite them and present.
    pub fn draw(&mut self, reading: &ClockReading) {
        if let Err(e) = self.backend.set_target(None) {
            self.diagnostics
                .error(format!("Failed to select screen target: {e}"));
        }
        if let Err(e) = self.backend.clear(Rgba::BLACK) {
            self.diagnostics.error(format!("Failed to clear screen: {e}"));
        }

        for layer in self.layers.iter_mut() {
            layer.update(&mut self.backend, reading);
        }

        // A layer that bailed out mid-redraw may have left its own target active
        if let Err(e) = self.backend.set_target(None) {
            self.diagnostics
                .error(format!("Failed to select screen target: {e}"));
        }

        for layer in &self.layers {
            let Some(texture) = layer.target() else {
                self.diagnostics.error("Invalid component texture");
                continue;
            };
            if let Err(e) = self.backend.copy(texture, &layer.placement(), None) {
                self.diagnostics
                    .error(format!("Failed to draw component texture: {e}"));
            }
        }

        if let Err(e) = self.backend.present() {
            self.diagnostics.error(format!("Failed to present frame: {e}"));
        }
    }

    /// The size the current layer set was built for.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn layers(&self) -> &[Box<dyn VisualComponent>] {
        &self.layers
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: RenderBackend> Drop for Compositor<B> {
    fn drop(&mut self) {
        self.release_layers();
    }
}
