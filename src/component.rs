//! # Visual Components
//!
//! Every layer of the display is a [`VisualComponent`]: it owns an off-screen
//! render target the size of its placement rectangle, redraws that target at
//! most once per minute, and exposes it to the compositor for the final blit.
//!
//! The shared bookkeeping (the target handle, the placement and the
//! once-per-minute redraw gate) lives in [`LayerSurface`] so each concrete
//! layer only implements its own drawing.

use crate::assets::{AssetError, TextError};
use crate::backend::{RenderBackend, RenderError, TextureId};
use crate::clock::ClockReading;
use embedded_graphics::primitives::Rectangle;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort construction of a layer.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// The off-screen render target could not be created
    #[error("failed to create ui component target texture: {0}")]
    ResourceCreation(#[from] RenderError),

    /// A required image could not be loaded or uploaded
    #[error("failed to load asset {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// A required font could not be opened
    #[error(transparent)]
    Font(#[from] TextError),
}

impl ComponentError {
    pub(crate) fn asset(path: PathBuf, source: &AssetError) -> Self {
        ComponentError::AssetLoad {
            path,
            reason: source.to_string(),
        }
    }
}

/// A rectangular layer composited into the final frame.
pub trait VisualComponent {
    /// Bring the layer's target up to date with `reading`.
    ///
    /// Implementations return early when the minute has not changed since
    /// the last redraw. Failures are logged and skipped, never propagated.
    fn update(&mut self, backend: &mut dyn RenderBackend, reading: &ClockReading);

    /// The render target to composite, if the layer has one.
    fn target(&self) -> Option<TextureId>;

    /// Where the target is drawn on screen.
    fn placement(&self) -> Rectangle;

    /// Give every backend resource the layer owns back to `backend`.
    fn release(self: Box<Self>, backend: &mut dyn RenderBackend);
}

/// Render target, placement and redraw gate shared by all layers.
#[derive(Debug)]
pub struct LayerSurface {
    target: Option<TextureId>,
    placement: Rectangle,
    last_minute: Option<u32>,
}

impl LayerSurface {
    /// Acquire a transparent, alpha-blended target exactly the size of
    /// `placement`.
    pub fn new(
        backend: &mut dyn RenderBackend,
        placement: Rectangle,
    ) -> Result<Self, ComponentError> {
        let target = backend.create_target(placement.size)?;
        Ok(Self {
            target: Some(target),
            placement,
            last_minute: None,
        })
    }

    /// The redraw gate.
    ///
    /// Returns `false` if `minute` was already drawn. Otherwise records
    /// `minute` as drawn and returns `true`; the caller must then redraw.
    pub fn begin_redraw(&mut self, minute: u32) -> bool {
        if self.last_minute == Some(minute) {
            return false;
        }
        self.last_minute = Some(minute);
        true
    }

    pub fn last_minute(&self) -> Option<u32> {
        self.last_minute
    }

    pub fn target(&self) -> Option<TextureId> {
        self.target
    }

    pub fn placement(&self) -> Rectangle {
        self.placement
    }

    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(target) = self.target.take() {
            backend.destroy_texture(target);
        }
    }
}
