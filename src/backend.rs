//! # Rendering Backend
//!
//! The narrow drawing interface the compositing core talks to, and a CPU
//! implementation of it.
//!
//! The interface mirrors what a hardware-accelerated 2D renderer offers:
//! textures identified by opaque handles, an active render target (either an
//! off-screen texture or the screen), clear, a scaled copy with optional color
//! modulation, size queries and present. Every operation reports failure as a
//! [`RenderError`] so callers can log and skip a single element without
//! tearing the frame down.
//!
//! [`SoftwareRenderer`] keeps every texture as an RGBA [`Canvas`] and
//! captures the screen into a front buffer on [`RenderBackend::present`].
//! The front buffer can then be pushed to any `embedded-graphics`
//! `DrawTarget` (see [`crate::renderer`]).

use crate::canvas::{Canvas, Rgba};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use std::collections::HashMap;
use thiserror::Error;

/// Opaque handle to a texture owned by a [`RenderBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

/// Errors reported by a [`RenderBackend`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Render targets and textures must have a non-zero area
    #[error("invalid texture size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    /// The handle was never issued or has been destroyed
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),

    /// A texture cannot be drawn into itself
    #[error("texture {0:?} is the active render target")]
    SourceIsTarget(TextureId),

    /// Backend-specific failure
    #[error("render backend failure: {0}")]
    Backend(String),
}

/// Drawing operations required by the compositing core.
///
/// Implementations must report failures through `Result`, never by
/// terminating the process.
pub trait RenderBackend {
    /// Size of the screen surface.
    fn output_size(&self) -> Size;

    /// Create an off-screen render target of `size` with alpha blending
    /// enabled, initially fully transparent.
    fn create_target(&mut self, size: Size) -> Result<TextureId, RenderError>;

    /// Upload decoded pixel data as a drawable texture.
    fn create_texture(&mut self, pixels: Canvas) -> Result<TextureId, RenderError>;

    /// Release a texture. Unknown handles are ignored.
    fn destroy_texture(&mut self, texture: TextureId);

    /// Direct subsequent drawing at `target`, or at the screen when `None`.
    fn set_target(&mut self, target: Option<TextureId>) -> Result<(), RenderError>;

    /// Overwrite the whole active target with `color`.
    fn clear(&mut self, color: Rgba) -> Result<(), RenderError>;

    /// Draw `texture` scaled into `dest` on the active target, multiplying its
    /// color channels by `tint` when given.
    fn copy(
        &mut self,
        texture: TextureId,
        dest: &Rectangle,
        tint: Option<Rgb888>,
    ) -> Result<(), RenderError>;

    /// Native pixel size of `texture`.
    fn query(&self, texture: TextureId) -> Result<Size, RenderError>;

    /// Show the screen contents.
    fn present(&mut self) -> Result<(), RenderError>;
}

impl<T: RenderBackend + ?Sized> RenderBackend for &mut T {
    fn output_size(&self) -> Size {
        (**self).output_size()
    }

    fn create_target(&mut self, size: Size) -> Result<TextureId, RenderError> {
        (**self).create_target(size)
    }

    fn create_texture(&mut self, pixels: Canvas) -> Result<TextureId, RenderError> {
        (**self).create_texture(pixels)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        (**self).destroy_texture(texture)
    }

    fn set_target(&mut self, target: Option<TextureId>) -> Result<(), RenderError> {
        (**self).set_target(target)
    }

    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        (**self).clear(color)
    }

    fn copy(
        &mut self,
        texture: TextureId,
        dest: &Rectangle,
        tint: Option<Rgb888>,
    ) -> Result<(), RenderError> {
        (**self).copy(texture, dest, tint)
    }

    fn query(&self, texture: TextureId) -> Result<Size, RenderError> {
        (**self).query(texture)
    }

    fn present(&mut self) -> Result<(), RenderError> {
        (**self).present()
    }
}

/// CPU implementation of [`RenderBackend`].
#[derive(Debug)]
pub struct SoftwareRenderer {
    screen: Canvas,
    front: Canvas,
    textures: HashMap<TextureId, Canvas>,
    next_id: u32,
    active: Option<TextureId>,
    frames_presented: u64,
}

impl SoftwareRenderer {
    /// Create a renderer with an opaque black screen of `size`.
    pub fn new(size: Size) -> Self {
        Self {
            screen: Canvas::new(size.width, size.height, Rgba::BLACK),
            front: Canvas::new(size.width, size.height, Rgba::BLACK),
            textures: HashMap::new(),
            next_id: 0,
            active: None,
            frames_presented: 0,
        }
    }

    /// Resize the screen surface, e.g. after the window changed size.
    ///
    /// Existing textures are kept; the screen and front buffer restart black.
    pub fn resize_output(&mut self, size: Size) {
        if self.screen.size() == size {
            return;
        }
        self.screen = Canvas::new(size.width, size.height, Rgba::BLACK);
        self.front = Canvas::new(size.width, size.height, Rgba::BLACK);
    }

    /// The most recently presented frame.
    pub fn front_buffer(&self) -> &Canvas {
        &self.front
    }

    /// Pixels of a live texture.
    pub fn texture_pixels(&self, texture: TextureId) -> Option<&Canvas> {
        self.textures.get(&texture)
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn insert(&mut self, canvas: Canvas) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.textures.insert(id, canvas);
        id
    }

    fn active_canvas(&mut self) -> Result<&mut Canvas, RenderError> {
        match self.active {
            None => Ok(&mut self.screen),
            Some(id) => self
                .textures
                .get_mut(&id)
                .ok_or(RenderError::UnknownTexture(id)),
        }
    }
}

/// Nearest-neighbour scaled blend of `src` into `dest` on `dst`.
fn blit(src: &Canvas, dst: &mut Canvas, dest: &Rectangle, tint: Option<Rgb888>) {
    if dest.size.width == 0 || dest.size.height == 0 || src.width() == 0 || src.height() == 0 {
        return;
    }

    let dest_x = dest.top_left.x as i64;
    let dest_y = dest.top_left.y as i64;
    let dest_w = dest.size.width as i64;
    let dest_h = dest.size.height as i64;

    // Clip the destination rectangle against the target surface
    let x_start = dest_x.max(0);
    let y_start = dest_y.max(0);
    let x_end = (dest_x + dest_w).min(dst.width() as i64);
    let y_end = (dest_y + dest_h).min(dst.height() as i64);

    for y in y_start..y_end {
        let sy = ((y - dest_y) * src.height() as i64 / dest_h) as u32;
        for x in x_start..x_end {
            let sx = ((x - dest_x) * src.width() as i64 / dest_w) as u32;
            let Some(mut pixel) = src.pixel(sx, sy) else {
                continue;
            };
            if let Some(tint) = tint {
                pixel = pixel.modulate(tint);
            }
            let (x, y) = (x as u32, y as u32);
            if let Some(under) = dst.pixel(x, y) {
                dst.set_pixel(x, y, pixel.over(under));
            }
        }
    }
}

impl RenderBackend for SoftwareRenderer {
    fn output_size(&self) -> Size {
        self.screen.size()
    }

    fn create_target(&mut self, size: Size) -> Result<TextureId, RenderError> {
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(self.insert(Canvas::new(size.width, size.height, Rgba::TRANSPARENT)))
    }

    fn create_texture(&mut self, pixels: Canvas) -> Result<TextureId, RenderError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(RenderError::InvalidSize {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(self.insert(pixels))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        if self.active == Some(texture) {
            self.active = None;
        }
    }

    fn set_target(&mut self, target: Option<TextureId>) -> Result<(), RenderError> {
        if let Some(id) = target {
            if !self.textures.contains_key(&id) {
                return Err(RenderError::UnknownTexture(id));
            }
        }
        self.active = target;
        Ok(())
    }

    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        self.active_canvas()?.fill(color);
        Ok(())
    }

    fn copy(
        &mut self,
        texture: TextureId,
        dest: &Rectangle,
        tint: Option<Rgb888>,
    ) -> Result<(), RenderError> {
        if self.active == Some(texture) {
            return Err(RenderError::SourceIsTarget(texture));
        }
        // Take the source out so the target can be borrowed mutably
        let src = self
            .textures
            .remove(&texture)
            .ok_or(RenderError::UnknownTexture(texture))?;
        let result = self.active_canvas().map(|dst| blit(&src, dst, dest, tint));
        self.textures.insert(texture, src);
        result
    }

    fn query(&self, texture: TextureId) -> Result<Size, RenderError> {
        self.textures
            .get(&texture)
            .map(Canvas::size)
            .ok_or(RenderError::UnknownTexture(texture))
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.front.clone_from(&self.screen);
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::Point;

    fn rect(x: i32, y: i32, w: u32, h: u32) -> Rectangle {
        Rectangle::new(Point::new(x, y), Size::new(w, h))
    }

    #[test]
    fn test_create_target_is_transparent_and_sized() {
        let mut renderer = SoftwareRenderer::new(Size::new(8, 8));
        let target = renderer.create_target(Size::new(4, 2)).unwrap();
        assert_eq!(renderer.query(target).unwrap(), Size::new(4, 2));
        let pixels = renderer.texture_pixels(target).unwrap();
        assert!(pixels.pixels().iter().all(|p| *p == Rgba::TRANSPARENT));
    }

    #[test]
    fn test_zero_sized_target_is_rejected() {
        let mut renderer = SoftwareRenderer::new(Size::new(8, 8));
        assert_eq!(
            renderer.create_target(Size::new(0, 5)),
            Err(RenderError::InvalidSize { width: 0, height: 5 })
        );
    }

    #[test]
    fn test_copy_scales_and_tints() {
        let mut renderer = SoftwareRenderer::new(Size::new(4, 4));
        let white = renderer
            .create_texture(Canvas::new(1, 1, Rgba::WHITE))
            .unwrap();

        renderer.set_target(None).unwrap();
        renderer.clear(Rgba::BLACK).unwrap();
        renderer
            .copy(white, &rect(0, 0, 2, 2), Some(Rgb888::new(0, 161, 254)))
            .unwrap();
        renderer.present().unwrap();

        let frame = renderer.front_buffer();
        assert_eq!(frame.pixel(0, 0), Some(Rgba::new(0, 161, 254, 255)));
        assert_eq!(frame.pixel(1, 1), Some(Rgba::new(0, 161, 254, 255)));
        assert_eq!(frame.pixel(2, 2), Some(Rgba::BLACK));
    }

    #[test]
    fn test_copy_clips_to_target() {
        let mut renderer = SoftwareRenderer::new(Size::new(4, 4));
        let white = renderer
            .create_texture(Canvas::new(2, 2, Rgba::WHITE))
            .unwrap();
        renderer.copy(white, &rect(-1, 3, 2, 2), None).unwrap();
        renderer.present().unwrap();

        let frame = renderer.front_buffer();
        assert_eq!(frame.pixel(0, 3), Some(Rgba::WHITE));
        assert_eq!(frame.pixel(1, 3), Some(Rgba::BLACK));
        assert_eq!(frame.pixel(0, 2), Some(Rgba::BLACK));
    }

    #[test]
    fn test_transparent_pixels_do_not_overwrite() {
        let mut renderer = SoftwareRenderer::new(Size::new(2, 1));
        let mut sprite = Canvas::new(2, 1, Rgba::TRANSPARENT);
        sprite.set_pixel(1, 0, Rgba::WHITE);
        let sprite = renderer.create_texture(sprite).unwrap();

        renderer.clear(Rgba::new(0, 0, 255, 255)).unwrap();
        renderer.copy(sprite, &rect(0, 0, 2, 1), None).unwrap();
        renderer.present().unwrap();

        let frame = renderer.front_buffer();
        assert_eq!(frame.pixel(0, 0), Some(Rgba::new(0, 0, 255, 255)));
        assert_eq!(frame.pixel(1, 0), Some(Rgba::WHITE));
    }

    #[test]
    fn test_render_into_target_then_screen() {
        let mut renderer = SoftwareRenderer::new(Size::new(4, 4));
        let layer = renderer.create_target(Size::new(2, 2)).unwrap();
        let white = renderer
            .create_texture(Canvas::new(1, 1, Rgba::WHITE))
            .unwrap();

        renderer.set_target(Some(layer)).unwrap();
        renderer.copy(white, &rect(0, 0, 1, 1), None).unwrap();
        renderer.set_target(None).unwrap();
        renderer.clear(Rgba::BLACK).unwrap();
        renderer.copy(layer, &rect(2, 2, 2, 2), None).unwrap();
        renderer.present().unwrap();

        let frame = renderer.front_buffer();
        assert_eq!(frame.pixel(2, 2), Some(Rgba::WHITE));
        assert_eq!(frame.pixel(3, 3), Some(Rgba::BLACK));
        assert_eq!(renderer.frames_presented(), 1);
    }

    #[test]
    fn test_copy_into_itself_fails() {
        let mut renderer = SoftwareRenderer::new(Size::new(4, 4));
        let layer = renderer.create_target(Size::new(2, 2)).unwrap();
        renderer.set_target(Some(layer)).unwrap();
        assert_eq!(
            renderer.copy(layer, &rect(0, 0, 2, 2), None),
            Err(RenderError::SourceIsTarget(layer))
        );
        // The texture survives the failed copy
        assert!(renderer.query(layer).is_ok());
    }

    #[test]
    fn test_destroyed_texture_is_unknown() {
        let mut renderer = SoftwareRenderer::new(Size::new(4, 4));
        let layer = renderer.create_target(Size::new(2, 2)).unwrap();
        renderer.set_target(Some(layer)).unwrap();
        renderer.destroy_texture(layer);

        assert_eq!(renderer.query(layer), Err(RenderError::UnknownTexture(layer)));
        assert_eq!(
            renderer.set_target(Some(layer)),
            Err(RenderError::UnknownTexture(layer))
        );
        // Destroying the active target falls back to the screen
        assert!(renderer.clear(Rgba::BLACK).is_ok());
        assert_eq!(renderer.texture_count(), 0);
    }

    #[test]
    fn test_present_snapshots_screen() {
        let mut renderer = SoftwareRenderer::new(Size::new(1, 1));
        renderer.clear(Rgba::WHITE).unwrap();
        assert_eq!(renderer.front_buffer().pixel(0, 0), Some(Rgba::BLACK));
        renderer.present().unwrap();
        renderer.clear(Rgba::BLACK).unwrap();
        assert_eq!(renderer.front_buffer().pixel(0, 0), Some(Rgba::WHITE));
    }

    #[test]
    fn test_resize_output() {
        let mut renderer = SoftwareRenderer::new(Size::new(2, 2));
        renderer.resize_output(Size::new(3, 1));
        assert_eq!(renderer.output_size(), Size::new(3, 1));
        assert_eq!(renderer.front_buffer().size(), Size::new(3, 1));
    }
}
