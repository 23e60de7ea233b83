//! # Info Layer
//!
//! The time in large type with the date underneath, centered in the middle of
//! the screen.
//!
//! The font is referenced by path and opened by the rasterizer on every
//! redraw. Redraws happen once a minute, so there is nothing to cache.

use crate::assets::TextRasterizer;
use crate::backend::{RenderBackend, TextureId};
use crate::canvas::Rgba;
use crate::clock::ClockReading;
use crate::component::{ComponentError, LayerSurface, VisualComponent};
use crate::diagnostics::Diagnostics;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use std::path::PathBuf;
use std::rc::Rc;

pub const DEFAULT_TIME_POINT_SIZE: u32 = 156;
pub const DEFAULT_DATE_POINT_SIZE: u32 = 48;

/// Position the time and date blocks inside a layer of `layer` size.
///
/// Each block is clamped to the layer width and half the layer height, centered
/// horizontally, and the pair is centered vertically with the date directly
/// below the time.
pub fn stack_layout(layer: Size, time: Size, date: Size) -> (Rectangle, Rectangle) {
    let clamp = |block: Size| {
        Size::new(
            block.width.min(layer.width),
            block.height.min(layer.height / 2),
        )
    };
    let time = clamp(time);
    let date = clamp(date);

    let half_width = (layer.width / 2) as i32;
    let half_height = (layer.height / 2) as i32;

    let time_top_left = Point::new(
        half_width - (time.width / 2) as i32,
        half_height - ((time.height + date.height) / 2) as i32,
    );
    let date_top_left = Point::new(
        half_width - (date.width / 2) as i32,
        time_top_left.y + time.height as i32,
    );

    (
        Rectangle::new(time_top_left, time),
        Rectangle::new(date_top_left, date),
    )
}

pub struct InfoLayer {
    surface: LayerSurface,
    font_path: PathBuf,
    time_point_size: u32,
    date_point_size: u32,
    rasterizer: Rc<dyn TextRasterizer>,
    diagnostics: Diagnostics,
}

impl InfoLayer {
    pub fn new(
        backend: &mut dyn RenderBackend,
        placement: Rectangle,
        font_path: PathBuf,
        rasterizer: Rc<dyn TextRasterizer>,
        diagnostics: Diagnostics,
    ) -> Result<Self, ComponentError> {
        // An unusable font is fatal here; later render failures only leave stale text
        rasterizer.check_font(&font_path)?;

        Ok(Self {
            surface: LayerSurface::new(backend, placement)?,
            font_path,
            time_point_size: DEFAULT_TIME_POINT_SIZE,
            date_point_size: DEFAULT_DATE_POINT_SIZE,
            rasterizer,
            diagnostics,
        })
    }

    /// Override the point sizes used for the time and date lines.
    pub fn with_point_sizes(mut self, time: u32, date: u32) -> Self {
        self.time_point_size = time;
        self.date_point_size = date;
        self
    }

    /// Rasterize `text` and upload it as a temporary texture.
    fn string_texture(
        &self,
        backend: &mut dyn RenderBackend,
        text: &str,
        point_size: u32,
    ) -> Result<TextureId, String> {
        let pixels = self
            .rasterizer
            .render(&self.font_path, point_size, text, Rgb888::WHITE)
            .map_err(|e| e.to_string())?;
        backend
            .create_texture(pixels)
            .map_err(|e| format!("failed to create texture for {text:?}: {e}"))
    }

    fn redraw(&self, backend: &mut dyn RenderBackend, target: TextureId, reading: &ClockReading) {
        let time = match self.string_texture(backend, &reading.time_string(), self.time_point_size)
        {
            Ok(texture) => texture,
            Err(e) => {
                self.diagnostics.error(e);
                return;
            }
        };
        let date = match self.string_texture(backend, &reading.date_string(), self.date_point_size)
        {
            Ok(texture) => texture,
            Err(e) => {
                backend.destroy_texture(time);
                self.diagnostics.error(e);
                return;
            }
        };

        self.compose(backend, target, time, date);

        backend.destroy_texture(time);
        backend.destroy_texture(date);
        if let Err(e) = backend.set_target(None) {
            self.diagnostics
                .error(format!("Failed to reset render target: {e}"));
        }
    }

    fn compose(
        &self,
        backend: &mut dyn RenderBackend,
        target: TextureId,
        time: TextureId,
        date: TextureId,
    ) {
        let (time_size, date_size) = match (backend.query(time), backend.query(date)) {
            (Ok(time_size), Ok(date_size)) => (time_size, date_size),
            (Err(e), _) | (_, Err(e)) => {
                self.diagnostics
                    .error(format!("Failed to query text textures: {e}"));
                return;
            }
        };

        if let Err(e) = backend.set_target(Some(target)) {
            self.diagnostics
                .error(format!("Failed to select info target: {e}"));
            return;
        }
        if let Err(e) = backend.clear(Rgba::TRANSPARENT) {
            self.diagnostics
                .error(format!("Failed to clear info target: {e}"));
        }

        let (time_rect, date_rect) =
            stack_layout(self.surface.placement().size, time_size, date_size);
        let drawn = backend
            .copy(time, &time_rect, None)
            .and_then(|_| backend.copy(date, &date_rect, None));
        if let Err(e) = drawn {
            self.diagnostics
                .error(format!("Failed to draw text textures: {e}"));
        }
    }
}

impl VisualComponent for InfoLayer {
    fn update(&mut self, backend: &mut dyn RenderBackend, reading: &ClockReading) {
        if !self.surface.begin_redraw(reading.minutes()) {
            return;
        }
        match self.surface.target() {
            Some(target) => self.redraw(backend, target, reading),
            None => self.diagnostics.error("Info target texture missing"),
        }
    }

    fn target(&self) -> Option<TextureId> {
        self.surface.target()
    }

    fn placement(&self) -> Rectangle {
        self.surface.placement()
    }

    fn release(mut self: Box<Self>, backend: &mut dyn RenderBackend) {
        self.surface.release(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SoftwareRenderer;
    use crate::diagnostics::MemorySink;
    use crate::tests::support::{BlockRasterizer, CountingBackend};
    use std::sync::Arc;

    fn build(
        backend: &mut dyn RenderBackend,
        size: Size,
        rasterizer: Rc<BlockRasterizer>,
    ) -> (InfoLayer, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let layer = InfoLayer::new(
            backend,
            Rectangle::new(Point::new(100, 100), size),
            PathBuf::from("/var/mrh/mrangeui/Font.ttf"),
            rasterizer,
            Diagnostics::new(sink.clone()),
        )
        .unwrap();
        (layer, sink)
    }

    #[test]
    fn test_layout_centers_stack() {
        let (time, date) = stack_layout(
            Size::new(400, 300),
            Size::new(200, 100),
            Size::new(100, 40),
        );
        assert_eq!(time, Rectangle::new(Point::new(100, 80), Size::new(200, 100)));
        assert_eq!(date, Rectangle::new(Point::new(150, 180), Size::new(100, 40)));
    }

    #[test]
    fn test_layout_clamps_oversized_text() {
        let (time, date) = stack_layout(
            Size::new(400, 300),
            Size::new(900, 200),
            Size::new(100, 40),
        );
        assert_eq!(time.size, Size::new(400, 150), "clamped to width and half height");
        assert_eq!(time.top_left, Point::new(0, 55));
        assert_eq!(date.top_left, Point::new(150, 205));
    }

    #[test]
    fn test_missing_font_fails_construction() {
        let mut backend = SoftwareRenderer::new(Size::new(800, 600));
        let rasterizer = Rc::new(BlockRasterizer::without_font());
        let result = InfoLayer::new(
            &mut backend,
            Rectangle::new(Point::new(100, 100), Size::new(400, 300)),
            PathBuf::from("/nonexistent/Font.ttf"),
            rasterizer.clone(),
            Diagnostics::new(Arc::new(MemorySink::default())),
        );

        assert!(matches!(result, Err(ComponentError::Font(_))));
        assert_eq!(backend.texture_count(), 0, "no target left behind");
        assert!(rasterizer.calls().is_empty(), "nothing rendered");
    }

    #[test]
    fn test_renders_time_and_date_with_configured_sizes() {
        let mut backend = SoftwareRenderer::new(Size::new(800, 600));
        let rasterizer = Rc::new(BlockRasterizer::default());
        let (layer, sink) = build(&mut backend, Size::new(400, 300), rasterizer.clone());
        let mut layer = layer.with_point_sizes(60, 20);

        layer.update(&mut backend, &ClockReading::new(12, 30, 15, 6, 2022));

        assert!(sink.errors().is_empty(), "unexpected errors: {:?}", sink.errors());
        assert_eq!(
            rasterizer.calls(),
            vec![(60, "12:30".to_string()), (20, "15.06.2022".to_string())]
        );
        // Only the layer target survives; temporaries are destroyed
        assert_eq!(backend.texture_count(), 1);

        let pixels = backend.texture_pixels(layer.target().unwrap()).unwrap();
        assert_eq!(pixels.pixel(200, 150), Some(Rgba::WHITE), "text block at the center");
        assert_eq!(pixels.pixel(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_same_minute_renders_once() {
        let mut backend = SoftwareRenderer::new(Size::new(800, 600));
        let rasterizer = Rc::new(BlockRasterizer::default());
        let (mut layer, _) = build(&mut backend, Size::new(400, 300), rasterizer.clone());

        layer.update(&mut backend, &ClockReading::new(12, 30, 15, 6, 2022));
        layer.update(&mut backend, &ClockReading::new(12, 30, 15, 6, 2022));
        assert_eq!(rasterizer.calls().len(), 2);

        layer.update(&mut backend, &ClockReading::new(12, 31, 15, 6, 2022));
        assert_eq!(rasterizer.calls().len(), 4);
    }

    #[test]
    fn test_render_failure_keeps_previous_content() {
        let mut backend = SoftwareRenderer::new(Size::new(800, 600));
        let rasterizer = Rc::new(BlockRasterizer::default());
        let (mut layer, sink) = build(&mut backend, Size::new(400, 300), rasterizer.clone());

        layer.update(&mut backend, &ClockReading::new(12, 30, 15, 6, 2022));
        let before = backend
            .texture_pixels(layer.target().unwrap())
            .unwrap()
            .clone();

        // The date fails after the time texture was already created
        rasterizer.fail_on("15.06.2022");
        layer.update(&mut backend, &ClockReading::new(12, 31, 15, 6, 2022));

        assert_eq!(sink.errors().len(), 1);
        assert_eq!(backend.texture_count(), 1, "temporary time texture leaked");
        let after = backend.texture_pixels(layer.target().unwrap()).unwrap();
        assert_eq!(after, &before, "target must not be touched");
    }

    #[test]
    fn test_query_failure_is_logged() {
        let mut backend = CountingBackend::new(Size::new(800, 600));
        let rasterizer = Rc::new(BlockRasterizer::default());
        let (mut layer, sink) = build(&mut backend, Size::new(400, 300), rasterizer);

        backend.fail_all_queries(true);
        layer.update(&mut backend, &ClockReading::new(12, 30, 15, 6, 2022));

        let errors = sink.errors();
        assert_eq!(errors.len(), 1, "errors: {errors:?}");
        assert!(errors[0].contains("Failed to query text textures"));
        assert_eq!(backend.inner().texture_count(), 1);
    }
}
