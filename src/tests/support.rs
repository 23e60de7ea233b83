//! Test doubles shared by the unit tests and the frame scenarios.

use crate::assets::{AssetError, ImageLoader, TextError, TextRasterizer};
use crate::backend::{RenderBackend, RenderError, SoftwareRenderer, TextureId};
use crate::canvas::{Canvas, Rgba};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;

/// Software renderer that counts calls and fails on demand.
pub(crate) struct CountingBackend {
    inner: SoftwareRenderer,
    created: Vec<TextureId>,
    queries: Cell<usize>,
    copies: usize,
    presents: usize,
    fail_targets: bool,
    fail_all_queries: bool,
    failing_queries: HashSet<TextureId>,
    failing_copies: HashSet<TextureId>,
}

impl CountingBackend {
    pub(crate) fn new(size: Size) -> Self {
        Self {
            inner: SoftwareRenderer::new(size),
            created: Vec::new(),
            queries: Cell::new(0),
            copies: 0,
            presents: 0,
            fail_targets: false,
            fail_all_queries: false,
            failing_queries: HashSet::new(),
            failing_copies: HashSet::new(),
        }
    }

    pub(crate) fn inner(&self) -> &SoftwareRenderer {
        &self.inner
    }

    pub(crate) fn inner_mut(&mut self) -> &mut SoftwareRenderer {
        &mut self.inner
    }

    /// Every handle issued so far, targets and textures alike, in order.
    pub(crate) fn created(&self) -> &[TextureId] {
        &self.created
    }

    pub(crate) fn queries(&self) -> usize {
        self.queries.get()
    }

    pub(crate) fn copies(&self) -> usize {
        self.copies
    }

    pub(crate) fn presents(&self) -> usize {
        self.presents
    }

    pub(crate) fn fail_target_creation(&mut self, fail: bool) {
        self.fail_targets = fail;
    }

    pub(crate) fn fail_all_queries(&mut self, fail: bool) {
        self.fail_all_queries = fail;
    }

    pub(crate) fn fail_query(&mut self, texture: TextureId) {
        self.failing_queries.insert(texture);
    }

    pub(crate) fn fail_copy(&mut self, texture: TextureId) {
        self.failing_copies.insert(texture);
    }
}

impl RenderBackend for CountingBackend {
    fn output_size(&self) -> Size {
        self.inner.output_size()
    }

    fn create_target(&mut self, size: Size) -> Result<TextureId, RenderError> {
        if self.fail_targets {
            return Err(RenderError::Backend("injected target failure".to_string()));
        }
        let id = self.inner.create_target(size)?;
        self.created.push(id);
        Ok(id)
    }

    fn create_texture(&mut self, pixels: Canvas) -> Result<TextureId, RenderError> {
        let id = self.inner.create_texture(pixels)?;
        self.created.push(id);
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.inner.destroy_texture(texture);
    }

    fn set_target(&mut self, target: Option<TextureId>) -> Result<(), RenderError> {
        self.inner.set_target(target)
    }

    fn clear(&mut self, color: Rgba) -> Result<(), RenderError> {
        self.inner.clear(color)
    }

    fn copy(
        &mut self,
        texture: TextureId,
        dest: &Rectangle,
        tint: Option<Rgb888>,
    ) -> Result<(), RenderError> {
        self.copies += 1;
        if self.failing_copies.contains(&texture) {
            return Err(RenderError::Backend("injected copy failure".to_string()));
        }
        self.inner.copy(texture, dest, tint)
    }

    fn query(&self, texture: TextureId) -> Result<Size, RenderError> {
        self.queries.set(self.queries.get() + 1);
        if self.fail_all_queries || self.failing_queries.contains(&texture) {
            return Err(RenderError::Backend("injected query failure".to_string()));
        }
        self.inner.query(texture)
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.presents += 1;
        self.inner.present()
    }
}

/// Image loader that hands out solid sprites by file name.
///
/// The background and foregrounds are white or grey so the tint shows
/// through; the sun and moon carry their own colors.
#[derive(Default)]
pub(crate) struct ScriptedLoader {
    failing: Option<&'static str>,
    loaded: RefCell<Vec<String>>,
}

impl ScriptedLoader {
    pub(crate) const SUN_COLOR: Rgb888 = Rgb888::new(255, 220, 40);
    pub(crate) const MOON_COLOR: Rgb888 = Rgb888::new(210, 210, 230);
    pub(crate) const FOREGROUND_COLOR: Rgb888 = Rgb888::new(40, 80, 40);

    /// A loader that fails for the asset named `name`.
    pub(crate) fn failing(name: &'static str) -> Self {
        Self {
            failing: Some(name),
            loaded: RefCell::new(Vec::new()),
        }
    }

    /// Every path requested so far.
    pub(crate) fn loaded(&self) -> Vec<String> {
        self.loaded.borrow().clone()
    }
}

impl ImageLoader for ScriptedLoader {
    fn load(&self, path: &Path) -> Result<Canvas, AssetError> {
        self.loaded.borrow_mut().push(path.display().to_string());

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if self.failing == Some(name) {
            return Err(AssetError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let canvas = match name {
            "Background.png" => Canvas::new(8, 6, Rgba::WHITE),
            "Foreground_Left.png" => Canvas::new(20, 10, Rgba::opaque(Self::FOREGROUND_COLOR)),
            "Foreground_Right.png" => Canvas::new(30, 15, Rgba::opaque(Self::FOREGROUND_COLOR)),
            "Sun.png" => Canvas::new(10, 10, Rgba::opaque(Self::SUN_COLOR)),
            "Moon.png" => Canvas::new(6, 6, Rgba::opaque(Self::MOON_COLOR)),
            _ => return Err(AssetError::Unsupported(path.to_path_buf())),
        };
        Ok(canvas)
    }
}

/// Text rasterizer that renders each string as a solid block.
///
/// A string of `n` characters at point size `p` becomes an `n * p / 2` by `p`
/// block, so layouts are easy to predict.
#[derive(Default)]
pub(crate) struct BlockRasterizer {
    missing_font: bool,
    fail_on: RefCell<Option<String>>,
    calls: RefCell<Vec<(u32, String)>>,
}

impl BlockRasterizer {
    pub(crate) fn block_size(text: &str, point_size: u32) -> Size {
        Size::new(text.chars().count() as u32 * point_size / 2, point_size)
    }

    /// A rasterizer whose font cannot be opened at all.
    pub(crate) fn without_font() -> Self {
        Self {
            missing_font: true,
            ..Self::default()
        }
    }

    pub(crate) fn fail_on(&self, text: &str) {
        *self.fail_on.borrow_mut() = Some(text.to_string());
    }

    /// `(point size, text)` of every render request so far.
    pub(crate) fn calls(&self) -> Vec<(u32, String)> {
        self.calls.borrow().clone()
    }
}

impl TextRasterizer for BlockRasterizer {
    fn check_font(&self, font_path: &Path) -> Result<(), TextError> {
        if self.missing_font {
            return Err(TextError::Render {
                text: String::new(),
                reason: format!("no font at {}", font_path.display()),
            });
        }
        Ok(())
    }

    fn render(
        &self,
        _font_path: &Path,
        point_size: u32,
        text: &str,
        color: Rgb888,
    ) -> Result<Canvas, TextError> {
        self.calls
            .borrow_mut()
            .push((point_size, text.to_string()));

        if self.fail_on.borrow().as_deref() == Some(text) {
            return Err(TextError::Render {
                text: text.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        let size = Self::block_size(text, point_size);
        Ok(Canvas::new(size.width, size.height, Rgba::opaque(color)))
    }
}
