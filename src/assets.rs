//! # Image and Text Sources
//!
//! Decoding image files and rasterizing text are outside the compositing
//! core; layers reach them through two small traits:
//!
//! - [`ImageLoader`]: path → RGBA [`Canvas`]
//! - [`TextRasterizer`]: font path + point size + string → RGBA [`Canvas`]
//!
//! The bundled implementations decode PNG through `tiny-skia` (re-exported by
//! `resvg`), rasterize SVG through `usvg`/`resvg`, and render glyph runs with
//! FreeType.

use crate::canvas::{Canvas, Rgba};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use freetype::bitmap::PixelMode;
use freetype::face::LoadFlag;
use freetype::Library;
use resvg::tiny_skia;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while decoding an image asset.
#[derive(Error, Debug)]
pub enum AssetError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but could not be decoded
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The file extension is not a supported image format
    #[error("unsupported image format: {0}")]
    Unsupported(PathBuf),
}

/// Errors raised while rasterizing text.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("failed to load font file {path}: {source}")]
    FontOpen {
        path: PathBuf,
        #[source]
        source: freetype::Error,
    },

    #[error("failed to render text {text:?}: {reason}")]
    Render { text: String, reason: String },
}

/// Decodes an image file into pixels.
pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<Canvas, AssetError>;
}

/// Renders a UTF-8 string into pixels in a single solid color.
///
/// Implementations open the font for every call; callers that redraw rarely
/// do not need to cache font handles.
pub trait TextRasterizer {
    /// Open and close the font once, without rendering anything.
    fn check_font(&self, font_path: &Path) -> Result<(), TextError>;

    fn render(
        &self,
        font_path: &Path,
        point_size: u32,
        text: &str,
        color: Rgb888,
    ) -> Result<Canvas, TextError>;
}

/// PNG and SVG loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct RasterImageLoader;

impl RasterImageLoader {
    fn load_png(path: &Path) -> Result<tiny_skia::Pixmap, AssetError> {
        let data = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tiny_skia::Pixmap::decode_png(&data).map_err(|e| AssetError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn load_svg(path: &Path) -> Result<tiny_skia::Pixmap, AssetError> {
        use usvg::TreeParsing;

        let decode_error = |reason: String| AssetError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let data = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
            .map_err(|e| decode_error(e.to_string()))?;
        let rtree = resvg::Tree::from_usvg(&tree);

        // Rasterize at the document's native size
        let svg_size = rtree.view_box.rect.size();
        let width = svg_size.width().ceil() as u32;
        let height = svg_size.height().ceil() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| decode_error(format!("empty document ({width}x{height})")))?;
        rtree.render(tiny_skia::Transform::default(), &mut pixmap.as_mut());
        Ok(pixmap)
    }
}

/// Convert a premultiplied `tiny-skia` pixmap into a straight-alpha canvas.
fn pixmap_to_canvas(pixmap: &tiny_skia::Pixmap) -> Option<Canvas> {
    let pixels = pixmap
        .pixels()
        .iter()
        .map(|p| {
            let c = p.demultiply();
            Rgba::new(c.red(), c.green(), c.blue(), c.alpha())
        })
        .collect();
    Canvas::from_pixels(pixmap.width(), pixmap.height(), pixels)
}

impl ImageLoader for RasterImageLoader {
    fn load(&self, path: &Path) -> Result<Canvas, AssetError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let pixmap = match extension.as_deref() {
            Some("png") => Self::load_png(path)?,
            Some("svg") => Self::load_svg(path)?,
            _ => return Err(AssetError::Unsupported(path.to_path_buf())),
        };

        pixmap_to_canvas(&pixmap).ok_or_else(|| AssetError::Decode {
            path: path.to_path_buf(),
            reason: "pixel buffer does not match image size".to_string(),
        })
    }
}

/// FreeType glyph-run renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct FreetypeRasterizer;

/// A rendered glyph waiting to be placed on the line.
struct Glyph {
    left: i32,
    top: i32,
    width: i32,
    rows: i32,
    pitch: i32,
    coverage: Vec<u8>,
    advance: i32,
}

/// Canvas bounds for a glyph run.
///
/// Covers the advance box of the line and the ink of every glyph, so
/// overhanging glyphs (italic "f", "j") are not clipped at either end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineExtent {
    width: u32,
    height: u32,
    /// Canvas column of the pen's starting position
    origin_x: i32,
    /// Canvas row of the baseline
    baseline: i32,
}

impl LineExtent {
    fn measure(glyphs: &[Glyph], ascender: i32, descender: i32) -> Self {
        let (mut min_x, mut max_x) = (0, 0);
        let (mut min_y, mut max_y) = (-ascender, -descender);

        let mut pen_x = 0;
        for glyph in glyphs {
            if glyph.width > 0 && glyph.rows > 0 {
                min_x = min_x.min(pen_x + glyph.left);
                max_x = max_x.max(pen_x + glyph.left + glyph.width);
                min_y = min_y.min(-glyph.top);
                max_y = max_y.max(glyph.rows - glyph.top);
            }
            pen_x += glyph.advance;
        }
        max_x = max_x.max(pen_x);

        LineExtent {
            width: (max_x - min_x).max(1) as u32,
            height: (max_y - min_y).max(1) as u32,
            origin_x: -min_x,
            baseline: -min_y,
        }
    }
}

impl FreetypeRasterizer {
    /// Start FreeType and open the face at `font_path`.
    fn open_face(font_path: &Path) -> Result<(Library, freetype::Face), TextError> {
        let open_error = |source| TextError::FontOpen {
            path: font_path.to_path_buf(),
            source,
        };
        let library = Library::init().map_err(open_error)?;
        let face = library.new_face(font_path, 0).map_err(open_error)?;
        Ok((library, face))
    }
}

impl TextRasterizer for FreetypeRasterizer {
    fn check_font(&self, font_path: &Path) -> Result<(), TextError> {
        let (_library, _face) = Self::open_face(font_path)?;
        Ok(())
    }

    fn render(
        &self,
        font_path: &Path,
        point_size: u32,
        text: &str,
        color: Rgb888,
    ) -> Result<Canvas, TextError> {
        let render_error = |reason: String| TextError::Render {
            text: text.to_string(),
            reason,
        };
        // Library and face are dropped (closed) when this call returns
        let (_library, face) = Self::open_face(font_path)?;
        face.set_pixel_sizes(0, point_size)
            .map_err(|e| render_error(e.to_string()))?;

        let (ascender, descender) = face
            .size_metrics()
            .map(|m| ((m.ascender >> 6) as i32, (m.descender >> 6) as i32))
            .unwrap_or((point_size as i32, 0));

        let mut glyphs = Vec::with_capacity(text.len());
        for ch in text.chars() {
            face.load_char(ch as usize, LoadFlag::RENDER)
                .map_err(|e| render_error(format!("glyph {ch:?}: {e}")))?;
            let slot = face.glyph();
            let bitmap = slot.bitmap();
            let gray = matches!(bitmap.pixel_mode(), Ok(PixelMode::Gray));
            glyphs.push(Glyph {
                left: slot.bitmap_left(),
                top: slot.bitmap_top(),
                width: if gray { bitmap.width() } else { 0 },
                rows: if gray { bitmap.rows() } else { 0 },
                pitch: bitmap.pitch(),
                coverage: if gray { bitmap.buffer().to_vec() } else { Vec::new() },
                advance: (slot.advance().x >> 6) as i32,
            });
        }

        let extent = LineExtent::measure(&glyphs, ascender, descender);
        let mut canvas = Canvas::new(extent.width, extent.height, Rgba::TRANSPARENT);

        let mut pen_x = extent.origin_x;
        for glyph in &glyphs {
            for row in 0..glyph.rows {
                for col in 0..glyph.width {
                    let Some(&alpha) = glyph.coverage.get((row * glyph.pitch.abs() + col) as usize)
                    else {
                        continue;
                    };
                    if alpha == 0 {
                        continue;
                    }
                    let x = pen_x + glyph.left + col;
                    let y = extent.baseline - glyph.top + row;
                    if x >= 0 && y >= 0 {
                        canvas.set_pixel(
                            x as u32,
                            y as u32,
                            Rgba::new(color.r(), color.g(), color.b(), alpha),
                        );
                    }
                }
            }
            pen_x += glyph.advance;
        }

        Ok(canvas)
    }
}
