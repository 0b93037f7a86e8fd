//! tiny-skia raster backend.
//!
//! [`SkiaSurface`] wraps a `tiny_skia::Pixmap` and keeps a stack of
//! `(DrawState, clip mask)` pairs for `save`/`restore`. Text is rendered from
//! glyph outlines of a single TrueType face when one is supplied.

use crate::context::{Bitmap, DrawContext, DrawState, Shadow, aligned_start, baseline_y};
use crate::renderer::RendererError;
use canvink_core::ImageFilters;
use kurbo::{Affine, BezPath, PathEl, Point, Rect};
use peniko::Color;
use std::sync::Arc;
use tiny_skia::{
    FillRule, FilterQuality, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Stroke, StrokeDash, Transform,
};

/// Advance used per character when no font face is loaded, in ems.
const FALLBACK_ADVANCE_EM: f64 = 0.6;

/// Filtered images kept per surface, most recently drawn last.
const IMAGE_CACHE_CAPACITY: usize = 16;

/// Font bytes plus the face index inside a collection.
#[derive(Debug, Clone)]
struct FontData {
    data: Arc<[u8]>,
    index: u32,
}

/// A bitmap after filtering and premultiplication, keyed by the source
/// pixel buffer and the filters in source pixels.
struct CachedImage {
    source: Bitmap,
    filters: ImageFilters,
    pixmap: Pixmap,
}

/// A [`DrawContext`] over a tiny-skia pixmap.
pub struct SkiaSurface {
    pixmap: Pixmap,
    state: DrawState,
    clip: Option<Mask>,
    stack: Vec<(DrawState, Option<Mask>)>,
    font: Option<FontData>,
    image_cache: Vec<CachedImage>,
}

impl std::fmt::Debug for SkiaSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkiaSurface")
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("depth", &self.stack.len())
            .field("clipped", &self.clip.is_some())
            .field("has_font", &self.font.is_some())
            .field("cached_images", &self.image_cache.len())
            .finish()
    }
}

impl SkiaSurface {
    /// Create a transparent surface.
    pub fn new(width: u32, height: u32) -> Result<Self, RendererError> {
        let pixmap = Pixmap::new(width, height)
            .ok_or(RendererError::InvalidSurfaceSize { width, height })?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            clip: None,
            stack: Vec::new(),
            font: None,
            image_cache: Vec::new(),
        })
    }

    /// Use the face at `index` of `data` for text rendering.
    pub fn with_font(mut self, data: Vec<u8>, index: u32) -> Result<Self, RendererError> {
        if let Err(err) = ttf_parser::Face::parse(&data, index) {
            return Err(RendererError::InitFailed(format!("invalid font face: {err}")));
        }
        self.font = Some(FontData {
            data: data.into(),
            index,
        });
        Ok(self)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Number of filtered images currently cached.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    /// Index of the cache entry for `bitmap` under `filters`, filtering and
    /// inserting it on a miss.
    fn cached_image(&mut self, bitmap: &Bitmap, filters: &ImageFilters) -> Option<usize> {
        let hit = self
            .image_cache
            .iter()
            .position(|c| c.source.same_pixels(bitmap) && c.filters == *filters);
        if let Some(index) = hit {
            let entry = self.image_cache.remove(index);
            self.image_cache.push(entry);
            return Some(self.image_cache.len() - 1);
        }

        let pixels = filtered_pixels(bitmap, filters);
        let pixmap = premultiplied_pixmap(bitmap.width(), bitmap.height(), &pixels)?;
        if self.image_cache.len() >= IMAGE_CACHE_CAPACITY {
            self.image_cache.remove(0);
        }
        self.image_cache.push(CachedImage {
            source: bitmap.clone(),
            filters: *filters,
            pixmap,
        });
        Some(self.image_cache.len() - 1)
    }

    fn skia_transform(&self) -> Transform {
        to_skia_transform(self.state.transform)
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let rgba = color.to_rgba8();
        let alpha = (f64::from(rgba.a) * self.state.global_alpha).round() as u8;
        let mut paint = Paint::default();
        paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, alpha);
        paint.anti_alias = true;
        paint
    }

    fn stroke(&self) -> Stroke {
        Stroke {
            width: self.state.line_width as f32,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash: stroke_dash(&self.state.line_dash),
            ..Default::default()
        }
    }

    /// Fill a device-space-offset copy of `path` with the shadow color.
    fn fill_shadow(&mut self, path: &tiny_skia::Path, shadow: Shadow) {
        let paint = self.paint(shadow.color);
        let transform = Transform::from_translate(shadow.offset.x as f32, shadow.offset.y as f32)
            .pre_concat(self.skia_transform());
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, self.clip.as_ref());
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        let font = self.font.as_ref()?;
        ttf_parser::Face::parse(&font.data, font.index).ok()
    }

    /// Glyph outlines for `text` starting at `origin` (baseline), in local
    /// units. Returns `None` without a font.
    fn text_path(&self, text: &str, origin: Point) -> Option<tiny_skia::Path> {
        let face = self.face()?;
        let scale = (self.state.font.size / f64::from(face.units_per_em())) as f32;
        let mut builder = GlyphPathBuilder::new(origin.x as f32, origin.y as f32, scale);
        for ch in text.chars() {
            let Some(glyph) = face.glyph_index(ch) else {
                builder.advance(self.state.font.size as f32 * FALLBACK_ADVANCE_EM as f32);
                continue;
            };
            face.outline_glyph(glyph, &mut builder);
            let advance = face.glyph_hor_advance(glyph).unwrap_or(0);
            builder.advance(f32::from(advance) * scale);
        }
        builder.finish()
    }
}

impl DrawContext for SkiaSurface {
    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.pixmap = Pixmap::new(width, height)
            .ok_or(RendererError::InvalidSurfaceSize { width, height })?;
        self.state = DrawState::default();
        self.clip = None;
        self.stack.clear();
        Ok(())
    }

    fn state(&self) -> &DrawState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DrawState {
        &mut self.state
    }

    fn save(&mut self) {
        self.stack.push((self.state.clone(), self.clip.clone()));
    }

    fn restore(&mut self) {
        if let Some((state, clip)) = self.stack.pop() {
            self.state = state;
            self.clip = clip;
        }
    }

    fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn fill_path(&mut self, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        if let Some(shadow) = self.state.shadow {
            self.fill_shadow(&path, shadow);
        }
        let paint = self.paint(self.state.fill_color);
        let transform = self.skia_transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, self.clip.as_ref());
    }

    fn stroke_path(&mut self, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let paint = self.paint(self.state.stroke_color);
        let stroke = self.stroke();
        let transform = self.skia_transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, self.clip.as_ref());
    }

    fn clip(&mut self, path: &BezPath) {
        let Some(path) = to_skia_path(path) else {
            return;
        };
        let transform = self.skia_transform();
        match self.clip.as_mut() {
            Some(mask) => mask.intersect_path(&path, FillRule::Winding, true, transform),
            None => {
                let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
                    return;
                };
                mask.fill_path(&path, FillRule::Winding, true, transform);
                self.clip = Some(mask);
            }
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point) {
        if text.is_empty() {
            return;
        }
        let width = self.measure_text(text);
        let x = aligned_start(origin.x, width, self.state.text_align);
        let y = baseline_y(origin.y, self.state.font.size, self.state.text_baseline);
        let Some(path) = self.text_path(text, Point::new(x, y)) else {
            log::trace!("No font face loaded, skipping text run of {} chars", text.len());
            return;
        };
        if let Some(shadow) = self.state.shadow {
            self.fill_shadow(&path, shadow);
        }
        let paint = self.paint(self.state.fill_color);
        let transform = self.skia_transform();
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, transform, self.clip.as_ref());
    }

    fn measure_text(&self, text: &str) -> f64 {
        let size = self.state.font.size;
        let Some(face) = self.face() else {
            return text.chars().count() as f64 * size * FALLBACK_ADVANCE_EM;
        };
        let scale = size / f64::from(face.units_per_em());
        text.chars()
            .map(|ch| match face.glyph_index(ch) {
                Some(glyph) => f64::from(face.glyph_hor_advance(glyph).unwrap_or(0)) * scale,
                None => size * FALLBACK_ADVANCE_EM,
            })
            .sum()
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dest: Rect) {
        if dest.is_zero_area() {
            return;
        }
        let filters = source_filters(&self.state.filters, bitmap, dest);
        let Some(index) = self.cached_image(bitmap, &filters) else {
            return;
        };
        let placement = self.state.transform
            * Affine::translate(dest.origin().to_vec2())
            * Affine::scale_non_uniform(
                dest.width() / f64::from(bitmap.width()),
                dest.height() / f64::from(bitmap.height()),
            );
        let paint = PixmapPaint {
            opacity: self.state.global_alpha as f32,
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            self.image_cache[index].pixmap.as_ref(),
            &paint,
            to_skia_transform(placement),
            self.clip.as_ref(),
        );
    }
}

fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Canvas-style dash: odd-length patterns are repeated once.
fn stroke_dash(dash: &[f64]) -> Option<StrokeDash> {
    if dash.is_empty() {
        return None;
    }
    let mut intervals: Vec<f32> = dash.iter().map(|d| *d as f32).collect();
    if intervals.len() % 2 == 1 {
        intervals.extend_from_within(..);
    }
    StrokeDash::new(intervals, 0.0)
}

fn premultiplied_pixmap(width: u32, height: u32, rgba: &[u8]) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        let a = u16::from(src[3]);
        let premul = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
        let (r, g, b) = (premul(src[0]), premul(src[1]), premul(src[2]));
        *dst = PremultipliedColorU8::from_rgba(r, g, b, src[3])?;
    }
    Some(pixmap)
}

/// `filters` with the blur converted from `dest` units into source pixels.
fn source_filters(filters: &ImageFilters, bitmap: &Bitmap, dest: Rect) -> ImageFilters {
    ImageFilters {
        blur: filters.blur * f64::from(bitmap.width()) / dest.width().abs(),
        ..*filters
    }
}

/// Box blur radius in pixels. Non-finite or non-positive blur disables it,
/// and the radius never exceeds `limit`.
fn blur_radius(blur: f64, limit: u32) -> usize {
    if !blur.is_finite() || blur <= 0.0 {
        return 0;
    }
    blur.round().min(f64::from(limit)) as usize
}

/// Apply grayscale, sepia, brightness and blur to straight RGBA pixels.
pub(crate) fn filtered_pixels(bitmap: &Bitmap, filters: &ImageFilters) -> Vec<u8> {
    let mut pixels = bitmap.pixels().to_vec();
    if filters.is_identity() {
        return pixels;
    }

    let grayscale = filters.grayscale.clamp(0.0, 1.0);
    let sepia = filters.sepia.clamp(0.0, 1.0);
    let brightness = filters.brightness.max(0.0);
    for px in pixels.chunks_exact_mut(4) {
        let (mut r, mut g, mut b) = (f64::from(px[0]), f64::from(px[1]), f64::from(px[2]));
        if grayscale > 0.0 {
            let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
            r += (luma - r) * grayscale;
            g += (luma - g) * grayscale;
            b += (luma - b) * grayscale;
        }
        if sepia > 0.0 {
            let sr = 0.393 * r + 0.769 * g + 0.189 * b;
            let sg = 0.349 * r + 0.686 * g + 0.168 * b;
            let sb = 0.272 * r + 0.534 * g + 0.131 * b;
            r += (sr - r) * sepia;
            g += (sg - g) * sepia;
            b += (sb - b) * sepia;
        }
        px[0] = (r * brightness).round().clamp(0.0, 255.0) as u8;
        px[1] = (g * brightness).round().clamp(0.0, 255.0) as u8;
        px[2] = (b * brightness).round().clamp(0.0, 255.0) as u8;
    }

    let radius = blur_radius(filters.blur, bitmap.width().max(bitmap.height()));
    if radius > 0 {
        box_blur(&mut pixels, bitmap.width() as usize, bitmap.height() as usize, radius);
    }
    pixels
}

/// Separable box blur over all four channels.
fn box_blur(pixels: &mut [u8], width: usize, height: usize, radius: usize) {
    let mut scratch = vec![0u8; pixels.len()];
    blur_pass(pixels, &mut scratch, width, height, radius, true);
    blur_pass(&scratch, pixels, width, height, radius, false);
}

fn blur_pass(
    src: &[u8],
    dst: &mut [u8],
    width: usize,
    height: usize,
    radius: usize,
    horizontal: bool,
) {
    let (outer, inner) = if horizontal { (height, width) } else { (width, height) };
    let index = |o: usize, i: usize| {
        if horizontal {
            (o * width + i) * 4
        } else {
            (i * width + o) * 4
        }
    };
    let mut prefix = vec![0u64; inner + 1];
    for o in 0..outer {
        for channel in 0..4 {
            for i in 0..inner {
                prefix[i + 1] = prefix[i] + u64::from(src[index(o, i) + channel]);
            }
            for i in 0..inner {
                let lo = i.saturating_sub(radius);
                let hi = i.saturating_add(radius).min(inner - 1);
                let count = (hi - lo + 1) as u64;
                let sum = prefix[hi + 1] - prefix[lo];
                dst[index(o, i) + channel] = ((sum + count / 2) / count) as u8;
            }
        }
    }
}

/// Collects glyph outlines into one path, advancing a pen along x.
struct GlyphPathBuilder {
    builder: PathBuilder,
    x: f32,
    y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(x: f32, y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            x,
            y,
            scale,
        }
    }

    fn advance(&mut self, dx: f32) {
        self.x += dx;
    }

    fn px(&self, gx: f32) -> f32 {
        self.x + gx * self.scale
    }

    fn py(&self, gy: f32) -> f32 {
        // Font units point up.
        self.y - gy * self.scale
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl ttf_parser::OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.px(x1), self.py(y1), self.px(x), self.py(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.px(x1), self.py(y1));
        let (x2, y2) = (self.px(x2), self.py(y2));
        let (x, y) = (self.px(x), self.py(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
