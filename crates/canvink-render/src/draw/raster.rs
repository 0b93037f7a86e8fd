//! Image elements.

use super::DrawEnv;
use super::shape::{closed_polygon, polygon_path, star_path};
use crate::context::{DrawContext, Shadow, TextBaseline};
use canvink_core::{CanvasElement, ClipShape, FontSpec, ImageData, ImageFilters, TextAlign};
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape, Size, Vec2};
use peniko::Color;

/// Outline of a named clip shape filling `rect`.
pub fn clip_shape_path(shape: ClipShape, rect: Rect) -> BezPath {
    match shape {
        ClipShape::Rectangle => rect.to_path(0.1),
        ClipShape::Circle => {
            Circle::new(rect.center(), rect.width().min(rect.height()) / 2.0).to_path(0.1)
        }
        ClipShape::Ellipse => Ellipse::from_rect(rect).to_path(0.1),
        ClipShape::Triangle => closed_polygon(&[
            Point::new(rect.center().x, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]),
        ClipShape::Diamond => closed_polygon(&[
            Point::new(rect.center().x, rect.y0),
            Point::new(rect.x1, rect.center().y),
            Point::new(rect.center().x, rect.y1),
            Point::new(rect.x0, rect.center().y),
        ]),
        ClipShape::Star => star_path(rect, 5, 0.4),
        ClipShape::Pentagon => polygon_path(rect, 5),
        ClipShape::Hexagon => polygon_path(rect, 6),
        ClipShape::Heart => heart_path(rect),
    }
}

fn heart_path(rect: Rect) -> BezPath {
    let (x, y, w, h) = (rect.x0, rect.y0, rect.width(), rect.height());
    let mut path = BezPath::new();
    path.move_to((x + w / 2.0, y + h * 0.3));
    path.curve_to((x + w / 2.0, y), (x, y), (x, y + h * 0.3));
    path.curve_to((x, y + h * 0.6), (x + w / 2.0, y + h * 0.8), (x + w / 2.0, y + h));
    path.curve_to((x + w / 2.0, y + h * 0.8), (x + w, y + h * 0.6), (x + w, y + h * 0.3));
    path.curve_to((x + w, y), (x + w / 2.0, y), (x + w / 2.0, y + h * 0.3));
    path.close_path();
    path
}

/// Frame with a crossed-out picture glyph, shown while a bitmap is missing.
pub fn draw_placeholder<C: DrawContext + ?Sized>(
    ctx: &mut C,
    frame: Rect,
    fill: Color,
    stroke: Color,
) {
    ctx.save();
    ctx.set_fill_color(fill);
    ctx.set_stroke_color(stroke);
    ctx.set_line_width(1.0);
    ctx.set_line_dash(&[]);
    ctx.fill_path(&frame.to_path(0.1));
    ctx.stroke_path(&frame.to_path(0.1));

    let glyph = frame.inset(-frame.width().min(frame.height()) * 0.25);
    if glyph.width() > 0.0 && glyph.height() > 0.0 {
        let mut cross = BezPath::new();
        cross.move_to(glyph.origin());
        cross.line_to((glyph.x1, glyph.y1));
        cross.move_to((glyph.x1, glyph.y0));
        cross.line_to((glyph.x0, glyph.y1));
        ctx.stroke_path(&glyph.to_path(0.1));
        ctx.stroke_path(&cross);
    }
    ctx.restore();
}

pub(super) fn draw_image_element<C: DrawContext + ?Sized>(
    ctx: &mut C,
    element: &CanvasElement,
    data: &ImageData,
    size: Size,
    env: &mut DrawEnv<'_>,
) {
    let scale = env.scale();
    let frame = Rect::from_origin_size(Point::ZERO, size);
    let outline = match data.clip {
        Some(shape) => Some(clip_shape_path(shape, frame)),
        None if data.corner_radius > 0.0 => {
            let radius = (data.corner_radius * scale).min(size.width / 2.0).min(size.height / 2.0);
            Some(RoundedRect::from_rect(frame, radius).to_path(0.1))
        }
        None => None,
    };

    env.images.request(element.id, &data.src);
    let bitmap = env.images.bitmap(element.id);

    ctx.save();
    if let Some(outline) = &outline {
        ctx.clip(outline);
    }
    match bitmap {
        Some(bitmap) => {
            ctx.set_filters(ImageFilters {
                blur: data.filters.blur * scale,
                ..data.filters
            });
            ctx.draw_image(&bitmap, frame);
        }
        None => draw_placeholder(
            ctx,
            frame,
            env.config.placeholder_fill.into(),
            env.config.placeholder_stroke.into(),
        ),
    }
    ctx.restore();

    let border_path = outline.unwrap_or_else(|| frame.to_path(0.1));
    match &data.border {
        Some(border) => {
            ctx.save();
            ctx.set_stroke_color(border.color.into());
            ctx.set_line_width(border.width * scale);
            let dash: Vec<f64> = border
                .dash
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|d| d * scale)
                .collect();
            ctx.set_line_dash(&dash);
            ctx.stroke_path(&border_path);
            ctx.restore();
        }
        None if element.style.stroke.is_some() => ctx.stroke_path(&border_path),
        None => {}
    }

    if let Some(overlay) = &data.overlay {
        ctx.save();
        let font = FontSpec {
            size: overlay.font_size * scale,
            ..ctx.state().font.clone()
        };
        ctx.set_font(font);
        ctx.set_fill_color(overlay.color.into());
        ctx.set_text_align(TextAlign::Center);
        ctx.set_text_baseline(TextBaseline::Middle);
        if overlay.shadow {
            ctx.set_shadow(Some(Shadow {
                color: Color::from_rgba8(0, 0, 0, 128),
                offset: Vec2::new(2.0, 2.0),
                blur: 4.0,
            }));
        }
        let anchor = Point::new(
            size.width * overlay.x_percent / 100.0,
            size.height * overlay.y_percent / 100.0,
        );
        ctx.fill_text(&overlay.text, anchor);
        ctx.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::images::{ImageFetcher, ImageLoadError, ImageLoader};
    use crate::recording::{DrawOp, RecordingContext};
    use canvink_core::{
        CoordinateTransformer, ElementData, ImageBorder, ImageOverlay, SerializableColor, Viewport,
    };
    use std::sync::Arc;
    use std::time::Duration;

    struct SolidFetcher;

    impl ImageFetcher for SolidFetcher {
        fn fetch(&self, src: &str) -> Result<Vec<u8>, ImageLoadError> {
            if src == "missing" {
                return Err(ImageLoadError::NotFound(src.to_string()));
            }
            let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
            let mut bytes = Vec::new();
            img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            Ok(bytes)
        }
    }

    fn render(element: &CanvasElement, images: &mut ImageLoader) -> RecordingContext {
        let config = RenderConfig::default();
        let transformer = CoordinateTransformer::new(Viewport::new(200, 200).with_scale(2.0));
        let mut env = DrawEnv::new(transformer, images, &config);
        let ElementData::Image(data) = &element.data else {
            panic!("not an image element");
        };
        let size = transformer.virtual_size_to_screen(element.size);
        let mut ctx = RecordingContext::new(200, 200);
        draw_image_element(&mut ctx, element, data, size, &mut env);
        ctx
    }

    #[test]
    fn test_placeholder_then_bitmap() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut images = ImageLoader::new(Arc::new(SolidFetcher));
        let element = CanvasElement::image("photo.png", Point::ZERO, Size::new(50.0, 30.0));

        let first = render(&element, &mut images);
        assert!(first.ops().iter().all(|op| !matches!(op, DrawOp::Image { .. })));
        assert!(first.ops().iter().any(|op| matches!(op, DrawOp::Fill { .. })));

        assert!(images.wait(element.id, Duration::from_secs(5)).is_loaded());
        let second = render(&element, &mut images);
        match second.ops().iter().find(|op| matches!(op, DrawOp::Image { .. })) {
            Some(DrawOp::Image { width, dest, .. }) => {
                assert_eq!(*width, 4);
                assert_eq!(*dest, Rect::new(0.0, 0.0, 100.0, 60.0));
            }
            other => panic!("expected image op, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_load_keeps_placeholder() {
        let mut images = ImageLoader::new(Arc::new(SolidFetcher));
        let element = CanvasElement::image("missing", Point::ZERO, Size::new(10.0, 10.0));
        render(&element, &mut images);
        assert!(!images.wait(element.id, Duration::from_secs(5)).is_loaded());

        let ctx = render(&element, &mut images);
        assert!(ctx.ops().iter().all(|op| !matches!(op, DrawOp::Image { .. })));
    }

    #[test]
    fn test_clip_border_and_overlay() {
        let mut images = ImageLoader::new(Arc::new(SolidFetcher));
        let mut element = CanvasElement::image("photo.png", Point::ZERO, Size::new(40.0, 40.0));
        if let ElementData::Image(data) = &mut element.data {
            data.clip = Some(ClipShape::Circle);
            data.border = Some(ImageBorder {
                width: 3.0,
                color: SerializableColor::rgb(255, 0, 0),
                dash: Some(vec![2.0, 1.0]),
            });
            data.overlay = Some(ImageOverlay {
                text: "caption".to_string(),
                x_percent: 50.0,
                y_percent: 90.0,
                font_size: 12.0,
                color: SerializableColor::white(),
                shadow: true,
            });
        }

        let ctx = render(&element, &mut images);
        let ops = ctx.ops();
        assert!(matches!(ops.first(), Some(DrawOp::Clip { .. })));
        assert!(ops.iter().any(|op| matches!(
            op,
            DrawOp::Stroke { width, dash, .. }
                if (*width - 6.0).abs() < 1e-9 && dash == &vec![4.0, 2.0]
        )));
        match ops.last() {
            Some(DrawOp::Text { text, origin, font, .. }) => {
                assert_eq!(text, "caption");
                assert!((origin.x - 40.0).abs() < 1e-9);
                assert!((origin.y - 72.0).abs() < 1e-9);
                assert!((font.size - 24.0).abs() < 1e-9);
            }
            other => panic!("expected overlay text, got {other:?}"),
        }
        assert_eq!(ctx.state().shadow, None);
    }

    #[test]
    fn test_clip_shapes_fit_rect() {
        let rect = Rect::new(0.0, 0.0, 90.0, 60.0);
        for shape in [
            ClipShape::Rectangle,
            ClipShape::Circle,
            ClipShape::Ellipse,
            ClipShape::Triangle,
            ClipShape::Diamond,
            ClipShape::Star,
            ClipShape::Pentagon,
            ClipShape::Hexagon,
            ClipShape::Heart,
        ] {
            let bbox = clip_shape_path(shape, rect).bounding_box();
            assert!(bbox.x0 >= -0.1 && bbox.y0 >= -0.1, "{shape:?}: {bbox:?}");
            assert!(bbox.x1 <= 90.1 && bbox.y1 <= 60.1, "{shape:?}: {bbox:?}");
        }
    }

    #[test]
    fn test_placeholder_draws_frame_and_glyph() {
        let mut ctx = RecordingContext::new(100, 100);
        let fill = Color::from_rgba8(240, 240, 240, 255);
        let stroke = Color::from_rgba8(160, 160, 160, 255);
        draw_placeholder(&mut ctx, Rect::new(0.0, 0.0, 40.0, 40.0), fill, stroke);
        assert_eq!(ctx.ops().len(), 4);
        assert_eq!(ctx.save_depth(), 0);
    }
}
