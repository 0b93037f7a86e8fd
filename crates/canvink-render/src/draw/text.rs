//! Multi-line text layout.

use crate::context::{DrawContext, TextBaseline, aligned_start};
use canvink_core::{TextAlign, TextContent, TextDecoration};
use kurbo::{BezPath, Point, Size};

/// Draw `content` inside a frame of `size`, with the context's current font
/// and fill color.
///
/// Lines are stacked `font.size * line_height` apart and the block is
/// centered vertically. Each line is anchored to the left edge, the middle,
/// or the right edge according to its alignment.
pub fn draw_text_block<C: DrawContext + ?Sized>(ctx: &mut C, content: &TextContent, size: Size) {
    let lines: Vec<&str> = content.lines().collect();
    if lines.is_empty() {
        return;
    }

    let font_size = ctx.state().font.size;
    let line_height = font_size * content.line_height;
    let block_height = line_height * lines.len() as f64;
    let first_middle = (size.height - block_height) / 2.0 + line_height / 2.0;
    let x = match content.align {
        TextAlign::Left => 0.0,
        TextAlign::Center => size.width / 2.0,
        TextAlign::Right => size.width,
    };

    ctx.save();
    ctx.set_text_align(content.align);
    ctx.set_text_baseline(TextBaseline::Middle);
    for (i, line) in lines.iter().enumerate() {
        let y = first_middle + line_height * i as f64;
        ctx.fill_text(line, Point::new(x, y));
        if content.decoration != TextDecoration::None {
            draw_decoration(ctx, line, Point::new(x, y), content.align, content.decoration);
        }
    }
    ctx.restore();
}

/// Stroke an underline or strike-through across the measured width of `line`,
/// whose vertical middle is at `anchor.y`.
fn draw_decoration<C: DrawContext + ?Sized>(
    ctx: &mut C,
    line: &str,
    anchor: Point,
    align: TextAlign,
    decoration: TextDecoration,
) {
    let width = ctx.measure_text(line);
    if width <= 0.0 {
        return;
    }
    let font_size = ctx.state().font.size;
    let y = match decoration {
        TextDecoration::Underline => anchor.y + font_size * 0.4,
        TextDecoration::StrikeThrough => anchor.y,
        TextDecoration::None => return,
    };
    let x0 = aligned_start(anchor.x, width, align);

    let mut path = BezPath::new();
    path.move_to((x0, y));
    path.line_to((x0 + width, y));

    ctx.save();
    let color = ctx.state().fill_color;
    ctx.set_stroke_color(color);
    ctx.set_line_width((font_size / 15.0).max(1.0));
    ctx.set_line_dash(&[]);
    ctx.stroke_path(&path);
    ctx.restore();
}
