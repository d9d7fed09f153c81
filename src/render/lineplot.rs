//! Simple x/y line chart, used for 1-D difference slices

use super::canvas::{decimals_for, nice_ticks, BLACK, WHITE};
use super::text::{Anchor, TextRenderer};
use crate::dataset::finite_range;
use crate::errors::{Result, Ww3VisError};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::path::Path;

const LINE: Rgba<u8> = Rgba([31, 119, 180, 255]);
const ZERO_LINE: Rgba<u8> = Rgba([150, 150, 150, 255]);

/// Draw `values` against their index. NaN breaks the line.
pub fn render_line_plot(
    values: &[f64],
    title: &str,
    width: u32,
    height: u32,
) -> Result<RgbaImage> {
    let (left, right, top, bottom) = (90u32, 30u32, 50u32, 50u32);
    if width <= left + right + 10 || height <= top + bottom + 10 {
        return Err(Ww3VisError::Generic(format!(
            "image size {width}x{height} too small for a line plot"
        )));
    }
    let text = TextRenderer::new()?;
    let mut image = RgbaImage::from_pixel(width, height, WHITE);
    let (pw, ph) = (width - left - right, height - top - bottom);

    let (mut lo, mut hi) = finite_range(values).unwrap_or((0.0, 1.0));
    if hi <= lo {
        lo -= 0.5;
        hi += 0.5;
    }
    let n = values.len().max(2) as f64 - 1.0;
    let to_px = |i: usize, v: f64| -> (f32, f32) {
        let x = left as f64 + pw as f64 * i as f64 / n;
        let y = top as f64 + ph as f64 * (1.0 - (v - lo) / (hi - lo));
        (x as f32, y as f32)
    };

    if lo < 0.0 && hi > 0.0 {
        let (_, y0) = to_px(0, 0.0);
        draw_line_segment_mut(
            &mut image,
            (left as f32, y0),
            ((left + pw) as f32, y0),
            ZERO_LINE,
        );
    }

    let mut previous: Option<(f32, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            previous = None;
            continue;
        }
        let point = to_px(i, v);
        if let Some(prev) = previous {
            draw_line_segment_mut(&mut image, prev, point, LINE);
        }
        previous = Some(point);
    }

    draw_hollow_rect_mut(
        &mut image,
        Rect::at(left as i32, top as i32).of_size(pw, ph),
        BLACK,
    );

    let y_ticks = nice_ticks(lo, hi, 6);
    let decimals = match y_ticks.as_slice() {
        [a, b, ..] => decimals_for(b - a),
        _ => 3,
    };
    for tick in y_ticks {
        let (_, y) = to_px(0, tick);
        draw_line_segment_mut(&mut image, (left as f32 - 5.0, y), (left as f32, y), BLACK);
        text.draw(
            &mut image,
            &format!("{:.*}", decimals, tick),
            left as i32 - 8,
            y as i32,
            13.0,
            BLACK,
            Anchor::Right,
        );
    }
    for tick in nice_ticks(0.0, n, 8) {
        let (x, _) = to_px(tick as usize, lo);
        let base = (top + ph) as f32;
        draw_line_segment_mut(&mut image, (x, base), (x, base + 5.0), BLACK);
        text.draw(
            &mut image,
            &format!("{}", tick as usize),
            x as i32,
            (top + ph + 18) as i32,
            13.0,
            BLACK,
            Anchor::Center,
        );
    }

    text.draw(
        &mut image,
        title,
        (left + pw / 2) as i32,
        (top / 2) as i32,
        18.0,
        BLACK,
        Anchor::Center,
    );
    Ok(image)
}

/// Render and save a line plot as PNG
pub fn save_line_plot(
    values: &[f64],
    title: &str,
    width: u32,
    height: u32,
    path: &Path,
) -> Result<()> {
    render_line_plot(values, title, width, height)?.save(path)?;
    Ok(())
}
