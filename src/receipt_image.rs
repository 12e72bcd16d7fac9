//! Shareable receipt image: rasterizes the plain-text slip into a PNG with
//! the built-in 8x8 font, for devices without a thermal printer attached.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

use crate::config::AppConfig;
use crate::receipt;
use crate::types::Order;

const GLYPH_SIZE: u32 = 8;
const SCALE: u32 = 2;
const MARGIN: u32 = 16;
const LINE_GAP: u32 = 4;

const WHITE: Luma<u8> = Luma([255u8]);
const BLACK: Luma<u8> = Luma([0u8]);

/// Render the order receipt as a PNG.
pub fn render_receipt_png(order: &Order, config: &AppConfig) -> Result<Vec<u8>, String> {
    let lines = receipt::receipt_lines(order, config);
    render_lines_png(&lines)
}

fn render_lines_png(lines: &[String]) -> Result<Vec<u8>, String> {
    if lines.is_empty() {
        return Err("nothing to render".to_string());
    }

    let columns = lines
        .iter()
        .map(|l| l.chars().count() as u32)
        .max()
        .unwrap_or(0)
        .max(1);
    let glyph = GLYPH_SIZE * SCALE;
    let line_height = glyph + LINE_GAP;
    let width = columns * glyph + 2 * MARGIN;
    let height = lines.len() as u32 * line_height + 2 * MARGIN;

    let mut canvas = GrayImage::from_pixel(width, height, WHITE);
    for (row, line) in lines.iter().enumerate() {
        let y = MARGIN + row as u32 * line_height;
        for (col, ch) in line.chars().enumerate() {
            let x = MARGIN + col as u32 * glyph;
            draw_glyph(&mut canvas, ch, x, y);
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| format!("receipt PNG encode failed: {e}"))?;
    Ok(png)
}

fn draw_glyph(canvas: &mut GrayImage, ch: char, origin_x: u32, origin_y: u32) {
    let bitmap = BASIC_FONTS
        .get(ascii_fold(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0u8; 8]);

    for (gy, row_bits) in bitmap.iter().enumerate() {
        for gx in 0..8u32 {
            if row_bits & (1 << gx) == 0 {
                continue;
            }
            for sy in 0..SCALE {
                for sx in 0..SCALE {
                    let x = origin_x + gx * SCALE + sx;
                    let y = origin_y + gy as u32 * SCALE + sy;
                    if x < canvas.width() && y < canvas.height() {
                        canvas.put_pixel(x, y, BLACK);
                    }
                }
            }
        }
    }
}

/// The 8x8 basic set only covers ASCII; map the receipt's few non-ASCII
/// characters to readable stand-ins instead of a run of '?' boxes.
fn ascii_fold(ch: char) -> char {
    match ch {
        '₦' => 'N',
        '─' => '-',
        c if c.is_ascii() => c,
        _ => '?',
    }
}
