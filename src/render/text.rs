//! Text drawing with the embedded DejaVu Sans font

use crate::errors::{Result, Ww3VisError};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rusttype::{Font, Scale};

const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Horizontal anchoring of a text run relative to its x coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Left,
    Center,
    Right,
}

pub struct TextRenderer {
    font: Font<'static>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TextRenderer")
    }
}

impl TextRenderer {
    pub fn new() -> Result<Self> {
        let font = Font::try_from_bytes(FONT_DATA)
            .ok_or_else(|| Ww3VisError::Generic("failed to load embedded font".to_string()))?;
        Ok(Self { font })
    }

    /// Width and height in pixels of `text` at `size` px
    pub fn measure(&self, text: &str, size: f32) -> (i32, i32) {
        text_size(Scale::uniform(size), &self.font, text)
    }

    /// Draw `text` with its vertical center at `y`
    pub fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: f32,
        color: Rgba<u8>,
        anchor: Anchor,
    ) {
        let (w, h) = self.measure(text, size);
        let left = match anchor {
            Anchor::Left => x,
            Anchor::Center => x - w / 2,
            Anchor::Right => x - w,
        };
        draw_text_mut(image, color, left, y - h / 2, Scale::uniform(size), &self.font, text);
    }
}
