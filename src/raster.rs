//! Off-screen text rasterization into sparse target coordinates.

use crate::vec2::Vec2;
use image::{Rgba, RgbaImage};
use rand::{seq::SliceRandom, Rng};
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::Format;
use swash::FontRef;

/// DejaVu Sans Bold; see `assets/DejaVuSans-LICENSE`.
static FACE: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Largest font size that keeps `text` inside a `width × height` field.
pub fn font_size_for(text: &str, width: u32, height: u32) -> f32 {
    let n = text.chars().count().max(1) as f32;
    (width as f32 / (n * 0.7)).min(height as f32 / 1.5)
}

/// A rendered text string and the sampling stride used to read it back.
pub struct GlyphRaster {
    image: RgbaImage,
    stride: usize,
}

impl GlyphRaster {
    pub fn rasterize(text: &str, width: u32, height: u32, stride: usize) -> Self {
        let mut image = RgbaImage::new(width, height);
        draw_text(&mut image, text, font_size_for(text, width, height));
        Self {
            image,
            stride: stride.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Opaque pixels, sampled every `stride` pixels in buffer order.
    /// Each call walks the buffer again from the start.
    pub fn coords(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let raw = self.image.as_raw();
        let w = self.image.width();
        (0..raw.len())
            .step_by(self.stride.saturating_mul(4))
            .filter(move |&i| raw[i + 3] > 0)
            .map(move |i| {
                let p = (i / 4) as u32;
                (p % w, p / w)
            })
    }

    /// Sampled coordinates in random order, ready for reconciliation.
    pub fn shuffled_targets<R: Rng>(&self, rng: &mut R) -> Vec<Vec2> {
        let mut targets: Vec<Vec2> = self
            .coords()
            .map(|(x, y)| Vec2::new(x as f32, y as f32))
            .collect();
        targets.shuffle(rng);
        targets
    }
}

/// White glyph coverage, centered horizontally on the pen advance and
/// vertically on the cap height.
fn draw_text(image: &mut RgbaImage, text: &str, size: f32) {
    if text.is_empty() || !size.is_finite() || size <= 0.0 {
        return;
    }
    let Some(font) = FontRef::from_index(FACE, 0) else {
        log::warn!("embedded font failed to load, nothing rasterized");
        return;
    };

    let glyphs: Vec<u16> = text.chars().map(|c| font.charmap().map(c)).collect();
    let advances = font.glyph_metrics(&[]).scale(size);
    let text_w: f32 = glyphs.iter().map(|&g| advances.advance_width(g)).sum();

    let metrics = font.metrics(&[]).scale(size);
    let cap = if metrics.cap_height > 0.0 {
        metrics.cap_height
    } else {
        metrics.ascent * 0.7
    };
    let baseline = (image.height() as f32 + cap) / 2.0;

    let mut context = ScaleContext::new();
    let mut scaler = context.builder(font).size(size).hint(false).build();
    let mut pen = (image.width() as f32 - text_w) / 2.0;

    for &g in &glyphs {
        let rendered = Render::new(&[Source::Outline])
            .format(Format::Alpha)
            .render(&mut scaler, g);
        if let Some(glyph) = rendered {
            let p = glyph.placement;
            let x0 = pen.round() as i64 + p.left as i64;
            let y0 = baseline.round() as i64 - p.top as i64;
            for row in 0..p.height as i64 {
                for col in 0..p.width as i64 {
                    let coverage = glyph.data[(row * p.width as i64 + col) as usize];
                    blend_coverage(image, x0 + col, y0 + row, coverage);
                }
            }
        }
        pen += advances.advance_width(g);
    }
}

fn blend_coverage(image: &mut RgbaImage, x: i64, y: i64, coverage: u8) {
    if coverage == 0 || x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let px = image.get_pixel_mut(x as u32, y as u32);
    let alpha = px.0[3].max(coverage);
    *px = Rgba([255, 255, 255, alpha]);
}
