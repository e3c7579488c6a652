//! Drawing surfaces the engine renders onto.

use crate::color::Rgb;

/// A 2D raster target supporting the two primitives particles need.
///
/// Coordinates are in pixels with the origin at the top-left; anything that
/// falls outside `width × height` is clipped.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self);
    fn put(&mut self, x: u32, y: u32, c: Rgb);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, c: Rgb) {
        if !(x.is_finite() && y.is_finite() && w > 0.0 && h > 0.0) {
            return;
        }
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = (x + w).ceil().max(x0 + 1.0);
        let y1 = (y + h).ceil().max(y0 + 1.0);
        let (sx0, sx1) = clip_span(x0, x1, self.width());
        let (sy0, sy1) = clip_span(y0, y1, self.height());
        for py in sy0..sy1 {
            for px in sx0..sx1 {
                self.put(px, py, c);
            }
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, c: Rgb) {
        if !(cx.is_finite() && cy.is_finite() && r > 0.0) {
            return;
        }
        let (sx0, sx1) = clip_span((cx - r).floor(), (cx + r).ceil() + 1.0, self.width());
        let (sy0, sy1) = clip_span((cy - r).floor(), (cy + r).ceil() + 1.0, self.height());
        let r2 = r * r;
        let mut any = false;
        for py in sy0..sy1 {
            for px in sx0..sx1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put(px, py, c);
                    any = true;
                }
            }
        }
        // sub-pixel circles still leave a dot
        if !any && cx >= 0.0 && cy >= 0.0 && (cx as u32) < self.width() && (cy as u32) < self.height()
        {
            self.put(cx as u32, cy as u32, c);
        }
    }
}

fn clip_span(lo: f32, hi: f32, max: u32) -> (u32, u32) {
    let lo = lo.max(0.0).min(max as f32) as u32;
    let hi = hi.max(0.0).min(max as f32) as u32;
    (lo, hi.max(lo))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Plain RGBA buffer; the terminal host turns it into braille cells.
pub struct PixelCanvas {
    w: u32,
    h: u32,
    px: Vec<Pixel>,
}

impl PixelCanvas {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x < self.w && y < self.h {
            Some(self.px[self.idx(x, y)])
        } else {
            None
        }
    }
    pub fn lit_pixels(&self) -> usize {
        self.px.iter().filter(|p| p.a > 0).count()
    }
}

impl Surface for PixelCanvas {
    fn width(&self) -> u32 {
        self.w
    }
    fn height(&self) -> u32 {
        self.h
    }
    fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }
    fn put(&mut self, x: u32, y: u32, c: Rgb) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.px[i] = Pixel {
                r: c.r,
                g: c.g,
                b: c.b,
                a: 255,
            };
        }
    }
}
