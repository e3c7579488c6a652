//! Frame loop state: word rotation, pointer input and the particle field.

use crate::color::Rgb;
use crate::config::EffectConfig;
use crate::error::ConfigError;
use crate::field::{ParticleField, Reconciliation};
use crate::particle::DrawMode;
use crate::raster::GlyphRaster;
use crate::surface::Surface;
use crate::vec2::Vec2;

/// Frames between word changes in rotating mode.
pub const ROTATE_EVERY: u64 = 300;
pub const DEFAULT_WORDS: [&str; 3] = ["Particle", "Text", "Effect"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Static(String),
    Rotating(Vec<String>),
}

impl Content {
    pub fn is_static(&self) -> bool {
        matches!(self, Content::Static(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Content::Static(_) => 1,
            Content::Rotating(words) => words.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn word(&self, i: usize) -> &str {
        match self {
            Content::Static(text) => text,
            Content::Rotating(words) => words.get(i % words.len().max(1)).map_or("", String::as_str),
        }
    }
}

/// Latest pointer state. Host event handlers write it; the frame reads it
/// once per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointerInput {
    position: Vec2,
    active: bool,
}

impl PointerInput {
    pub fn on_move(&mut self, x: f32, y: f32) {
        self.position = Vec2::new(x, y);
        self.active = true;
    }

    pub fn on_leave(&mut self) {
        self.active = false;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.active.then_some(self.position)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn { removed: usize },
    /// The surface was gone; nothing was advanced.
    Skipped,
}

pub struct Animation {
    field: ParticleField,
    content: Content,
    color: Rgb,
    density: usize,
    width: u32,
    height: u32,
    mode: DrawMode,
    word_index: usize,
    frame_count: u64,
    started: bool,
}

impl Animation {
    pub fn new(cfg: &EffectConfig, width: u32, height: u32) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let seed = cfg.seed.unwrap_or_else(rand::random);
        log::debug!("animation seed {seed:#x}, field {width}x{height}");
        Ok(Self {
            field: ParticleField::new(width, height, cfg.size, seed)?,
            content: cfg.content()?,
            color: cfg.color_rgb()?,
            density: cfg.density,
            width,
            height,
            mode: cfg.draw_mode,
            word_index: 0,
            frame_count: 0,
            started: false,
        })
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn current_word(&self) -> &str {
        self.content.word(self.word_index)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    pub fn toggle_draw_mode(&mut self) {
        self.mode = match self.mode {
            DrawMode::Points => DrawMode::Circles,
            DrawMode::Circles => DrawMode::Points,
        };
    }

    /// Forms the first word.
    pub fn start(&mut self) -> Reconciliation {
        self.started = true;
        self.word_index = 0;
        self.show_current()
    }

    fn show_current(&mut self) -> Reconciliation {
        let raster = GlyphRaster::rasterize(self.current_word(), self.width, self.height, self.density);
        let targets = raster.shuffled_targets(self.field.rng());
        self.field.set_targets(&targets, self.color)
    }

    /// Moves on to the next word. Fixed text never changes.
    pub fn next_word(&mut self) -> Option<Reconciliation> {
        if self.content.is_static() {
            return None;
        }
        self.word_index = (self.word_index + 1) % self.content.len();
        log::info!("forming {:?}", self.current_word());
        Some(self.show_current())
    }

    /// New field bounds; the current word is re-formed to fit them.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.field.resize(width, height);
        if self.started {
            self.show_current();
        }
    }

    /// One display refresh.
    pub fn frame<S: Surface + ?Sized>(
        &mut self,
        surface: Option<&mut S>,
        input: &PointerInput,
    ) -> FrameOutcome {
        let Some(surface) = surface else {
            log::trace!("no surface, skipping frame");
            return FrameOutcome::Skipped;
        };

        surface.clear();
        let removed = self.field.tick(surface, input.pointer(), self.mode);

        if !self.content.is_static() {
            self.frame_count += 1;
            if self.frame_count % ROTATE_EVERY == 0 {
                self.next_word();
            }
        }
        FrameOutcome::Drawn { removed }
    }
}
