//! Particle text formation: text is rasterized into target pixels and a pool
//! of steering particles converges on them, dissolving back out when the
//! text changes.

pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod field;
pub mod particle;
pub mod raster;
pub mod surface;
pub mod vec2;

pub use color::Rgb;
pub use config::EffectConfig;
pub use driver::{Animation, Content, FrameOutcome, PointerInput};
pub use error::ConfigError;
pub use field::{ParticleField, Reconciliation};
pub use particle::{DrawMode, Particle};
pub use raster::GlyphRaster;
pub use surface::{PixelCanvas, Surface};
pub use vec2::Vec2;
