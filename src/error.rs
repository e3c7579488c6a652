use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid hex color {0:?} (expected #RGB or #RRGGBB)")]
    InvalidColor(String),

    #[error("density must be at least 1, got {0}")]
    InvalidDensity(usize),

    #[error("particle size must be a positive number, got {0}")]
    InvalidSize(f32),

    #[error("canvas dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("fps must be within 10..=240, got {0}")]
    InvalidFps(u32),

    #[error("nothing to display: {0}")]
    EmptyContent(&'static str),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}
