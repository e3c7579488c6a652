use clap::Parser;
use particle_text::{ConfigError, DrawMode, EffectConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "particle-text", about = "Text assembled from steering particles")]
pub(crate) struct Args {
    /// fixed text to form (disables word rotation)
    #[arg(long, conflicts_with = "words")]
    pub(crate) text: Option<String>,

    /// comma-separated words to rotate through
    #[arg(long, value_delimiter = ',')]
    pub(crate) words: Option<Vec<String>>,

    /// particle colour, #RGB or #RRGGBB
    #[arg(long)]
    pub(crate) color: Option<String>,

    /// background colour, #RGB or #RRGGBB
    #[arg(long)]
    pub(crate) background: Option<String>,

    /// canvas width in braille dots (default: whole terminal)
    #[arg(long)]
    pub(crate) width: Option<u32>,

    /// canvas height in braille dots (default: whole terminal)
    #[arg(long)]
    pub(crate) height: Option<u32>,

    /// pixel sampling stride; larger means fewer particles
    #[arg(long)]
    pub(crate) density: Option<usize>,

    /// base particle size in dots
    #[arg(long)]
    pub(crate) size: Option<f32>,

    #[arg(long)]
    pub(crate) fps: Option<u32>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// draw particles as circles instead of square points
    #[arg(long)]
    pub(crate) circles: bool,

    /// JSON settings file; flags override its values
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,

    /// write logs here (the terminal is busy drawing)
    #[arg(long)]
    pub(crate) log_file: Option<PathBuf>,
}

impl Args {
    pub(crate) fn effect_config(&self) -> Result<EffectConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => EffectConfig::load(path)?,
            None => EffectConfig::default(),
        };
        if let Some(text) = &self.text {
            cfg.text = Some(text.clone());
        }
        if let Some(words) = &self.words {
            cfg.text = None;
            cfg.words = Some(words.clone());
        }
        if let Some(v) = &self.color {
            cfg.color = v.clone();
        }
        if let Some(v) = &self.background {
            cfg.background = v.clone();
        }
        cfg.width = self.width.or(cfg.width);
        cfg.height = self.height.or(cfg.height);
        cfg.density = self.density.unwrap_or(cfg.density);
        cfg.size = self.size.unwrap_or(cfg.size);
        cfg.fps = self.fps.unwrap_or(cfg.fps);
        cfg.seed = self.seed.or(cfg.seed);
        if self.circles {
            cfg.draw_mode = DrawMode::Circles;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_text::Content;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("particle-text").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn no_flags_gives_defaults() {
        let cfg = parse(&[]).effect_config().unwrap();
        assert_eq!(cfg.density, 5);
        assert_eq!(cfg.draw_mode, DrawMode::Points);
    }

    #[test]
    fn words_are_comma_separated() {
        let cfg = parse(&["--words", "Hello,World"]).effect_config().unwrap();
        assert_eq!(
            cfg.content().unwrap(),
            Content::Rotating(vec!["Hello".into(), "World".into()])
        );
    }

    #[test]
    fn text_and_words_conflict() {
        assert!(Args::try_parse_from(["particle-text", "--text", "a", "--words", "b"]).is_err());
    }

    #[test]
    fn overrides_apply_and_validate() {
        let cfg = parse(&["--text", "Hardik", "--color", "#a855f7", "--density", "3", "--circles"])
            .effect_config()
            .unwrap();
        assert_eq!(cfg.content().unwrap(), Content::Static("Hardik".into()));
        assert_eq!(cfg.density, 3);
        assert_eq!(cfg.draw_mode, DrawMode::Circles);

        let bad = parse(&["--density", "0"]).effect_config();
        assert!(matches!(bad, Err(ConfigError::InvalidDensity(0))));
    }
}
