//! A single steering particle.

use crate::color::Rgb;
use crate::surface::Surface;
use crate::vec2::Vec2;
use rand::Rng;
use serde::Deserialize;

/// Within this distance of its target a particle's desired speed tapers off
/// linearly to zero.
pub const CLOSE_ENOUGH: f32 = 100.0;
/// Escape targets sit this many half-extents away from the field center.
pub const ESCAPE_SCALE: f32 = 1.5;
pub const MIN_SPEED: f32 = 4.0;
pub const MAX_SPEED: f32 = 10.0;
pub const FORCE_RATIO: f32 = 0.05;
pub const MIN_BLEND_RATE: f32 = 0.0025;
pub const MAX_BLEND_RATE: f32 = 0.03;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    #[default]
    Points,
    Circles,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pos: Vec2,
    vel: Vec2,
    acc: Vec2,
    target: Vec2,
    max_speed: f32,
    max_force: f32,
    radius: f32,
    color_start: Rgb,
    color_end: Rgb,
    blend: f32,
    blend_rate: f32,
    killed: bool,
}

impl Particle {
    /// Fresh particle at `at`, heading for `target` and fading in from black.
    ///
    /// Speed, force, radius and blend rate are drawn once here and stay fixed
    /// for the particle's life. `size` must be positive.
    pub fn spawn<R: Rng>(at: Vec2, target: Vec2, color: Rgb, size: f32, rng: &mut R) -> Self {
        debug_assert!(size.is_finite() && size > 0.0, "particle size must be positive");
        let max_speed = rng.gen_range(MIN_SPEED..MAX_SPEED);
        Self {
            pos: at,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            target,
            max_speed,
            max_force: max_speed * FORCE_RATIO,
            radius: rng.gen_range(size / 2.0..size / 2.0 + size),
            color_start: Rgb::BLACK,
            color_end: color,
            blend: 0.0,
            blend_rate: rng.gen_range(MIN_BLEND_RATE..MAX_BLEND_RATE),
            killed: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }
    pub fn velocity(&self) -> Vec2 {
        self.vel
    }
    pub fn target(&self) -> Vec2 {
        self.target
    }
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }
    pub fn max_force(&self) -> f32 {
        self.max_force
    }
    pub fn radius(&self) -> f32 {
        self.radius
    }
    pub fn blend_progress(&self) -> f32 {
        self.blend
    }
    pub fn target_color(&self) -> Rgb {
        self.color_end
    }
    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn current_color(&self) -> Rgb {
        Rgb::lerp(self.color_start, self.color_end, self.blend)
    }

    /// One steering step toward the target.
    pub fn advance(&mut self) {
        let to_target = self.target.sub(self.pos);
        let distance = to_target.len();
        let proximity = if distance < CLOSE_ENOUGH {
            distance / CLOSE_ENOUGH
        } else {
            1.0
        };

        let desired = to_target.norm().mul(self.max_speed * proximity);
        let steer = desired.sub(self.vel).limit(self.max_force);

        self.acc = self.acc.add(steer);
        self.vel = self.vel.add(self.acc);
        self.pos = self.pos.add(self.vel);
        self.acc = Vec2::ZERO;
    }

    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, mode: DrawMode) {
        if self.blend < 1.0 {
            self.blend = (self.blend + self.blend_rate).min(1.0);
        }
        let c = self.current_color();
        match mode {
            DrawMode::Points => surface.fill_rect(self.pos.x, self.pos.y, self.radius, self.radius, c),
            DrawMode::Circles => surface.fill_circle(self.pos.x, self.pos.y, self.radius / 2.0, c),
        }
    }

    /// Reuse for a new target: fade from whatever colour is showing now.
    pub fn retarget(&mut self, target: Vec2, color: Rgb) {
        self.killed = false;
        self.color_start = self.current_color();
        self.color_end = color;
        self.blend = 0.0;
        self.target = target;
    }

    /// Sends the particle off-field and fades it to black. Only the first
    /// call has any effect.
    pub fn mark_escaping<R: Rng>(&mut self, width: f32, height: f32, rng: &mut R) {
        if self.killed {
            return;
        }
        let center = Vec2::new(width / 2.0, height / 2.0);
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let reach = (width + height) / 2.0 * ESCAPE_SCALE;
        self.target = center.add(Vec2::new(angle.cos(), angle.sin()).mul(reach));

        self.color_start = self.current_color();
        self.color_end = Rgb::BLACK;
        self.blend = 0.0;
        self.killed = true;
    }

    /// Instantaneous displacement, used for pointer repulsion.
    pub fn nudge(&mut self, delta: Vec2) {
        self.pos = self.pos.add(delta);
    }

    pub fn is_outside(&self, width: f32, height: f32) -> bool {
        self.pos.x < 0.0 || self.pos.x > width || self.pos.y < 0.0 || self.pos.y > height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelCanvas;
    use rand::{rngs::StdRng, SeedableRng};

    fn particle(rng: &mut StdRng) -> Particle {
        Particle::spawn(
            Vec2::new(0.0, 0.0),
            Vec2::new(300.0, 120.0),
            Rgb::WHITE,
            2.0,
            rng,
        )
    }

    #[test]
    fn spawn_draws_caps_from_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = particle(&mut rng);
            assert!(p.max_speed() >= MIN_SPEED && p.max_speed() < MAX_SPEED);
            assert!((p.max_force() - p.max_speed() * FORCE_RATIO).abs() < 1e-6);
            assert!(p.radius() >= 1.0 && p.radius() < 3.0);
            assert!(p.blend_rate >= MIN_BLEND_RATE && p.blend_rate < MAX_BLEND_RATE);
            assert_eq!(p.current_color(), Rgb::BLACK);
            assert!(!p.is_killed());
        }
    }

    #[test]
    fn speed_never_exceeds_cap_plus_force() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut p = particle(&mut rng);
            for step in 0..400 {
                if step % 50 == 0 {
                    let t = Vec2::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
                    p.retarget(t, Rgb::WHITE);
                }
                p.advance();
                assert!(p.velocity().len() <= p.max_speed() + p.max_force() + 1e-4);
            }
        }
    }

    #[test]
    fn settles_on_target() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = particle(&mut rng);
        for _ in 0..3000 {
            p.advance();
        }
        assert!(p.position().dist(p.target()) < 1.0, "ended at {:?}", p.position());
    }

    #[test]
    fn advance_at_target_stays_finite() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut p = Particle::spawn(Vec2::new(5.0, 5.0), Vec2::new(5.0, 5.0), Rgb::WHITE, 2.0, &mut rng);
        p.advance();
        assert_eq!(p.position(), Vec2::new(5.0, 5.0));
        assert!(p.velocity().x.is_finite() && p.velocity().y.is_finite());
    }

    #[test]
    fn render_advances_blend_and_clamps() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut p = Particle::spawn(Vec2::new(4.0, 4.0), Vec2::new(4.0, 4.0), Rgb::WHITE, 2.0, &mut rng);
        let mut canvas = PixelCanvas::new(10, 10);
        let mut last = p.blend_progress();
        for _ in 0..1000 {
            p.render(&mut canvas, DrawMode::Points);
            assert!(p.blend_progress() >= last);
            assert!(p.blend_progress() <= 1.0);
            last = p.blend_progress();
        }
        assert_eq!(last, 1.0);
        assert_eq!(p.current_color(), Rgb::WHITE);
        assert!(canvas.lit_pixels() > 0);
    }

    #[test]
    fn mark_escaping_is_idempotent() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut p = particle(&mut rng);
        let mut canvas = PixelCanvas::new(10, 10);
        for _ in 0..10 {
            p.render(&mut canvas, DrawMode::Circles);
        }
        let showing = p.current_color();

        p.mark_escaping(800.0, 300.0, &mut rng);
        assert!(p.is_killed());
        assert_eq!(p.blend_progress(), 0.0);
        assert_eq!(p.current_color(), showing);
        assert_eq!(p.target_color(), Rgb::BLACK);
        let target = p.target();
        let center = Vec2::new(400.0, 150.0);
        assert!((target.dist(center) - 550.0 * ESCAPE_SCALE).abs() < 1e-2);

        p.mark_escaping(800.0, 300.0, &mut rng);
        assert_eq!(p.target(), target);
        assert_eq!(p.current_color(), showing);
        assert_eq!(p.blend_progress(), 0.0);
    }

    #[test]
    fn retarget_revives_and_locks_colour() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut p = particle(&mut rng);
        p.mark_escaping(100.0, 100.0, &mut rng);
        let showing = p.current_color();
        let purple = Rgb::new(0xa8, 0x55, 0xf7);
        p.retarget(Vec2::new(1.0, 2.0), purple);
        assert!(!p.is_killed());
        assert_eq!(p.target(), Vec2::new(1.0, 2.0));
        assert_eq!(p.current_color(), showing);
        assert_eq!(p.target_color(), purple);
    }
}
