//! The particle pool and its reconciliation against new glyph targets.

use crate::color::Rgb;
use crate::error::ConfigError;
use crate::particle::{DrawMode, Particle};
use crate::surface::Surface;
use crate::vec2::Vec2;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Pointer repulsion reach, in pixels.
pub const REPEL_RADIUS: f32 = 50.0;
/// How far a repelled particle is pushed per tick.
pub const REPEL_STEP: f32 = 10.0;

/// What one `set_targets` call did to the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub reused: usize,
    pub spawned: usize,
    pub escaping: usize,
}

pub struct ParticleField {
    particles: Vec<Particle>,
    width: f32,
    height: f32,
    size: f32,
    rng: StdRng,
}

impl ParticleField {
    /// `size` is the base particle radius and must be positive.
    pub fn new(width: u32, height: u32, size: f32, seed: u64) -> Result<Self, ConfigError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ConfigError::InvalidSize(size));
        }
        Ok(Self {
            particles: Vec::new(),
            width: width as f32,
            height: height as f32,
            size,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.particles.iter().filter(|p| !p.is_killed()).count()
    }

    pub fn escaping_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_killed()).count()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    /// Reassigns the pool to `targets`, which the caller has already shuffled.
    ///
    /// Pool slot `i` takes target `i`. Targets left over once the pool runs
    /// out get freshly spawned particles; pool slots left over once the
    /// targets run out are sent escaping.
    pub fn set_targets(&mut self, targets: &[Vec2], color: Rgb) -> Reconciliation {
        let reused = targets.len().min(self.particles.len());

        for (p, &t) in self.particles.iter_mut().zip(targets) {
            p.retarget(t, color);
        }

        let spawned = targets.len() - reused;
        self.particles.reserve(spawned);
        for &t in &targets[reused..] {
            let at = self.spawn_point();
            let p = Particle::spawn(at, t, color, self.size, &mut self.rng);
            self.particles.push(p);
        }

        let mut escaping = 0;
        for p in &mut self.particles[reused + spawned..] {
            p.mark_escaping(self.width, self.height, &mut self.rng);
            escaping += 1;
        }

        let summary = Reconciliation {
            reused,
            spawned,
            escaping,
        };
        log::debug!(
            "reconciled {} targets: {:?}, pool now {}",
            targets.len(),
            summary,
            self.particles.len()
        );
        summary
    }

    /// Projects from the field center toward a random in-bounds point, out to
    /// roughly the field's half-extent.
    fn spawn_point(&mut self) -> Vec2 {
        let center = Vec2::new(self.width / 2.0, self.height / 2.0);
        let toward = Vec2::new(
            self.rng.gen::<f32>() * self.width,
            self.rng.gen::<f32>() * self.height,
        );
        let reach = (self.width + self.height) / 2.0;
        center.add(toward.sub(center).norm().mul(reach))
    }

    /// Advances, draws, repels and culls every particle once. Returns how
    /// many escaping particles left the field and were dropped.
    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        pointer: Option<Vec2>,
        mode: DrawMode,
    ) -> usize {
        let mut removed = 0;
        for i in (0..self.particles.len()).rev() {
            let p = &mut self.particles[i];
            p.advance();
            p.render(surface, mode);

            if let Some(at) = pointer {
                let away = p.position().sub(at);
                if away.len() < REPEL_RADIUS {
                    p.nudge(away.norm().mul(REPEL_STEP));
                }
            }

            if p.is_killed() && p.is_outside(self.width, self.height) {
                // everything past `i` has already been ticked
                self.particles.swap_remove(i);
                removed += 1;
            }
        }
        if removed > 0 {
            log::trace!("dropped {removed} escaped particles");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PixelCanvas;

    fn grid(n: usize) -> Vec<Vec2> {
        (0..n)
            .map(|i| Vec2::new((i % 40) as f32 * 2.0, (i / 40) as f32 * 2.0))
            .collect()
    }

    #[test]
    fn non_positive_size_is_rejected() {
        for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                ParticleField::new(10, 10, size, 0),
                Err(ConfigError::InvalidSize(_))
            ));
        }
    }

    #[test]
    fn empty_pool_spawns_everything() {
        let mut f = ParticleField::new(100, 60, 2.0, 1).unwrap();
        let r = f.set_targets(&grid(25), Rgb::WHITE);
        assert_eq!(
            r,
            Reconciliation {
                reused: 0,
                spawned: 25,
                escaping: 0
            }
        );
        assert_eq!(f.len(), 25);
        assert_eq!(f.live_count(), 25);
    }

    #[test]
    fn growing_reuses_then_spawns() {
        let mut f = ParticleField::new(100, 60, 2.0, 2).unwrap();
        f.set_targets(&grid(10), Rgb::WHITE);
        let r = f.set_targets(&grid(30), Rgb::WHITE);
        assert_eq!((r.reused, r.spawned, r.escaping), (10, 20, 0));
        assert_eq!(f.live_count(), 30);
        assert_eq!(f.escaping_count(), 0);
    }

    #[test]
    fn shrinking_marks_surplus_escaping() {
        let mut f = ParticleField::new(100, 60, 2.0, 3).unwrap();
        f.set_targets(&grid(30), Rgb::WHITE);
        let r = f.set_targets(&grid(12), Rgb::WHITE);
        assert_eq!((r.reused, r.spawned, r.escaping), (12, 0, 18));
        assert_eq!(f.len(), 30);
        assert_eq!(f.live_count(), 12);
        assert_eq!(f.escaping_count(), 18);
    }

    #[test]
    fn escaping_particles_are_revived_by_reuse() {
        let mut f = ParticleField::new(100, 60, 2.0, 4).unwrap();
        f.set_targets(&grid(20), Rgb::WHITE);
        f.set_targets(&[], Rgb::WHITE);
        assert_eq!(f.escaping_count(), 20);
        let r = f.set_targets(&grid(20), Rgb::WHITE);
        assert_eq!((r.reused, r.spawned, r.escaping), (20, 0, 0));
        assert_eq!(f.live_count(), 20);
    }

    #[test]
    fn reuse_is_positional_and_keeps_identity() {
        let mut f = ParticleField::new(100, 60, 2.0, 5).unwrap();
        f.set_targets(&grid(3), Rgb::WHITE);
        let before: Vec<Vec2> = f.particles().iter().map(|p| p.position()).collect();
        let targets = [Vec2::new(7.0, 8.0), Vec2::new(9.0, 1.0), Vec2::new(4.0, 4.0)];
        let purple = Rgb::new(0xa8, 0x55, 0xf7);
        f.set_targets(&targets, purple);
        for (i, p) in f.particles().iter().enumerate() {
            assert_eq!(p.position(), before[i]);
            assert_eq!(p.target(), targets[i]);
            assert_eq!(p.target_color(), purple);
            assert_eq!(p.blend_progress(), 0.0);
        }
    }

    #[test]
    fn spawn_points_sit_on_the_half_extent_ring() {
        let mut f = ParticleField::new(200, 100, 2.0, 6).unwrap();
        f.set_targets(&grid(50), Rgb::WHITE);
        let center = Vec2::new(100.0, 50.0);
        for p in f.particles() {
            let d = p.position().dist(center);
            assert!((d - 150.0).abs() < 1e-2 || d < 1e-3, "d={d}");
        }
    }

    #[test]
    fn killed_particles_inside_bounds_are_kept() {
        let mut f = ParticleField::new(400, 400, 2.0, 7).unwrap();
        let mut canvas = PixelCanvas::new(400, 400);
        f.set_targets(&[Vec2::new(200.0, 200.0); 8], Rgb::WHITE);
        for _ in 0..600 {
            f.tick(&mut canvas, None, DrawMode::Points);
        }
        f.set_targets(&[], Rgb::WHITE);
        // one step cannot carry a settled particle 200px out of the field
        let removed = f.tick(&mut canvas, None, DrawMode::Points);
        assert_eq!(removed, 0);
        assert_eq!(f.len(), 8);
    }

    #[test]
    fn escaped_particles_are_eventually_removed() {
        let mut f = ParticleField::new(120, 80, 2.0, 8).unwrap();
        let mut canvas = PixelCanvas::new(120, 80);
        f.set_targets(&grid(40), Rgb::WHITE);
        f.set_targets(&grid(5), Rgb::WHITE);
        let mut removed = 0;
        for _ in 0..2000 {
            removed += f.tick(&mut canvas, None, DrawMode::Points);
            for p in f.particles() {
                if p.is_killed() {
                    // survivors of a tick are never outside
                    assert!(!p.is_outside(120.0, 80.0));
                }
            }
        }
        assert_eq!(removed, 35);
        assert_eq!(f.len(), 5);
        assert_eq!(f.live_count(), 5);
    }

    #[test]
    fn pointer_pushes_nearby_particles_away() {
        let mut f = ParticleField::new(200, 200, 2.0, 9).unwrap();
        let mut canvas = PixelCanvas::new(200, 200);
        f.set_targets(&[Vec2::new(100.0, 100.0)], Rgb::WHITE);
        for _ in 0..1500 {
            f.tick(&mut canvas, None, DrawMode::Points);
        }
        let settled = f.particles()[0].position();
        assert!(settled.dist(Vec2::new(100.0, 100.0)) < 1.0);

        let pointer = Vec2::new(90.0, 100.0);
        f.tick(&mut canvas, Some(pointer), DrawMode::Points);
        let after = f.particles()[0].position();
        assert!(after.x > settled.x + 5.0, "after={after:?}");
    }

    #[test]
    fn far_pointer_has_no_effect() {
        let mut a = ParticleField::new(200, 200, 2.0, 10).unwrap();
        let mut b = ParticleField::new(200, 200, 2.0, 10).unwrap();
        let mut canvas = PixelCanvas::new(200, 200);
        a.set_targets(&grid(10), Rgb::WHITE);
        b.set_targets(&grid(10), Rgb::WHITE);
        for _ in 0..50 {
            a.tick(&mut canvas, None, DrawMode::Points);
            b.tick(&mut canvas, Some(Vec2::new(-1000.0, -1000.0)), DrawMode::Points);
        }
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.position(), pb.position());
        }
    }

    #[test]
    fn tick_draws_onto_the_surface() {
        let mut f = ParticleField::new(50, 50, 3.0, 11).unwrap();
        let mut canvas = PixelCanvas::new(50, 50);
        f.set_targets(&[Vec2::new(25.0, 25.0)], Rgb::WHITE);
        for _ in 0..400 {
            canvas.clear();
            f.tick(&mut canvas, None, DrawMode::Circles);
        }
        assert!(canvas.lit_pixels() > 0);
    }
}
