#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub fn add(self, o: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + o.x,
            y: self.y + o.y,
        }
    }
    pub fn sub(self, o: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - o.x,
            y: self.y - o.y,
        }
    }
    pub fn mul(self, k: f32) -> Vec2 {
        Vec2 {
            x: self.x * k,
            y: self.y * k,
        }
    }
    pub fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
    pub fn dist(self, o: Vec2) -> f32 {
        self.sub(o).len()
    }
    /// Unit vector, or zero when the magnitude is too small to normalize.
    pub fn norm(self) -> Vec2 {
        let l = self.len();
        if l <= 1e-6 {
            Vec2::ZERO
        } else {
            self.mul(1.0 / l)
        }
    }
    pub fn limit(self, max: f32) -> Vec2 {
        let l = self.len();
        if l > max {
            self.mul(max / l)
        } else {
            self
        }
    }
}
