/// World-space geometry: vectors and axis-aligned boxes.
///
/// World space is bottom-left origin, y grows upward.
/// `Aabb::origin` is the bottom-left corner.

use std::ops::{Add, Mul, Sub};

#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    /// Component-wise clamp into the rectangle `[min, max]`.
    pub fn clamp(self, min: Vec2, max: Vec2) -> Self {
        Vec2 {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, k: f32) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Aabb { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    /// Box of `size` centred on `center`.
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Aabb {
            origin: Vec2::new(center.x - size.x / 2.0, center.y - size.y / 2.0),
            size,
        }
    }

    #[inline] pub fn min_x(&self) -> f32 { self.origin.x }
    #[inline] pub fn min_y(&self) -> f32 { self.origin.y }
    #[inline] pub fn max_x(&self) -> f32 { self.origin.x + self.size.x }
    #[inline] pub fn max_y(&self) -> f32 { self.origin.y + self.size.y }

    /// Raw intersection rectangle. Width/height are zero or negative when the
    /// boxes only touch or are disjoint; check before use.
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        let x = self.min_x().max(other.min_x());
        let y = self.min_y().max(other.min_y());
        let w = self.max_x().min(other.max_x()) - x;
        let h = self.max_y().min(other.max_y()) - y;
        Aabb::new(x, y, w, h)
    }

    /// Intersection with strictly positive width and height, if any.
    pub fn overlap(&self, other: &Aabb) -> Option<Aabb> {
        let i = self.intersection(other);
        if i.size.x > 0.0 && i.size.y > 0.0 { Some(i) } else { None }
    }
}
