use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Create an AABB from two corner points.
    ///
    /// Axes thinner than a small delta are padded so flat geometry (a triangle
    /// lying in an axis plane) still has a box with volume.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from exact corners, without padding.
    pub fn from_corners(min: Vec3, max: Vec3) -> Self {
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow the box so it contains `p`.
    pub fn include_point(&self, p: Vec3) -> Self {
        Self {
            x: self.x.include(p.x),
            y: self.y.include(p.y),
            z: self.z.include(p.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }

    /// Returns true if any axis is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Returns true if every axis has finite bounds.
    pub fn is_bounded(&self) -> bool {
        self.x.is_bounded() && self.y.is_bounded() && self.z.is_bounded()
    }

    /// Surface area, used as the SAH cost weight. Zero for empty boxes.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    /// Test if a ray intersects this AABB within the ray's `[tmin, tmax]`.
    pub fn hit(&self, ray: &Ray) -> bool {
        self.hit_range(ray).is_some()
    }

    /// Slab test returning the parametric entry and exit distances.
    ///
    /// The range starts as the ray's own `[tmin, tmax]` and is narrowed per axis.
    /// An axis the ray runs exactly parallel to rejects immediately when the
    /// origin lies outside that slab. Tiny nonzero components go through the
    /// regular slab math so grazing rays still reach thin boxes.
    pub fn hit_range(&self, ray: &Ray) -> Option<(f32, f32)> {
        if self.is_empty() {
            return None;
        }

        let mut tmin = ray.tmin;
        let mut tmax = ray.tmax;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];

            if dir == 0.0 {
                if origin < slab.min || origin > slab.max {
                    return None;
                }
                continue;
            }

            let inv_dir = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv_dir;
            let mut t1 = (slab.max - origin) * inv_dir;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > tmin {
                tmin = t0;
            }
            if t1 < tmax {
                tmax = t1;
            }
            if tmin > tmax {
                return None;
            }
        }

        Some((tmin, tmax))
    }

    /// Outward normal of the face closest to `point`.
    ///
    /// Picks the axis whose face is nearest and signs it by the point's offset
    /// from the box center.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        let offset = point - self.centroid();
        let half = self.size() * 0.5;

        let mut best_axis = 0;
        let mut best_distance = f32::MAX;
        for axis in 0..3 {
            let distance = (half[axis] - offset[axis].abs()).abs();
            if distance < best_distance {
                best_distance = distance;
                best_axis = axis;
            }
        }

        let mut normal = Vec3::ZERO;
        normal[best_axis] = if offset[best_axis] < 0.0 { -1.0 } else { 1.0 };
        normal
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(self.x.center(), self.y.center(), self.z.center())
    }

    /// Static constants
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
