//! Pinhole camera for ray generation.

use ember_math::{Ray, Vec2, Vec3};

/// Pinhole camera.
///
/// The basis and viewport vectors are cached by `initialize`, which the scene
/// calls when the camera is set so the aspect ratio matches the image.
#[derive(Clone, Debug)]
pub struct Camera {
    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,

    // Cached computed values (set by initialize())
    image_width: u32,
    image_height: u32,
    upper_left: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a camera looking down -Z from the origin with a 45 degree field of view.
    pub fn new() -> Self {
        Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::NEG_Z,
            vup: Vec3::Y,
            vfov: 45.0,
            image_width: 1,
            image_height: 1,
            upper_left: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        }
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_vfov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    pub fn target(&self) -> Vec3 {
        self.look_at
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    /// Cache the basis for an image of `width` x `height` pixels.
    pub fn initialize(&mut self, width: u32, height: u32) {
        self.image_width = width.max(1);
        self.image_height = height.max(1);

        // Calculate viewport dimensions at unit distance
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Corner of pixel (0, 0), not its center
        self.upper_left = self.look_from - self.w - viewport_u / 2.0 - viewport_v / 2.0;
    }

    /// Ray through a continuous image-space point.
    ///
    /// Pixel `(x, y)` covers `[x, x + 1) x [y, y + 1)` with `y` growing down,
    /// so `(x + 0.5, y + 0.5)` is the pixel center.
    pub fn generate_ray(&self, point: Vec2) -> Ray {
        let target = self.upper_left + point.x * self.pixel_delta_u + point.y * self.pixel_delta_v;
        Ray::new(self.look_from, (target - self.look_from).normalize())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
