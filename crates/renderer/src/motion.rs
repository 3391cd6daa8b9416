//! Per-frame model motion: the continuous spin, the idle float, and the
//! depth-of-field style blur that follows the spin angle.
use std::f32::consts::PI;
use std::fmt;

use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;

use crate::preset::RenderPreset;

/// Accumulated rotation of the model itself, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spin {
    pub x: f32,
    pub y: f32,
}

impl Spin {
    /// Advances by a frame delta. Rates are per second so the motion does not
    /// depend on the frame rate.
    pub fn advance(&mut self, delta_seconds: f32, preset: &RenderPreset) {
        self.y += delta_seconds * preset.rotation_speed;
        self.x += delta_seconds * preset.tilt_speed;
    }

    pub fn rotation(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.x, self.y, 0.0)
    }

    /// Same orientation with both angles wrapped into `[0, 2pi)`, so long
    /// sessions keep precision.
    pub(crate) fn wrapped(self) -> Self {
        Self {
            x: wrap_angle(self.x),
            y: wrap_angle(self.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlurRadius {
    None,
    /// Gaussian standard deviation in logical pixels.
    Pixels(f32),
}

impl BlurRadius {
    pub fn pixels(self) -> f32 {
        match self {
            BlurRadius::None => 0.0,
            BlurRadius::Pixels(radius) => radius,
        }
    }
}

impl fmt::Display for BlurRadius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlurRadius::None => f.write_str("none"),
            BlurRadius::Pixels(radius) => write!(f, "blur({radius:.2}px)"),
        }
    }
}

/// Blur for the current spin angle: sharpest when the model faces the
/// camera side where `sin(angle) = 1`, softest half a turn later.
pub fn blur_for_angle(angle_y: f32, preset: &RenderPreset) -> BlurRadius {
    if !preset.blur_enabled {
        return BlurRadius::None;
    }
    let oscillation = (angle_y.sin() + 1.0) * 0.5;
    let [a, b] = preset.blur_range;
    let radius = a + (b - a) * (1.0 - oscillation);
    BlurRadius::Pixels(radius.clamp(a.min(b), a.max(b)))
}

/// Gentle bobbing and swaying on top of the spin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatMotion {
    offset: f32,
}

/// Float transform sampled at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatPose {
    pub rotation: Vec3,
    pub lift: f32,
}

impl FloatMotion {
    pub fn new(offset: f32) -> Self {
        Self { offset }
    }

    /// Picks a random phase so separate sessions do not bob in lockstep.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0.0..10_000.0))
    }

    pub fn sample(&self, elapsed_seconds: f32, preset: &RenderPreset) -> FloatPose {
        let t = (self.offset + elapsed_seconds) / 4.0 * preset.float_speed;
        let intensity = preset.rotation_intensity;
        FloatPose {
            rotation: Vec3::new(
                t.cos() / 8.0 * intensity,
                t.sin() / 8.0 * intensity,
                t.sin() / 20.0 * intensity,
            ),
            lift: t.sin() / 10.0 * preset.float_intensity,
        }
    }
}

impl FloatPose {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.lift, 0.0))
            * Mat4::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            )
    }
}

pub fn model_matrix(pose: &FloatPose, spin: &Spin, scale: f32) -> Mat4 {
    pose.transform() * spin.rotation() * Mat4::from_scale(Vec3::splat(scale))
}

fn wrap_angle(angle: f32) -> f32 {
    angle.rem_euclid(2.0 * PI)
}
