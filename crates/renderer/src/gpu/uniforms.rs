use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::preset::RenderPreset;
use crate::types::Theme;

pub(crate) const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.0, 5.0);
pub(crate) const CAMERA_FOV_DEGREES: f32 = 45.0;
const LIGHT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 100.0;

/// Perspective camera looking at the origin.
pub(crate) fn view_projection(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    let projection = Mat4::perspective_rh(
        CAMERA_FOV_DEGREES.to_radians(),
        aspect,
        NEAR_PLANE,
        FAR_PLANE,
    );
    let view = Mat4::look_at_rh(CAMERA_POSITION, Vec3::ZERO, Vec3::Y);
    projection * view
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub light: [f32; 4],
    pub ambient: [f32; 4],
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    pub base_color: [f32; 4],
    pub params: [f32; 4],
}

impl SceneUniforms {
    pub fn new(
        view_proj: Mat4,
        model: Mat4,
        preset: &RenderPreset,
        base_color: [f32; 4],
        opacity: f32,
    ) -> Self {
        let light = LIGHT_POSITION.normalize();
        let ambient = preset.ambient_light;
        let (sky, ground, environment) = match preset.environment {
            Some(environment) => (environment.sky(), environment.ground(), environment.intensity()),
            None => ([0.0; 3], [0.0; 3], 0.0),
        };
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            light: [light.x, light.y, light.z, preset.directional_light],
            ambient: [ambient, ambient, ambient, 0.0],
            sky: [sky[0], sky[1], sky[2], environment],
            ground: [ground[0], ground[1], ground[2], 0.0],
            base_color,
            params: [opacity.clamp(0.0, 1.0), 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub(crate) struct BlurUniforms {
    pub direction: [f32; 2],
    pub sigma: f32,
    pub composite: f32,
    pub background: [f32; 4],
    pub params: [f32; 4],
}

impl BlurUniforms {
    /// First pass: horizontal blur into the intermediate target.
    pub fn horizontal(width: u32, sigma: f32) -> Self {
        Self {
            direction: [1.0 / width.max(1) as f32, 0.0],
            sigma,
            composite: 0.0,
            background: [0.0; 4],
            params: [0.0; 4],
        }
    }

    /// Second pass: vertical blur composited over the theme background.
    pub fn composite(height: u32, sigma: f32, theme: Theme) -> Self {
        let [r, g, b] = theme.background();
        Self {
            direction: [0.0, 1.0 / height.max(1) as f32],
            sigma,
            composite: 1.0,
            background: [r, g, b, 1.0],
            params: [theme.canvas_opacity(), 0.0, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::RenderPresetId;

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<BlurUniforms>(), 48);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let clip = view_projection(1920, 1080) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn canonical_model_fits_the_view() {
        // A sphere of radius 2.25 at distance 5 stays inside a 45 degree frustum.
        let half_fov = (CAMERA_FOV_DEGREES / 2.0).to_radians();
        let visible_half_height = CAMERA_POSITION.z * half_fov.tan();
        assert!(visible_half_height > 2.0);
    }

    #[test]
    fn low_preset_turns_the_environment_off() {
        let uniforms = SceneUniforms::new(
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            RenderPresetId::Low.preset(),
            [1.0; 4],
            2.0,
        );
        assert_eq!(uniforms.sky[3], 0.0);
        assert_eq!(uniforms.light[3], 0.8);
        assert_eq!(uniforms.params[0], 1.0);
    }

    #[test]
    fn composite_pass_carries_theme() {
        let light = BlurUniforms::composite(600, 3.0, Theme::Light);
        assert_eq!(light.params[0], 0.4);
        assert_eq!(light.composite, 1.0);
        let horizontal = BlurUniforms::horizontal(800, 3.0);
        assert_eq!(horizontal.direction, [1.0 / 800.0, 0.0]);
        assert_eq!(horizontal.composite, 0.0);
    }
}
