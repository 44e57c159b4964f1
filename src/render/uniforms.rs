//! Plain-old-data mirrors of the WGSL uniform blocks.
//!
//! Every field is a `vec4`/`mat4` on the shader side so the Rust layout
//! matches WGSL's uniform address space rules without manual padding.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::lighting::POINT_LIGHT_COUNT;

/// `@group(0) @binding(0)`: camera matrices.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirLightUniform {
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightUniform {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// constant, linear, quadratic, unused
    pub attenuation: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightUniform {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub attenuation: [f32; 4],
    /// cos(inner), cos(outer), unused, unused
    pub cut_off: [f32; 4],
}

/// `@group(0) @binding(1)`: everything the lighting program shades with.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsUniform {
    pub view_position: [f32; 4],
    pub dir_light: DirLightUniform,
    pub point_lights: [PointLightUniform; POINT_LIGHT_COUNT],
    pub spot_light: SpotLightUniform,
    /// shininess, unused, unused, unused
    pub material: [f32; 4],
}

/// `@group(1) @binding(0)`: per-draw transform.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

impl ObjectUniform {
    pub fn new(model: Mat4) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
        }
    }
}

pub(crate) fn vec4(v: Vec3) -> [f32; 4] {
    v.extend(0.0).into()
}

pub(crate) fn point4(v: Vec3) -> [f32; 4] {
    v.extend(1.0).into()
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 128);
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 80);
        assert_eq!(std::mem::size_of::<SpotLightUniform>(), 112);
        assert_eq!(std::mem::size_of::<LightsUniform>(), 16 + 64 + 80 * 4 + 112 + 16);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 112);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let uniform = ObjectUniform::new(Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5)));
        assert!((uniform.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((uniform.normal[1][1] - 1.0).abs() < 1e-6);
        assert!((uniform.normal[2][2] - 2.0).abs() < 1e-6);
    }
}
