use bytemuck::Zeroable;
use glam::Vec3;

use crate::camera::Camera;
use crate::render::uniforms::{
    point4, vec4, DirLightUniform, LightsUniform, PointLightUniform, SpotLightUniform,
};

/// Number of point lights the lighting program shades with.
pub const POINT_LIGHT_COUNT: usize = 4;
/// Index of the only point light that moves and changes colour.
pub const ACCENT_LIGHT: usize = 0;
/// Distance a held light key moves the accent light each frame.
pub const LIGHT_NUDGE_STEP: f32 = 0.01;
/// Accent toggle vector while the accent light is on.
pub const ACCENT_ON: Vec3 = Vec3::new(1.0, 1.0, 0.0);
pub const MATERIAL_SHININESS: f32 = 1.0;

const SPOT_CUTOFF_DEGREES: f32 = 12.0;

const INITIAL_POSITIONS: [Vec3; POINT_LIGHT_COUNT] = [
    Vec3::new(32.0, 10.0, 32.0),
    Vec3::new(32.0, 10.0, -32.0),
    Vec3::new(-32.0, 10.0, 32.0),
    Vec3::new(-32.0, 10.0, -32.0),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// No falloff with distance.
    pub const CONSTANT_ONLY: Self = Self {
        constant: 1.0,
        linear: 0.0,
        quadratic: 0.0,
    };

    fn to_uniform(self) -> [f32; 4] {
        [self.constant, self.linear, self.quadratic, 0.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

impl PointLight {
    fn to_uniform(self) -> PointLightUniform {
        PointLightUniform {
            position: point4(self.position),
            ambient: vec4(self.ambient),
            diffuse: vec4(self.diffuse),
            specular: vec4(self.specular),
            attenuation: self.attenuation.to_uniform(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirectionalLight {
    /// The scene's sun: grey ambient fill only.
    pub fn fixed() -> Self {
        Self {
            direction: Vec3::new(-0.2, -1.0, -0.3),
            ambient: Vec3::splat(0.5),
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
        }
    }

    fn to_uniform(self) -> DirLightUniform {
        DirLightUniform {
            direction: vec4(self.direction),
            ambient: vec4(self.ambient),
            diffuse: vec4(self.diffuse),
            specular: vec4(self.specular),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    /// Cosine of the inner cone angle.
    pub cut_off: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off: f32,
}

impl SpotLight {
    /// Flashlight at the camera. All colour channels are zero, so it
    /// contributes nothing while still being uploaded every frame.
    pub fn follow(camera: &Camera) -> Self {
        let cut_off = SPOT_CUTOFF_DEGREES.to_radians().cos();
        Self {
            position: camera.position,
            direction: camera.front,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ZERO,
            specular: Vec3::ZERO,
            attenuation: Attenuation::CONSTANT_ONLY,
            cut_off,
            outer_cut_off: cut_off,
        }
    }

    fn to_uniform(self) -> SpotLightUniform {
        SpotLightUniform {
            position: point4(self.position),
            direction: vec4(self.direction),
            ambient: vec4(self.ambient),
            diffuse: vec4(self.diffuse),
            specular: vec4(self.specular),
            attenuation: self.attenuation.to_uniform(),
            cut_off: [self.cut_off, self.outer_cut_off, 0.0, 0.0],
        }
    }
}

/// Colour of the accent light at `elapsed` seconds.
///
/// X and Y are rectified, Z is not, so a toggle vector with a non-zero Z
/// would dip below zero.
pub fn accent_color(elapsed: f32, toggle: Vec3) -> Vec3 {
    Vec3::new(
        (elapsed * toggle.x).sin().abs(),
        (elapsed * toggle.y).sin().abs(),
        (elapsed * toggle.z).sin(),
    )
}

impl LightsUniform {
    /// Writes the fields of point light `index`. Indices past the end of the
    /// array are ignored, the same way an unknown uniform name uploads
    /// nothing.
    pub fn set_point_light(&mut self, index: usize, light: &PointLight) {
        if let Some(slot) = self.point_lights.get_mut(index) {
            *slot = light.to_uniform();
        }
    }
}

/// Point-light positions plus the accent light's on/off state.
#[derive(Debug, Clone, PartialEq)]
pub struct LightRig {
    positions: [Vec3; POINT_LIGHT_COUNT],
    active: bool,
    accent: Vec3,
}

impl Default for LightRig {
    fn default() -> Self {
        Self::new()
    }
}

impl LightRig {
    /// Four lights at the board corners, accent light off.
    pub fn new() -> Self {
        Self {
            positions: INITIAL_POSITIONS,
            active: false,
            accent: Vec3::ZERO,
        }
    }

    pub fn positions(&self) -> &[Vec3; POINT_LIGHT_COUNT] {
        &self.positions
    }

    pub fn accent_position(&self) -> Vec3 {
        self.positions[ACCENT_LIGHT]
    }

    pub fn nudge_accent(&mut self, delta: Vec3) {
        self.positions[ACCENT_LIGHT] += delta;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current toggle vector fed into [`accent_color`].
    pub fn accent(&self) -> Vec3 {
        self.accent
    }

    /// Flips the accent light and resets its toggle vector.
    pub fn toggle_accent(&mut self) {
        self.active = !self.active;
        self.accent = if self.active { ACCENT_ON } else { Vec3::ZERO };
        log::debug!("accent light {}", if self.active { "on" } else { "off" });
    }

    /// Point light `index` as shaded at `elapsed` seconds, or `None` past
    /// the last light.
    pub fn point_light(&self, index: usize, elapsed: f32) -> Option<PointLight> {
        let position = *self.positions.get(index)?;
        let (ambient, diffuse) = if index == ACCENT_LIGHT {
            let color = accent_color(elapsed, self.accent);
            (color, color)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        };
        Some(PointLight {
            position,
            ambient,
            diffuse,
            specular: Vec3::ONE,
            attenuation: Attenuation::CONSTANT_ONLY,
        })
    }

    /// Assembles the full lighting block for one frame.
    pub fn uniform(&self, camera: &Camera, elapsed: f32) -> LightsUniform {
        let mut uniform = LightsUniform {
            view_position: point4(camera.position),
            dir_light: DirectionalLight::fixed().to_uniform(),
            point_lights: [PointLightUniform::zeroed(); POINT_LIGHT_COUNT],
            spot_light: SpotLight::follow(camera).to_uniform(),
            material: [MATERIAL_SHININESS, 0.0, 0.0, 0.0],
        };
        for index in 0..POINT_LIGHT_COUNT {
            if let Some(light) = self.point_light(index, elapsed) {
                uniform.set_point_light(index, &light);
            }
        }
        uniform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accent_color_rectifies_x_and_y_only() {
        for t in [0.0_f32, 0.7, 2.0, 4.5, 100.25] {
            let color = accent_color(t, ACCENT_ON);
            assert!((color.x - t.sin().abs()).abs() < 1e-6);
            assert!((color.y - t.sin().abs()).abs() < 1e-6);
            assert_eq!(color.z, 0.0);
        }
        let color = accent_color(4.0, Vec3::Z);
        assert!(color.z < 0.0);
    }

    #[test]
    fn accent_is_dark_while_inactive() {
        let rig = LightRig::new();
        assert_eq!(accent_color(3.0, rig.accent()), Vec3::ZERO);
    }

    #[test]
    fn toggle_alternates_accent_vector() {
        let mut rig = LightRig::new();
        for presses in 1..=6 {
            rig.toggle_accent();
            if presses % 2 == 1 {
                assert!(rig.is_active());
                assert_eq!(rig.accent(), ACCENT_ON);
            } else {
                assert!(!rig.is_active());
                assert_eq!(rig.accent(), Vec3::ZERO);
            }
        }
    }

    #[test]
    fn only_the_accent_light_moves() {
        let mut rig = LightRig::new();
        rig.nudge_accent(Vec3::new(LIGHT_NUDGE_STEP, 0.0, -LIGHT_NUDGE_STEP));
        let moved = rig.accent_position() - Vec3::new(32.01, 10.0, 31.99);
        assert!(moved.abs().max_element() < 1e-5);
        assert_eq!(rig.positions()[1..], INITIAL_POSITIONS[1..]);
    }

    #[test]
    fn static_lights_are_specular_only() {
        let mut rig = LightRig::new();
        rig.toggle_accent();
        let uniform = rig.uniform(&Camera::default(), 1.0);
        for light in &uniform.point_lights[1..] {
            assert_eq!(light.ambient, [0.0; 4]);
            assert_eq!(light.diffuse, [0.0; 4]);
            assert_eq!(light.specular, [1.0, 1.0, 1.0, 0.0]);
            assert_eq!(light.attenuation, [1.0, 0.0, 0.0, 0.0]);
        }
        let accent = uniform.point_lights[ACCENT_LIGHT];
        let expected = 1.0_f32.sin().abs();
        assert!((accent.ambient[0] - expected).abs() < 1e-6);
        assert_eq!(accent.ambient, accent.diffuse);
        assert_eq!(accent.position, [32.0, 10.0, 32.0, 1.0]);
    }

    #[test]
    fn spotlight_follows_camera_with_zero_colour() {
        let mut camera = Camera::default();
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        let uniform = LightRig::new().uniform(&camera, 0.0);
        assert_eq!(uniform.view_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.spot_light.position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.spot_light.diffuse, [0.0; 4]);
        let cut = 12.0_f32.to_radians().cos();
        assert_eq!(uniform.spot_light.cut_off, [cut, cut, 0.0, 0.0]);
        assert_eq!(uniform.material[0], MATERIAL_SHININESS);
        assert_eq!(uniform.dir_light.ambient, [0.5, 0.5, 0.5, 0.0]);
    }

    #[test]
    fn point_light_past_the_end_is_none() {
        let rig = LightRig::new();
        assert!(rig.point_light(POINT_LIGHT_COUNT - 1, 0.0).is_some());
        assert_eq!(rig.point_light(POINT_LIGHT_COUNT, 0.0), None);
        assert_eq!(rig.point_light(usize::MAX, 0.0), None);
    }

    #[test]
    fn out_of_range_point_light_is_ignored() {
        let mut uniform = LightRig::new().uniform(&Camera::default(), 0.0);
        let before = uniform;
        uniform.set_point_light(POINT_LIGHT_COUNT, &PointLight {
            position: Vec3::ONE,
            ambient: Vec3::ONE,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            attenuation: Attenuation::CONSTANT_ONLY,
        });
        assert_eq!(uniform, before);
    }
}
