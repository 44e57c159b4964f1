use glam::{Mat4, Vec3};

/// Near clip plane shared by both projections.
pub const Z_NEAR: f32 = 0.1;
/// Far clip plane shared by both projections.
pub const Z_FAR: f32 = 100.0;
/// Half height of the orthographic view volume in world units.
pub const ORTHO_SIZE: f32 = 20.0;

const YAW: f32 = -90.0;
const PITCH: f32 = 0.0;
const SPEED: f32 = 6.0;
const SENSITIVITY: f32 = 0.25;
const ZOOM: f32 = 45.0;
const PITCH_LIMIT: f32 = 89.0;

/// Direction of a keyboard-driven camera move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-look camera driven by Euler angles (degrees).
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: YAW,
            pitch: PITCH,
            movement_speed: SPEED,
            mouse_sensitivity: SENSITIVITY,
            zoom: ZOOM,
        };
        camera.update_vectors();
        camera
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    /// Moves the camera along its front or right vector.
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    /// Applies a look offset; pitch is clamped so the view never flips.
    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch = (self.pitch + y_offset * self.mouse_sensitivity)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_vectors();
    }

    fn update_vectors(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

/// Which projection the frame loop builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

/// Extents of the orthographic view volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthoBounds {
    /// Volume `ORTHO_SIZE` units tall, widened by the framebuffer aspect.
    pub fn for_framebuffer(width: u32, height: u32) -> Self {
        let aspect = aspect_ratio(width, height);
        Self {
            left: -ORTHO_SIZE * aspect,
            right: ORTHO_SIZE * aspect,
            bottom: -ORTHO_SIZE,
            top: ORTHO_SIZE,
            near: Z_NEAR,
            far: Z_FAR,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Width over height; a zero-height framebuffer (minimised window) counts
/// as square.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Builds the projection for the given mode. `zoom` is the vertical field of
/// view in degrees and only affects the perspective projection.
pub fn projection_matrix(mode: ProjectionMode, zoom: f32, width: u32, height: u32) -> Mat4 {
    match mode {
        ProjectionMode::Perspective => Mat4::perspective_rh(
            zoom.to_radians(),
            aspect_ratio(width, height),
            Z_NEAR,
            Z_FAR,
        ),
        ProjectionMode::Orthographic => OrthoBounds::for_framebuffer(width, height).matrix(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert!(approx(camera.front, Vec3::NEG_Z));
        assert!(approx(camera.right, Vec3::X));
        assert!(approx(camera.up, Vec3::Y));
        assert_eq!(camera.zoom, 45.0);
    }

    #[test]
    fn keyboard_moves_along_front_and_right() {
        let mut camera = Camera::default();
        camera.process_keyboard(CameraMovement::Forward, 0.5);
        assert!(approx(camera.position, Vec3::new(0.0, 0.0, 0.0)));
        camera.process_keyboard(CameraMovement::Right, 1.0);
        assert!(approx(camera.position, Vec3::new(6.0, 0.0, 0.0)));
        camera.process_keyboard(CameraMovement::Left, 1.0);
        camera.process_keyboard(CameraMovement::Backward, 0.5);
        assert!(approx(camera.position, Vec3::new(0.0, 0.0, 3.0)));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.process_mouse_movement(0.0, -20_000.0);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn mouse_movement_turns_yaw() {
        let mut camera = Camera::default();
        // 360 units * 0.25 sensitivity = 90 degrees to the right
        camera.process_mouse_movement(360.0, 0.0);
        assert!(approx(camera.front, Vec3::X));
    }

    #[test]
    fn view_matrix_moves_eye_to_origin() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        let eye = camera.view_matrix() * Vec4::new(1.0, 2.0, 3.0, 1.0);
        assert!(approx(eye.truncate(), Vec3::ZERO));
    }

    #[test]
    fn orthographic_bounds_follow_aspect() {
        let bounds = OrthoBounds::for_framebuffer(800, 600);
        let half_width = 20.0 * (800.0 / 600.0);
        assert!((bounds.left + half_width).abs() < 1e-4);
        assert!((bounds.right - half_width).abs() < 1e-4);
        assert_eq!(bounds.bottom, -20.0);
        assert_eq!(bounds.top, 20.0);
        assert_eq!((bounds.near, bounds.far), (0.1, 100.0));
    }

    #[test]
    fn orthographic_matrix_maps_corner_to_clip_edge() {
        let bounds = OrthoBounds::for_framebuffer(800, 600);
        let clip = projection_matrix(ProjectionMode::Orthographic, 45.0, 800, 600)
            * Vec4::new(bounds.right, bounds.top, -bounds.near, 1.0);
        assert!(approx(clip.truncate(), Vec3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn perspective_uses_zoom_and_aspect() {
        let proj = projection_matrix(ProjectionMode::Perspective, 90.0, 800, 400);
        // cot(45deg) / aspect
        assert!((proj.x_axis.x - 0.5).abs() < 1e-4);
        assert!((proj.y_axis.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_height_is_treated_as_square() {
        assert_eq!(aspect_ratio(800, 0), 1.0);
    }
}
