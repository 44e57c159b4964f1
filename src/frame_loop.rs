//! Per-frame state: input dispatch, held-key updates and the uniform values
//! handed to the renderer.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec2, Vec3};

use crate::camera::{projection_matrix, Camera, CameraMovement, ProjectionMode};
use crate::input::{InputEvent, InputState, KeyAction, KeyCode, NamedKey};
use crate::lighting::{LightRig, LIGHT_NUDGE_STEP, POINT_LIGHT_COUNT};
use crate::render::uniforms::{CameraUniform, LightsUniform, ObjectUniform};
use crate::scene::SceneLayout;

/// Held movement keys advance the camera this many times faster than
/// `movement_speed * delta`.
pub const MOVEMENT_MULTIPLIER: f32 = 2.0;
/// Edge length of the cube drawn at each point light.
pub const LAMP_SCALE: f32 = 0.2;

const MOVEMENT_KEYS: [(CameraMovement, [KeyCode; 2]); 4] = [
    (
        CameraMovement::Forward,
        [KeyCode::Character('W'), KeyCode::Named(NamedKey::Up)],
    ),
    (
        CameraMovement::Backward,
        [KeyCode::Character('S'), KeyCode::Named(NamedKey::Down)],
    ),
    (
        CameraMovement::Left,
        [KeyCode::Character('A'), KeyCode::Named(NamedKey::Left)],
    ),
    (
        CameraMovement::Right,
        [KeyCode::Character('D'), KeyCode::Named(NamedKey::Right)],
    ),
];

const LIGHT_KEYS: [(char, Vec3); 6] = [
    ('T', Vec3::X),
    ('G', Vec3::NEG_X),
    ('Y', Vec3::Y),
    ('H', Vec3::NEG_Y),
    ('U', Vec3::NEG_Z),
    ('J', Vec3::Z),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Running,
    /// Exit was requested; the in-flight frame still completes.
    ClosingRequested,
    Terminated,
}

/// Monotonic frame timer.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
}

/// Timing of one frame, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub delta: f32,
    pub elapsed: f32,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self {
            start,
            last_frame: start,
        }
    }

    /// Records `now` as the latest frame and returns the time since the
    /// previous one and since the clock started.
    pub fn tick(&mut self, now: Instant) -> FrameTime {
        let delta = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        FrameTime {
            delta: delta.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.last_frame.saturating_duration_since(self.start)
    }
}

/// Everything the renderer uploads for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUniforms {
    pub camera: CameraUniform,
    pub lights: LightsUniform,
    /// One entry per [`SceneLayout::placements`], board first.
    pub models: Vec<ObjectUniform>,
    pub lamps: [ObjectUniform; POINT_LIGHT_COUNT],
}

/// Mutable scene state owned by the frame loop.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub camera: Camera,
    pub input: InputState,
    pub lights: LightRig,
    pub projection: ProjectionMode,
    state: LoopState,
}

impl SceneState {
    /// Fresh state for a window of the given size; the cursor baseline starts
    /// at the window centre.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: Camera::default(),
            input: InputState::new(width, height),
            lights: LightRig::new(),
            projection: ProjectionMode::Perspective,
            state: LoopState::Running,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn request_close(&mut self) {
        if self.state == LoopState::Running {
            log::info!("close requested");
            self.state = LoopState::ClosingRequested;
        }
    }

    /// Final transition once the last frame has been presented.
    pub fn terminate(&mut self) {
        self.state = LoopState::Terminated;
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key { code, action } => self.handle_key(code, action),
            InputEvent::CursorMoved { x, y } => self.handle_cursor(Vec2::new(x, y)),
            InputEvent::CloseRequested => self.request_close(),
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, action: KeyAction) {
        if !self.input.set_key(code, action) {
            log::trace!("ignoring key {code:?} outside the key table");
            return;
        }
        if action != KeyAction::Press {
            return;
        }
        match code {
            KeyCode::Named(NamedKey::Escape) => self.request_close(),
            KeyCode::Named(NamedKey::Space) => self.lights.toggle_accent(),
            KeyCode::Digit(1) => self.projection = ProjectionMode::Perspective,
            KeyCode::Digit(2) => self.projection = ProjectionMode::Orthographic,
            _ => {}
        }
    }

    pub fn handle_cursor(&mut self, position: Vec2) {
        let offset = self.input.cursor_offset(position);
        self.camera.process_mouse_movement(offset.x, offset.y);
    }

    /// Applies continuous movement for every key currently held.
    pub fn apply_held_keys(&mut self, delta: f32) {
        for (direction, keys) in MOVEMENT_KEYS {
            if self.input.any_down(&keys) {
                self.camera
                    .process_keyboard(direction, delta * MOVEMENT_MULTIPLIER);
            }
        }
        for (key, axis) in LIGHT_KEYS {
            if self.input.is_key_down(KeyCode::Character(key)) {
                self.lights.nudge_accent(axis * LIGHT_NUDGE_STEP);
            }
        }
    }

    /// Drains queued input, then applies held keys.
    pub fn update<I>(&mut self, events: I, delta: f32)
    where
        I: IntoIterator<Item = InputEvent>,
    {
        for event in events {
            self.handle_event(event);
        }
        self.apply_held_keys(delta);
    }

    pub fn frame_uniforms(
        &self,
        layout: &SceneLayout,
        elapsed: f32,
        width: u32,
        height: u32,
    ) -> FrameUniforms {
        let projection = projection_matrix(self.projection, self.camera.zoom, width, height);
        let positions = self.lights.positions();
        FrameUniforms {
            camera: CameraUniform::new(self.camera.view_matrix(), projection),
            lights: self.lights.uniform(&self.camera, elapsed),
            models: layout
                .placements()
                .map(|placement| ObjectUniform::new(placement.transform.matrix()))
                .collect(),
            lamps: std::array::from_fn(|index| ObjectUniform::new(lamp_matrix(positions[index]))),
        }
    }
}

/// Model matrix of the marker cube drawn at a point light.
pub fn lamp_matrix(position: Vec3) -> Mat4 {
    Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(LAMP_SCALE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::EventQueue;
    use crate::lighting::ACCENT_ON;

    fn press(code: KeyCode) -> InputEvent {
        InputEvent::Key {
            code,
            action: KeyAction::Press,
        }
    }

    fn release(code: KeyCode) -> InputEvent {
        InputEvent::Key {
            code,
            action: KeyAction::Release,
        }
    }

    #[test]
    fn last_projection_key_wins() {
        let mut state = SceneState::new(800, 600);
        for (keys, expected) in [
            (vec![2], ProjectionMode::Orthographic),
            (vec![2, 2], ProjectionMode::Orthographic),
            (vec![2, 1], ProjectionMode::Perspective),
            (vec![1, 1, 2], ProjectionMode::Orthographic),
        ] {
            state.projection = ProjectionMode::Perspective;
            for key in keys {
                state.handle_event(press(KeyCode::Digit(key)));
                state.handle_event(release(KeyCode::Digit(key)));
            }
            assert_eq!(state.projection, expected);
        }
    }

    #[test]
    fn space_presses_toggle_accent() {
        let mut state = SceneState::new(800, 600);
        for presses in 1..=5 {
            state.handle_event(press(KeyCode::Named(NamedKey::Space)));
            state.handle_event(release(KeyCode::Named(NamedKey::Space)));
            let expected = if presses % 2 == 1 { ACCENT_ON } else { Vec3::ZERO };
            assert_eq!(state.lights.accent(), expected);
        }
        // key repeat while held does not toggle again
        state.handle_event(InputEvent::Key {
            code: KeyCode::Named(NamedKey::Space),
            action: KeyAction::Repeat,
        });
        assert_eq!(state.lights.accent(), ACCENT_ON);
    }

    #[test]
    fn escape_and_close_request_shutdown() {
        let mut state = SceneState::new(800, 600);
        state.handle_event(press(KeyCode::Named(NamedKey::Escape)));
        assert_eq!(state.state(), LoopState::ClosingRequested);
        state.terminate();
        assert_eq!(state.state(), LoopState::Terminated);

        let mut state = SceneState::new(800, 600);
        state.handle_event(InputEvent::CloseRequested);
        assert!(!state.is_running());
    }

    #[test]
    fn held_keys_move_camera_until_released() {
        let mut state = SceneState::new(800, 600);
        let mut queue = EventQueue::new();
        queue.push(press(KeyCode::Named(NamedKey::Up)));
        state.update(queue.drain(), 0.25);
        // speed 6 * 0.25s * 2
        assert!((state.camera.position.z - 0.0).abs() < 1e-5);

        queue.push(release(KeyCode::Named(NamedKey::Up)));
        queue.push(press(KeyCode::Character('d')));
        state.update(queue.drain(), 0.5);
        assert!((state.camera.position - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn light_keys_nudge_only_the_accent_light() {
        let mut state = SceneState::new(800, 600);
        state.handle_event(press(KeyCode::Character('T')));
        state.handle_event(press(KeyCode::Character('U')));
        for _ in 0..10 {
            state.apply_held_keys(1.0);
        }
        let moved = state.lights.accent_position() - Vec3::new(32.1, 10.0, 31.9);
        assert!(moved.abs().max_element() < 1e-4);
        assert_eq!(state.lights.positions()[1], Vec3::new(32.0, 10.0, -32.0));
    }

    #[test]
    fn cursor_events_turn_the_camera() {
        let mut state = SceneState::new(800, 600);
        state.handle_event(InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        assert_eq!(state.camera.yaw, -90.0);
        state.handle_event(InputEvent::CursorMoved { x: 140.0, y: 60.0 });
        assert_eq!(state.camera.yaw, -80.0);
        assert_eq!(state.camera.pitch, 10.0);
    }

    #[test]
    fn clock_reports_delta_and_elapsed() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let first = clock.tick(start + Duration::from_millis(500));
        assert!((first.delta - 0.5).abs() < 1e-6);
        let second = clock.tick(start + Duration::from_millis(750));
        assert!((second.delta - 0.25).abs() < 1e-6);
        assert!((second.elapsed - 0.75).abs() < 1e-6);
        assert_eq!(clock.elapsed(), Duration::from_millis(750));
    }

    #[test]
    fn frame_uniforms_cover_every_placement_and_lamp() {
        let layout = SceneLayout::chessboard();
        let mut state = SceneState::new(800, 600);
        state.projection = ProjectionMode::Orthographic;
        let frame = state.frame_uniforms(&layout, 1.0, 800, 600);
        assert_eq!(frame.models.len(), layout.placements().count());
        assert_eq!(
            frame.models[0],
            ObjectUniform::new(layout.board.transform.matrix())
        );
        assert_eq!(
            frame.camera.projection,
            projection_matrix(ProjectionMode::Orthographic, 45.0, 800, 600).to_cols_array_2d()
        );
        let lamp = frame.lamps[3].model;
        assert_eq!(lamp[0][0], LAMP_SCALE);
        assert_eq!(lamp[3], [-32.0, 10.0, -32.0, 1.0]);
    }
}
