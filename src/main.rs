use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use chess_lights::cli::USAGE;
use chess_lights::{
    CliOptions, EventQueue, FrameClock, InputEvent, KeyAction, KeyCode, LightRig, LoopState,
    NamedKey, Renderer, SceneLayout, SceneState, StartupError,
};

const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        println!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse_from(env::args().skip(1))?;
    if options.show_help {
        println!("{USAGE}");
        return Ok(());
    }
    let layout = options.load_layout()?;
    info!(
        "scene layout has {} placements using {} models",
        layout.placements().count(),
        layout.model_paths().len()
    );

    if options.summary_only {
        print_summary(&layout);
        return Ok(());
    }
    run_interactive(options.assets, layout)
}

fn print_summary(layout: &SceneLayout) {
    println!(
        "Scene layout: {} placements, {} models",
        layout.placements().count(),
        layout.model_paths().len()
    );
    for placement in layout.placements() {
        let transform = &placement.transform;
        println!(
            " - {} ({}) pos=({:.2}, {:.2}, {:.2}) rot={:.1} scale=({:.2}, {:.2}, {:.2})",
            placement.name,
            placement.model,
            transform.position.x,
            transform.position.y,
            transform.position.z,
            transform.rotation_y,
            transform.scale.x,
            transform.scale.y,
            transform.scale.z
        );
    }
    println!("Point lights:");
    for (index, position) in LightRig::new().positions().iter().enumerate() {
        println!(
            " - {index} pos=({:.2}, {:.2}, {:.2})",
            position.x, position.y, position.z
        );
    }
}

fn run_interactive(assets: PathBuf, layout: SceneLayout) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| StartupError::Window(err.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        assets,
        layout,
        renderer: None,
        scene: SceneState::new(WINDOW_WIDTH, WINDOW_HEIGHT),
        events: EventQueue::new(),
        clock: FrameClock::new(Instant::now()),
        last_error: None,
    };
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    if let Some(err) = app.last_error {
        return Err(err);
    }
    Ok(())
}

struct App {
    assets: PathBuf,
    layout: SceneLayout,
    renderer: Option<Renderer>,
    scene: SceneState,
    events: EventQueue,
    clock: FrameClock,
    last_error: Option<anyhow::Error>,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title("Chess Lights")
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| StartupError::Window(err.to_string()))?,
        );
        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            &self.assets,
            &self.layout,
        ))
        .map_err(|err| StartupError::graphics(&err))?;

        let size = renderer.size();
        self.scene = SceneState::new(size.width, size.height);
        self.clock = FrameClock::new(Instant::now());
        self.renderer = Some(renderer);
        window.request_redraw();
        info!("window ready ({}x{})", size.width, size.height);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        self.scene.request_close();
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        let time = self.clock.tick(Instant::now());
        self.scene.update(self.events.drain(), time.delta);

        let size = renderer.size();
        let frame = self
            .scene
            .frame_uniforms(&self.layout, time.elapsed, size.width, size.height);
        match renderer.render(&frame, &self.layout) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = renderer.window().inner_size();
                renderer.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
            }
            Err(err) => warn!("frame skipped: {err}"),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        if window_id != renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.events.push(InputEvent::CloseRequested),
            WindowEvent::Resized(size) => renderer.resize(size),
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(event) = map_key_event(&event) {
                    self.events.push(event);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.events.push(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                })
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                    return;
                }
                if self.scene.state() == LoopState::ClosingRequested {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // GPU resources go before the loop returns
        self.renderer = None;
        self.scene.terminate();
        info!("shut down");
    }
}

fn map_key_event(event: &KeyEvent) -> Option<InputEvent> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let action = match (event.state, event.repeat) {
        (ElementState::Pressed, true) => KeyAction::Repeat,
        (ElementState::Pressed, false) => KeyAction::Press,
        (ElementState::Released, _) => KeyAction::Release,
    };
    Some(InputEvent::Key {
        code: map_keycode(code)?,
        action,
    })
}

fn map_keycode(code: winit::keyboard::KeyCode) -> Option<KeyCode> {
    use winit::keyboard::KeyCode as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Enter => KeyCode::Named(NamedKey::Enter),
        Key::Tab => KeyCode::Named(NamedKey::Tab),
        Key::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Key::ArrowRight => KeyCode::Named(NamedKey::Right),
        Key::ArrowUp => KeyCode::Named(NamedKey::Up),
        Key::ArrowDown => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::Backspace => KeyCode::Named(NamedKey::Backspace),
        Key::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        Key::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        Key::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        Key::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode as Key;

    #[test]
    fn only_top_row_digits_select_projection() {
        assert_eq!(map_keycode(Key::Digit1), Some(KeyCode::Digit(1)));
        assert_eq!(map_keycode(Key::Digit2), Some(KeyCode::Digit(2)));
        assert_eq!(map_keycode(Key::Numpad1), None);
        assert_eq!(map_keycode(Key::Numpad2), None);
    }

    #[test]
    fn movement_and_light_keys_are_mapped() {
        assert_eq!(map_keycode(Key::KeyW), Some(KeyCode::Character('W')));
        assert_eq!(map_keycode(Key::ArrowUp), Some(KeyCode::Named(NamedKey::Up)));
        assert_eq!(map_keycode(Key::KeyJ), Some(KeyCode::Character('J')));
        assert_eq!(map_keycode(Key::Escape), Some(KeyCode::Named(NamedKey::Escape)));
    }
}
