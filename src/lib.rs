//! Chessboard scene viewer: a free-look camera over a textured board and
//! pieces, shaded by a directional light, four point lights (one of them
//! movable and colour-cycling) and a camera spotlight.
//!
//! Everything except [`render`] is plain data and math so the scene logic
//! can be exercised without a window or GPU.

pub mod camera;
pub mod cli;
pub mod error;
pub mod frame_loop;
pub mod input;
pub mod lighting;
pub mod obj;
pub mod render;
pub mod scene;

pub use camera::{projection_matrix, Camera, CameraMovement, OrthoBounds, ProjectionMode};
pub use cli::CliOptions;
pub use error::StartupError;
pub use frame_loop::{FrameClock, FrameUniforms, LoopState, SceneState};
pub use input::{EventQueue, InputEvent, InputState, KeyAction, KeyCode, NamedKey};
pub use lighting::{accent_color, LightRig, PointLight};
pub use obj::{load_obj_from_str, parse_mtl, ObjMesh, ObjModel};
pub use render::Renderer;
pub use scene::{Placement, SceneLayout, Transform};
