pub mod model;
mod renderer;
pub mod shaders;
pub mod uniforms;

pub use model::{Model, ModelLoader, Texture};
pub use renderer::Renderer;
pub use uniforms::{CameraUniform, LightsUniform, ObjectUniform};
