pub mod camera;
pub mod gpu_context;
pub mod magnifier;
pub mod quad_pipeline;
pub mod render_target;
pub mod renderer;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::GpuContext;
pub use magnifier::{MagnifierPass, MagnifierUniform};
pub use quad_pipeline::QuadPipeline;
pub use render_target::RenderTarget;
pub use renderer::WgpuRenderer;
pub use vertex::{QuadMesh, QuadVertex};
