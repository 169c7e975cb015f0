//! GPU rendering subsystem.
//!
//! - `shader`: WGSL stage compilation, interface linking, pipeline creation
//! - `mesh`: static vertex/index upload and scoped binding
//! - `cube`: the cube renderer tying program, mesh and transform uniform together
//!
//! Convention: right-handed world space, wgpu clip space (depth in `[0, 1]`).

mod ctx;
mod cube;
mod mesh;
mod shader;

pub use ctx::{RenderCtx, RenderTarget};
pub use cube::CubeRenderer;
pub use mesh::{BoundMesh, Mesh};
pub use shader::{
    compile_stage, link, CompiledStage, LinkedProgram, PipelineDesc, ShaderError, ShaderProgram,
    ShaderSource, ShaderStage,
};
