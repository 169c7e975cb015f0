//! CPU-side scene data: the cube mesh, the camera and the per-frame
//! transform chain.
//!
//! Nothing here touches the GPU; `render` consumes these types.

mod camera;
mod cube;
mod transform;

pub use camera::{Camera, Projection};
pub use cube::{Vertex, CUBE_INDICES, CUBE_VERTICES};
pub use transform::{model_at, TransformUniform, Transforms, ROTATION_AXIS};
