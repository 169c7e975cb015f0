use bytemuck::{Pod, Zeroable};

/// Interleaved cube vertex: position then color, 6 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }
}

/// Unit cube centered at the origin. Vertices 0..4 lie on z = -0.5,
/// 4..8 on z = +0.5, each ring ordered bottom-left, bottom-right, top-right, top-left.
pub const CUBE_VERTICES: [Vertex; 8] = [
    Vertex::new([-0.5, -0.5, -0.5], [1.0, 0.0, 0.0]), // red
    Vertex::new([ 0.5, -0.5, -0.5], [0.0, 1.0, 0.0]), // green
    Vertex::new([ 0.5,  0.5, -0.5], [0.0, 0.0, 1.0]), // blue
    Vertex::new([-0.5,  0.5, -0.5], [1.0, 1.0, 0.0]), // yellow
    Vertex::new([-0.5, -0.5,  0.5], [1.0, 0.0, 1.0]), // magenta
    Vertex::new([ 0.5, -0.5,  0.5], [0.0, 1.0, 1.0]), // cyan
    Vertex::new([ 0.5,  0.5,  0.5], [1.0, 1.0, 1.0]), // white
    Vertex::new([-0.5,  0.5,  0.5], [0.5, 0.5, 0.5]), // gray
];

/// Two triangles per face. Culling is off, so winding is not significant.
pub const CUBE_INDICES: [u32; 36] = [
    0, 1, 2,  0, 2, 3, // front  (z = -0.5)
    4, 5, 6,  4, 6, 7, // back   (z = +0.5)
    0, 1, 5,  0, 5, 4, // bottom (y = -0.5)
    2, 3, 7,  2, 7, 6, // top    (y = +0.5)
    0, 3, 7,  0, 7, 4, // left   (x = -0.5)
    1, 2, 6,  1, 6, 5, // right  (x = +0.5)
];
