use wgpu::util::DeviceExt;

use crate::scene::Vertex;

impl Vertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // color
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Indexed triangle mesh resident on the GPU.
///
/// Buffers are created with their final contents and no `COPY_DST` usage;
/// the mesh cannot be modified after upload. Dropping it destroys both buffers.
pub struct Mesh {
    label: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vbo")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} ibo")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "mesh `{label}` uploaded: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );

        Self {
            label: label.to_string(),
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds the vertex and index buffers on `pass`.
    ///
    /// The returned guard is the only way to draw the mesh, and it borrows
    /// the pass mutably, so nothing else can be bound over it while it lives.
    pub fn bind<'p, 'e>(&self, pass: &'p mut wgpu::RenderPass<'e>) -> BoundMesh<'p, 'e> {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        BoundMesh {
            pass,
            index_count: self.index_count,
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        log::debug!("mesh `{}` released", self.label);
    }
}

/// A mesh bound to a render pass. See [`Mesh::bind`].
pub struct BoundMesh<'p, 'e> {
    pass: &'p mut wgpu::RenderPass<'e>,
    index_count: u32,
}

impl BoundMesh<'_, '_> {
    /// Issues one indexed triangle-list draw over the whole index buffer.
    pub fn draw(&mut self) {
        self.pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
