use std::borrow::Cow;

use crate::scene::{TransformUniform, Transforms, Vertex, CUBE_INDICES, CUBE_VERTICES};

use super::mesh::Mesh;
use super::shader::{PipelineDesc, ShaderError, ShaderProgram, ShaderSource};
use super::{RenderCtx, RenderTarget};

const VERTEX_SHADER: &str = include_str!("shaders/cube.vert.wgsl");
const FRAGMENT_SHADER: &str = include_str!("shaders/cube.frag.wgsl");

/// Draws the colored unit cube.
///
/// All GPU state is created in [`CubeRenderer::new`]: the shading program,
/// the static mesh, and a uniform buffer that receives the three transform
/// matrices every frame. The render pass loads (does not clear) the color
/// and depth attachments.
pub struct CubeRenderer {
    program: ShaderProgram,
    mesh: Mesh,
    transform_ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CubeRenderer {
    /// Embedded WGSL for the cube program.
    pub fn shader_source() -> ShaderSource {
        ShaderSource {
            label: Cow::Borrowed("cubix cube"),
            vertex: Cow::Borrowed(VERTEX_SHADER),
            fragment: Cow::Borrowed(FRAGMENT_SHADER),
        }
    }

    pub fn new(ctx: &RenderCtx<'_>) -> Result<Self, ShaderError> {
        Self::with_source(ctx, &Self::shader_source())
    }

    /// Builds the renderer with caller-provided shader text.
    ///
    /// The sources must keep the cube program's interface: vertex inputs at
    /// locations 0/1 and the transform block at group 0, binding 0.
    pub fn with_source(ctx: &RenderCtx<'_>, source: &ShaderSource) -> Result<Self, ShaderError> {
        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("cubix cube bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                std::mem::size_of::<TransformUniform>() as u64,
                            ),
                        },
                        count: None,
                    }],
                });

        let program = ShaderProgram::build(
            ctx.device,
            source,
            &PipelineDesc {
                color_format: ctx.surface_format,
                depth_format: Some(ctx.depth_format),
                bind_group_layouts: &[&bind_group_layout],
                vertex_buffers: &[Vertex::layout()],
            },
        )?;

        let mesh = Mesh::upload(ctx.device, "cubix cube", &CUBE_VERTICES, &CUBE_INDICES);

        let transform_ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cubix cube transform ubo"),
            size: std::mem::size_of::<TransformUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cubix cube bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        Ok(Self {
            program,
            mesh,
            transform_ubo,
            bind_group,
        })
    }

    /// Uploads `transforms` and records one indexed draw of the cube.
    pub fn render(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, transforms: &Transforms) {
        ctx.queue
            .write_buffer(&self.transform_ubo, 0, bytemuck::bytes_of(&transforms.uniform()));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cubix cube pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, &self.bind_group, &[]);
        self.mesh.bind(&mut rpass).draw();
        // Dropping the pass ends it and releases every binding made on it.
    }

    pub fn index_count(&self) -> u32 {
        self.mesh.index_count()
    }
}

impl Drop for CubeRenderer {
    fn drop(&mut self) {
        self.transform_ubo.destroy();
        log::info!("shader program `{}` released", self.program.label());
    }
}
