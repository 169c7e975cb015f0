//! Shader program build: compile each WGSL stage, link the stage interface,
//! then create the wgpu render pipeline.
//!
//! Compilation and linking run on the CPU through naga before anything is
//! handed to wgpu, so a broken shader surfaces as a [`ShaderError`] with the
//! rendered diagnostic instead of a device-level validation panic. There is
//! no way to obtain a [`ShaderProgram`] from a failed build.

use std::borrow::Cow;
use std::fmt;

use naga::{Binding, Module, TypeInner};

/// Pipeline stage of a shader source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader build failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// WGSL parse or validation failed.
    Compile {
        label: String,
        stage: ShaderStage,
        diagnostic: String,
    },
    /// The source has no entry point for its stage, or more than one.
    MissingEntryPoint { label: String, stage: ShaderStage },
    /// The stages compiled but their interfaces do not fit together.
    Link { label: String, diagnostic: String },
}

impl ShaderError {
    /// Human-readable diagnostic text, without the stage/label prefix.
    pub fn diagnostic(&self) -> String {
        match self {
            ShaderError::Compile { diagnostic, .. } | ShaderError::Link { diagnostic, .. } => {
                diagnostic.clone()
            }
            ShaderError::MissingEntryPoint { stage, .. } => {
                format!("expected exactly one @{stage} entry point")
            }
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { label, stage, diagnostic } => {
                write!(f, "{label}: {stage} stage failed to compile:\n{diagnostic}")
            }
            ShaderError::MissingEntryPoint { label, stage } => {
                write!(f, "{label}: expected exactly one @{stage} entry point")
            }
            ShaderError::Link { label, diagnostic } => {
                write!(f, "{label}: program failed to link: {diagnostic}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// WGSL text for both stages of a program.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub label: Cow<'static, str>,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

/// One successfully parsed and validated stage.
#[derive(Debug)]
pub struct CompiledStage {
    label: String,
    stage: ShaderStage,
    source: String,
    module: Module,
    entry_point: String,
}

impl CompiledStage {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

/// Parses and validates `source` as a single `stage`.
///
/// Validation covers the required builtins: a vertex stage that does not
/// write `@builtin(position)` is a compile error.
pub fn compile_stage(
    label: &str,
    stage: ShaderStage,
    source: &str,
) -> Result<CompiledStage, ShaderError> {
    let compile_error = |diagnostic: String| ShaderError::Compile {
        label: label.to_string(),
        stage,
        diagnostic,
    };

    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|e| compile_error(e.emit_to_string(source)))?;

    let mut entries = module
        .entry_points
        .iter()
        .filter(|ep| ep.stage == stage.to_naga());
    let entry_point = match (entries.next(), entries.next()) {
        (Some(ep), None) => ep.name.clone(),
        _ => {
            return Err(ShaderError::MissingEntryPoint {
                label: label.to_string(),
                stage,
            });
        }
    };

    Ok(CompiledStage {
        label: label.to_string(),
        stage,
        source: source.to_string(),
        module,
        entry_point,
    })
}

/// A vertex + fragment pair whose interfaces have been checked against
/// each other. Holds only what pipeline creation needs.
#[derive(Debug)]
pub struct LinkedProgram {
    label: String,
    vertex_source: String,
    vertex_entry: String,
    fragment_source: String,
    fragment_entry: String,
}

/// Checks the vertex → fragment interface.
///
/// Every user location the fragment stage reads must be written by the
/// vertex stage with the same type, and the fragment stage must write color
/// location 0.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, ShaderError> {
    let link_error = |diagnostic: String| ShaderError::Link {
        label: vertex.label.clone(),
        diagnostic,
    };

    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(link_error(format!(
            "stages given as {} + {}, expected vertex + fragment",
            vertex.stage, fragment.stage
        )));
    }

    let varyings_out = stage_outputs(&vertex);
    let varyings_in = stage_inputs(&fragment);

    for (location, ty) in &varyings_in {
        match varyings_out.iter().find(|(l, _)| l == location) {
            None => {
                return Err(link_error(format!(
                    "fragment input @location({location}) is not written by the vertex stage"
                )));
            }
            Some((_, out_ty)) if out_ty != ty => {
                return Err(link_error(format!(
                    "@location({location}) is {out_ty:?} in the vertex stage but {ty:?} in the fragment stage"
                )));
            }
            Some(_) => {}
        }
    }

    if !stage_outputs(&fragment).iter().any(|(l, _)| *l == 0) {
        return Err(link_error("fragment stage does not write @location(0)".to_string()));
    }

    // The compiled stages (and their naga modules) end here; the pipeline is
    // created from source text.
    Ok(LinkedProgram {
        label: vertex.label,
        vertex_source: vertex.source,
        vertex_entry: vertex.entry_point,
        fragment_source: fragment.source,
        fragment_entry: fragment.entry_point,
    })
}

/// Location-bound values of the stage's entry point arguments.
fn stage_inputs(stage: &CompiledStage) -> Vec<(u32, TypeInner)> {
    let module = &stage.module;
    let Some(ep) = entry_point(stage) else { return Vec::new() };

    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

/// Location-bound values of the stage's entry point result.
fn stage_outputs(stage: &CompiledStage) -> Vec<(u32, TypeInner)> {
    let module = &stage.module;
    let Some(ep) = entry_point(stage) else { return Vec::new() };

    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn entry_point(stage: &CompiledStage) -> Option<&naga::EntryPoint> {
    stage
        .module
        .entry_points
        .iter()
        .find(|ep| ep.name == stage.entry_point && ep.stage == stage.stage.to_naga())
}

fn collect_locations(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            // Unbound arguments/results are structs whose members carry the bindings.
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

/// Fixed-function state and resource layout for [`ShaderProgram::build`].
pub struct PipelineDesc<'a> {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
}

/// Linked, GPU-resident shading program.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Compiles, links and uploads `source`.
    ///
    /// Nothing is created on the device unless both stages compile and link.
    pub fn build(
        device: &wgpu::Device,
        source: &ShaderSource,
        desc: &PipelineDesc<'_>,
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(&source.label, ShaderStage::Vertex, &source.vertex)?;
        let fragment = compile_stage(&source.label, ShaderStage::Fragment, &source.fragment)?;
        let linked = link(vertex, fragment)?;
        let program = Self::create_pipeline(device, linked, desc);

        log::info!("shader program `{}` built", program.label);
        Ok(program)
    }

    fn create_pipeline(
        device: &wgpu::Device,
        linked: LinkedProgram,
        desc: &PipelineDesc<'_>,
    ) -> Self {
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} vertex", linked.label)),
            source: wgpu::ShaderSource::Wgsl(linked.vertex_source.as_str().into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} fragment", linked.label)),
            source: wgpu::ShaderSource::Wgsl(linked.fragment_source.as_str().into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", linked.label)),
            bind_group_layouts: desc.bind_group_layouts,
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} pipeline", linked.label)),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(linked.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: desc.vertex_buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(linked.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: desc.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // Face winding in the index list is mixed.
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: desc.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        Self {
            label: linked.label,
            pipeline,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}
