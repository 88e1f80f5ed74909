use crate::{
    gpu::Gpu,
    scene::{Instance, Mesh, Scene, Vertex},
};
use nalgebra_glm as glm;

const SPHERE_SEGMENTS: u32 = 16;

/// Draws the core and every ball with one instanced, Phong-lit pipeline.
pub struct SwarmView {
    pub uniform_buffer: wgpu::Buffer,
    pub uniform_bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
    pub balls: InstancedMesh,
    pub core: InstancedMesh,
}

impl SwarmView {
    pub fn new(gpu: &Gpu, scene: &Scene) -> Self {
        let (uniform_buffer, uniform_bind_group_layout, uniform_bind_group) = create_uniform(gpu);
        let pipeline = create_pipeline(gpu, &[&uniform_bind_group_layout]);

        let balls = InstancedMesh::new(
            gpu,
            "balls",
            &Mesh::uv_sphere(scene.ball_radius, SPHERE_SEGMENTS, SPHERE_SEGMENTS),
            scene.ball_positions.capacity().max(scene.ball_positions.len()),
        );
        let core = InstancedMesh::new(gpu, "core", &Mesh::cuboid(scene.core_half_extents), 1);

        Self {
            uniform_buffer,
            uniform_bind_group,
            pipeline,
            balls,
            core,
        }
    }

    /// Uploads camera, lights, and instance transforms for this frame.
    pub fn sync(&mut self, gpu: &Gpu, scene: &Scene) {
        let camera = &scene.camera;
        let lights = &scene.lights;
        let camera_direction = camera.forward();
        gpu.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[Uniform {
                view: camera.view_matrix(),
                projection: camera.projection_matrix(gpu.aspect_ratio()),
                camera_position: glm::vec3_to_vec4(&camera.position),
                point_light: glm::vec4(
                    lights.point_position.x,
                    lights.point_position.y,
                    lights.point_position.z,
                    lights.point_intensity,
                ),
                camera_light: glm::vec4(
                    camera_direction.x,
                    camera_direction.y,
                    camera_direction.z,
                    lights.camera_intensity,
                ),
            }]),
        );
        self.balls.write_instances(gpu, &scene.ball_instances());
        self.core.write_instances(gpu, &scene.core_instances());
    }

    pub fn render<'rp>(&'rp self, render_pass: &mut wgpu::RenderPass<'rp>) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        self.core.draw(render_pass);
        self.balls.draw(render_pass);
    }
}

/// A mesh together with a growable buffer of per-instance data.
pub struct InstancedMesh {
    pub label: &'static str,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub instance_buffer: wgpu::Buffer,
    pub instance_capacity: usize,
    pub instance_count: u32,
}

impl InstancedMesh {
    pub fn new(gpu: &Gpu, label: &'static str, mesh: &Mesh, instance_capacity: usize) -> Self {
        let (vertex_buffer, index_buffer) =
            create_geometry_buffers(&gpu.device, &mesh.vertices, &mesh.indices);
        let instance_capacity = instance_capacity.max(1);
        Self {
            label,
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            instance_buffer: create_instance_buffer(&gpu.device, label, instance_capacity),
            instance_capacity,
            instance_count: 0,
        }
    }

    pub fn write_instances(&mut self, gpu: &Gpu, instances: &[Instance]) {
        if instances.len() > self.instance_capacity {
            log::info!(
                "Growing {} instance buffer from {} to {} instances",
                self.label,
                self.instance_capacity,
                instances.len()
            );
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer =
                create_instance_buffer(&gpu.device, self.label, self.instance_capacity);
        }
        if !instances.is_empty() {
            gpu.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }
        self.instance_count = instances.len() as u32;
    }

    pub fn draw<'rp>(&'rp self, render_pass: &mut wgpu::RenderPass<'rp>) {
        if self.instance_count == 0 {
            return;
        }
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.index_count, 0, 0..self.instance_count);
    }
}

#[repr(C)]
#[derive(Default, Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniform {
    pub view: glm::Mat4,
    pub projection: glm::Mat4,
    pub camera_position: glm::Vec4,
    /// Position in `xyz`, intensity in `w`
    pub point_light: glm::Vec4,
    /// Direction in `xyz`, intensity in `w`
    pub camera_light: glm::Vec4,
}

fn create_uniform(gpu: &Gpu) -> (wgpu::Buffer, wgpu::BindGroupLayout, wgpu::BindGroup) {
    let uniform_buffer = wgpu::util::DeviceExt::create_buffer_init(
        &gpu.device,
        &wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::cast_slice(&[Uniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        },
    );

    let uniform_bind_group_layout =
        gpu.device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("uniform_bind_group_layout"),
            });

    let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &uniform_bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
        label: Some("uniform_bind_group"),
    });

    (
        uniform_buffer,
        uniform_bind_group_layout,
        uniform_bind_group,
    )
}

fn create_geometry_buffers(
    device: &wgpu::Device,
    vertices: &[Vertex],
    indices: &[u32],
) -> (wgpu::Buffer, wgpu::Buffer) {
    let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
        device,
        &wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        },
    );
    let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
        device,
        &wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        },
    );
    (vertex_buffer, index_buffer)
}

fn create_instance_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity * std::mem::size_of::<Instance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_pipeline(
    gpu: &Gpu,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let shader_module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: None,
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(SHADER_SOURCE)),
        });

    let pipeline_layout = gpu
        .device
        .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts,
            push_constant_ranges: &[],
        });

    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("swarm_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vertex_main",
                buffers: &[
                    vertex_description(&vertex_attributes()),
                    instance_description(&instance_attributes()),
                ],
            },
            primitive: wgpu::PrimitiveState {
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: Gpu::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fragment_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
        })
}

pub fn vertex_attributes() -> Vec<wgpu::VertexAttribute> {
    wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
    ]
    .to_vec()
}

pub fn vertex_description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

pub fn instance_attributes() -> Vec<wgpu::VertexAttribute> {
    wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4, // color
    ]
    .to_vec()
}

pub fn instance_description(attributes: &[wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Instance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

const SHADER_SOURCE: &str = "
struct Uniform {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    camera_position: vec4<f32>,
    point_light: vec4<f32>,
    camera_light: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> ubo: Uniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_matrix_0: vec4<f32>,
    @location(3) model_matrix_1: vec4<f32>,
    @location(4) model_matrix_2: vec4<f32>,
    @location(5) model_matrix_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vertex_main(vert: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model_matrix = mat4x4<f32>(
        instance.model_matrix_0,
        instance.model_matrix_1,
        instance.model_matrix_2,
        instance.model_matrix_3,
    );
    let world_position = model_matrix * vec4<f32>(vert.position, 1.0);

    var out: VertexOutput;
    out.position = ubo.projection * ubo.view * world_position;
    out.world_position = world_position.xyz;
    out.normal = (model_matrix * vec4<f32>(vert.normal, 0.0)).xyz;
    out.color = instance.color.rgb;
    return out;
}

const AMBIENT: f32 = 0.05;
const SHININESS: f32 = 30.0;
const SPECULAR: f32 = 0.067;

@fragment
fn fragment_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let normal = normalize(in.normal);
    let to_eye = normalize(ubo.camera_position.xyz - in.world_position);

    let to_point = normalize(ubo.point_light.xyz - in.world_position);
    let point_diffuse = max(dot(normal, to_point), 0.0) * ubo.point_light.w;
    let reflected = reflect(-to_point, normal);
    let point_specular = pow(max(dot(reflected, to_eye), 0.0), SHININESS) * ubo.point_light.w;

    let to_camera_light = normalize(-ubo.camera_light.xyz);
    let camera_diffuse = max(dot(normal, to_camera_light), 0.0) * ubo.camera_light.w;

    let diffuse = in.color * (AMBIENT + point_diffuse + camera_diffuse);
    return vec4<f32>(diffuse + vec3<f32>(SPECULAR * point_specular), 1.0);
}
";
