//! wgpu backend for the frame loop's drawing contract.
//!
//! `FrameRenderer` calls only collect geometry and parameters; `encode`
//! records the actual passes once the surface texture is acquired:
//!
//!   1. Quad pass into the logical target (world camera, then screen camera)
//!   2. Magnifier pass from the target onto the surface

use glam::Vec2;
use p2d_core::render::{FrameRenderer, MagnifierParams, Quad};

use crate::camera::{Camera2D, CameraUniform};
use crate::gpu_context::GpuContext;
use crate::magnifier::MagnifierPass;
use crate::quad_pipeline::QuadPipeline;
use crate::render_target::RenderTarget;
use crate::vertex::{QuadMesh, QuadVertex};

pub struct WgpuRenderer {
    quad_pipeline: QuadPipeline,
    magnifier: MagnifierPass,
    target: RenderTarget,
    camera: Camera2D,
    world_camera_buffer: wgpu::Buffer,
    world_camera_bind_group: wgpu::BindGroup,
    screen_camera_buffer: wgpu::Buffer,
    screen_camera_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    index_capacity: usize,

    // --- Collected for the current frame -----------------------------------
    mesh: QuadMesh,
    world_index_count: u32,
    requested_size: (u32, u32),
    clear_color: wgpu::Color,
    magnifier_params: Option<MagnifierParams>,
}

impl WgpuRenderer {
    pub fn new(gpu: &GpuContext, logical_size: (u32, u32)) -> Self {
        let device = &gpu.device;
        let quad_pipeline = QuadPipeline::new(device, RenderTarget::FORMAT);
        let mut magnifier = MagnifierPass::new(device, gpu.surface_format);
        let target = RenderTarget::new(device, logical_size);
        magnifier.bind_target(device, &target);

        let world_camera_buffer = create_camera_buffer(device, "World Camera Buffer");
        let screen_camera_buffer = create_camera_buffer(device, "Screen Camera Buffer");
        let world_camera_bind_group = quad_pipeline.create_camera_bind_group(
            device,
            "World Camera Bind Group",
            &world_camera_buffer,
        );
        let screen_camera_bind_group = quad_pipeline.create_camera_bind_group(
            device,
            "Screen Camera Bind Group",
            &screen_camera_buffer,
        );

        let vertex_capacity = 1024;
        let index_capacity = vertex_capacity / 4 * 6;

        Self {
            quad_pipeline,
            magnifier,
            camera: Camera2D::new(target.size.0, target.size.1),
            target,
            world_camera_buffer,
            world_camera_bind_group,
            screen_camera_buffer,
            screen_camera_bind_group,
            vertex_buffer: create_vertex_buffer(device, vertex_capacity),
            index_buffer: create_index_buffer(device, index_capacity),
            vertex_capacity,
            index_capacity,
            mesh: QuadMesh::default(),
            world_index_count: 0,
            requested_size: logical_size,
            clear_color: wgpu::Color::BLACK,
            magnifier_params: None,
        }
    }

    pub fn quad_count(&self) -> usize {
        self.mesh.vertices.len() / 4
    }

    fn ensure_target(&mut self, device: &wgpu::Device) {
        if self.target.size == self.requested_size {
            return;
        }
        self.target = RenderTarget::new(device, self.requested_size);
        self.magnifier.bind_target(device, &self.target);
        self.camera.viewport = self.target.size;
    }

    fn ensure_mesh_capacity(&mut self, device: &wgpu::Device) {
        let vertex_count = self.mesh.vertices.len();
        let index_count = self.mesh.indices.len();
        if vertex_count > self.vertex_capacity {
            self.vertex_capacity = vertex_count.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.vertex_capacity);
        }
        if index_count > self.index_capacity {
            self.index_capacity = index_count.next_power_of_two();
            self.index_buffer = create_index_buffer(device, self.index_capacity);
        }
    }

    /// Record the quad and magnifier passes for the collected frame. The
    /// caller submits the encoder after adding any UI passes on top.
    pub fn encode(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        surface_view: &wgpu::TextureView,
    ) {
        self.ensure_target(&gpu.device);
        self.ensure_mesh_capacity(&gpu.device);

        gpu.queue.write_buffer(
            &self.world_camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera.world_uniform()),
        );
        gpu.queue.write_buffer(
            &self.screen_camera_buffer,
            0,
            bytemuck::bytes_of(&self.camera.screen_uniform()),
        );
        if !self.mesh.vertices.is_empty() {
            gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(&self.mesh.vertices),
            );
            gpu.queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.mesh.indices));
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Logical Target Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            let total = self.mesh.index_count();
            if total > 0 {
                pass.set_pipeline(&self.quad_pipeline.render_pipeline);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                if self.world_index_count > 0 {
                    pass.set_bind_group(0, &self.world_camera_bind_group, &[]);
                    pass.draw_indexed(0..self.world_index_count, 0, 0..1);
                }
                if total > self.world_index_count {
                    pass.set_bind_group(0, &self.screen_camera_bind_group, &[]);
                    pass.draw_indexed(self.world_index_count..total, 0, 0..1);
                }
            }
        }

        let params = self.magnifier_params.unwrap_or_else(|| {
            MagnifierParams::new(Vec2::splat(0.5), gpu.size, 0.0)
        });
        self.magnifier
            .encode(&gpu.queue, encoder, surface_view, &params);
    }
}

impl FrameRenderer for WgpuRenderer {
    fn begin_target(&mut self, logical_size: (u32, u32), clear: [f32; 4]) {
        self.mesh.clear();
        self.world_index_count = 0;
        self.magnifier_params = None;
        self.requested_size = logical_size;
        self.clear_color = wgpu::Color {
            r: clear[0] as f64,
            g: clear[1] as f64,
            b: clear[2] as f64,
            a: clear[3] as f64,
        };
    }

    fn draw_world(&mut self, camera_center: Vec2, quads: &[Quad]) {
        self.camera.position = camera_center;
        self.mesh.extend(quads);
        self.world_index_count = self.mesh.index_count();
    }

    fn draw_overlay(&mut self, quads: &[Quad]) {
        self.mesh.extend(quads);
    }

    fn present_magnified(&mut self, params: &MagnifierParams) {
        self.magnifier_params = Some(*params);
    }
}

fn create_camera_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<CameraUniform>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<QuadVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Quad Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
