use crate::{
    gpu::Gpu,
    scene::Scene,
    view::SwarmView,
};

/// What the event loop should do after a frame was attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    Skipped,
    Fatal,
}

pub struct Renderer<'window> {
    pub gpu: Gpu<'window>,
    pub view: Option<SwarmView>,
    pub depth_texture_view: wgpu::TextureView,
    pub gui_renderer: egui_wgpu::Renderer,
}

impl<'window> Renderer<'window> {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'window>>,
        width: u32,
        height: u32,
    ) -> Result<Self, crate::gpu::Error> {
        let gpu = Gpu::new_async(window, width, height).await?;
        let depth_texture_view = gpu.create_depth_texture(width, height);
        let gui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.surface_format, Some(Gpu::DEPTH_FORMAT), 1);
        Ok(Self {
            gpu,
            view: None,
            depth_texture_view,
            gui_renderer,
        })
    }

    /// Builds GPU meshes and buffers sized for the scene.
    pub fn load_scene(&mut self, scene: &Scene) {
        let _ = std::mem::replace(&mut self.view, Some(SwarmView::new(&self.gpu, scene)));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.depth_texture_view = self.gpu.create_depth_texture(width, height);
    }

    pub fn render_frame(
        &mut self,
        scene: &Scene,
        textures_delta: &egui::epaint::textures::TexturesDelta,
        paint_jobs: Vec<egui::ClippedPrimitive>,
        screen_descriptor: egui_wgpu::ScreenDescriptor,
    ) -> FrameOutcome {
        let surface_texture = match self.gpu.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
                return FrameOutcome::Skipped;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next surface texture, skipping frame");
                return FrameOutcome::Skipped;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("The GPU is out of memory");
                return FrameOutcome::Fatal;
            }
        };

        if let Some(view) = self.view.as_mut() {
            view.sync(&self.gpu, scene);
        }

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        for (id, image_delta) in &textures_delta.set {
            self.gui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, image_delta);
        }

        for id in &textures_delta.free {
            self.gui_renderer.free_texture(id);
        }

        self.gui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        let surface_texture_view =
            surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor {
                    label: wgpu::Label::default(),
                    aspect: wgpu::TextureAspect::default(),
                    format: Some(self.gpu.surface_format),
                    dimension: None,
                    base_mip_level: 0,
                    mip_level_count: None,
                    base_array_layer: 0,
                    array_layer_count: None,
                });

        encoder.insert_debug_marker("Render scene");

        // This scope around the render_pass prevents the
        // render_pass from holding a borrow to the encoder,
        // which would prevent calling `.finish()` in
        // preparation for queue submission.
        {
            let background = scene.background;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: background.x as f64,
                            g: background.y as f64,
                            b: background.z as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(view) = self.view.as_ref() {
                view.render(&mut render_pass);
            }

            self.gui_renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        surface_texture.present();

        FrameOutcome::Presented
    }
}
