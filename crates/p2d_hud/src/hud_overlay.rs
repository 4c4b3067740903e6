//! In-game HUD and debug window rendered via egui on top of the magnified
//! scene.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! The HUD text is always drawn; the debug window only when toggled by F3.

use std::time::Duration;

use p2d_core::hud::{HudPresenter, HudText};
use p2d_core::level::LevelRuntime;
use p2d_core::time::FrameClock;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct DebugStats {
    pub level_index: usize,
    pub level_count: usize,
    pub phase_label: String,
    pub quad_count: u32,
    pub saving: bool,
}

/// Latest HUD state, refreshed once per tick by the frame loop.
#[derive(Debug, Clone)]
pub struct HudModel {
    warning_time: Duration,
    text: Option<HudText>,
    updates: u64,
}

impl HudModel {
    pub fn new(warning_time: Duration) -> Self {
        Self {
            warning_time,
            text: None,
            updates: 0,
        }
    }

    pub fn text(&self) -> Option<&HudText> {
        self.text.as_ref()
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl HudPresenter for HudModel {
    fn on_level_update(&mut self, runtime: &LevelRuntime) {
        self.text = Some(HudText::from_runtime(runtime, self.warning_time));
        self.updates += 1;
    }
}

pub struct HudOverlay {
    pub model: HudModel,
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub debug_visible: bool,
}

impl HudOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
        warning_time: Duration,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            model: HudModel::new(warning_time),
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            debug_visible: false,
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle_debug(&mut self) {
        self.debug_visible = !self.debug_visible;
        log::info!(
            "Debug window: {}",
            if self.debug_visible { "ON" } else { "OFF" }
        );
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        clock: &FrameClock,
        stats: Option<DebugStats>,
    ) -> (Vec<egui::ClippedPrimitive>, egui::TexturesDelta) {
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let text = self.model.text().cloned();
        let debug_visible = self.debug_visible;

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(text) = &text {
                draw_hud(ctx, text);
            }
            if debug_visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 80.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", clock.smoothed_fps));
                        ui.label(format!("Frame time: {:.2} ms", clock.smoothed_frame_time_ms));
                        ui.label(format!("Steps this frame: {}", clock.steps_this_frame));
                        ui.label(format!("Total steps: {}", clock.fixed_step_count));
                        if let Some(ref stats) = stats {
                            ui.separator();
                            ui.label(format!(
                                "Level: {} / {}",
                                stats.level_index + 1,
                                stats.level_count
                            ));
                            ui.label(format!("Phase: {}", stats.phase_label));
                            ui.label(format!("Quads: {}", stats.quad_count));
                            if stats.saving {
                                ui.label("Saving...");
                            }
                        }
                    });
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

impl HudPresenter for HudOverlay {
    fn on_level_update(&mut self, runtime: &LevelRuntime) {
        self.model.on_level_update(runtime);
    }
}

fn color32(rgb: [u8; 3]) -> egui::Color32 {
    egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

fn shadowed(ui: &mut egui::Ui, text: &str, color: egui::Color32, size: f32) {
    ui.label(
        egui::RichText::new(text)
            .color(color)
            .size(size)
            .strong()
            .background_color(egui::Color32::from_black_alpha(96)),
    );
}

fn draw_hud(ctx: &egui::Context, text: &HudText) {
    egui::Area::new(egui::Id::new("hud_counters"))
        .anchor(egui::Align2::LEFT_TOP, [12.0, 8.0])
        .interactable(false)
        .show(ctx, |ui| {
            shadowed(ui, &text.time, color32(text.time_color.rgb()), 20.0);
            shadowed(ui, &text.score, egui::Color32::YELLOW, 20.0);
        });

    if let Some(status) = text.status {
        egui::Area::new(egui::Id::new("hud_status"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .interactable(false)
            .show(ctx, |ui| {
                shadowed(ui, status, egui::Color32::WHITE, 22.0);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use p2d_core::hud::TimeColor;

    fn runtime(secs: u64) -> LevelRuntime {
        LevelRuntime {
            time_remaining: Duration::from_secs(secs),
            reached_exit: false,
            player_alive: true,
            player_velocity: Vec2::ZERO,
            score: 60,
        }
    }

    #[test]
    fn model_keeps_latest_update() {
        let mut model = HudModel::new(Duration::from_secs(30));
        assert!(model.text().is_none());

        model.on_level_update(&runtime(100));
        model.on_level_update(&runtime(29));

        let text = model.text().expect("text after update");
        assert_eq!(text.time, "TIME: 00:29");
        assert_eq!(text.time_color, TimeColor::Warning);
        assert_eq!(text.score, "SCORE: 60");
        assert_eq!(model.updates(), 2);
    }
}
