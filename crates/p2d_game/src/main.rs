//! Platformer2D -- window, event loop and per-frame orchestration.
//!
//! winit drives the event loop via `ApplicationHandler`. Simulation runs inside
//! `RedrawRequested` using a **fixed-timestep** model (see `FrameClock`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- one `FrameLoop::tick` per fixed-dt slice
//!   3. `FrameLoop::draw` -- world and overlay into the 800x480 target
//!   4. Magnifier pass onto the surface, then the egui HUD on top
//!
//! Gamepads are polled once per redraw, before the fixed steps.
//! The session is saved in the background when the window loses focus and
//! synchronously when it closes.

mod collision;
mod controller;
mod enemy;
mod layout;
mod level;
mod loader;
#[cfg(test)]
mod replay;

use std::path::Path;
use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use loader::{TileLevelLoader, LEVEL_COUNT};
use p2d_core::audio::{start_music, MusicPlayer};
use p2d_core::config::{GameConfig, DEFAULT_CONFIG_PATH};
use p2d_core::frame::FrameLoop;
use p2d_core::input::{InputState, Key};
use p2d_core::machine::{LevelSession, SessionEvent};
use p2d_core::persistence::{
    load_session, save_blocking, FileStore, SaveOutcome, SaveTicket, SessionSaver,
};
use p2d_core::render::{LOGICAL_HEIGHT, LOGICAL_WIDTH};
use p2d_core::time::FrameClock;
use p2d_hud::{DebugStats, HudOverlay};
use p2d_platform::audio::open_music_player;
use p2d_platform::gamepad::GamepadPoller;
use p2d_platform::window::PlatformConfig;
use p2d_render::{GpuContext, WgpuRenderer};

/// Everything that exists once the window and GPU are up.
struct GameState {
    window: Arc<Window>,
    gpu: GpuContext,
    clock: FrameClock,
    input: InputState,
    gamepads: GamepadPoller,
    frame: FrameLoop<TileLevelLoader>,
    renderer: WgpuRenderer,
    hud: HudOverlay,
    saver: SessionSaver<FileStore>,
    pending_save: Option<SaveTicket>,
    _music: Box<dyn MusicPlayer>,
}

impl GameState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;

        let saver = SessionSaver::new(FileStore::new(&config.save_dir));
        let saved = load_session(saver.store(), LEVEL_COUNT);
        let loader = TileLevelLoader::new(&config.level_dir, config.time_limit());
        let session = LevelSession::new(loader, saved, LEVEL_COUNT)?;
        let frame = FrameLoop::new(session, gpu.size, config.magnifier_factor);

        let renderer = WgpuRenderer::new(&gpu, (LOGICAL_WIDTH, LOGICAL_HEIGHT));
        let hud = HudOverlay::new(
            &gpu.device,
            gpu.surface_format,
            &window,
            config.warning_time(),
        );

        let mut music = open_music_player();
        start_music(music.as_mut(), &config.music_track);

        Ok(Self {
            window,
            gpu,
            clock: FrameClock::new(config.fixed_dt),
            input: InputState::new(),
            gamepads: GamepadPoller::new(),
            frame,
            renderer,
            hud,
            saver,
            pending_save: None,
            _music: music,
        })
    }

    /// Background save when the game is suspended.
    fn save_in_background(&mut self) {
        if let Some(ticket) = self.pending_save.take() {
            if !ticket.is_finished() {
                self.pending_save = Some(ticket);
            } else if let Err(err) = ticket.wait() {
                log::warn!("{err}");
            }
        }
        match self.saver.request_save(&self.frame.session_state()) {
            SaveOutcome::Started(ticket) => self.pending_save = Some(ticket),
            SaveOutcome::SkippedInFlight => {
                log::info!("Suspend save skipped, previous save still running")
            }
            SaveOutcome::Failed(err) => log::warn!("Suspend save not started: {err}"),
        }
    }

    /// Final save on exit. Waits for any in-flight write first so the last
    /// state always lands.
    fn save_on_close(&mut self) {
        if let Some(ticket) = self.pending_save.take() {
            if let Err(err) = ticket.wait() {
                log::warn!("{err}");
            }
        }
        save_blocking(&self.saver, &self.frame.session_state());
    }

    fn handle_touch(&mut self, id: u64, phase: TouchPhase, x: f64, y: f64) {
        match phase {
            TouchPhase::Started | TouchPhase::Moved => {
                self.input.touch_moved(id, Vec2::new(x as f32, y as f32));
            }
            TouchPhase::Ended | TouchPhase::Cancelled => self.input.touch_ended(id),
        }
    }

    /// Run the fixed steps for this redraw. A level load failure is fatal.
    fn simulate(&mut self, event_loop: &ActiveEventLoop) -> Result<(), String> {
        self.clock.begin_frame();
        self.input.gamepad = self.gamepads.poll();

        while self.clock.should_step() {
            if self.input.is_just_pressed(Key::F3) {
                self.hud.toggle_debug();
            }

            let dt = self.clock.fixed_dt as f32;
            let report = self.frame.tick(&self.input, dt, &mut self.hud)?;
            match report.event {
                SessionEvent::None => {}
                SessionEvent::Restarted => log::info!("Continue: new life"),
                SessionEvent::Advanced { level_index } => {
                    log::info!("Continue: advanced to level {level_index}")
                }
                SessionEvent::Reloaded { level_index } => {
                    log::info!("Continue: retrying level {level_index}")
                }
            }
            if report.back_requested {
                log::info!("Back pressed, exiting.");
                self.save_on_close();
                event_loop.exit();
                return Ok(());
            }
            // Clear edges only once a step has consumed them; a press that
            // lands on a frame with no steps would otherwise be lost.
            self.input.end_frame();
        }
        Ok(())
    }

    fn render(&mut self) {
        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        self.frame.draw(&mut self.renderer);

        let stats = self.frame.session().phase().map(|phase| DebugStats {
            level_index: self.frame.session().level_index(),
            level_count: self.frame.session().level_count(),
            phase_label: phase.label().to_string(),
            quad_count: self.renderer.quad_count() as u32,
            saving: self.saver.is_saving(),
        });
        let (egui_primitives, egui_textures_delta) =
            self.hud.prepare(&self.window, &self.clock, stats);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.renderer.encode(&self.gpu, &mut encoder, &view);

        self.hud.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.hud
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.hud.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: GameConfig,
    state: Option<GameState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let platform = PlatformConfig {
            title: self.config.window.title.clone(),
            width: self.config.window.width,
            height: self.config.window.height,
            ..Default::default()
        };
        let window = p2d_platform::window::create_window(event_loop, &platform)
            .unwrap_or_else(|e| panic!("{e}"));
        match GameState::new(window, &self.config) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("{err}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state.hud.handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.save_on_close();
                event_loop.exit();
            }

            WindowEvent::Focused(false) => {
                log::info!("Window lost focus, saving session");
                state.save_in_background();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.frame.set_surface_size((w, h));
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(game_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(game_key),
                            ElementState::Released => state.input.key_up(game_key),
                        }
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                state.input.mouse_position = (position.x, position.y);
            }

            WindowEvent::Touch(touch) => {
                state.handle_touch(
                    touch.id,
                    touch.phase,
                    touch.location.x,
                    touch.location.y,
                );
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }
                if let Err(err) = state.simulate(event_loop) {
                    log::error!("{err}");
                    event_loop.exit();
                    return;
                }
                state.render();
            }

            _ => {}
        }
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyD => Some(Key::D),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Platformer2D starting...");

    let config = GameConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
