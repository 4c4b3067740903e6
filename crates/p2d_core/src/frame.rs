//! Per-tick orchestration: input, session update, HUD notify, draw.

use crate::aggregator::{InputAggregator, InputSnapshot};
use crate::edge::RisingEdge;
use crate::hud::HudPresenter;
use crate::input::InputState;
use crate::level::{Level, LevelLoader, LevelPhase};
use crate::machine::{LevelSession, SessionEvent};
use crate::render::{
    clamp_camera, FrameRenderer, MagnifierParams, Quad, StatusOverlay, CLEAR_COLOR,
    LOGICAL_HEIGHT, LOGICAL_SIZE, LOGICAL_WIDTH,
};
use crate::session::SessionState;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub event: SessionEvent,
    pub phase: LevelPhase,
    /// The back control was pressed this tick.
    pub back_requested: bool,
}

pub struct FrameLoop<Lo: LevelLoader> {
    session: LevelSession<Lo>,
    input: InputAggregator,
    continue_edge: RisingEdge,
    back_edge: RisingEdge,
    last_snapshot: InputSnapshot,
    magnifier_factor: f32,
    world_quads: Vec<Quad>,
    overlay_quads: Vec<Quad>,
}

impl<Lo: LevelLoader> FrameLoop<Lo> {
    pub fn new(session: LevelSession<Lo>, surface_size: (u32, u32), magnifier_factor: f32) -> Self {
        Self {
            session,
            input: InputAggregator::new(surface_size),
            continue_edge: RisingEdge::new(),
            back_edge: RisingEdge::new(),
            last_snapshot: InputSnapshot::default(),
            magnifier_factor,
            world_quads: Vec::new(),
            overlay_quads: Vec::new(),
        }
    }

    pub fn set_surface_size(&mut self, surface_size: (u32, u32)) {
        self.input.set_surface_size(surface_size);
    }

    pub fn session(&self) -> &LevelSession<Lo> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut LevelSession<Lo> {
        &mut self.session
    }

    /// Session ready to persist, live progress included.
    pub fn session_state(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn last_snapshot(&self) -> &InputSnapshot {
        &self.last_snapshot
    }

    /// Advance one simulation step. A level load failure is returned as-is
    /// and is not recoverable.
    pub fn tick(
        &mut self,
        raw: &InputState,
        dt: f32,
        hud: &mut dyn HudPresenter,
    ) -> Result<FrameReport, String> {
        let snapshot = self.input.sample(raw);
        let continue_edge = self.continue_edge.sample(snapshot.continue_held);
        let back_requested = self.back_edge.sample(snapshot.back_held);
        self.input.virtual_pad_mut().update(dt);

        let event = self.session.update(&snapshot, continue_edge, dt)?;

        let runtime = self
            .session
            .runtime()
            .ok_or_else(|| "No level is loaded".to_string())?;
        hud.on_level_update(&runtime);
        if runtime.player_velocity != glam::Vec2::ZERO {
            self.input.virtual_pad_mut().notify_player_is_moving();
        }

        self.last_snapshot = snapshot;
        Ok(FrameReport {
            event,
            phase: LevelPhase::from_runtime(&runtime),
            back_requested,
        })
    }

    /// Record the frame: world and overlay into the logical target, then the
    /// magnified present onto the surface.
    pub fn draw(&mut self, renderer: &mut dyn FrameRenderer) {
        let Some(level) = self.session.level() else {
            return;
        };

        renderer.begin_target((LOGICAL_WIDTH, LOGICAL_HEIGHT), CLEAR_COLOR);

        self.world_quads.clear();
        level.emit_world(&mut self.world_quads);
        let camera = clamp_camera(level.camera_focus(), level.bounds(), LOGICAL_SIZE);
        renderer.draw_world(camera, &self.world_quads);

        self.overlay_quads.clear();
        let overlay = match LevelPhase::from_runtime(&level.runtime()) {
            LevelPhase::Playing => None,
            LevelPhase::TimeExpiredWin => Some(StatusOverlay::Win),
            LevelPhase::TimeExpiredLose => Some(StatusOverlay::Lose),
            LevelPhase::PlayerDead => Some(StatusOverlay::Died),
        };
        if let Some(overlay) = overlay {
            self.overlay_quads.extend(overlay.quads());
        }
        if self.last_snapshot.touch_connected {
            self.overlay_quads.extend(self.input.virtual_pad().quads());
        }
        renderer.draw_overlay(&self.overlay_quads);

        let params = MagnifierParams::new(
            self.last_snapshot.pointer,
            self.input.surface_size(),
            self.magnifier_factor,
        );
        renderer.present_magnified(&params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{GamepadState, Key};
    use crate::level::LevelRuntime;
    use crate::machine::tests::FakeLoader;
    use glam::Vec2;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum Call {
        Begin((u32, u32)),
        World(Vec2, usize),
        Overlay(usize),
        Present(MagnifierParams),
    }

    #[derive(Default)]
    struct RecordingRenderer {
        calls: Vec<Call>,
    }

    impl FrameRenderer for RecordingRenderer {
        fn begin_target(&mut self, logical_size: (u32, u32), _clear: [f32; 4]) {
            self.calls.push(Call::Begin(logical_size));
        }

        fn draw_world(&mut self, camera_center: Vec2, quads: &[Quad]) {
            self.calls.push(Call::World(camera_center, quads.len()));
        }

        fn draw_overlay(&mut self, quads: &[Quad]) {
            self.calls.push(Call::Overlay(quads.len()));
        }

        fn present_magnified(&mut self, params: &MagnifierParams) {
            self.calls.push(Call::Present(*params));
        }
    }

    #[derive(Default)]
    struct CountingHud {
        updates: Vec<LevelRuntime>,
    }

    impl HudPresenter for CountingHud {
        fn on_level_update(&mut self, runtime: &LevelRuntime) {
            self.updates.push(*runtime);
        }
    }

    fn frame_loop() -> FrameLoop<FakeLoader> {
        let session = LevelSession::new(FakeLoader::default(), SessionState::default(), 3)
            .expect("session should load");
        FrameLoop::new(session, (1600, 960), 0.2)
    }

    #[test]
    fn hud_is_notified_once_per_tick() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let raw = InputState::new();
        for _ in 0..3 {
            frame.tick(&raw, 1.0 / 60.0, &mut hud).expect("tick");
        }
        assert_eq!(hud.updates.len(), 3);
        assert!(hud.updates[2].time_remaining < Duration::from_secs(120));
    }

    #[test]
    fn held_continue_fires_only_once() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();

        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .player_alive = false;
        raw.key_down(Key::Space);
        let first = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(first.event, SessionEvent::Restarted);

        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .player_alive = false;
        let second = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(second.event, SessionEvent::None);
        assert_eq!(second.phase, LevelPhase::PlayerDead);

        raw.key_up(Key::Space);
        frame.tick(&raw, 0.0, &mut hud).expect("tick");
        raw.key_down(Key::Space);
        let third = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(third.event, SessionEvent::Restarted);
    }

    #[test]
    fn gamepad_a_continues_once_per_press() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();
        raw.gamepad = GamepadState {
            connected: true,
            button_a: true,
            ..Default::default()
        };

        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .player_alive = false;
        let first = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(first.event, SessionEvent::Restarted);

        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .player_alive = false;
        let held = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(held.event, SessionEvent::None);
    }

    #[test]
    fn gamepad_back_and_disconnected_pad() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();
        raw.gamepad = GamepadState {
            connected: false,
            button_a: true,
            button_back: true,
            ..Default::default()
        };
        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .player_alive = false;
        let report = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(report.event, SessionEvent::None);
        assert!(!report.back_requested);

        raw.gamepad.connected = true;
        let report = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert!(report.back_requested);
        assert_eq!(report.event, SessionEvent::Restarted);
    }

    #[test]
    fn back_is_reported_on_press_only() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();
        raw.key_down(Key::Escape);
        assert!(frame.tick(&raw, 0.0, &mut hud).expect("tick").back_requested);
        assert!(!frame.tick(&raw, 0.0, &mut hud).expect("tick").back_requested);
    }

    #[test]
    fn movement_resets_the_touch_hint() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();

        frame.tick(&raw, 10.0, &mut hud).expect("tick");
        assert_eq!(frame.input.virtual_pad().hint_opacity(), 1.0);

        raw.key_down(Key::Right);
        frame.tick(&raw, 1.0 / 60.0, &mut hud).expect("tick");
        assert_eq!(frame.input.virtual_pad().hint_opacity(), 0.0);
    }

    #[test]
    fn draw_order_is_world_then_overlay_then_present() {
        let mut frame = frame_loop();
        let mut renderer = RecordingRenderer::default();
        frame.draw(&mut renderer);

        assert_eq!(renderer.calls.len(), 4);
        assert_eq!(renderer.calls[0], Call::Begin((800, 480)));
        assert!(matches!(renderer.calls[1], Call::World(_, 1)));
        assert_eq!(renderer.calls[2], Call::Overlay(0));
        match &renderer.calls[3] {
            Call::Present(params) => {
                assert_eq!(params.surface_size, Vec2::new(1600.0, 960.0));
                assert_eq!(params.pointer, Vec2::splat(0.5));
                assert!((params.factor - 0.2).abs() < 1e-6);
            }
            other => panic!("expected present, got {other:?}"),
        }
    }

    #[test]
    fn terminal_phase_draws_status_panel() {
        let mut frame = frame_loop();
        frame
            .session_mut()
            .level_mut()
            .expect("level")
            .runtime
            .time_remaining = Duration::ZERO;
        let mut renderer = RecordingRenderer::default();
        frame.draw(&mut renderer);
        assert_eq!(renderer.calls[2], Call::Overlay(2));
    }

    #[test]
    fn session_state_follows_level_changes() {
        let mut frame = frame_loop();
        let mut hud = CountingHud::default();
        let mut raw = InputState::new();
        {
            let level = frame.session_mut().level_mut().expect("level");
            level.runtime.time_remaining = Duration::ZERO;
            level.runtime.reached_exit = true;
        }
        raw.key_down(Key::Space);
        let report = frame.tick(&raw, 0.0, &mut hud).expect("tick");
        assert_eq!(report.event, SessionEvent::Advanced { level_index: 1 });
        assert_eq!(frame.session_state().level_index, 1);
    }
}
