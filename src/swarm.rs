use crate::{
    app::{Context, State},
    attraction::{Attraction, CoreSpin, ForceModel},
    config::{SwarmConfig, WindowConfig},
    gravity::{GravityTarget, PointerEvent},
    physics::{BodyDescription, PhysicsWorld},
    placement::generate_positions,
};
use nalgebra_glm as glm;
use rapier3d::prelude::RigidBodyHandle;

/// How often periodic statistics are logged, in frames.
const STATS_LOG_INTERVAL: u64 = 600;

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Stats {
    pub frames: u64,
    pub impulses_applied: u64,
    /// Impulses dropped because they were not finite
    pub skipped_impulses: u64,
}

/// The whole simulation: the physics world, the core it spins, the balls it
/// attracts, and the target they are attracted to.
pub struct Swarm {
    pub config: SwarmConfig,
    pub physics: PhysicsWorld,
    pub core: Option<RigidBodyHandle>,
    pub balls: Vec<RigidBodyHandle>,
    pub target: GravityTarget,
    pub spin: CoreSpin,
    pub attraction: Attraction,
    pub stats: Stats,
}

impl Swarm {
    pub fn new(config: SwarmConfig) -> Self {
        let mut physics = PhysicsWorld::new(glm::Vec3::zeros(), config.time_step);

        let spin = CoreSpin::new(
            glm::Vec3::from(config.core.rotation),
            config.core.spin_step,
        );
        let half_extent = config.core.half_extent;
        let core = physics.add_fixed_cuboid(
            glm::Vec3::zeros(),
            glm::vec3(half_extent, half_extent, half_extent),
            BodyDescription {
                mass: config.core.mass,
                restitution: config.core.restitution,
            },
        );
        physics.set_rotation(core, spin.orientation());

        let ball = BodyDescription {
            mass: config.ball.mass,
            restitution: config.ball.restitution,
        };
        let balls = generate_positions(
            config.balls_per_side,
            config.placement.radius,
            config.placement.stride,
        )
        .into_iter()
        .map(|position| physics.add_dynamic_ball(position, config.ball.radius, ball))
        .collect::<Vec<_>>();

        log::info!(
            "Created swarm with {} balls around a core of half extent {}",
            balls.len(),
            half_extent
        );

        let target = GravityTarget::new(
            config.input.pixels_per_unit,
            config.input.track_while_held,
        );
        let attraction = Attraction {
            gravitational_constant: config.attraction.gravitational_constant,
            core_mass: config.core.mass,
            min_distance: config.attraction.min_distance,
            force_model: config.attraction.force_model,
        };

        Self {
            config,
            physics,
            core: Some(core),
            balls,
            target,
            spin,
            attraction,
            stats: Stats::default(),
        }
    }

    /// Advances the simulation by one frame.
    pub fn step(&mut self) {
        self.physics.step();

        if let Some(core) = self.core {
            let rotation = self.spin.advance();
            self.physics.set_rotation(core, rotation);
        }

        let target = self.target.position;
        let body_mass = self.config.ball.mass;
        for ball in self.balls.iter() {
            let Some(position) = self.physics.translation(*ball) else {
                continue;
            };
            match self.attraction.impulse(&position, body_mass, &target) {
                Some(impulse) => {
                    self.physics.apply_impulse(*ball, impulse);
                    self.stats.impulses_applied += 1;
                }
                None => {
                    if self.stats.skipped_impulses == 0 {
                        log::warn!(
                            "Skipping a non-finite impulse for a ball at {:?}",
                            position.as_slice()
                        );
                    }
                    self.stats.skipped_impulses += 1;
                }
            }
        }

        self.stats.frames += 1;
        if self.stats.frames % STATS_LOG_INTERVAL == 0 {
            log::debug!("{:?}", self.stats);
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        self.target.receive_pointer_event(event);
    }

    pub fn ball_positions(&self) -> Vec<glm::Vec3> {
        self.balls
            .iter()
            .filter_map(|ball| self.physics.translation(*ball))
            .collect()
    }

    pub fn core_position(&self) -> Option<glm::Vec3> {
        self.core.and_then(|core| self.physics.translation(core))
    }

    pub fn core_rotation(&self) -> glm::Quat {
        self.core
            .and_then(|core| self.physics.rotation(core))
            .unwrap_or_else(|| self.spin.orientation())
    }

    /// Mean distance from the balls to the gravity target.
    pub fn mean_distance_to_target(&self) -> f32 {
        let positions = self.ball_positions();
        if positions.is_empty() {
            return 0.0;
        }
        let total = positions
            .iter()
            .map(|position| glm::distance(position, &self.target.position))
            .sum::<f32>();
        total / positions.len() as f32
    }

    pub fn force_model(&self) -> ForceModel {
        self.attraction.force_model
    }

    pub fn toggle_force_model(&mut self) {
        self.attraction.force_model = self.attraction.force_model.toggled();
        log::info!("Force model set to {}", self.attraction.force_model);
    }

    pub fn reset_target(&mut self) {
        self.target.release();
    }

    /// Releases every body and collider. Calling this more than once is harmless.
    pub fn shutdown(&mut self) {
        if self.core.is_none() && self.balls.is_empty() {
            return;
        }
        self.physics.clear();
        self.core = None;
        self.balls.clear();
        log::info!("Swarm shut down after {} frames", self.stats.frames);
    }

    pub fn is_shut_down(&self) -> bool {
        self.core.is_none() && self.physics.body_count() == 0
    }

    /// Copies the current body transforms into the render snapshot.
    pub fn sync_scene(&self, scene: &mut crate::scene::Scene) {
        scene.ball_positions.clear();
        scene.ball_positions.extend(
            self.balls
                .iter()
                .filter_map(|ball| self.physics.translation(*ball)),
        );
        if let Some(position) = self.core_position() {
            scene.core_transform.translation = position;
        }
        scene.core_transform.rotation = self.core_rotation();
    }

    fn receive_key(&mut self, context: &mut Context, key_code: winit::keyboard::KeyCode) {
        match key_code {
            winit::keyboard::KeyCode::Space => context.frame_loop.toggle(),
            winit::keyboard::KeyCode::KeyR => self.reset_target(),
            winit::keyboard::KeyCode::KeyF => self.toggle_force_model(),
            _ => {}
        }
    }

    fn overlay(&mut self, context: &mut Context, ui: &egui::Context) {
        egui::Window::new("Swarm")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ui, |ui| {
                egui::Grid::new("swarm_stats").num_columns(2).show(ui, |ui| {
                    ui.label("Frames");
                    ui.label(self.stats.frames.to_string());
                    ui.end_row();

                    ui.label("Balls");
                    ui.label(self.balls.len().to_string());
                    ui.end_row();

                    let target = self.target.position;
                    ui.label("Target");
                    ui.label(format!("({:.2}, {:.2}, {:.2})", target.x, target.y, target.z));
                    ui.end_row();

                    ui.label("Force model");
                    ui.label(self.attraction.force_model.to_string());
                    ui.end_row();

                    ui.label("Skipped impulses");
                    ui.label(self.stats.skipped_impulses.to_string());
                    ui.end_row();

                    ui.label("Frame time");
                    ui.label(format!("{:.1} ms", context.delta_time * 1000.0));
                    ui.end_row();
                });

                ui.separator();

                ui.horizontal(|ui| {
                    let label = if context.frame_loop.is_running() {
                        "Pause"
                    } else {
                        "Resume"
                    };
                    if ui.button(label).clicked() {
                        context.frame_loop.toggle();
                    }
                    if ui.button("Reset target").clicked() {
                        self.reset_target();
                    }
                    if ui.button("Toggle force").clicked() {
                        self.toggle_force_model();
                    }
                });
            });
    }
}

impl State for Swarm {
    fn window(&self) -> WindowConfig {
        self.config.window.clone()
    }

    fn initialize(&mut self, context: &mut Context) {
        context.scene = crate::scene::Scene::from_config(&self.config);
        self.sync_scene(&mut context.scene);
        context.should_reload_view = true;
    }

    fn receive_event(&mut self, context: &mut Context, event: &winit::event::Event<()>) {
        let winit::event::Event::WindowEvent { event, .. } = event else {
            return;
        };

        if let winit::event::WindowEvent::KeyboardInput {
            event:
                winit::event::KeyEvent {
                    physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                    state: winit::event::ElementState::Pressed,
                    repeat: false,
                    ..
                },
            ..
        } = event
        {
            self.receive_key(context, *key_code);
        }

        if let Some(pointer_event) = context.io.pointer_event(event, self.config.input.model) {
            self.handle_pointer(pointer_event);
        }
    }

    fn update(&mut self, context: &mut Context) {
        self.step();
        self.sync_scene(&mut context.scene);
    }

    fn ui(&mut self, context: &mut Context, ui: &egui::Context) {
        self.overlay(context, ui);
    }

    fn shutdown(&mut self, _context: &mut Context) {
        Swarm::shutdown(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SwarmConfig {
        config(4)
    }

    fn config(balls_per_side: usize) -> SwarmConfig {
        SwarmConfig {
            balls_per_side,
            ..Default::default()
        }
    }

    fn run(swarm: &mut Swarm, frames: usize) {
        for _ in 0..frames {
            swarm.step();
        }
    }

    #[test]
    fn creates_one_core_and_every_ball() {
        let swarm = Swarm::new(small_config());
        assert_eq!(swarm.balls.len(), 16);
        assert_eq!(swarm.physics.body_count(), 17);
        for position in swarm.ball_positions() {
            assert!((glm::length(&position) - 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn core_starts_at_its_configured_orientation() {
        let swarm = Swarm::new(small_config());
        let expected = CoreSpin::default().orientation();
        assert!(glm::quat_dot(&swarm.core_rotation(), &expected).abs() > 0.9999);
    }

    #[test]
    fn step_applies_one_impulse_per_ball() {
        let mut swarm = Swarm::new(small_config());
        swarm.step();
        swarm.step();
        assert_eq!(swarm.stats.frames, 2);
        assert_eq!(swarm.stats.impulses_applied, 32);
        assert_eq!(swarm.stats.skipped_impulses, 0);
    }

    #[test]
    fn step_spins_the_core_about_y() {
        let mut swarm = Swarm::new(small_config());
        let before = swarm.spin.angles.y;
        swarm.step();
        assert!((swarm.spin.angles.y - before - 0.1).abs() < 1e-5);
        assert_eq!(swarm.spin.angles.x, 45.0);
        assert_eq!(swarm.spin.angles.z, 45.0);
    }

    #[test]
    fn ball_on_the_target_is_skipped_not_poisoned() {
        let mut config = small_config();
        config.balls_per_side = 1;
        let mut swarm = Swarm::new(config);
        let ball = swarm.balls[0];
        let position = swarm.physics.translation(ball).unwrap();
        swarm.target.position = position;

        swarm.step();
        assert_eq!(swarm.stats.skipped_impulses, 1);
        let after = swarm.physics.translation(ball).unwrap();
        assert!(after.iter().all(|component| component.is_finite()));
    }

    #[test]
    fn pointer_press_and_release_move_the_target() {
        let mut swarm = Swarm::new(small_config());
        swarm.handle_pointer(PointerEvent::Pressed(glm::vec2(150.0, 50.0)));
        assert!((swarm.target.position - glm::vec3(1.5, 0.0, -0.5)).norm() < 1e-6);
        swarm.handle_pointer(PointerEvent::Released);
        assert_eq!(swarm.target.position, glm::Vec3::zeros());
    }

    #[test]
    fn force_model_toggles_at_runtime() {
        let mut swarm = Swarm::new(small_config());
        assert_eq!(swarm.force_model(), ForceModel::Normalized);
        swarm.toggle_force_model();
        assert_eq!(swarm.force_model(), ForceModel::InverseSquare);
    }

    #[test]
    fn scene_snapshot_tracks_the_bodies() {
        let mut swarm = Swarm::new(small_config());
        let mut scene = crate::scene::Scene::from_config(&swarm.config);
        swarm.step();
        swarm.sync_scene(&mut scene);
        assert_eq!(scene.ball_positions, swarm.ball_positions());
        assert_eq!(scene.core_transform.translation, glm::Vec3::zeros());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut swarm = Swarm::new(small_config());
        swarm.shutdown();
        assert!(swarm.is_shut_down());
        assert!(swarm.ball_positions().is_empty());
        swarm.shutdown();
        assert!(swarm.is_shut_down());
        swarm.step();
        assert_eq!(swarm.stats.impulses_applied, 0);
    }

    #[test]
    fn balls_fall_toward_the_target() {
        let mut swarm = Swarm::new(config(8));
        let before = swarm.mean_distance_to_target();
        run(&mut swarm, 10);
        let after = swarm.mean_distance_to_target();
        assert!(after < before, "mean distance went from {before} to {after}");
    }

    #[test]
    fn inverse_square_model_still_attracts() {
        let mut config = config(6);
        config.attraction.force_model = ForceModel::InverseSquare;
        // A larger constant so the pull is measurable within a few frames
        config.attraction.gravitational_constant = 1.0;
        let mut swarm = Swarm::new(config);
        let before = swarm.mean_distance_to_target();
        run(&mut swarm, 10);
        assert!(swarm.mean_distance_to_target() < before);
    }

    #[test]
    fn core_rotates_in_place() {
        let mut swarm = Swarm::new(config(6));
        let initial_rotation = swarm.core_rotation();
        run(&mut swarm, 30);
        assert_eq!(swarm.core_position(), Some(glm::Vec3::zeros()));
        assert!(glm::quat_dot(&swarm.core_rotation(), &initial_rotation).abs() < 0.99999);
    }

    #[test]
    fn moving_the_target_redirects_the_swarm() {
        let mut swarm = Swarm::new(config(6));
        swarm.handle_pointer(PointerEvent::Pressed(glm::vec2(400.0, 0.0)));
        assert_eq!(swarm.target.position, glm::vec3(4.0, 0.0, 0.0));

        let mean_x = |swarm: &Swarm| {
            let positions = swarm.ball_positions();
            positions.iter().map(|position| position.x).sum::<f32>() / positions.len() as f32
        };
        let before = mean_x(&swarm);
        run(&mut swarm, 10);
        assert!(mean_x(&swarm) > before);

        swarm.handle_pointer(PointerEvent::Cancelled);
        assert_eq!(swarm.target.position, glm::Vec3::zeros());
    }

    #[test]
    fn jittered_layouts_are_reproducible() {
        let mut config = config(5);
        config.placement.stride = crate::placement::PlacementStride::Jittered {
            step: 0.2,
            jitter: 0.05,
            seed: 7,
        };
        let first = Swarm::new(config.clone()).ball_positions();
        let second = Swarm::new(config).ball_positions();
        assert_eq!(first.len(), 25);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_swarm_steps_without_balls() {
        let mut swarm = Swarm::new(config(0));
        run(&mut swarm, 3);
        assert!(swarm.ball_positions().is_empty());
        assert_eq!(swarm.stats.frames, 3);
        assert_eq!(swarm.mean_distance_to_target(), 0.0);
    }

    #[test]
    fn shutdown_empties_the_world() {
        let mut swarm = Swarm::new(config(6));
        run(&mut swarm, 5);
        swarm.shutdown();
        assert!(swarm.is_shut_down());
        assert_eq!(swarm.physics.colliders.len(), 0);
    }

    #[test]
    fn config_file_drives_the_simulation() {
        let config = SwarmConfig::from_toml_str(
            r#"
            balls_per_side = 3

            [ball]
            radius = 0.05

            [placement]
            radius = 1.5
            "#,
        )
        .unwrap();
        let swarm = Swarm::new(config);
        let positions = swarm.ball_positions();
        assert_eq!(positions.len(), 9);
        for position in positions {
            assert!((glm::length(&position) - 1.5).abs() < 1e-4);
        }
    }
}
