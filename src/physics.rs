use rapier3d::prelude::*;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BodyDescription {
    pub mass: f32,
    pub restitution: f32,
}

/// Owns every rapier structure needed to step a scene.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            gravity: vector![0.0, 0.0, 0.0],
            integration_parameters: IntegrationParameters::default(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }
}

impl PhysicsWorld {
    pub fn new(gravity: nalgebra_glm::Vec3, time_step: f32) -> Self {
        let mut world = Self {
            gravity,
            ..Default::default()
        };
        world.integration_parameters.dt = time_step;
        world
    }

    pub fn add_fixed_cuboid(
        &mut self,
        position: nalgebra_glm::Vec3,
        half_extents: nalgebra_glm::Vec3,
        description: BodyDescription,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed().translation(position).build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .mass(description.mass)
            .restitution(description.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    pub fn add_dynamic_ball(
        &mut self,
        position: nalgebra_glm::Vec3,
        radius: f32,
        description: BodyDescription,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic().translation(position).build();
        let handle = self.bodies.insert(body);
        let collider = ColliderBuilder::ball(radius)
            .mass(description.mass)
            .restitution(description.restitution)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }

    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    pub fn translation(&self, handle: RigidBodyHandle) -> Option<nalgebra_glm::Vec3> {
        self.bodies.get(handle).map(|body| *body.translation())
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> Option<nalgebra_glm::Quat> {
        self.bodies
            .get(handle)
            .map(|body| body.rotation().into_inner())
    }

    pub fn set_rotation(&mut self, handle: RigidBodyHandle, rotation: nalgebra_glm::Quat) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_rotation(Rotation::<Real>::new_normalize(rotation), true);
        }
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: nalgebra_glm::Vec3) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.apply_impulse(impulse, true);
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Removes every body along with its colliders.
    pub fn clear(&mut self) {
        let handles = self
            .bodies
            .iter()
            .map(|(handle, _)| handle)
            .collect::<Vec<_>>();
        handles.into_iter().for_each(|handle| {
            self.bodies.remove(
                handle,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            );
        });
    }
}
