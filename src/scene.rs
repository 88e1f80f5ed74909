use crate::config::{hex_to_linear, SwarmConfig};
use nalgebra_glm as glm;

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub lights: Lights,
    pub background: glm::Vec3,
    pub ball_color: glm::Vec3,
    pub ball_radius: f32,
    pub ball_positions: Vec<glm::Vec3>,
    pub core_color: glm::Vec3,
    pub core_half_extents: glm::Vec3,
    pub core_transform: Transform,
    pub core_visible: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::from_config(&SwarmConfig::default())
    }
}

impl Scene {
    pub fn from_config(config: &SwarmConfig) -> Self {
        let camera = &config.camera;
        let lights = &config.lights;
        Self {
            camera: Camera {
                position: glm::Vec3::from(camera.position),
                target: glm::Vec3::from(camera.target),
                up: glm::Vec3::from(camera.up),
                fov: camera.fov.to_radians(),
                near: camera.near,
                far: camera.far,
            },
            lights: Lights {
                point_position: glm::Vec3::from(lights.point_position),
                point_intensity: lights.point_intensity,
                camera_intensity: lights.camera_intensity,
            },
            background: hex_to_linear(config.palette.background),
            ball_color: hex_to_linear(config.palette.ball),
            ball_radius: config.ball.radius,
            ball_positions: Vec::with_capacity(config.ball_count()),
            core_color: hex_to_linear(config.palette.core),
            core_half_extents: glm::vec3(
                config.core.half_extent,
                config.core.half_extent,
                config.core.half_extent,
            ),
            core_transform: Transform::default(),
            core_visible: config.core.visible,
        }
    }

    pub fn ball_instances(&self) -> Vec<Instance> {
        let color = glm::vec3_to_vec4(&self.ball_color);
        self.ball_positions
            .iter()
            .map(|position| Instance {
                model: glm::translation(position),
                color,
            })
            .collect()
    }

    pub fn core_instances(&self) -> Vec<Instance> {
        if !self.core_visible {
            return Vec::new();
        }
        vec![Instance {
            model: self.core_transform.matrix(),
            color: glm::vec3_to_vec4(&self.core_color),
        }]
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Camera {
    pub position: glm::Vec3,
    pub target: glm::Vec3,
    pub up: glm::Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn projection_matrix(&self, aspect_ratio: f32) -> glm::Mat4 {
        glm::perspective_rh_zo(aspect_ratio, self.fov, self.near, self.far)
    }

    pub fn view_matrix(&self) -> glm::Mat4 {
        glm::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn forward(&self) -> glm::Vec3 {
        glm::normalize(&(self.target - self.position))
    }
}

#[derive(Debug, Copy, Clone)]
pub struct Lights {
    pub point_position: glm::Vec3,
    pub point_intensity: f32,
    pub camera_intensity: f32,
}

#[derive(Debug, Copy, Clone)]
pub struct Transform {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: glm::Vec3::zeros(),
            rotation: glm::Quat::identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> glm::Mat4 {
        glm::translation(&self.translation)
            * glm::quat_to_mat4(&self.rotation)
            * glm::scaling(&self.scale)
    }
}

#[repr(C)]
#[derive(Default, Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: glm::Vec3,
    pub normal: glm::Vec3,
}

#[repr(C)]
#[derive(Default, Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Instance {
    pub model: glm::Mat4,
    pub color: glm::Vec4,
}

#[derive(Default, Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// A latitude/longitude sphere with `width_segments` around the equator
    /// and `height_segments` from pole to pole.
    pub fn uv_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices = Vec::new();
        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let (sin_theta, cos_theta) = (v * std::f32::consts::PI).sin_cos();
                let (sin_phi, cos_phi) = (u * std::f32::consts::TAU).sin_cos();
                let normal = glm::vec3(-cos_phi * sin_theta, cos_theta, sin_phi * sin_theta);
                vertices.push(Vertex {
                    position: normal * radius,
                    normal,
                });
            }
        }

        let row = width_segments + 1;
        let mut indices = Vec::new();
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * row + ix + 1;
                let b = iy * row + ix;
                let c = (iy + 1) * row + ix;
                let d = (iy + 1) * row + ix + 1;
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn cuboid(half_extents: glm::Vec3) -> Self {
        let faces = [
            (glm::Vec3::x(), glm::Vec3::y()),
            (-glm::Vec3::x(), glm::Vec3::y()),
            (glm::Vec3::y(), glm::Vec3::z()),
            (-glm::Vec3::y(), glm::Vec3::z()),
            (glm::Vec3::z(), glm::Vec3::y()),
            (-glm::Vec3::z(), glm::Vec3::y()),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, up) in faces {
            let right = glm::cross(&up, &normal);
            let first = vertices.len() as u32;
            for (s, t) in [(-1.0_f32, -1.0_f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = normal + right * s + up * t;
                vertices.push(Vertex {
                    position: corner.component_mul(&half_extents),
                    normal,
                });
            }
            indices.extend_from_slice(&[first, first + 1, first + 2, first, first + 2, first + 3]);
        }

        Self { vertices, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let mesh = Mesh::uv_sphere(0.1, 16, 16);
        assert_eq!(mesh.vertices.len(), 17 * 17);
        for vertex in mesh.vertices.iter() {
            assert!((glm::length(&vertex.position) - 0.1).abs() < 1e-6);
            assert!((glm::length(&vertex.normal) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_indices_skip_degenerate_pole_triangles() {
        let mesh = Mesh::uv_sphere(1.0, 16, 16);
        // Two triangles per quad, minus one per quad on each pole row
        assert_eq!(mesh.indices.len(), (16 * 16 * 2 - 2 * 16) * 3);
        let vertex_count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|index| *index < vertex_count));
    }

    #[test]
    fn sphere_triangles_face_outward() {
        let mesh = Mesh::uv_sphere(1.0, 16, 16);
        for triangle in mesh.indices.chunks(3) {
            let a = mesh.vertices[triangle[0] as usize].position;
            let b = mesh.vertices[triangle[1] as usize].position;
            let c = mesh.vertices[triangle[2] as usize].position;
            let winding = glm::cross(&(b - a), &(c - a));
            assert!(glm::dot(&winding, &((a + b + c) / 3.0)) > 0.0);
        }
    }

    #[test]
    fn cuboid_has_flat_shaded_faces() {
        let half_extents = glm::vec3(0.6, 0.6, 0.6);
        let mesh = Mesh::cuboid(half_extents);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        for vertex in mesh.vertices.iter() {
            for axis in 0..3 {
                assert!((vertex.position[axis].abs() - 0.6).abs() < 1e-6);
            }
            // Every corner lies on the face its normal points out of
            assert!((glm::dot(&vertex.position, &vertex.normal) - 0.6).abs() < 1e-6);
        }
    }

    #[test]
    fn cuboid_triangles_face_outward() {
        let mesh = Mesh::cuboid(glm::vec3(1.0, 2.0, 3.0));
        for triangle in mesh.indices.chunks(3) {
            let a = mesh.vertices[triangle[0] as usize];
            let b = mesh.vertices[triangle[1] as usize];
            let c = mesh.vertices[triangle[2] as usize];
            let winding = glm::cross(&(b.position - a.position), &(c.position - a.position));
            assert!(glm::dot(&winding, &a.normal) > 0.0);
        }
    }

    #[test]
    fn ball_instances_follow_positions() {
        let mut scene = Scene::default();
        scene.ball_positions = vec![glm::vec3(1.0, 2.0, 3.0), glm::vec3(-1.0, 0.0, 0.5)];
        let instances = scene.ball_instances();
        assert_eq!(instances.len(), 2);
        let translated = instances[1].model * glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_eq!(translated, glm::vec4(-1.0, 0.0, 0.5, 1.0));
        assert_eq!(instances[0].color, glm::vec3_to_vec4(&scene.ball_color));
    }

    #[test]
    fn hidden_core_has_no_instances() {
        let mut scene = Scene::default();
        assert_eq!(scene.core_instances().len(), 1);
        scene.core_visible = false;
        assert!(scene.core_instances().is_empty());
    }

    #[test]
    fn default_camera_looks_up_the_y_axis_at_the_origin() {
        let scene = Scene::default();
        assert!((scene.camera.forward() - glm::Vec3::y()).norm() < 1e-6);
        let origin = scene.camera.view_matrix() * glm::vec4(0.0, 0.0, 0.0, 1.0);
        // Right-handed view space looks down -Z
        assert!((origin.z + 5.0).abs() < 1e-5);
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
    }
}
