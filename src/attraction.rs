use nalgebra_glm as glm;

pub const GRAVITATIONAL_CONSTANT: f32 = 6.67408e-11;

/// How the computed magnitude is turned into the impulse that is applied.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceModel {
    /// The scaled direction is normalized again, so every ball receives a
    /// unit impulse toward the target regardless of distance.
    #[default]
    Normalized,

    /// The scaled direction is applied as is and falls off with the square
    /// of the distance.
    InverseSquare,
}

impl ForceModel {
    pub fn toggled(self) -> Self {
        match self {
            Self::Normalized => Self::InverseSquare,
            Self::InverseSquare => Self::Normalized,
        }
    }
}

impl std::fmt::Display for ForceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normalized => write!(f, "normalized"),
            Self::InverseSquare => write!(f, "inverse-square"),
        }
    }
}

impl std::str::FromStr for ForceModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "normalized" => Ok(Self::Normalized),
            "inverse-square" => Ok(Self::InverseSquare),
            other => Err(format!("Unknown force model '{other}'")),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Attraction {
    pub gravitational_constant: f32,
    pub core_mass: f32,
    pub min_distance: f32,
    pub force_model: ForceModel,
}

impl Default for Attraction {
    fn default() -> Self {
        Self {
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            core_mass: 2.0,
            min_distance: 1e-4,
            force_model: ForceModel::default(),
        }
    }
}

impl Attraction {
    /// `k * m_core * m_body / d²`, with `d` clamped to `min_distance`.
    pub fn magnitude(&self, position: &glm::Vec3, body_mass: f32, target: &glm::Vec3) -> f32 {
        let distance = glm::distance(position, target).max(self.min_distance);
        self.gravitational_constant * self.core_mass * body_mass / (distance * distance)
    }

    /// The impulse pulling a body at `position` toward `target` this frame.
    ///
    /// Returns `None` when the result is not finite, which happens when the
    /// body sits exactly on the target and has no direction to move in.
    pub fn impulse(
        &self,
        position: &glm::Vec3,
        body_mass: f32,
        target: &glm::Vec3,
    ) -> Option<glm::Vec3> {
        let magnitude = self.magnitude(position, body_mass, target);
        let direction = glm::normalize(&(target - position));
        let scaled = direction * magnitude;
        let impulse = match self.force_model {
            ForceModel::Normalized => glm::normalize(&scaled),
            ForceModel::InverseSquare => scaled,
        };
        impulse.iter().all(|component| component.is_finite()).then_some(impulse)
    }
}

/// Euler angles of the core, in degrees, of which only `y` is animated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CoreSpin {
    pub angles: glm::Vec3,
    pub step: f32,
}

impl Default for CoreSpin {
    fn default() -> Self {
        Self {
            angles: glm::vec3(45.0, 45.0, 45.0),
            step: 0.1,
        }
    }
}

impl CoreSpin {
    pub const WRAP_DEGREES: f32 = 180.0;

    pub fn new(angles: glm::Vec3, step: f32) -> Self {
        Self { angles, step }
    }

    /// Advances the spin by one frame and returns the new orientation.
    pub fn advance(&mut self) -> glm::Quat {
        self.angles.y = if self.angles.y > Self::WRAP_DEGREES {
            -Self::WRAP_DEGREES
        } else {
            self.angles.y + self.step
        };
        self.orientation()
    }

    /// Rotation about X, then Y, then Z (intrinsic).
    pub fn orientation(&self) -> glm::Quat {
        let x = glm::quat_angle_axis(self.angles.x.to_radians(), &glm::Vec3::x());
        let y = glm::quat_angle_axis(self.angles.y.to_radians(), &glm::Vec3::y());
        let z = glm::quat_angle_axis(self.angles.z.to_radians(), &glm::Vec3::z());
        glm::quat_normalize(&(x * y * z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attraction(force_model: ForceModel) -> Attraction {
        Attraction {
            force_model,
            ..Default::default()
        }
    }

    #[test]
    fn normalized_impulse_is_a_unit_vector_toward_the_target() {
        let attraction = attraction(ForceModel::Normalized);
        let target = glm::vec3(0.0, 0.0, 0.0);
        for position in [
            glm::vec3(2.0, 0.0, 0.0),
            glm::vec3(0.3, -1.2, 0.7),
            glm::vec3(-40.0, 5.0, 12.0),
        ] {
            let impulse = attraction.impulse(&position, 1.0, &target).unwrap();
            assert!((glm::length(&impulse) - 1.0).abs() < 1e-5);
            let toward = glm::normalize(&(target - position));
            assert!(glm::dot(&impulse, &toward) > 0.9999);
        }
    }

    #[test]
    fn normalized_impulse_ignores_distance() {
        let attraction = attraction(ForceModel::Normalized);
        let target = glm::vec3(1.0, 0.0, -1.0);
        let near = attraction
            .impulse(&glm::vec3(1.5, 0.0, -1.0), 1.0, &target)
            .unwrap();
        let far = attraction
            .impulse(&glm::vec3(9.0, 0.0, -1.0), 1.0, &target)
            .unwrap();
        assert!((glm::length(&near) - glm::length(&far)).abs() < 1e-5);
    }

    #[test]
    fn inverse_square_impulse_falls_off_with_distance() {
        let attraction = attraction(ForceModel::InverseSquare);
        let target = glm::vec3(0.0, 0.0, 0.0);
        let mut previous = f32::INFINITY;
        for distance in [0.25_f32, 0.5, 1.0, 2.0, 4.0, 8.0] {
            let position = glm::vec3(0.0, distance, 0.0);
            let impulse = attraction.impulse(&position, 1.0, &target).unwrap();
            let length = glm::length(&impulse);
            assert!(length < previous);
            assert!(impulse.y < 0.0);
            previous = length;
        }
    }

    #[test]
    fn inverse_square_impulse_matches_newtons_formula() {
        let attraction = attraction(ForceModel::InverseSquare);
        let impulse = attraction
            .impulse(&glm::vec3(2.0, 0.0, 0.0), 1.0, &glm::vec3(0.0, 0.0, 0.0))
            .unwrap();
        let expected = GRAVITATIONAL_CONSTANT * 2.0 * 1.0 / 4.0;
        assert!((glm::length(&impulse) - expected).abs() < expected * 1e-4);
    }

    #[test]
    fn magnitude_clamps_the_distance() {
        let attraction = Attraction::default();
        let target = glm::vec3(0.5, 0.5, 0.5);
        let magnitude = attraction.magnitude(&target, 1.0, &target);
        assert!(magnitude.is_finite());
        let expected = GRAVITATIONAL_CONSTANT * 2.0 / (1e-4 * 1e-4);
        assert!((magnitude - expected).abs() < expected * 1e-4);
    }

    #[test]
    fn body_on_the_target_produces_no_impulse() {
        for force_model in [ForceModel::Normalized, ForceModel::InverseSquare] {
            let attraction = attraction(force_model);
            let target = glm::vec3(0.0, 0.0, 0.0);
            assert_eq!(attraction.impulse(&target, 1.0, &target), None);
        }
    }

    #[test]
    fn spin_increases_by_the_step() {
        let mut spin = CoreSpin::new(glm::vec3(45.0, 10.0, 45.0), 0.1);
        let mut previous = spin.angles.y;
        for _ in 0..100 {
            spin.advance();
            assert!(spin.angles.y > previous);
            assert!((spin.angles.y - previous - 0.1).abs() < 1e-4);
            previous = spin.angles.y;
        }
        assert_eq!(spin.angles.x, 45.0);
        assert_eq!(spin.angles.z, 45.0);
    }

    #[test]
    fn spin_wraps_past_one_eighty() {
        let mut spin = CoreSpin::new(glm::vec3(45.0, 180.05, 45.0), 0.1);
        spin.advance();
        assert_eq!(spin.angles.y, -180.0);
        spin.advance();
        assert!((spin.angles.y - -179.9).abs() < 1e-4);
    }

    #[test]
    fn spin_at_exactly_one_eighty_still_steps() {
        let mut spin = CoreSpin::new(glm::vec3(0.0, 180.0, 0.0), 0.1);
        spin.advance();
        assert!((spin.angles.y - 180.1).abs() < 1e-4);
        spin.advance();
        assert_eq!(spin.angles.y, -180.0);
    }

    #[test]
    fn orientation_is_a_unit_quaternion() {
        let spin = CoreSpin::default();
        let orientation = spin.orientation();
        assert!((glm::quat_length(&orientation) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orientation_about_y_alone_rotates_z_toward_x() {
        let spin = CoreSpin::new(glm::vec3(0.0, 90.0, 0.0), 0.1);
        let rotated = glm::quat_rotate_vec3(&spin.orientation(), &glm::Vec3::z());
        assert!((rotated - glm::Vec3::x()).norm() < 1e-5);
    }

    #[test]
    fn force_model_parses_its_display_form() {
        for force_model in [ForceModel::Normalized, ForceModel::InverseSquare] {
            assert_eq!(force_model.to_string().parse::<ForceModel>(), Ok(force_model));
        }
        assert!("linear".parse::<ForceModel>().is_err());
    }
}
