//! Initial ball layout.
//!
//! Balls are laid out by walking a pair of spherical angles that accumulate
//! across the whole grid without ever being reset. With the default stride
//! this traces a spiral over the sphere rather than an equal-area covering.

use rand::{Rng, SeedableRng};

/// Spherical coordinates with `phi` measured from +Y and `theta` measured
/// around +Y starting at +Z.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Spherical {
    pub radius: f64,
    pub phi: f64,
    pub theta: f64,
}

impl Spherical {
    pub fn new(radius: f64, phi: f64, theta: f64) -> Self {
        Self { radius, phi, theta }
    }

    pub fn to_cartesian(&self) -> nalgebra_glm::DVec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        nalgebra_glm::DVec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    pub fn from_cartesian(position: &nalgebra_glm::DVec3) -> Self {
        let radius = position.norm();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            phi: (position.y / radius).clamp(-1.0, 1.0).acos(),
            theta: position.x.atan2(position.z),
        }
    }

    /// Folds the angles into `phi` in `[0, π]` and `theta` in `(-π, π]`
    /// while describing the same point.
    pub fn canonical(&self) -> Self {
        let tau = std::f64::consts::TAU;
        let pi = std::f64::consts::PI;

        let mut phi = self.phi.rem_euclid(tau);
        let mut theta = self.theta;
        if phi > pi {
            // Reflecting phi through the pole flips the azimuth to the far side
            phi = tau - phi;
            theta += pi;
        }

        let mut theta = theta.rem_euclid(tau);
        if theta > pi {
            theta -= tau;
        }

        Self {
            radius: self.radius,
            phi,
            theta,
        }
    }
}

/// How far the angles advance per grid step.
#[derive(Debug, Copy, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PlacementStride {
    Spiral {
        step: f64,
    },
    Jittered {
        step: f64,
        jitter: f64,
        seed: u64,
    },
}

impl Default for PlacementStride {
    fn default() -> Self {
        Self::Spiral { step: 20.0 }
    }
}

impl PlacementStride {
    pub fn step(&self) -> f64 {
        match *self {
            Self::Spiral { step } | Self::Jittered { step, .. } => step,
        }
    }
}

/// Produces `balls_per_side²` positions on a sphere of `radius`.
pub fn generate_positions(
    balls_per_side: usize,
    radius: f64,
    stride: PlacementStride,
) -> Vec<nalgebra_glm::Vec3> {
    generate_angles(balls_per_side, radius, stride)
        .iter()
        .map(|spherical| {
            let position = spherical.to_cartesian();
            nalgebra_glm::vec3(position.x as f32, position.y as f32, position.z as f32)
        })
        .collect()
}

/// Walks the grid and returns the spherical coordinates of every ball.
///
/// The outer index drives `phi` and the inner index drives `theta`; both
/// accumulate for the whole walk. Accumulation happens in `f64` because the
/// default stride pushes the angles into the hundreds of thousands of radians.
pub fn generate_angles(balls_per_side: usize, radius: f64, stride: PlacementStride) -> Vec<Spherical> {
    let mut rng = match stride {
        PlacementStride::Jittered { seed, .. } => Some(rand::rngs::StdRng::seed_from_u64(seed)),
        PlacementStride::Spiral { .. } => None,
    };
    let mut jitter = || match (&mut rng, stride) {
        (Some(rng), PlacementStride::Jittered { jitter, .. }) if jitter > 0.0 => {
            rng.gen_range(-jitter..=jitter)
        }
        _ => 0.0,
    };

    let step = stride.step();
    let mut spherical = Spherical::new(radius, 0.0, 0.0);
    let mut angles =
        Vec::with_capacity(balls_per_side.checked_mul(balls_per_side).unwrap_or_default());
    for i in 0..balls_per_side {
        for j in 0..balls_per_side {
            spherical.theta += j as f64 * step + jitter();
            spherical.phi += i as f64 * step + jitter();
            angles.push(spherical);
        }
    }
    angles
}
