use nalgebra::Vector2;
use serde::Serialize;

use crate::error::FissureError;

/// A point mass at one lattice site.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
    pub acceleration: Vector2<f64>,
}

/// Lifecycle of a spring.
///
/// `Zeroed` is only ever assigned when the network is built. `Fractured` is
/// reached from `Intact` through the fracture criterion and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpringState {
    Intact,
    Zeroed,
    Fractured,
}

impl SpringState {
    /// Whether a spring in this state still pushes and pulls on its nodes
    pub fn carries_load(self) -> bool {
        matches!(self, SpringState::Intact)
    }
}

/// An elastic connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub(crate) nodes: [usize; 2],
    pub(crate) rest_length: f64,
    pub(crate) stiffness: f64,
    pub(crate) state: SpringState,
    pub(crate) stress: f64,
    pub(crate) strain: f64,
}

impl Spring {
    pub fn nodes(&self) -> [usize; 2] {
        self.nodes
    }

    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn state(&self) -> SpringState {
        self.state
    }

    /// Nominal stress from the last evaluation while intact
    pub fn stress(&self) -> f64 {
        self.stress
    }

    /// Engineering strain from the last evaluation while intact
    pub fn strain(&self) -> f64 {
        self.strain
    }
}

/// Which edge of the grid a boundary set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    Left,
    Right,
    Top,
    Bottom,
}

impl Boundary {
    pub const ALL: [Boundary; 4] = [
        Boundary::Left,
        Boundary::Right,
        Boundary::Top,
        Boundary::Bottom,
    ];
}

/// Constant external force applied to every node of each boundary, every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryLoads {
    pub left: Vector2<f64>,
    pub right: Vector2<f64>,
    pub top: Vector2<f64>,
    pub bottom: Vector2<f64>,
}

impl BoundaryLoads {
    pub fn zero() -> BoundaryLoads {
        BoundaryLoads {
            left: Vector2::zeros(),
            right: Vector2::zeros(),
            top: Vector2::zeros(),
            bottom: Vector2::zeros(),
        }
    }

    pub fn get(&self, boundary: Boundary) -> Vector2<f64> {
        match boundary {
            Boundary::Left => self.left,
            Boundary::Right => self.right,
            Boundary::Top => self.top,
            Boundary::Bottom => self.bottom,
        }
    }
}

impl Default for BoundaryLoads {
    fn default() -> Self {
        BoundaryLoads::zero()
    }
}

/// Grid layout of the lattice
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeMetadata {
    /// Node count along x
    pub nx: usize,
    /// Node count along y
    pub ny: usize,
    pub xi: f64,
    pub yi: f64,
    pub xe: f64,
    pub ye: f64,
    /// Standard deviation of the per-axis random offset
    pub jitter: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsMetadata {
    /// Stiffness scale K; a spring gets `K * rest_length`
    pub stiffness: f64,
    /// Extension (in length units) past which a spring breaks
    pub threshold_length: f64,
    pub mass: f64,
    pub initial_acceleration: Vector2<f64>,
    pub initial_velocity: Vector2<f64>,
    pub dt: f64,
    /// Number of steps a driver should advance. Simulated time is `steps * dt`.
    pub steps: u64,
}

/// What to do when an intact spring collapses to zero length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateSpringPolicy {
    /// Fail the step with [`FissureError::DegenerateSpring`]
    #[default]
    Error,
    /// Drop that spring's force for the step and keep going
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SolverOptions {
    pub degenerate_springs: DegenerateSpringPolicy,
    /// Accumulate spring forces across threads with per-thread partial sums
    pub parallel_forces: bool,
}

/// Everything needed to build a [`crate::simulation::Simulation`]
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub lattice: LatticeMetadata,
    pub physics: PhysicsMetadata,
    pub loading: BoundaryLoads,
    /// Spring indices that start out with zero stiffness
    pub defects: Vec<usize>,
    pub solver: SolverOptions,
}

impl Default for SimulationConfig {
    /// A 20x20 unit plate pulled apart along x
    fn default() -> Self {
        SimulationConfig {
            lattice: LatticeMetadata {
                nx: 20,
                ny: 20,
                xi: 1.0,
                yi: 1.0,
                xe: 2.0,
                ye: 2.0,
                jitter: 0.002,
                seed: 0,
            },
            physics: PhysicsMetadata {
                stiffness: 400.0,
                threshold_length: 0.022,
                mass: 1.0,
                initial_acceleration: Vector2::zeros(),
                initial_velocity: Vector2::zeros(),
                dt: 0.05,
                steps: 70,
            },
            loading: BoundaryLoads {
                left: Vector2::new(-0.35, 0.0),
                right: Vector2::new(0.35, 0.0),
                top: Vector2::zeros(),
                bottom: Vector2::zeros(),
            },
            defects: vec![2, 21, 762, 1123],
            solver: SolverOptions::default(),
        }
    }
}

fn require_finite(name: &str, value: f64) -> Result<(), FissureError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FissureError::Configuration(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

impl SimulationConfig {
    /// Checks every parameter that can be checked without building the
    /// lattice. Defect indices are range-checked once the spring count is
    /// known.
    pub fn validate(&self) -> Result<(), FissureError> {
        let lattice = &self.lattice;
        let physics = &self.physics;

        if lattice.nx < 2 || lattice.ny < 2 {
            return Err(FissureError::Configuration(format!(
                "lattice must be at least 2x2 nodes, got {}x{}",
                lattice.nx, lattice.ny
            )));
        }
        for (name, value) in [
            ("xi", lattice.xi),
            ("yi", lattice.yi),
            ("xe", lattice.xe),
            ("ye", lattice.ye),
            ("jitter", lattice.jitter),
            ("stiffness", physics.stiffness),
            ("threshold_length", physics.threshold_length),
            ("mass", physics.mass),
            ("dt", physics.dt),
        ] {
            require_finite(name, value)?;
        }
        if lattice.jitter < 0.0 {
            return Err(FissureError::Configuration(format!(
                "jitter must be non-negative, got {}",
                lattice.jitter
            )));
        }
        if physics.mass <= 0.0 {
            return Err(FissureError::Configuration(format!(
                "mass must be positive, got {}",
                physics.mass
            )));
        }
        if physics.threshold_length <= 0.0 {
            return Err(FissureError::Configuration(format!(
                "threshold_length must be positive, got {}",
                physics.threshold_length
            )));
        }
        if physics.dt <= 0.0 {
            return Err(FissureError::Configuration(format!(
                "dt must be positive, got {}",
                physics.dt
            )));
        }

        let vectors = [
            ("initial_acceleration", physics.initial_acceleration),
            ("initial_velocity", physics.initial_velocity),
            ("loading.left", self.loading.left),
            ("loading.right", self.loading.right),
            ("loading.top", self.loading.top),
            ("loading.bottom", self.loading.bottom),
        ];
        for (name, vector) in vectors {
            if !vector.iter().all(|c| c.is_finite()) {
                return Err(FissureError::Configuration(format!(
                    "{name} must be finite, got ({}, {})",
                    vector.x, vector.y
                )));
            }
        }

        Ok(())
    }
}
