use fissure::datatypes::{
    BoundaryLoads, LatticeMetadata, PhysicsMetadata, SimulationConfig, SolverOptions,
};
use nalgebra::Vector2;

/// An unloaded, unjittered `nx` by `ny` lattice on the unit square
pub fn unit_config(nx: usize, ny: usize) -> SimulationConfig {
    SimulationConfig {
        lattice: LatticeMetadata {
            nx,
            ny,
            xi: 0.0,
            yi: 0.0,
            xe: 1.0,
            ye: 1.0,
            jitter: 0.0,
            seed: 0,
        },
        physics: PhysicsMetadata {
            stiffness: 100.0,
            threshold_length: 1000.0,
            mass: 1.0,
            initial_acceleration: Vector2::zeros(),
            initial_velocity: Vector2::zeros(),
            dt: 0.01,
            steps: 10,
        },
        loading: BoundaryLoads::zero(),
        defects: vec![],
        solver: SolverOptions::default(),
    }
}

/// Pulls the left and right edges apart along x
pub fn tension(magnitude: f64) -> BoundaryLoads {
    BoundaryLoads {
        left: Vector2::new(-magnitude, 0.0),
        right: Vector2::new(magnitude, 0.0),
        ..BoundaryLoads::zero()
    }
}
