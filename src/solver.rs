use nalgebra::Vector2;
use rayon::prelude::*;
use tracing::warn;

use crate::{
    datatypes::{Boundary, BoundaryLoads, DegenerateSpringPolicy, Node, Spring},
    error::FissureError,
    lattice::BoundarySets,
    network::SpringNetwork,
};

/// Geometry of one spring at the start of a step.
///
/// Measured once per step and shared by fracture detection, force
/// accumulation and the stress/strain diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringMeasurement {
    pub length: f64,
    /// `length - rest_length`
    pub extension: f64,
    /// Unit vector from node b to node a. `None` when the endpoints coincide.
    pub direction: Option<Vector2<f64>>,
}

/// Measures every spring of the network against `positions`
pub fn measure_springs(
    network: &SpringNetwork,
    positions: &[Vector2<f64>],
) -> Vec<SpringMeasurement> {
    network
        .springs()
        .iter()
        .map(|spring| {
            let [a, b] = spring.nodes();
            let delta = positions[a] - positions[b];
            let length = delta.norm();
            SpringMeasurement {
                length,
                extension: length - spring.rest_length(),
                direction: if length > 0.0 {
                    Some(delta / length)
                } else {
                    None
                },
            }
        })
        .collect()
}

/// Returns the first load-carrying spring whose endpoints coincide
pub fn find_degenerate_spring(
    network: &SpringNetwork,
    measurements: &[SpringMeasurement],
) -> Option<usize> {
    network
        .springs()
        .iter()
        .zip(measurements)
        .position(|(spring, m)| spring.state().carries_load() && m.direction.is_none())
}

/// Signed axial force of a spring by Hooke's law. Negative when stretched,
/// which makes it restoring once projected onto the a-from-b direction.
pub fn axial_force(spring: &Spring, measurement: &SpringMeasurement) -> f64 {
    -measurement.extension * spring.stiffness()
}

/// Force the spring exerts on its node a; node b receives the negation.
///
/// `Ok(None)` for springs that carry no load, and for degenerate springs
/// under [`DegenerateSpringPolicy::Clamp`].
fn spring_contribution(
    index: usize,
    spring: &Spring,
    measurement: &SpringMeasurement,
    policy: DegenerateSpringPolicy,
    step: u64,
) -> Result<Option<Vector2<f64>>, FissureError> {
    if !spring.state().carries_load() {
        return Ok(None);
    }

    match (measurement.direction, policy) {
        (Some(direction), _) => Ok(Some(direction * axial_force(spring, measurement))),
        (None, DegenerateSpringPolicy::Clamp) => {
            warn!(spring = index, step, "clamping force of zero-length spring");
            Ok(None)
        }
        (None, DegenerateSpringPolicy::Error) => {
            let [a, b] = spring.nodes();
            Err(FissureError::DegenerateSpring {
                spring: index,
                a,
                b,
                step,
            })
        }
    }
}

/// Scatter-adds spring forces into per-node accumulators, visiting springs
/// in the order given by `order`.
///
/// Each spring adds to two shared slots, so the result only depends on which
/// springs were visited, never on the order (up to float rounding).
///
/// # Arguments
/// * `network` - The spring network
/// * `measurements` - Output of [`measure_springs`] for this step
/// * `order` - Spring indices to visit
/// * `node_count` - Length of the returned force vector
/// * `policy` - How to treat zero-length intact springs
/// * `step` - Step index, reported in errors
pub fn accumulate_spring_forces_in_order<I>(
    network: &SpringNetwork,
    measurements: &[SpringMeasurement],
    order: I,
    node_count: usize,
    policy: DegenerateSpringPolicy,
    step: u64,
) -> Result<Vec<Vector2<f64>>, FissureError>
where
    I: IntoIterator<Item = usize>,
{
    let mut forces: Vec<Vector2<f64>> = vec![Vector2::zeros(); node_count];
    let springs = network.springs();

    for i in order {
        let spring = &springs[i];
        if let Some(force) = spring_contribution(i, spring, &measurements[i], policy, step)? {
            let [a, b] = spring.nodes();
            forces[a] += force;
            forces[b] -= force;
        }
    }

    Ok(forces)
}

/// [`accumulate_spring_forces_in_order`] over every spring in index order
pub fn accumulate_spring_forces(
    network: &SpringNetwork,
    measurements: &[SpringMeasurement],
    node_count: usize,
    policy: DegenerateSpringPolicy,
    step: u64,
) -> Result<Vec<Vector2<f64>>, FissureError> {
    accumulate_spring_forces_in_order(
        network,
        measurements,
        0..network.len(),
        node_count,
        policy,
        step,
    )
}

/// Parallel spring force accumulation.
///
/// Every rayon worker folds its share of springs into a private accumulator,
/// and the partial accumulators are merged by element-wise addition.
pub fn accumulate_spring_forces_parallel(
    network: &SpringNetwork,
    measurements: &[SpringMeasurement],
    node_count: usize,
    policy: DegenerateSpringPolicy,
    step: u64,
) -> Result<Vec<Vector2<f64>>, FissureError> {
    let springs = network.springs();

    springs
        .par_iter()
        .zip(measurements.par_iter())
        .enumerate()
        .try_fold(
            || vec![Vector2::<f64>::zeros(); node_count],
            |mut forces, (i, (spring, measurement))| {
                if let Some(force) = spring_contribution(i, spring, measurement, policy, step)? {
                    let [a, b] = spring.nodes();
                    forces[a] += force;
                    forces[b] -= force;
                }
                Ok(forces)
            },
        )
        .try_reduce(
            || vec![Vector2::<f64>::zeros(); node_count],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    *l += r;
                }
                Ok(left)
            },
        )
}

/// Adds each boundary's load to every node of that boundary. Corner nodes
/// receive the sum of both of their boundaries.
pub fn apply_boundary_loads(
    forces: &mut [Vector2<f64>],
    boundaries: &BoundarySets,
    loads: &BoundaryLoads,
) {
    for boundary in Boundary::ALL {
        let load = loads.get(boundary);
        for &node in boundaries.get(boundary) {
            forces[node] += load;
        }
    }
}

/// Advances every node one semi-implicit Euler step: the velocity is updated
/// from the force first, then the position from the new velocity.
pub fn integrate(nodes: &mut [Node], forces: &[Vector2<f64>], mass: f64, dt: f64) {
    for (node, force) in nodes.iter_mut().zip(forces) {
        node.acceleration = force / mass;
        node.velocity += node.acceleration * dt;
        node.position += node.velocity * dt;
    }
}
