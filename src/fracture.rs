use std::f64::consts::PI;

use tracing::debug;

use crate::{
    datatypes::SpringState,
    network::SpringNetwork,
    solver::{axial_force, SpringMeasurement},
};

/// Append-only record of the endpoints of every fractured spring.
///
/// Each fracture appends its two node indices in (a, b) order. A node shared
/// by several broken springs appears once per spring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FractureFront {
    nodes: Vec<usize>,
}

impl FractureFront {
    pub fn new() -> FractureFront {
        FractureFront { nodes: Vec::new() }
    }

    fn record(&mut self, nodes: [usize; 2]) {
        self.nodes.extend_from_slice(&nodes);
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of fractures recorded so far
    pub fn fracture_count(&self) -> usize {
        self.nodes.len() / 2
    }
}

/// A spring that broke during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractureEvent {
    pub spring: usize,
    pub nodes: [usize; 2],
    pub extension: f64,
}

/// Evaluates every intact spring against the fracture threshold.
///
/// Updates the stress and strain diagnostics of each intact spring, then
/// breaks those stretched past `threshold_length` and records their endpoints
/// in `front`. Zeroed and already fractured springs are skipped and keep the
/// diagnostics they last had.
///
/// # Arguments
/// * `network` - The spring network to update
/// * `measurements` - Spring geometry from before this step's integration
/// * `threshold_length` - Extension past which a spring breaks
/// * `front` - The fracture front to append to
///
/// # Returns
/// The springs that fractured, in index order
pub fn detect_fractures(
    network: &mut SpringNetwork,
    measurements: &[SpringMeasurement],
    threshold_length: f64,
    front: &mut FractureFront,
) -> Vec<FractureEvent> {
    let nominal_area = PI * threshold_length * threshold_length;
    let mut events: Vec<FractureEvent> = Vec::new();

    for (i, (spring, measurement)) in network
        .springs_mut()
        .iter_mut()
        .zip(measurements)
        .enumerate()
    {
        if spring.state != SpringState::Intact {
            continue;
        }

        spring.stress = axial_force(spring, measurement) / nominal_area;
        spring.strain = measurement.extension / spring.rest_length;

        if measurement.extension > threshold_length {
            spring.state = SpringState::Fractured;
            front.record(spring.nodes);

            debug!(
                spring = i,
                a = spring.nodes[0],
                b = spring.nodes[1],
                extension = measurement.extension,
                "spring fractured"
            );

            events.push(FractureEvent {
                spring: i,
                nodes: spring.nodes,
                extension: measurement.extension,
            });
        }
    }

    events
}
