use std::collections::BTreeSet;

use nalgebra::Vector2;
use tracing::debug;

use crate::{
    datatypes::{Spring, SpringState},
    error::FissureError,
};

/// Per-spring material state: rest length, stiffness and fracture state.
#[derive(Debug, Clone, PartialEq)]
pub struct SpringNetwork {
    springs: Vec<Spring>,
}

impl SpringNetwork {
    /// Builds a spring for every connection.
    ///
    /// # Arguments
    /// * `positions` - Node positions at construction; these define rest lengths
    /// * `connections` - Node index pairs, one per spring
    /// * `stiffness_scale` - K, a spring's stiffness is `K * rest_length`
    /// * `defects` - Spring indices to start in [`SpringState::Zeroed`]
    pub fn new(
        positions: &[Vector2<f64>],
        connections: &[[usize; 2]],
        stiffness_scale: f64,
        defects: &[usize],
    ) -> Result<SpringNetwork, FissureError> {
        if let Some(bad) = defects.iter().find(|&&d| d >= connections.len()) {
            return Err(FissureError::Configuration(format!(
                "defect spring index {bad} out of range, lattice has {} springs",
                connections.len()
            )));
        }
        let defects: BTreeSet<usize> = defects.iter().copied().collect();

        let mut springs: Vec<Spring> = Vec::with_capacity(connections.len());
        for (i, &[a, b]) in connections.iter().enumerate() {
            if a >= positions.len() || b >= positions.len() {
                return Err(FissureError::Configuration(format!(
                    "spring {i} references node outside of 0..{}",
                    positions.len()
                )));
            }

            let rest_length = (positions[a] - positions[b]).norm();
            let (stiffness, state) = if defects.contains(&i) {
                (0.0, SpringState::Zeroed)
            } else {
                (stiffness_scale * rest_length, SpringState::Intact)
            };

            springs.push(Spring {
                nodes: [a, b],
                rest_length,
                stiffness,
                state,
                stress: 0.0,
                strain: 0.0,
            });
        }

        debug!(
            springs = springs.len(),
            defects = defects.len(),
            "built spring network"
        );

        Ok(SpringNetwork { springs })
    }

    pub fn len(&self) -> usize {
        self.springs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.springs.is_empty()
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn spring(&self, spring: usize) -> &Spring {
        &self.springs[spring]
    }

    /// Distance between the spring's endpoints at `positions`
    pub fn current_length(&self, spring: usize, positions: &[Vector2<f64>]) -> f64 {
        let [a, b] = self.springs[spring].nodes;
        (positions[a] - positions[b]).norm()
    }

    pub fn rest_length(&self, spring: usize) -> f64 {
        self.springs[spring].rest_length
    }

    pub fn stiffness(&self, spring: usize) -> f64 {
        self.springs[spring].stiffness
    }

    pub fn state(&self, spring: usize) -> SpringState {
        self.springs[spring].state
    }

    pub fn count_in_state(&self, state: SpringState) -> usize {
        self.springs.iter().filter(|s| s.state == state).count()
    }

    pub(crate) fn springs_mut(&mut self) -> &mut [Spring] {
        &mut self.springs
    }
}
