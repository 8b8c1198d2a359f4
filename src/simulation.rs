use nalgebra::Vector2;
use tracing::{debug, info, trace};

use crate::{
    crack::{measure_crack, CrackMeasurement},
    datatypes::{DegenerateSpringPolicy, Node, SimulationConfig, SpringState},
    error::FissureError,
    fracture::{detect_fractures, FractureEvent, FractureFront},
    lattice::LatticeTopology,
    network::SpringNetwork,
    solver::{
        accumulate_spring_forces, accumulate_spring_forces_parallel, apply_boundary_loads,
        find_degenerate_spring, integrate, measure_springs,
    },
};

/// Owned copy of the engine's observable state after a step
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Steps completed
    pub step: u64,
    /// `step * dt`
    pub time: f64,
    pub positions: Vec<Vector2<f64>>,
    pub velocities: Vec<Vector2<f64>>,
    pub states: Vec<SpringState>,
    pub stress: Vec<f64>,
    pub strain: Vec<f64>,
    pub crack: CrackMeasurement,
    pub fracture_front_len: usize,
}

impl Snapshot {
    pub fn fractured_count(&self) -> usize {
        self.states
            .iter()
            .filter(|&&s| s == SpringState::Fractured)
            .count()
    }

    pub fn max_abs_stress(&self) -> f64 {
        self.stress.iter().fold(0.0, |max, s| f64::max(max, s.abs()))
    }
}

/// The lattice fracture engine.
///
/// Owns every piece of mutable state. Each call to [`Simulation::step`]
/// runs, in order: spring measurement on the inherited positions, fracture
/// detection, force accumulation, integration and crack measurement on the
/// updated positions.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    topology: LatticeTopology,
    network: SpringNetwork,
    nodes: Vec<Node>,
    front: FractureFront,
    crack: CrackMeasurement,
    steps_taken: u64,
}

impl Simulation {
    /// Builds the lattice, its springs and the initial node state from
    /// `config`. Fails without returning a partial engine.
    pub fn new(config: SimulationConfig) -> Result<Simulation, FissureError> {
        config.validate()?;

        let topology = LatticeTopology::new(&config.lattice)?;
        let network = SpringNetwork::new(
            topology.positions(),
            topology.connections(),
            config.physics.stiffness,
            &config.defects,
        )?;

        Simulation::from_parts(config, topology, network)
    }

    /// Assembles an engine around an existing topology and network.
    ///
    /// The lattice dimensions in `config` are replaced with those of
    /// `topology`; `config.defects` is not consulted since `network` already
    /// carries its spring states. Spring `i` of `network` must join the same
    /// nodes as connection `i` of `topology`.
    pub fn from_parts(
        mut config: SimulationConfig,
        topology: LatticeTopology,
        network: SpringNetwork,
    ) -> Result<Simulation, FissureError> {
        let (nx, ny) = topology.dimensions();
        config.lattice.nx = nx;
        config.lattice.ny = ny;
        config.validate()?;

        let connections = topology.connections();
        if network.len() != connections.len() {
            return Err(FissureError::Configuration(format!(
                "network has {} springs but the topology has {} connections",
                network.len(),
                connections.len()
            )));
        }
        if let Some((i, (spring, connection))) = network
            .springs()
            .iter()
            .zip(connections)
            .enumerate()
            .find(|(_, (s, c))| s.nodes() != **c)
        {
            return Err(FissureError::Configuration(format!(
                "spring {i} joins ({}, {}) but topology connection {i} is ({}, {})",
                spring.nodes()[0],
                spring.nodes()[1],
                connection[0],
                connection[1]
            )));
        }

        let nodes: Vec<Node> = topology
            .positions()
            .iter()
            .map(|&position| Node {
                position,
                velocity: config.physics.initial_velocity,
                acceleration: config.physics.initial_acceleration,
            })
            .collect();

        info!(
            nodes = nodes.len(),
            springs = network.len(),
            defects = network.count_in_state(SpringState::Zeroed),
            dt = config.physics.dt,
            "simulation ready"
        );

        Ok(Simulation {
            config,
            topology,
            network,
            nodes,
            front: FractureFront::new(),
            crack: CrackMeasurement::none(),
            steps_taken: 0,
        })
    }

    /// Advances the engine by one step.
    ///
    /// With [`DegenerateSpringPolicy::Error`], a zero-length intact spring
    /// fails the step before any state changes.
    ///
    /// # Returns
    /// The springs that fractured during this step
    pub fn step(&mut self) -> Result<Vec<FractureEvent>, FissureError> {
        let step = self.steps_taken;
        let physics = &self.config.physics;
        let policy = self.config.solver.degenerate_springs;

        let positions = self.positions();
        let measurements = measure_springs(&self.network, &positions);

        if let Some(spring) = find_degenerate_spring(&self.network, &measurements) {
            if policy == DegenerateSpringPolicy::Error {
                let [a, b] = self.network.spring(spring).nodes();
                return Err(FissureError::DegenerateSpring { spring, a, b, step });
            }
        }

        let events = detect_fractures(
            &mut self.network,
            &measurements,
            physics.threshold_length,
            &mut self.front,
        );

        let node_count = self.nodes.len();
        let mut forces = if self.config.solver.parallel_forces {
            accumulate_spring_forces_parallel(
                &self.network,
                &measurements,
                node_count,
                policy,
                step,
            )?
        } else {
            accumulate_spring_forces(&self.network, &measurements, node_count, policy, step)?
        };
        apply_boundary_loads(&mut forces, self.topology.boundaries(), &self.config.loading);

        integrate(&mut self.nodes, &forces, physics.mass, physics.dt);

        self.crack = measure_crack(self.front.nodes(), &self.positions());
        self.steps_taken += 1;

        trace!(step, max_stress = self.max_abs_stress(), "step complete");
        if !events.is_empty() {
            debug!(
                step,
                fractured = events.len(),
                crack_length = self.crack.length,
                "fracture front grew"
            );
        }

        Ok(events)
    }

    /// Runs `steps` consecutive steps, stopping at the first error
    pub fn advance(&mut self, steps: u64) -> Result<(), FissureError> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn topology(&self) -> &LatticeTopology {
        &self.topology
    }

    pub fn network(&self) -> &SpringNetwork {
        &self.network
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn positions(&self) -> Vec<Vector2<f64>> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    pub fn fracture_front(&self) -> &FractureFront {
        &self.front
    }

    pub fn crack(&self) -> CrackMeasurement {
        self.crack
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    pub fn time(&self) -> f64 {
        self.steps_taken as f64 * self.config.physics.dt
    }

    fn max_abs_stress(&self) -> f64 {
        self.network
            .springs()
            .iter()
            .fold(0.0, |max, s| f64::max(max, s.stress().abs()))
    }

    pub fn snapshot(&self) -> Snapshot {
        let springs = self.network.springs();
        Snapshot {
            step: self.steps_taken,
            time: self.time(),
            positions: self.positions(),
            velocities: self.nodes.iter().map(|n| n.velocity).collect(),
            states: springs.iter().map(|s| s.state()).collect(),
            stress: springs.iter().map(|s| s.stress()).collect(),
            strain: springs.iter().map(|s| s.strain()).collect(),
            crack: self.crack,
            fracture_front_len: self.front.len(),
        }
    }
}
