mod common;

use common::{tension, unit_config};
use fissure::{
    datatypes::{DegenerateSpringPolicy, LatticeMetadata},
    lattice::{stencil_connections, LatticeTopology},
    network::SpringNetwork,
    solver::{
        accumulate_spring_forces, accumulate_spring_forces_in_order,
        accumulate_spring_forces_parallel, measure_springs,
    },
    Simulation,
};
use proptest::prelude::*;

fn lattice(nx: usize, ny: usize, seed: u64) -> LatticeMetadata {
    LatticeMetadata {
        nx,
        ny,
        xi: 0.0,
        yi: 0.0,
        xe: 1.0,
        ye: 1.0,
        jitter: 0.03,
        seed,
    }
}

/// Grid size, seed, a spring visiting order and some defects
fn shuffled_lattice() -> impl Strategy<Value = (usize, usize, u64, Vec<usize>, Vec<usize>)> {
    (2usize..7, 2usize..7, any::<u64>()).prop_flat_map(|(nx, ny, seed)| {
        let springs = stencil_connections(nx, ny).len();
        (
            Just(nx),
            Just(ny),
            Just(seed),
            Just((0..springs).collect::<Vec<usize>>()).prop_shuffle(),
            proptest::collection::vec(0..springs, 0..4),
        )
    })
}

proptest! {
    #[test]
    fn force_accumulation_ignores_spring_order(
        (nx, ny, seed, order, defects) in shuffled_lattice()
    ) {
        // Rest lengths from one layout, current positions from another
        let rest = LatticeTopology::new(&lattice(nx, ny, seed)).unwrap();
        let current = LatticeTopology::new(&lattice(nx, ny, seed.wrapping_add(1))).unwrap();
        let network =
            SpringNetwork::new(rest.positions(), rest.connections(), 100.0, &defects).unwrap();
        let measurements = measure_springs(&network, current.positions());
        let node_count = current.node_count();

        let in_index_order = accumulate_spring_forces(
            &network, &measurements, node_count, DegenerateSpringPolicy::Error, 0,
        ).unwrap();
        let shuffled = accumulate_spring_forces_in_order(
            &network, &measurements, order, node_count, DegenerateSpringPolicy::Error, 0,
        ).unwrap();
        let parallel = accumulate_spring_forces_parallel(
            &network, &measurements, node_count, DegenerateSpringPolicy::Error, 0,
        ).unwrap();

        for ((a, b), c) in in_index_order.iter().zip(&shuffled).zip(&parallel) {
            prop_assert!((a - b).norm() < 1e-9, "{a} vs {b}");
            prop_assert!((a - c).norm() < 1e-9, "{a} vs {c}");
        }
    }

    #[test]
    fn internal_forces_sum_to_zero(
        (nx, ny, seed, _order, defects) in shuffled_lattice()
    ) {
        let rest = LatticeTopology::new(&lattice(nx, ny, seed)).unwrap();
        let current = LatticeTopology::new(&lattice(nx, ny, seed ^ 0xdead_beef)).unwrap();
        let network =
            SpringNetwork::new(rest.positions(), rest.connections(), 100.0, &defects).unwrap();
        let measurements = measure_springs(&network, current.positions());
        let forces = accumulate_spring_forces(
            &network, &measurements, current.node_count(), DegenerateSpringPolicy::Error, 0,
        ).unwrap();

        let total = forces.iter().fold(nalgebra::Vector2::<f64>::zeros(), |sum, f| sum + f);
        prop_assert!(total.norm() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn fracture_front_only_grows(
        seed in any::<u64>(),
        load in 0.5f64..4.0,
        threshold in 0.002f64..0.05,
    ) {
        let mut config = unit_config(5, 5);
        config.lattice.jitter = 0.002;
        config.lattice.seed = seed;
        config.physics.stiffness = 50.0;
        config.physics.threshold_length = threshold;
        config.physics.dt = 0.05;
        config.loading = tension(load);

        let mut sim = Simulation::new(config).unwrap();
        let mut front = Vec::new();
        for _ in 0..25 {
            sim.step().unwrap();
            let next = sim.fracture_front().nodes().to_vec();
            prop_assert!(next.len() >= front.len());
            prop_assert_eq!(&next[..front.len()], &front[..]);

            let crack = sim.crack();
            prop_assert!(crack.length >= 0.0);
            if next.is_empty() {
                prop_assert_eq!(crack.length, 0.0);
            }
            front = next;
        }
    }
}
