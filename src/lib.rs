//! Brittle fracture of a 2D spring lattice.
//!
//! A grid of point masses joined by linear springs is loaded on its edges and
//! stepped forward in time. Springs stretched past a threshold break for good,
//! and the spread of broken-spring endpoints gives the crack length.

pub mod crack;
pub mod datatypes;
pub mod error;
pub mod fracture;
pub mod input;
pub mod lattice;
pub mod network;
pub mod post_processor;
pub mod simulation;
pub mod solver;

pub use crate::{
    crack::CrackMeasurement,
    datatypes::{SimulationConfig, SpringState},
    error::FissureError,
    simulation::{Simulation, Snapshot},
};
