use std::{fs::File, io::Write, path::Path};

use serde::Serialize;
use tracing::info;

use crate::{datatypes::SpringState, error::FissureError, simulation::Snapshot};

/// Scales stress magnitudes into `[0, 1]` by the largest magnitude present.
///
/// When every stress is zero the result is all zeros.
pub fn normalized_stress(stress: &[f64]) -> Vec<f64> {
    let max = stress.iter().fold(0.0, |max: f64, s| max.max(s.abs()));
    if max == 0.0 {
        return vec![0.0; stress.len()];
    }
    stress.iter().map(|s| (s / max).abs()).collect()
}

#[derive(Debug, Serialize)]
struct NodeRecord {
    step: u64,
    node: usize,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

#[derive(Debug, Serialize)]
struct SpringRecord {
    step: u64,
    spring: usize,
    a: usize,
    b: usize,
    state: SpringState,
    stress: f64,
    strain: f64,
    normalized_stress: f64,
}

#[derive(Debug, Serialize)]
struct CrackRecord {
    step: u64,
    time: f64,
    crack_length: f64,
    front_len: usize,
    endpoint_a: Option<usize>,
    endpoint_b: Option<usize>,
}

fn write_error(file: &str, err: impl std::fmt::Display) -> FissureError {
    FissureError::PostProcessor(format!("Failed to write {file}: {err}"))
}

/// Streams snapshots into three CSV tables: nodes, springs and crack history.
pub struct CsvOutput<W: Write> {
    nodes: csv::Writer<W>,
    springs: csv::Writer<W>,
    crack: csv::Writer<W>,
}

impl CsvOutput<File> {
    /// Creates `nodes.csv`, `springs.csv` and `crack.csv` in `output_dir`
    pub fn create(output_dir: &Path) -> Result<CsvOutput<File>, FissureError> {
        if let Err(err) = std::fs::create_dir_all(output_dir) {
            return Err(FissureError::PostProcessor(format!(
                "Failed to create output directory {}: {err}",
                output_dir.display()
            )));
        }

        let open = |name: &str| match File::create(output_dir.join(name)) {
            Ok(f) => Ok(f),
            Err(err) => Err(FissureError::PostProcessor(format!(
                "Failed to create {name}: {err}"
            ))),
        };

        let output = CsvOutput::from_writers(
            open("nodes.csv")?,
            open("springs.csv")?,
            open("crack.csv")?,
        );

        info!("writing output to {}", output_dir.display());

        Ok(output)
    }
}

impl<W: Write> CsvOutput<W> {
    pub fn from_writers(nodes: W, springs: W, crack: W) -> CsvOutput<W> {
        CsvOutput {
            nodes: csv::Writer::from_writer(nodes),
            springs: csv::Writer::from_writer(springs),
            crack: csv::Writer::from_writer(crack),
        }
    }

    /// Appends one snapshot to all three tables.
    ///
    /// # Arguments
    /// * `snapshot` - The engine state to record
    /// * `connections` - Spring endpoint pairs, parallel to the snapshot's spring data
    pub fn write_snapshot(
        &mut self,
        snapshot: &Snapshot,
        connections: &[[usize; 2]],
    ) -> Result<(), FissureError> {
        for (node, (p, v)) in snapshot
            .positions
            .iter()
            .zip(&snapshot.velocities)
            .enumerate()
        {
            self.nodes
                .serialize(NodeRecord {
                    step: snapshot.step,
                    node,
                    x: p.x,
                    y: p.y,
                    vx: v.x,
                    vy: v.y,
                })
                .map_err(|err| write_error("nodes.csv", err))?;
        }

        let normalized = normalized_stress(&snapshot.stress);
        for (spring, [a, b]) in connections.iter().copied().enumerate() {
            self.springs
                .serialize(SpringRecord {
                    step: snapshot.step,
                    spring,
                    a,
                    b,
                    state: snapshot.states[spring],
                    stress: snapshot.stress[spring],
                    strain: snapshot.strain[spring],
                    normalized_stress: normalized[spring],
                })
                .map_err(|err| write_error("springs.csv", err))?;
        }

        self.crack
            .serialize(CrackRecord {
                step: snapshot.step,
                time: snapshot.time,
                crack_length: snapshot.crack.length,
                front_len: snapshot.fracture_front_len,
                endpoint_a: snapshot.crack.endpoints.map(|(a, _)| a),
                endpoint_b: snapshot.crack.endpoints.map(|(_, b)| b),
            })
            .map_err(|err| write_error("crack.csv", err))?;

        Ok(())
    }

    /// Flushes all tables and hands back the underlying writers
    pub fn into_inner(self) -> Result<(W, W, W), FissureError> {
        let nodes = self
            .nodes
            .into_inner()
            .map_err(|err| write_error("nodes.csv", err))?;
        let springs = self
            .springs
            .into_inner()
            .map_err(|err| write_error("springs.csv", err))?;
        let crack = self
            .crack
            .into_inner()
            .map_err(|err| write_error("crack.csv", err))?;
        Ok((nodes, springs, crack))
    }
}
