use std::path::Path;

use json::JsonValue;
use nalgebra::Vector2;

use crate::{
    datatypes::{
        BoundaryLoads, DegenerateSpringPolicy, LatticeMetadata, PhysicsMetadata,
        SimulationConfig, SolverOptions,
    },
    error::FissureError,
};

/// Reads a required number from `section`
fn required_f64(json: &JsonValue, section: &str, key: &str) -> Result<f64, FissureError> {
    if !json[section].has_key(key) {
        return Err(FissureError::Input(format!(
            "Input json missing {key} field in {section} section"
        )));
    }
    match json[section][key].as_f64() {
        Some(v) => Ok(v),
        None => Err(FissureError::Input(format!(
            "Bad value for {key} in {section}: expected a number"
        ))),
    }
}

fn optional_f64(
    json: &JsonValue,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, FissureError> {
    if json[section][key].is_null() {
        return Ok(default);
    }
    required_f64(json, section, key)
}

/// Reads a required non-negative integer from `section`
fn required_u64(json: &JsonValue, section: &str, key: &str) -> Result<u64, FissureError> {
    if !json[section].has_key(key) {
        return Err(FissureError::Input(format!(
            "Input json missing {key} field in {section} section"
        )));
    }
    match json[section][key].as_u64() {
        Some(v) => Ok(v),
        None => Err(FissureError::Input(format!(
            "Bad value for {key} in {section}: expected a non-negative integer"
        ))),
    }
}

fn required_usize(json: &JsonValue, section: &str, key: &str) -> Result<usize, FissureError> {
    let value = required_u64(json, section, key)?;
    match usize::try_from(value) {
        Ok(v) => Ok(v),
        Err(_) => Err(FissureError::Input(format!(
            "Bad value for {key} in {section}: {value} is too large"
        ))),
    }
}

/// Parses `[x, y]`, or a single number applied to both components.
/// A missing value is the zero vector.
fn parse_vector(value: &JsonValue, name: &str) -> Result<Vector2<f64>, FissureError> {
    if value.is_null() {
        return Ok(Vector2::zeros());
    }
    if let Some(v) = value.as_f64() {
        return Ok(Vector2::new(v, v));
    }
    if value.is_array() && value.len() == 2 {
        if let (Some(x), Some(y)) = (value[0].as_f64(), value[1].as_f64()) {
            return Ok(Vector2::new(x, y));
        }
    }
    Err(FissureError::Input(format!(
        "Bad value for {name}: expected [x, y] or a number"
    )))
}

fn parse_lattice(json: &JsonValue) -> Result<LatticeMetadata, FissureError> {
    let seed = if json["lattice"]["seed"].is_null() {
        0
    } else {
        required_u64(json, "lattice", "seed")?
    };

    Ok(LatticeMetadata {
        nx: required_usize(json, "lattice", "nx")?,
        ny: required_usize(json, "lattice", "ny")?,
        xi: required_f64(json, "lattice", "xi")?,
        yi: required_f64(json, "lattice", "yi")?,
        xe: required_f64(json, "lattice", "xe")?,
        ye: required_f64(json, "lattice", "ye")?,
        jitter: optional_f64(json, "lattice", "jitter", 0.0)?,
        seed,
    })
}

fn parse_physics(json: &JsonValue) -> Result<PhysicsMetadata, FissureError> {
    Ok(PhysicsMetadata {
        stiffness: required_f64(json, "physics", "stiffness")?,
        threshold_length: required_f64(json, "physics", "threshold_length")?,
        mass: required_f64(json, "physics", "mass")?,
        initial_acceleration: parse_vector(
            &json["physics"]["initial_acceleration"],
            "physics.initial_acceleration",
        )?,
        initial_velocity: parse_vector(
            &json["physics"]["initial_velocity"],
            "physics.initial_velocity",
        )?,
        dt: required_f64(json, "physics", "dt")?,
        steps: required_u64(json, "physics", "steps")?,
    })
}

fn parse_loading(json: &JsonValue) -> Result<BoundaryLoads, FissureError> {
    let loading = &json["loading"];
    Ok(BoundaryLoads {
        left: parse_vector(&loading["left"], "loading.left")?,
        right: parse_vector(&loading["right"], "loading.right")?,
        top: parse_vector(&loading["top"], "loading.top")?,
        bottom: parse_vector(&loading["bottom"], "loading.bottom")?,
    })
}

fn parse_defects(json: &JsonValue) -> Result<Vec<usize>, FissureError> {
    let defects = &json["defects"];
    if defects.is_null() {
        return Ok(Vec::new());
    }
    if !defects.is_array() {
        return Err(FissureError::Input(
            "Bad value for defects: expected an array of spring indices".to_owned(),
        ));
    }

    let mut indices: Vec<usize> = Vec::with_capacity(defects.len());
    for member in defects.members() {
        match member.as_usize() {
            Some(i) => indices.push(i),
            None => {
                return Err(FissureError::Input(format!(
                    "Bad defect spring index {member}"
                )))
            }
        }
    }
    Ok(indices)
}

fn parse_solver(json: &JsonValue) -> Result<SolverOptions, FissureError> {
    let solver = &json["solver"];
    let mut options = SolverOptions::default();

    if !solver["degenerate_springs"].is_null() {
        options.degenerate_springs = match solver["degenerate_springs"].as_str() {
            Some("error") => DegenerateSpringPolicy::Error,
            Some("clamp") => DegenerateSpringPolicy::Clamp,
            _ => {
                return Err(FissureError::Input(format!(
                    "Bad value for solver.degenerate_springs: {}. Expected \"error\" or \"clamp\"",
                    solver["degenerate_springs"]
                )))
            }
        };
    }
    if !solver["parallel_forces"].is_null() {
        options.parallel_forces = match solver["parallel_forces"].as_bool() {
            Some(b) => b,
            None => {
                return Err(FissureError::Input(
                    "Bad value for solver.parallel_forces: expected a boolean".to_owned(),
                ))
            }
        };
    }

    Ok(options)
}

/// Parses input json text into a validated SimulationConfig
///
/// # Arguments
/// * `contents` - The input file contents
pub fn parse_input(contents: &str) -> Result<SimulationConfig, FissureError> {
    let input_json = match json::parse(contents) {
        Ok(j) => j,
        Err(err) => {
            return Err(FissureError::Input(format!(
                "Error in input file json: {err}"
            )))
        }
    };

    for section in ["lattice", "physics"] {
        if !input_json.has_key(section) {
            return Err(FissureError::Input(format!(
                "Input json missing {section} field"
            )));
        }
    }

    let config = SimulationConfig {
        lattice: parse_lattice(&input_json)?,
        physics: parse_physics(&input_json)?,
        loading: parse_loading(&input_json)?,
        defects: parse_defects(&input_json)?,
        solver: parse_solver(&input_json)?,
    };
    config.validate()?;

    Ok(config)
}

/// Loads and validates a simulation input file
///
/// # Arguments
/// * `input_file` - The path to the input json
pub fn load_input_file(input_file: &Path) -> Result<SimulationConfig, FissureError> {
    let contents = match std::fs::read_to_string(input_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(FissureError::Input(format!(
                "Unable to open input file {}: {err}",
                input_file.display()
            )))
        }
    };

    parse_input(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MINIMAL: &str = r#"{
        "lattice": { "nx": 3, "ny": 4, "xi": 0, "yi": 0, "xe": 1, "ye": 1.5 },
        "physics": { "stiffness": 100, "threshold_length": 0.05, "mass": 1, "dt": 0.01, "steps": 10 }
    }"#;

    #[test]
    fn minimal_input_uses_defaults() {
        let config = parse_input(MINIMAL).unwrap();
        assert_eq!(config.lattice.nx, 3);
        assert_eq!(config.lattice.ny, 4);
        assert_eq!(config.lattice.ye, 1.5);
        assert_eq!(config.lattice.jitter, 0.0);
        assert_eq!(config.lattice.seed, 0);
        assert_eq!(config.physics.steps, 10);
        assert_eq!(config.physics.initial_velocity, Vector2::zeros());
        assert_eq!(config.loading, BoundaryLoads::zero());
        assert!(config.defects.is_empty());
        assert_eq!(config.solver, SolverOptions::default());
    }

    #[test]
    fn full_input() {
        let text = r#"{
            "lattice": { "nx": 20, "ny": 20, "xi": 1, "yi": 1, "xe": 2, "ye": 2, "jitter": 0.002, "seed": 9 },
            "physics": {
                "stiffness": 400, "threshold_length": 0.022, "mass": 1,
                "initial_acceleration": 0, "initial_velocity": [0.5, -1],
                "dt": 0.05, "steps": 70
            },
            "loading": { "left": [-0.35, 0], "right": [0.35, 0] },
            "defects": [2, 21, 762, 1123],
            "solver": { "degenerate_springs": "clamp", "parallel_forces": true }
        }"#;

        let config = parse_input(text).unwrap();
        assert_eq!(config.lattice.seed, 9);
        assert_eq!(config.physics.initial_velocity, Vector2::new(0.5, -1.0));
        assert_eq!(config.loading.left, Vector2::new(-0.35, 0.0));
        assert_eq!(config.loading.top, Vector2::zeros());
        assert_eq!(config.defects, vec![2, 21, 762, 1123]);
        assert_eq!(
            config.solver.degenerate_springs,
            DegenerateSpringPolicy::Clamp
        );
        assert!(config.solver.parallel_forces);
    }

    #[test]
    fn scalar_vector_applies_to_both_axes() {
        let v = parse_vector(&json::parse("0.25").unwrap(), "v").unwrap();
        assert_eq!(v, Vector2::new(0.25, 0.25));
        assert!(parse_vector(&json::parse("[1, 2, 3]").unwrap(), "v").is_err());
        assert!(parse_vector(&json::parse("\"up\"").unwrap(), "v").is_err());
    }

    #[test]
    fn missing_sections_and_keys_are_named() {
        let err = parse_input(r#"{ "lattice": {} }"#).unwrap_err();
        assert_eq!(
            err,
            FissureError::Input("Input json missing physics field".to_owned())
        );

        let text = MINIMAL.replace("\"dt\": 0.01, ", "");
        let err = parse_input(&text).unwrap_err();
        assert_eq!(
            err,
            FissureError::Input("Input json missing dt field in physics section".to_owned())
        );
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            parse_input("{ not json"),
            Err(FissureError::Input(_))
        ));

        let text = MINIMAL.replace("\"nx\": 3", "\"nx\": -3");
        assert!(matches!(parse_input(&text), Err(FissureError::Input(_))));

        let text = MINIMAL.replace("\"steps\": 10", "\"steps\": 10, \"defects\": 4");
        // defects belongs at top level; inside physics it is ignored
        assert!(parse_input(&text).is_ok());

        let text = MINIMAL.replacen('{', "{ \"defects\": [1, \"x\"],", 1);
        assert!(matches!(parse_input(&text), Err(FissureError::Input(_))));
    }

    #[test]
    fn demo_input_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/tension_plate.json");
        let config = load_input_file(&path).unwrap();
        let expected = SimulationConfig::default();

        assert_eq!(config.lattice.nx, expected.lattice.nx);
        assert_eq!(config.lattice.ny, expected.lattice.ny);
        assert_eq!(config.lattice.seed, expected.lattice.seed);
        assert_relative_eq!(config.lattice.jitter, expected.lattice.jitter);
        assert_relative_eq!(config.lattice.xe, expected.lattice.xe);
        assert_relative_eq!(
            config.physics.threshold_length,
            expected.physics.threshold_length
        );
        assert_relative_eq!(config.physics.dt, expected.physics.dt);
        assert_eq!(config.physics.steps, expected.physics.steps);
        assert_relative_eq!(config.loading.left, expected.loading.left);
        assert_relative_eq!(config.loading.right, expected.loading.right);
        assert_eq!(config.defects, expected.defects);
        assert_eq!(config.solver, expected.solver);
    }

    #[test]
    fn missing_input_file_is_an_input_error() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/no_such_file.json");
        assert!(matches!(
            load_input_file(&path),
            Err(FissureError::Input(_))
        ));
    }

    #[test]
    fn semantic_errors_surface_as_configuration() {
        let text = MINIMAL.replace("\"mass\": 1", "\"mass\": 0");
        assert!(matches!(
            parse_input(&text),
            Err(FissureError::Configuration(_))
        ));
    }
}
