use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FissureError {
    /// Rejected model parameters. Raised before any engine state exists.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An intact spring collapsed to zero length, so its force direction is
    /// undefined.
    #[error("Degenerate spring error: spring {spring} ({a}, {b}) has zero length at step {step}")]
    DegenerateSpring {
        spring: usize,
        a: usize,
        b: usize,
        step: u64,
    },

    #[error("Input error: {0}")]
    Input(String),

    #[error("Post Processor error: {0}")]
    PostProcessor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        let err = FissureError::Configuration("nx must be at least 2".to_owned());
        assert_eq!(
            err.to_string(),
            "Configuration error: nx must be at least 2"
        );

        let err = FissureError::DegenerateSpring {
            spring: 4,
            a: 1,
            b: 2,
            step: 7,
        };
        assert_eq!(
            err.to_string(),
            "Degenerate spring error: spring 4 (1, 2) has zero length at step 7"
        );
    }
}
