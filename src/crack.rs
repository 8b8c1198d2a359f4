use nalgebra::Vector2;

/// Extent of the crack at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrackMeasurement {
    /// Largest distance between any two fracture-front nodes, 0 without fractures
    pub length: f64,
    /// Node pair spanning `length`, `None` until the first fracture
    pub endpoints: Option<(usize, usize)>,
}

impl CrackMeasurement {
    pub fn none() -> CrackMeasurement {
        CrackMeasurement {
            length: 0.0,
            endpoints: None,
        }
    }
}

impl Default for CrackMeasurement {
    fn default() -> Self {
        CrackMeasurement::none()
    }
}

/// Measures the crack spanned by the fracture front at `positions`.
///
/// Scans every ordered pair (i, j) of front entries, self pairs and
/// duplicates included, which is O(F²) in the front length. The first pair
/// reaching the maximum in (i, j) order wins ties.
///
/// # Arguments
/// * `front` - Node indices from the fracture front, in recording order
/// * `positions` - Current node positions
pub fn measure_crack(front: &[usize], positions: &[Vector2<f64>]) -> CrackMeasurement {
    let Some(&first) = front.first() else {
        return CrackMeasurement::none();
    };

    let mut length = 0.0;
    let mut endpoints = (first, first);

    for &a in front {
        for &b in front {
            let distance = (positions[a] - positions[b]).norm();
            if distance > length {
                length = distance;
                endpoints = (a, b);
            }
        }
    }

    CrackMeasurement {
        length,
        endpoints: Some(endpoints),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn positions() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(3.0, 4.0),
        ]
    }

    #[test]
    fn empty_front_has_no_crack() {
        let crack = measure_crack(&[], &positions());
        assert_eq!(crack.length, 0.0);
        assert_eq!(crack.endpoints, None);
        assert_eq!(crack, CrackMeasurement::default());
    }

    #[test]
    fn single_fracture_spans_its_spring() {
        let crack = measure_crack(&[0, 1], &positions());
        assert_relative_eq!(crack.length, 1.0);
        assert_eq!(crack.endpoints, Some((0, 1)));
    }

    #[test]
    fn uses_euclidean_distance() {
        let crack = measure_crack(&[0, 1, 0, 4], &positions());
        assert_relative_eq!(crack.length, 5.0);
        assert_eq!(crack.endpoints, Some((0, 4)));
    }

    #[test]
    fn first_maximal_pair_wins() {
        // (1, 2) and (0, 3) are both sqrt(2) apart; (1, 2) comes first
        let crack = measure_crack(&[1, 2, 0, 3], &positions());
        assert_relative_eq!(crack.length, 2f64.sqrt());
        assert_eq!(crack.endpoints, Some((1, 2)));
    }

    #[test]
    fn coincident_front_reports_zero_length() {
        let mut p = positions();
        p[1] = p[0];
        let crack = measure_crack(&[0, 1], &p);
        assert_eq!(crack.length, 0.0);
        assert_eq!(crack.endpoints, Some((0, 0)));
    }
}
