//! Pose validity gate.

use contracts::PoseSample;

/// Whether a pose sample can be trusted
///
/// Every sub-measurement must carry its own valid flag and the norm of the
/// ECEF position std must stay below `max_position_std`.
pub fn is_valid(sample: &PoseSample, max_position_std: f64) -> bool {
    let flags = sample.position_geodetic.valid
        && sample.orientation_ned.valid
        && sample.velocity_calibrated.valid
        && sample.position_ecef.valid;

    flags && sample.uncertainty().norm() < max_position_std
}

/// Gate over an optional sample; a missing pose is never valid
pub fn is_valid_opt(sample: Option<&PoseSample>, max_position_std: f64) -> bool {
    sample.is_some_and(|s| is_valid(s, max_position_std))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Measurement, Vector3};

    fn good_sample() -> PoseSample {
        PoseSample {
            position_geodetic: Measurement::valid(Vector3::new(37.0, -122.0, 0.0)),
            orientation_ned: Measurement::valid(Vector3::default()),
            velocity_calibrated: Measurement::valid(Vector3::new(10.0, 0.0, 0.0)),
            position_ecef: Measurement {
                value: Vector3::default(),
                std: Vector3::new(1.0, 1.0, 1.0),
                valid: true,
            },
            orientation_ecef: Measurement::valid(Vector3::default()),
        }
    }

    #[test]
    fn test_valid_sample() {
        assert!(is_valid(&good_sample(), 100.0));
    }

    #[test]
    fn test_any_invalid_flag_rejects() {
        let setters: [fn(&mut PoseSample); 4] = [
            |s| s.position_geodetic.valid = false,
            |s| s.orientation_ned.valid = false,
            |s| s.velocity_calibrated.valid = false,
            |s| s.position_ecef.valid = false,
        ];
        for (i, set) in setters.iter().enumerate() {
            let mut sample = good_sample();
            set(&mut sample);
            assert!(!is_valid(&sample, 100.0), "flag {i} should invalidate");
        }
    }

    #[test]
    fn test_uncertainty_threshold() {
        let mut sample = good_sample();
        // norm exactly 100
        sample.position_ecef.std = Vector3::new(60.0, 80.0, 0.0);
        assert!(!is_valid(&sample, 100.0));

        sample.position_ecef.std = Vector3::new(60.0, 79.9, 0.0);
        assert!(is_valid(&sample, 100.0));

        sample.position_ecef.std = Vector3::new(500.0, 0.0, 0.0);
        assert!(!is_valid(&sample, 100.0));
    }

    #[test]
    fn test_missing_sample() {
        assert!(!is_valid_opt(None, 100.0));
        assert!(is_valid_opt(Some(&good_sample()), 100.0));
    }
}
