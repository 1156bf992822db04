//! RSSI to distance estimation
//!
//! Log-distance path-loss model:
//!
//! `distance = 10 ^ ((tx_power - rssi) / (10 * n))`

use crate::config::PathLossModel;
use crate::types::{Rssi, UNKNOWN_DISTANCE};

/// Maps a smoothed RSSI to metres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistanceEstimator {
    model: PathLossModel,
}

impl DistanceEstimator {
    pub fn new(model: PathLossModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &PathLossModel {
        &self.model
    }

    /// Estimated distance in metres, [`UNKNOWN_DISTANCE`] for an RSSI of 0
    pub fn estimate(&self, rssi: Rssi) -> f64 {
        if rssi == 0 {
            return UNKNOWN_DISTANCE;
        }
        let loss = i32::from(self.model.tx_power) - i32::from(rssi);
        let ratio = f64::from(loss) / (10.0 * self.model.path_loss_exponent);
        // Extreme readings must not underflow into the sentinel range
        10f64.powf(ratio).clamp(f64::MIN_POSITIVE, f64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> DistanceEstimator {
        DistanceEstimator::default()
    }

    #[test]
    fn test_zero_rssi_is_unknown() {
        assert_eq!(estimator().estimate(0), -1.0);
    }

    #[test]
    fn test_tx_power_is_about_one_metre() {
        let d = estimator().estimate(-59);
        assert!((0.8..=1.2).contains(&d), "was {}", d);
    }

    #[test]
    fn test_default_model_reference_points() {
        // 10^(21/25) and 10^(11/25)
        let d80 = estimator().estimate(-80);
        assert!((d80 - 6.918).abs() < 0.01, "was {}", d80);
        let d70 = estimator().estimate(-70);
        assert!((d70 - 2.754).abs() < 0.01, "was {}", d70);
    }

    #[test]
    fn test_lower_exponent_reaches_further() {
        let open_air = DistanceEstimator::new(PathLossModel::new().with_path_loss_exponent(1.7));
        let d = open_air.estimate(-80);
        assert!((15.0..=20.0).contains(&d), "was {}", d);
        assert!(d > estimator().estimate(-80));
    }

    #[test]
    fn test_weaker_signal_is_further() {
        let e = estimator();
        assert!(e.estimate(-80) > e.estimate(-60));
    }

    #[test]
    fn test_positive_for_all_real_readings() {
        let e = estimator();
        for rssi in [-50, -60, -70, -80, -90, -100, -1] {
            assert!(e.estimate(rssi) > 0.0, "rssi {}", rssi);
        }
    }

    #[test]
    fn test_extremes_stay_strictly_positive() {
        let e = estimator();
        assert!(e.estimate(Rssi::MAX) > 0.0);
        assert!(e.estimate(Rssi::MIN).is_finite());
    }

    #[test]
    fn test_positive_rssi_gives_sub_metre_distance() {
        assert!(estimator().estimate(5) < 1.0);
    }
}
