//! Force simulation parameters.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Configuration shared by the planar and depth simulations.
///
/// Field names are camelCase on the wire so the worker can take a plain
/// JavaScript object. Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
    /// Layout area `[width, height]`; gravity pulls toward its centre (default: [1, 1]).
    pub size: [f32; 2],
    /// Rest length of every link (default: 20.0).
    pub link_distance: f32,
    /// Link stiffness in [0, 1] (default: 1.0).
    pub link_strength: f32,
    /// Velocity retained per tick, in [0, 1] (default: 0.9).
    pub friction: f32,
    /// Node charge; negative repels (default: -30.0).
    pub charge: f32,
    /// Maximum distance over which charge acts; `None` is unbounded.
    pub charge_distance: Option<f32>,
    /// Pull toward the layout centre (default: 0.1).
    pub gravity: f32,
    /// Seed for placing nodes that have no position.
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            size: [1.0, 1.0],
            link_distance: 20.0,
            link_strength: 1.0,
            friction: 0.9,
            charge: -30.0,
            charge_distance: None,
            gravity: 0.1,
            seed: 0,
        }
    }
}

impl ForceConfig {
    /// Check that every parameter is usable by the integrator.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let finite = [
            ("size[0]", self.size[0]),
            ("size[1]", self.size[1]),
            ("linkDistance", self.link_distance),
            ("linkStrength", self.link_strength),
            ("friction", self.friction),
            ("charge", self.charge),
            ("gravity", self.gravity),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(LayoutError::InvalidConfig(format!("{name} must be finite")));
        }

        if self.size[0] <= 0.0 || self.size[1] <= 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "size must be positive, got {:?}",
                self.size
            )));
        }
        if self.link_distance < 0.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "linkDistance must not be negative, got {}",
                self.link_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.link_strength) {
            return Err(LayoutError::InvalidConfig(format!(
                "linkStrength must be in [0, 1], got {}",
                self.link_strength
            )));
        }
        if !(0.0..=1.0).contains(&self.friction) {
            return Err(LayoutError::InvalidConfig(format!(
                "friction must be in [0, 1], got {}",
                self.friction
            )));
        }
        if let Some(distance) = self.charge_distance {
            if distance.is_nan() || distance <= 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "chargeDistance must be positive, got {distance}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ForceConfig::default();
        assert_eq!(config.size, [1.0, 1.0]);
        assert_eq!(config.charge_distance, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ForceConfig =
            serde_json::from_str(r#"{ "size": [960, 500], "linkDistance": 40 }"#).unwrap();

        assert_eq!(config.size, [960.0, 500.0]);
        assert_eq!(config.link_distance, 40.0);
        assert_eq!(config.friction, 0.9);
        assert_eq!(config.charge, -30.0);
    }

    #[test]
    fn test_charge_distance_round_trips_as_null() {
        let json = serde_json::to_value(ForceConfig::default()).unwrap();
        assert!(json["chargeDistance"].is_null());

        let config: ForceConfig = serde_json::from_str(r#"{ "chargeDistance": 150 }"#).unwrap();
        assert_eq!(config.charge_distance, Some(150.0));
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            ForceConfig { size: [0.0, 10.0], ..Default::default() },
            ForceConfig { friction: 1.5, ..Default::default() },
            ForceConfig { link_strength: -0.1, ..Default::default() },
            ForceConfig { link_distance: -1.0, ..Default::default() },
            ForceConfig { gravity: f32::NAN, ..Default::default() },
            ForceConfig { charge_distance: Some(0.0), ..Default::default() },
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(LayoutError::InvalidConfig(_))),
                "expected {config:?} to be rejected"
            );
        }
    }
}
