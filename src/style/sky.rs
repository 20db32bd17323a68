//! Atmospheric sky styling.

use super::color::Color;
use super::expression::{EvaluationContext, Expression, ExpressionError};
use super::StyleError;
use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Sky properties. Omitted properties take the renderer's defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SkySpec {
    pub sky_color: Color,
    pub sky_horizon_blend: f64,
    pub horizon_color: Color,
    pub horizon_fog_blend: f64,
    pub fog_color: Color,
    pub fog_ground_blend: f64,
    /// A constant or a zoom-driven expression.
    pub atmosphere_blend: Expression,
}

impl Default for SkySpec {
    fn default() -> Self {
        Self {
            sky_color: Color::rgb(0x88, 0xc6, 0xfc),
            sky_horizon_blend: 0.8,
            horizon_color: Color::WHITE,
            horizon_fog_blend: 0.5,
            fog_color: Color::WHITE,
            fog_ground_blend: 0.5,
            atmosphere_blend: Expression::literal(0.8),
        }
    }
}

impl SkySpec {
    /// Atmosphere blend factor at `zoom`.
    pub fn atmosphere_blend_at(&self, zoom: f64) -> Result<f64, ExpressionError> {
        let empty = Map::new();
        self.atmosphere_blend
            .evaluate_number(&EvaluationContext::new(zoom, &empty))
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        let blends = [
            ("sky-horizon-blend", self.sky_horizon_blend),
            ("horizon-fog-blend", self.horizon_fog_blend),
            ("fog-ground-blend", self.fog_ground_blend),
        ];
        for (property, value) in blends {
            if !(0.0..=1.0).contains(&value) {
                return Err(StyleError::invalid(
                    property,
                    format!("{} is outside [0, 1]", value),
                ));
            }
        }

        // A constant blend must also be in range; curves are checked at their stops.
        let outputs: Vec<f64> = match &self.atmosphere_blend {
            Expression::Interpolate { stops, .. } => stops.iter().map(|(_, out)| *out).collect(),
            _ => vec![self
                .atmosphere_blend_at(0.0)
                .map_err(|e| StyleError::invalid("atmosphere-blend", e.to_string()))?],
        };
        if let Some(out) = outputs.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(StyleError::invalid(
                "atmosphere-blend",
                format!("{} is outside [0, 1]", out),
            ));
        }

        Ok(())
    }
}
