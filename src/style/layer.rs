//! Render layer declarations.

use super::color::Color;
use super::expression::{EvaluationContext, Expression};
use super::StyleError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Render type of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    /// Polygons drawn as prisms of per-feature height.
    FillExtrusion,
}

/// Paint properties of a `fill-extrusion` layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillExtrusionPaint {
    #[serde(rename = "fill-extrusion-color")]
    pub color: Color,
    #[serde(rename = "fill-extrusion-opacity")]
    pub opacity: f64,
    #[serde(rename = "fill-extrusion-height")]
    pub height: Expression,
    #[serde(
        rename = "fill-extrusion-base",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub base: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub source: String,
    #[serde(rename = "source-layer", default, skip_serializing_if = "Option::is_none")]
    pub source_layer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,
    pub paint: FillExtrusionPaint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
}

impl LayerSpec {
    /// Returns true if the layer is drawn at `zoom` (minzoom inclusive, maxzoom exclusive).
    pub fn visible_at(&self, zoom: f64) -> bool {
        self.minzoom.map_or(true, |min| zoom >= min) && self.maxzoom.map_or(true, |max| zoom < max)
    }

    /// Returns true if a feature with `properties` is rendered at `zoom`.
    pub fn renders_feature(&self, properties: &Map<String, Value>, zoom: f64) -> bool {
        if !self.visible_at(zoom) {
            return false;
        }
        let ctx = EvaluationContext::new(zoom, properties);
        self.filter.as_ref().map_or(true, |filter| filter.matches(&ctx))
    }

    /// Extrusion height of a feature in metres, if the height expression yields a number.
    pub fn extrusion_height(&self, properties: &Map<String, Value>, zoom: f64) -> Option<f64> {
        let ctx = EvaluationContext::new(zoom, properties);
        self.paint.height.evaluate_number(&ctx).ok()
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        if self.id.is_empty() {
            return Err(StyleError::invalid("id", "layer id must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.paint.opacity) {
            return Err(StyleError::invalid(
                "fill-extrusion-opacity",
                format!("{} is outside [0, 1]", self.paint.opacity),
            ));
        }
        if let (Some(min), Some(max)) = (self.minzoom, self.maxzoom) {
            if min > max {
                return Err(StyleError::invalid(
                    "minzoom",
                    format!("{} is above maxzoom {}", min, max),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn buildings() -> LayerSpec {
        LayerSpec {
            id: "bldg".into(),
            layer_type: LayerType::FillExtrusion,
            source: "building".into(),
            source_layer: Some("PLATEAU".into()),
            minzoom: Some(14.0),
            maxzoom: Some(23.0),
            paint: FillExtrusionPaint {
                color: Color::WHITE,
                opacity: 1.0,
                height: Expression::get("measuredHeight"),
                base: None,
            },
            filter: Some(Expression::eq(
                Expression::get("city"),
                Expression::literal("東京都港区"),
            )),
        }
    }

    #[test]
    fn test_layer_json_shape() {
        let value = serde_json::to_value(buildings()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "bldg",
                "type": "fill-extrusion",
                "source": "building",
                "source-layer": "PLATEAU",
                "minzoom": 14.0,
                "maxzoom": 23.0,
                "paint": {
                    "fill-extrusion-color": "#ffffff",
                    "fill-extrusion-opacity": 1.0,
                    "fill-extrusion-height": ["get", "measuredHeight"]
                },
                "filter": ["==", ["get", "city"], "東京都港区"]
            })
        );
    }

    #[test]
    fn test_renders_feature_respects_zoom_and_filter() {
        let layer = buildings();
        let feature = json!({"city": "東京都港区", "measuredHeight": 30.5});
        let properties = feature.as_object().unwrap();

        assert!(layer.renders_feature(properties, 16.0));
        assert!(!layer.renders_feature(properties, 13.9));
        assert!(!layer.renders_feature(properties, 23.0));
        assert_eq!(layer.extrusion_height(properties, 16.0), Some(30.5));

        let other = json!({"city": "東京都新宿区"});
        assert!(!layer.renders_feature(other.as_object().unwrap(), 16.0));
    }

    #[test]
    fn test_validate_opacity() {
        let mut layer = buildings();
        layer.paint.opacity = 1.5;
        assert!(layer.validate().is_err());
    }
}
