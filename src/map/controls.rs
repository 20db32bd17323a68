//! UI controls attached to the map.

use crate::overlay::OverlaySpec;
use serde::Serialize;

/// Map corner a control is docked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ControlPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPosition::TopLeft => "top-left",
            ControlPosition::TopRight => "top-right",
            ControlPosition::BottomLeft => "bottom-left",
            ControlPosition::BottomRight => "bottom-right",
        }
    }
}

/// Zoom buttons and compass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationOptions {
    pub show_compass: bool,
    pub show_zoom: bool,
    pub visualize_pitch: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            show_compass: true,
            show_zoom: true,
            visualize_pitch: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitBoundsOptions {
    pub max_zoom: f64,
}

/// Locate-me button.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocateOptions {
    pub position_options: PositionOptions,
    /// Zoom cap when fitting the view to the user's position.
    pub fit_bounds_options: FitBoundsOptions,
    /// Keep re-centering as the user moves.
    pub track_user_location: bool,
    pub show_user_location: bool,
}

impl Default for GeolocateOptions {
    fn default() -> Self {
        Self {
            position_options: PositionOptions {
                enable_high_accuracy: false,
            },
            fit_bounds_options: FitBoundsOptions { max_zoom: 18.0 },
            track_user_location: true,
            show_user_location: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleUnit {
    Metric,
    Imperial,
    Nautical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleOptions {
    /// Longest the bar may grow on screen, in pixels.
    pub max_width: u32,
    pub unit: ScaleUnit,
}

impl Default for ScaleOptions {
    fn default() -> Self {
        Self {
            max_width: 200,
            unit: ScaleUnit::Metric,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionOptions {
    /// Collapse into an info button.
    pub compact: bool,
    /// HTML credit shown alongside source attributions.
    pub custom_attribution: String,
}

/// A control the map can host.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Control {
    Navigation(NavigationOptions),
    Fullscreen,
    Geolocate(GeolocateOptions),
    Scale(ScaleOptions),
    Attribution(AttributionOptions),
    Overlay(OverlaySpec),
}

impl Control {
    pub fn name(&self) -> &'static str {
        match self {
            Control::Navigation(_) => "navigation",
            Control::Fullscreen => "fullscreen",
            Control::Geolocate(_) => "geolocate",
            Control::Scale(_) => "scale",
            Control::Attribution(_) => "attribution",
            Control::Overlay(_) => "overlay",
        }
    }

    /// The corner the renderer docks this control in when none is given.
    pub fn default_position(&self) -> ControlPosition {
        match self {
            Control::Scale(_) => ControlPosition::BottomLeft,
            Control::Attribution(_) => ControlPosition::BottomRight,
            _ => ControlPosition::TopRight,
        }
    }
}

/// A control together with where it was docked.
#[derive(Debug, Clone, Serialize)]
pub struct AttachedControl {
    pub position: ControlPosition,
    #[serde(flatten)]
    pub control: Control,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_geolocate_json_shape() {
        let value = serde_json::to_value(Control::Geolocate(GeolocateOptions::default())).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "geolocate",
                "positionOptions": {"enableHighAccuracy": false},
                "fitBoundsOptions": {"maxZoom": 18.0},
                "trackUserLocation": true,
                "showUserLocation": true
            })
        );
    }

    #[test]
    fn test_attached_control_flattens() {
        let attached = AttachedControl {
            position: ControlPosition::BottomLeft,
            control: Control::Scale(ScaleOptions::default()),
        };
        assert_eq!(
            serde_json::to_value(&attached).unwrap(),
            json!({"position": "bottom-left", "type": "scale", "maxWidth": 200, "unit": "metric"})
        );
    }

    #[test]
    fn test_default_positions() {
        assert_eq!(Control::Fullscreen.default_position(), ControlPosition::TopRight);
        assert_eq!(
            Control::Scale(ScaleOptions::default()).default_position(),
            ControlPosition::BottomLeft
        );
        assert_eq!(ControlPosition::BottomRight.as_str(), "bottom-right");
    }
}
