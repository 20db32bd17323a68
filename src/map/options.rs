//! Viewer construction options.

use super::MapError;
use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Steepest pitch the renderer supports, in degrees.
pub const PITCH_LIMIT: f64 = 85.0;
/// Deepest zoom the renderer supports.
pub const ZOOM_LIMIT: f64 = 24.0;

/// Camera pose: where the map looks from and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Longitude (`x`) and latitude (`y`) in degrees; `[lon, lat]` in JSON.
    #[serde(with = "lon_lat")]
    pub center: Coord<f64>,
    pub zoom: f64,
    /// Tilt away from straight down, in degrees.
    pub pitch: f64,
    /// Rotation from north, in degrees.
    pub bearing: f64,
}

impl Camera {
    pub fn new(lon: f64, lat: f64, zoom: f64) -> Self {
        Self {
            center: Coord { x: lon, y: lat },
            zoom,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub fn lon(&self) -> f64 {
        self.center.x
    }

    pub fn lat(&self) -> f64 {
        self.center.y
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            center: Coord {
                x: 139.744935,
                y: 35.661738,
            },
            zoom: 16.23,
            pitch: 73.0,
            bearing: 0.0,
        }
    }
}

/// Options the viewer is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapOptions {
    /// Id of the page element the map renders into.
    pub container: String,
    /// Path or URL of the base style document.
    pub style: String,
    #[serde(flatten)]
    pub camera: Camera,
    pub max_pitch: f64,
    /// Mirror the camera into the URL fragment.
    pub hash: bool,
    /// Show the renderer's built-in attribution control.
    pub attribution_control: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            style: "./std.json".to_string(),
            camera: Camera::default(),
            max_pitch: PITCH_LIMIT,
            hash: true,
            attribution_control: false,
        }
    }
}

impl MapOptions {
    /// Adopts the camera encoded in a URL `fragment` when hash support is on.
    ///
    /// A fragment that does not parse, or whose camera fails validation,
    /// leaves the configured camera in place.
    pub fn restore_camera(&mut self, fragment: Option<&str>) {
        if !self.hash {
            return;
        }
        let Some(camera) = fragment.and_then(crate::state::url_hash::parse_hash) else {
            return;
        };

        let mut candidate = self.clone();
        candidate.camera = camera;
        match candidate.validate() {
            Ok(()) => {
                log::info!("Restoring camera from URL fragment");
                self.camera = candidate.camera;
            }
            Err(e) => log::warn!("Ignoring URL fragment camera: {}", e),
        }
    }

    /// Checks ranges and clamps the initial pitch to `max_pitch`.
    pub fn validate(&mut self) -> Result<(), MapError> {
        if self.container.is_empty() {
            return Err(MapError::InvalidOptions("container must not be empty".into()));
        }
        if self.style.is_empty() {
            return Err(MapError::InvalidOptions("style must not be empty".into()));
        }
        if !(-180.0..=180.0).contains(&self.camera.lon()) {
            return Err(MapError::InvalidOptions(format!(
                "longitude {} is outside [-180, 180]",
                self.camera.lon()
            )));
        }
        if !(-90.0..=90.0).contains(&self.camera.lat()) {
            return Err(MapError::InvalidOptions(format!(
                "latitude {} is outside [-90, 90]",
                self.camera.lat()
            )));
        }
        if !(0.0..=ZOOM_LIMIT).contains(&self.camera.zoom) {
            return Err(MapError::InvalidOptions(format!(
                "zoom {} is outside [0, {}]",
                self.camera.zoom, ZOOM_LIMIT
            )));
        }
        if !(0.0..=PITCH_LIMIT).contains(&self.max_pitch) {
            return Err(MapError::InvalidOptions(format!(
                "maxPitch {} is outside [0, {}]",
                self.max_pitch, PITCH_LIMIT
            )));
        }
        if !self.camera.bearing.is_finite() {
            return Err(MapError::InvalidOptions("bearing must be finite".into()));
        }
        if self.camera.pitch.is_nan() || self.camera.pitch < 0.0 {
            return Err(MapError::InvalidOptions(format!(
                "pitch {} is not a non-negative angle",
                self.camera.pitch
            )));
        }

        if self.camera.pitch > self.max_pitch {
            log::warn!(
                "Pitch {} exceeds maxPitch {}, clamping",
                self.camera.pitch,
                self.max_pitch
            );
            self.camera.pitch = self.max_pitch;
        }

        Ok(())
    }
}

mod lon_lat {
    use geo_types::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        center: &Coord<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        [center.x, center.y].serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Coord<f64>, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_options_json() {
        let value = serde_json::to_value(MapOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "container": "map",
                "style": "./std.json",
                "center": [139.744935, 35.661738],
                "zoom": 16.23,
                "pitch": 73.0,
                "bearing": 0.0,
                "maxPitch": 85.0,
                "hash": true,
                "attributionControl": false
            })
        );
    }

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: MapOptions = serde_json::from_value(json!({
            "center": [139.0, 35.0],
            "zoom": 10.0,
            "pitch": 0.0,
            "bearing": 0.0,
            "hash": false
        }))
        .unwrap();
        assert_eq!(options.container, "map");
        assert_eq!(options.camera.lon(), 139.0);
        assert!(!options.hash);
    }

    #[test]
    fn test_validate_clamps_pitch() {
        let mut options = MapOptions {
            max_pitch: 60.0,
            ..MapOptions::default()
        };
        options.validate().unwrap();
        assert_eq!(options.camera.pitch, 60.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut options = MapOptions::default();
        options.camera.center.y = 95.0;
        assert!(matches!(
            options.validate(),
            Err(MapError::InvalidOptions(_))
        ));

        let mut options = MapOptions::default();
        options.max_pitch = 90.0;
        assert!(options.validate().is_err());

        let mut options = MapOptions::default();
        options.camera.zoom = -1.0;
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_restore_camera_from_fragment() {
        let mut options = MapOptions::default();
        options.restore_camera(Some("#12/35.6/139.7/10/45"));
        assert_eq!(options.camera.zoom, 12.0);
        assert_eq!(options.camera.pitch, 45.0);

        let mut options = MapOptions::default();
        options.restore_camera(Some("not-a-camera"));
        assert_eq!(options.camera, Camera::default());
    }

    #[test]
    fn test_out_of_range_fragment_keeps_configured_camera() {
        let mut options = MapOptions::default();
        options.restore_camera(Some("#30/35.6/139.7"));
        assert_eq!(options.camera, Camera::default());
        options.validate().unwrap();

        let mut options = MapOptions::default();
        options.restore_camera(Some("#12/95/139.7"));
        assert_eq!(options.camera.zoom, 16.23);
    }
}
