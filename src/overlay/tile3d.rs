//! 3D Tiles point-cloud layers.

use crate::style::StyleError;
use glam::DVec3;
use serde::Serialize;
use std::fmt;
use std::rc::Rc;

/// Loaded content of one 3D tile, as seen by tile-load hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct TileContent {
    pub id: String,
    /// Origin of the tile's local frame: longitude and latitude in degrees,
    /// height in metres.
    pub cartographic_origin: DVec3,
}

/// Runs on every tile before it is first drawn.
pub trait TileLoadHook: fmt::Debug {
    fn on_tile_load(&self, content: &mut TileContent);
}

/// Lowers every tile by a fixed number of metres.
///
/// Point-cloud heights are ellipsoidal while the terrain is geoid-based; the
/// offset compensates for the local difference. Zero leaves tiles untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationOffset {
    pub meters: f64,
}

impl ElevationOffset {
    pub fn new(meters: f64) -> Self {
        Self { meters }
    }
}

impl TileLoadHook for ElevationOffset {
    fn on_tile_load(&self, content: &mut TileContent) {
        content.cartographic_origin.z -= self.meters;
    }
}

/// A point-cloud layer streamed from a 3D Tiles tileset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile3dLayer {
    #[serde(rename = "@@type")]
    kind: &'static str,
    pub id: String,
    /// URL of the tileset descriptor (`tileset.json`).
    pub data: String,
    pub opacity: f64,
    pub point_size: f64,
    #[serde(skip)]
    pub on_tile_load: Rc<dyn TileLoadHook>,
}

impl Tile3dLayer {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind: "Tile3DLayer",
            id: id.into(),
            data: data.into(),
            opacity: 1.0,
            point_size: 1.0,
            on_tile_load: Rc::new(ElevationOffset::default()),
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_point_size(mut self, point_size: f64) -> Self {
        self.point_size = point_size;
        self
    }

    pub fn with_tile_load_hook(mut self, hook: Rc<dyn TileLoadHook>) -> Self {
        self.on_tile_load = hook;
        self
    }

    /// Applies the tile-load hook to freshly loaded content.
    pub fn load_tile(&self, content: &mut TileContent) {
        let before = content.cartographic_origin.z;
        self.on_tile_load.on_tile_load(content);
        log::debug!(
            "Tile {} of layer {} loaded, origin height {:.2} -> {:.2}",
            content.id,
            self.id,
            before,
            content.cartographic_origin.z
        );
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(StyleError::invalid(
                "opacity",
                format!("{} is outside [0, 1]", self.opacity),
            ));
        }
        if !(self.point_size.is_finite() && self.point_size > 0.0) {
            return Err(StyleError::invalid(
                "pointSize",
                format!("{} is not a positive size", self.point_size),
            ));
        }
        if self.data.is_empty() {
            return Err(StyleError::invalid("data", "tileset URL must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokyo_tower_tile() -> TileContent {
        TileContent {
            id: "root".into(),
            cartographic_origin: DVec3::new(139.7454, 35.6586, 45.0),
        }
    }

    #[test]
    fn test_default_hook_is_identity() {
        let layer = Tile3dLayer::new("pc", "https://example.com/tileset.json");
        let mut content = tokyo_tower_tile();
        layer.load_tile(&mut content);
        assert_eq!(content, tokyo_tower_tile());
    }

    #[test]
    fn test_elevation_offset_lowers_origin() {
        let layer = Tile3dLayer::new("pc", "https://example.com/tileset.json")
            .with_tile_load_hook(Rc::new(ElevationOffset::new(36.7)));
        let mut content = tokyo_tower_tile();
        layer.load_tile(&mut content);

        assert!((content.cartographic_origin.z - 8.3).abs() < 1e-9);
        assert_eq!(content.cartographic_origin.x, 139.7454);
        assert_eq!(content.cartographic_origin.y, 35.6586);
    }

    #[test]
    fn test_layer_json_shape() {
        let layer = Tile3dLayer::new("pc-3dtiles", "https://example.com/tileset.json")
            .with_point_size(2.0);
        assert_eq!(
            serde_json::to_value(&layer).unwrap(),
            json!({
                "@@type": "Tile3DLayer",
                "id": "pc-3dtiles",
                "data": "https://example.com/tileset.json",
                "opacity": 1.0,
                "pointSize": 2.0
            })
        );
    }

    #[test]
    fn test_validate() {
        let layer = Tile3dLayer::new("pc", "https://example.com/tileset.json");
        assert!(layer.validate().is_ok());
        assert!(layer.clone().with_opacity(2.0).validate().is_err());
        assert!(layer.clone().with_point_size(0.0).validate().is_err());
        assert!(Tile3dLayer::new("pc", "").validate().is_err());
    }
}
