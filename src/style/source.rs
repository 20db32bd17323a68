//! Source and terrain declarations.

use super::StyleError;
use serde::{Deserialize, Serialize};

/// Encoding of elevation values in raster-DEM tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemEncoding {
    #[default]
    Mapbox,
    Terrarium,
}

/// A raster elevation source addressed by a z/x/y URL template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterDemSource {
    pub tiles: Vec<String>,
    pub tile_size: u32,
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(default)]
    pub encoding: DemEncoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// A vector tile source described by a TileJSON URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSource {
    pub url: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

/// A named entry in the map's source registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceSpec {
    RasterDem(RasterDemSource),
    Vector(VectorSource),
}

impl SourceSpec {
    /// The `type` name the renderer knows this source by.
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceSpec::RasterDem(_) => "raster-dem",
            SourceSpec::Vector(_) => "vector",
        }
    }

    pub fn zoom_range(&self) -> (u8, u8) {
        match self {
            SourceSpec::RasterDem(s) => (s.minzoom, s.maxzoom),
            SourceSpec::Vector(s) => (s.minzoom, s.maxzoom),
        }
    }

    pub fn attribution(&self) -> Option<&str> {
        match self {
            SourceSpec::RasterDem(s) => s.attribution.as_deref(),
            SourceSpec::Vector(s) => s.attribution.as_deref(),
        }
    }

    /// URLs the renderer will fetch through: tile templates or the TileJSON URL.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            SourceSpec::RasterDem(s) => s.tiles.iter().map(String::as_str).collect(),
            SourceSpec::Vector(s) => vec![s.url.as_str()],
        }
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        let (minzoom, maxzoom) = self.zoom_range();
        if minzoom > maxzoom {
            return Err(StyleError::invalid(
                "minzoom",
                format!("{} is above maxzoom {}", minzoom, maxzoom),
            ));
        }

        if let SourceSpec::RasterDem(dem) = self {
            if dem.tiles.is_empty() {
                return Err(StyleError::invalid("tiles", "at least one URL template is required"));
            }
            if let Some(template) = dem
                .tiles
                .iter()
                .find(|t| !(t.contains("{z}") && t.contains("{x}") && t.contains("{y}")))
            {
                return Err(StyleError::invalid(
                    "tiles",
                    format!("{} lacks {{z}}/{{x}}/{{y}} placeholders", template),
                ));
            }
            if !dem.tile_size.is_power_of_two() {
                return Err(StyleError::invalid(
                    "tileSize",
                    format!("{} is not a power of two", dem.tile_size),
                ));
            }
        }

        Ok(())
    }
}

/// Active terrain: which DEM source drives elevation and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSpec {
    pub source: String,
    #[serde(default = "default_exaggeration")]
    pub exaggeration: f64,
}

fn default_exaggeration() -> f64 {
    1.0
}

impl TerrainSpec {
    pub fn validate(&self) -> Result<(), StyleError> {
        if !(self.exaggeration.is_finite() && self.exaggeration >= 0.0) {
            return Err(StyleError::invalid(
                "exaggeration",
                format!("{} is not a non-negative number", self.exaggeration),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dem() -> SourceSpec {
        SourceSpec::RasterDem(RasterDemSource {
            tiles: vec!["https://example.com/dem/{z}/{x}/{y}.png".into()],
            tile_size: 256,
            minzoom: 1,
            maxzoom: 18,
            encoding: DemEncoding::Mapbox,
            attribution: Some("DEM".into()),
        })
    }

    #[test]
    fn test_source_json_shape() {
        let value = serde_json::to_value(dem()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "raster-dem",
                "tiles": ["https://example.com/dem/{z}/{x}/{y}.png"],
                "tileSize": 256,
                "minzoom": 1,
                "maxzoom": 18,
                "encoding": "mapbox",
                "attribution": "DEM"
            })
        );

        let vector: SourceSpec = serde_json::from_value(json!({
            "type": "vector",
            "url": "pmtiles://https://host/a.pmtiles",
            "minzoom": 14,
            "maxzoom": 16
        }))
        .unwrap();
        assert_eq!(vector.type_name(), "vector");
        assert_eq!(vector.zoom_range(), (14, 16));
        assert_eq!(vector.attribution(), None);
    }

    #[test]
    fn test_validate() {
        assert!(dem().validate().is_ok());

        let mut bad = dem();
        if let SourceSpec::RasterDem(s) = &mut bad {
            s.minzoom = 19;
        }
        assert!(bad.validate().is_err());

        let mut bad = dem();
        if let SourceSpec::RasterDem(s) = &mut bad {
            s.tiles = vec!["https://example.com/dem.png".into()];
        }
        assert!(bad.validate().is_err());

        let terrain = TerrainSpec {
            source: "dem".into(),
            exaggeration: f64::NAN,
        };
        assert!(terrain.validate().is_err());
    }
}
