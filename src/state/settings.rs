//! Scene settings.
//!
//! Every value the map is composed from lives here, with defaults describing
//! the Tokyo Tower scene. Settings are read from a JSON file on native builds
//! and from localStorage in the browser; any field left out keeps its default.

use crate::map::MapOptions;
use crate::style::{Color, Expression, SkySpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from reading settings.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Failed to read settings: {}", e),
            SettingsError::Parse(e) => write!(f, "Failed to parse settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

/// UI control tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlSettings {
    /// Zoom cap when the geolocate control fits the user's position.
    pub geolocate_max_zoom: f64,
    pub scale_max_width: u32,
    /// HTML credit shown in the compact attribution control.
    pub credit: String,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            geolocate_max_zoom: 18.0,
            scale_max_width: 200,
            credit: "<a href=\"https://www.geospatial.jp/ckan/dataset/tokyopc-23ku-2024\" target=\"_blank\">東京都デジタルツイン実現プロジェクト 区部点群データ</a>".to_string(),
        }
    }
}

/// Elevation source driving the terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerrainSettings {
    pub source_id: String,
    pub tiles: Vec<String>,
    pub tile_size: u32,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub attribution: String,
    pub exaggeration: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            source_id: "gsi-terrain-dem".to_string(),
            tiles: vec![
                "https://xs489works.xsrv.jp/raster-tiles/gsi/gsi-dem-terrain-rgb/{z}/{x}/{y}.png"
                    .to_string(),
            ],
            tile_size: 256,
            minzoom: 1,
            maxzoom: 18,
            attribution: "<a href='https://maps.gsi.go.jp/development/ichiran.html#dem' target='_blank'>地理院タイル(標高タイル)</a>".to_string(),
            exaggeration: 1.0,
        }
    }
}

/// Extruded building footprints from a PMTiles archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildingSettings {
    pub source_id: String,
    /// Archive URL, without the `pmtiles://` prefix.
    pub archive_url: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub attribution: String,
    pub layer_id: String,
    pub source_layer: String,
    pub layer_minzoom: f64,
    pub layer_maxzoom: f64,
    pub color: Color,
    pub opacity: f64,
    /// Feature property holding the building height in metres.
    pub height_property: String,
    /// Only buildings whose `city` equals this are drawn.
    pub city: String,
    /// A building left out of the extrusion layer.
    pub excluded_building_id: String,
}

impl Default for BuildingSettings {
    fn default() -> Self {
        Self {
            source_id: "building".to_string(),
            archive_url:
                "https://pmtiles-data.s3.ap-northeast-1.amazonaws.com/plateau/PLATEAU_2022_LOD1.pmtiles"
                    .to_string(),
            minzoom: 14,
            maxzoom: 16,
            attribution: "<a href='https://www.geospatial.jp/ckan/dataset/plateau' target='_blank'>3D都市モデル Project PLATEAU (国土交通省)</a>, <a href='https://github.com/amx-project/apb' target='_blank'>法務省地図XMLアダプトプロジェクト</a>".to_string(),
            layer_id: "bldg-pmtiles".to_string(),
            source_layer: "PLATEAU".to_string(),
            layer_minzoom: 14.0,
            layer_maxzoom: 23.0,
            color: Color::WHITE,
            opacity: 1.0,
            height_property: "measuredHeight".to_string(),
            city: "東京都港区".to_string(),
            excluded_building_id: "13103-bldg-16907".to_string(),
        }
    }
}

/// The 3D Tiles point cloud drawn through the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PointCloudSettings {
    pub layer_id: String,
    pub tileset_url: String,
    pub opacity: f64,
    pub point_size: f64,
    /// Metres subtracted from every tile's origin height.
    pub elevation_offset: f64,
}

impl Default for PointCloudSettings {
    fn default() -> Self {
        Self {
            layer_id: "pc-3dtiles".to_string(),
            tileset_url: "https://shiworks.xsrv.jp/3dtiles/toyko-23ku-pc/tokyo-tower/tileset.json"
                .to_string(),
            opacity: 1.0,
            point_size: 1.0,
            elevation_offset: 0.0,
        }
    }
}

fn default_sky() -> SkySpec {
    SkySpec {
        sky_color: Color::rgb(0x19, 0x9e, 0xf3),
        sky_horizon_blend: 0.7,
        horizon_color: Color::rgb(0xf0, 0xf8, 0xff),
        horizon_fog_blend: 0.8,
        fog_color: Color::rgb(0x2c, 0x7f, 0xb8),
        fog_ground_blend: 0.9,
        atmosphere_blend: Expression::interpolate_linear(
            Expression::Zoom,
            vec![(0.0, 1.0), (12.0, 0.0)],
        ),
    }
}

/// Everything the scene is composed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneSettings {
    pub map: MapOptions,
    pub controls: ControlSettings,
    pub terrain: TerrainSettings,
    pub buildings: BuildingSettings,
    pub point_cloud: PointCloudSettings,
    pub sky: SkySpec,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            map: MapOptions::default(),
            controls: ControlSettings::default(),
            terrain: TerrainSettings::default(),
            buildings: BuildingSettings::default(),
            point_cloud: PointCloudSettings::default(),
            sky: default_sky(),
        }
    }
}

impl SceneSettings {
    /// localStorage key for persisting settings.
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "pointcloud_map_settings";

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(SettingsError::Parse)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(SettingsError::Io)?;
        Self::from_json(&json)
    }

    /// Loads settings from `path`, falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load_from_path(path) {
            Ok(settings) => {
                log::info!("Loaded scene settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{} ({}), using defaults", e, path.display());
                Self::default()
            }
        }
    }

    /// Load settings from localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(Some(s))) => s,
            _ => return Self::default(),
        };

        let json = match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(s)) => s,
            _ => return Self::default(),
        };

        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded scene settings from localStorage");
                settings
            }
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Save settings to localStorage.
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = match web_sys::window().map(|w| w.local_storage()) {
            Some(Ok(Some(s))) => s,
            _ => return,
        };

        let json = match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Failed to serialize scene settings: {}", e);
                return;
            }
        };

        if let Err(e) = storage.set_item(Self::STORAGE_KEY, &json) {
            log::warn!("Failed to save scene settings: {:?}", e);
        } else {
            log::info!("Saved scene settings to localStorage");
        }
    }
}
