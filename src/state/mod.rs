//! Persistent application state.
//!
//! Scene settings and the camera fragment in the page URL. Both survive a
//! reload: settings through a JSON file or localStorage, the camera through
//! the URL hash.

mod settings;
pub mod url_hash;

pub use settings::{
    BuildingSettings, ControlSettings, PointCloudSettings, SceneSettings, SettingsError,
    TerrainSettings,
};
