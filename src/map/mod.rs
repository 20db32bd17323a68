//! Map viewer, controls and scene composition.

mod composition;
mod controls;
mod options;
mod renderer;
mod viewer;

pub use composition::{
    building_filter, building_layer, building_source, compose, compose_recorded, configure_scene,
    point_cloud_overlay, standard_controls, terrain_source,
};
pub use controls::{
    AttachedControl, AttributionOptions, Control, ControlPosition, FitBoundsOptions,
    GeolocateOptions, NavigationOptions, PositionOptions, ScaleOptions, ScaleUnit,
};
pub use options::{Camera, MapOptions, PITCH_LIMIT, ZOOM_LIMIT};
pub use renderer::{MapRenderer, RecordingRenderer};
pub use viewer::{LoadHandler, MapViewer};

use crate::style::StyleError;

/// Lifecycle of a map.
///
/// ```text
/// StyleLoading --style loaded--> Ready --load handlers ok--> Configured
/// ```
///
/// There is no way back to an earlier phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapPhase {
    /// Constructed; the base style is still loading.
    StyleLoading,
    /// The style has loaded; declarations are accepted.
    Ready,
    /// Every load handler completed.
    Configured,
}

/// Errors from building or configuring a map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    InvalidOptions(String),
    /// A style-dependent declaration was made before the style loaded.
    StyleNotLoaded,
    StyleLoad(String),
    SourceNotFound(String),
    DuplicateSource(String),
    DuplicateLayer(String),
    /// Terrain must come from a `raster-dem` source.
    InvalidTerrainSource {
        source: String,
        found: String,
    },
    Style(StyleError),
    Renderer(String),
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapError::InvalidOptions(msg) => write!(f, "Invalid map options: {}", msg),
            MapError::StyleNotLoaded => write!(f, "Style is not done loading"),
            MapError::StyleLoad(msg) => write!(f, "Failed to load style: {}", msg),
            MapError::SourceNotFound(id) => write!(f, "Source \"{}\" not found", id),
            MapError::DuplicateSource(id) => write!(f, "Source \"{}\" already exists", id),
            MapError::DuplicateLayer(id) => write!(f, "Layer \"{}\" already exists", id),
            MapError::InvalidTerrainSource { source, found } => write!(
                f,
                "Terrain source \"{}\" is of type {}, expected raster-dem",
                source, found
            ),
            MapError::Style(e) => write!(f, "{}", e),
            MapError::Renderer(msg) => write!(f, "Renderer error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Style(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StyleError> for MapError {
    fn from(e: StyleError) -> Self {
        MapError::Style(e)
    }
}
