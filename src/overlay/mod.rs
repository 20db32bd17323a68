//! Composite 3D overlay hosted as a single map control.

mod tile3d;

pub use tile3d::{ElevationOffset, Tile3dLayer, TileContent, TileLoadHook};

use crate::style::StyleError;
use serde::Serialize;

/// An overlay control drawing its own layers into the map.
#[derive(Debug, Clone, Serialize)]
pub struct OverlaySpec {
    /// Draw into the map's depth buffer instead of on top of it.
    pub interleaved: bool,
    pub layers: Vec<Tile3dLayer>,
}

impl OverlaySpec {
    pub fn interleaved(layers: Vec<Tile3dLayer>) -> Self {
        Self {
            interleaved: true,
            layers,
        }
    }

    pub fn layer(&self, id: &str) -> Option<&Tile3dLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn validate(&self) -> Result<(), StyleError> {
        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate()?;
            if self.layers[..i].iter().any(|other| other.id == layer.id) {
                return Err(StyleError::invalid(
                    "id",
                    format!("overlay layer {} is declared twice", layer.id),
                ));
            }
        }
        Ok(())
    }
}
