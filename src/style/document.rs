//! The style document the viewer renders from.
//!
//! Base styles are loaded from JSON and may contain sources and layers of
//! any type; those are kept as raw JSON so nothing is lost on the way
//! through. Declarations made by this crate are added in typed form and
//! serialized on insertion.

use super::layer::LayerSpec;
use super::sky::SkySpec;
use super::source::{SourceSpec, TerrainSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const STYLE_VERSION: u8 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDocument {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Map<String, Value>,
    #[serde(default)]
    pub layers: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<TerrainSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sky: Option<SkySpec>,
    /// Glyphs, sprite and any other top-level properties, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_version() -> u8 {
    STYLE_VERSION
}

impl Default for StyleDocument {
    fn default() -> Self {
        Self {
            version: STYLE_VERSION,
            name: None,
            sources: Map::new(),
            layers: Vec::new(),
            terrain: None,
            sky: None,
            extra: Map::new(),
        }
    }
}

impl StyleDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    /// The `type` of a registered source.
    pub fn source_type(&self, id: &str) -> Option<&str> {
        self.sources.get(id)?.get("type")?.as_str()
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layer_ids().any(|layer_id| layer_id == id)
    }

    /// Layer ids in draw order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get("id").and_then(Value::as_str))
    }

    pub fn insert_source(
        &mut self,
        id: &str,
        source: &SourceSpec,
    ) -> Result<(), serde_json::Error> {
        self.sources
            .insert(id.to_string(), serde_json::to_value(source)?);
        Ok(())
    }

    pub fn push_layer(&mut self, layer: &LayerSpec) -> Result<(), serde_json::Error> {
        self.layers.push(serde_json::to_value(layer)?);
        Ok(())
    }
}
