//! Renderer seam.
//!
//! The viewer drives a renderer through this trait. In the browser the
//! renderer is the map library itself; natively a recording renderer keeps the
//! composed style document so it can be inspected.

use super::controls::{AttachedControl, Control, ControlPosition};
use super::MapError;
use crate::protocol::{scheme_of, ProtocolRegistry, TileFuture, TileRequest};
use crate::style::{LayerSpec, SkySpec, SourceSpec, StyleDocument, TerrainSpec};
use std::path::Path;
use std::rc::Rc;

/// Operations the viewer needs from a map renderer.
///
/// Callers check ordering invariants (style loaded, source exists) before
/// calling; renderers only report their own failures.
pub trait MapRenderer {
    fn add_control(&mut self, control: &Control, position: ControlPosition)
        -> Result<(), MapError>;

    /// The `type` of a registered source, if the source exists.
    fn source_type(&self, id: &str) -> Option<String>;

    fn has_layer(&self, id: &str) -> bool;

    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), MapError>;

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError>;

    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), MapError>;

    fn set_sky(&mut self, sky: &SkySpec) -> Result<(), MapError>;
}

/// Renderer that records every declaration into a style document.
pub struct RecordingRenderer {
    style: StyleDocument,
    controls: Vec<AttachedControl>,
    protocols: Rc<ProtocolRegistry>,
}

impl RecordingRenderer {
    pub fn new(protocols: Rc<ProtocolRegistry>) -> Self {
        Self {
            style: StyleDocument::default(),
            controls: Vec::new(),
            protocols,
        }
    }

    /// Replaces the current style with the document at `path`.
    pub fn load_style(&mut self, path: &Path) -> Result<(), MapError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| MapError::StyleLoad(format!("{}: {}", path.display(), e)))?;
        self.load_style_json(&json)
    }

    pub fn load_style_json(&mut self, json: &str) -> Result<(), MapError> {
        self.style =
            StyleDocument::from_json(json).map_err(|e| MapError::StyleLoad(e.to_string()))?;
        log::info!(
            "Loaded base style with {} source(s) and {} layer(s)",
            self.style.sources.len(),
            self.style.layers.len()
        );
        Ok(())
    }

    pub fn style(&self) -> &StyleDocument {
        &self.style
    }

    pub fn controls(&self) -> &[AttachedControl] {
        &self.controls
    }

    /// Fetches a custom-scheme URL the way the renderer would.
    pub fn request(&self, url: &str) -> TileFuture {
        self.protocols.dispatch(&TileRequest::new(url))
    }
}

impl MapRenderer for RecordingRenderer {
    fn add_control(
        &mut self,
        control: &Control,
        position: ControlPosition,
    ) -> Result<(), MapError> {
        self.controls.push(AttachedControl {
            position,
            control: control.clone(),
        });
        Ok(())
    }

    fn source_type(&self, id: &str) -> Option<String> {
        self.style.source_type(id).map(str::to_string)
    }

    fn has_layer(&self, id: &str) -> bool {
        self.style.has_layer(id)
    }

    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), MapError> {
        for url in source.urls() {
            match scheme_of(url) {
                Some("http") | Some("https") | None => {}
                Some(scheme) if self.protocols.is_registered(scheme) => {}
                Some(scheme) => {
                    log::warn!("Source {} uses unregistered scheme {}://", id, scheme);
                }
            }
        }
        self.style
            .insert_source(id, source)
            .map_err(|e| MapError::Renderer(e.to_string()))
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError> {
        self.style
            .push_layer(layer)
            .map_err(|e| MapError::Renderer(e.to_string()))
    }

    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), MapError> {
        self.style.terrain = Some(terrain.clone());
        Ok(())
    }

    fn set_sky(&mut self, sky: &SkySpec) -> Result<(), MapError> {
        self.style.sky = Some(sky.clone());
        Ok(())
    }
}
