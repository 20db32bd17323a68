//! The map viewer and its load lifecycle.

use super::controls::{Control, ControlPosition};
use super::options::{Camera, MapOptions};
use super::renderer::MapRenderer;
use super::{MapError, MapPhase};
use crate::state::url_hash;
use crate::style::{LayerSpec, SkySpec, SourceSpec, TerrainSpec};

/// Runs once when the style has finished loading.
pub type LoadHandler<R> = Box<dyn FnOnce(&mut MapViewer<R>) -> Result<(), MapError>>;

/// A map bound to a renderer.
///
/// Style-dependent declarations (sources, layers, terrain, sky) are only
/// accepted once the renderer reports the style as loaded. Controls can be
/// attached at any time.
pub struct MapViewer<R: MapRenderer> {
    renderer: R,
    options: MapOptions,
    camera: Camera,
    phase: MapPhase,
    load_handlers: Vec<LoadHandler<R>>,
}

impl<R: MapRenderer> MapViewer<R> {
    /// Creates the viewer. The style starts loading immediately.
    ///
    /// With hash support on, a valid `fragment` (`#zoom/lat/lng/...`) takes
    /// precedence over the configured camera. An invalid one is ignored.
    pub fn new(
        renderer: R,
        mut options: MapOptions,
        fragment: Option<&str>,
    ) -> Result<Self, MapError> {
        options.restore_camera(fragment);
        options.validate()?;

        log::info!(
            "Map created in #{} with style {} at {:.6},{:.6} z{}",
            options.container,
            options.style,
            options.camera.lon(),
            options.camera.lat(),
            options.camera.zoom
        );

        Ok(Self {
            renderer,
            camera: options.camera.clone(),
            options,
            phase: MapPhase::StyleLoading,
            load_handlers: Vec::new(),
        })
    }

    pub fn phase(&self) -> MapPhase {
        self.phase
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Moves the camera, keeping pitch within `max_pitch`.
    pub fn set_camera(&mut self, mut camera: Camera) {
        camera.pitch = camera.pitch.clamp(0.0, self.options.max_pitch);
        self.camera = camera;
    }

    /// The URL fragment for the current camera, when hash support is on.
    pub fn hash_fragment(&self) -> Option<String> {
        self.options.hash.then(|| url_hash::format_hash(&self.camera))
    }

    /// Registers `handler` to run once the style has loaded.
    ///
    /// If the style is already loaded the handler runs immediately.
    pub fn once_load(
        &mut self,
        handler: impl FnOnce(&mut MapViewer<R>) -> Result<(), MapError> + 'static,
    ) -> Result<(), MapError>
    where
        R: 'static,
    {
        if self.phase == MapPhase::StyleLoading {
            self.load_handlers.push(Box::new(handler));
            Ok(())
        } else {
            handler(self)
        }
    }

    /// Called by the renderer when the style has finished loading.
    ///
    /// Runs every pending load handler exactly once; later notifications are
    /// ignored. Returns the first handler error, in which case the map stays
    /// `Ready` instead of becoming `Configured`.
    pub fn notify_style_loaded(&mut self) -> Result<(), MapError> {
        if self.phase != MapPhase::StyleLoading {
            log::debug!("Ignoring repeated style load event");
            return Ok(());
        }

        self.phase = MapPhase::Ready;
        log::info!("Style loaded: {}", self.options.style);

        let handlers = std::mem::take(&mut self.load_handlers);
        let mut first_error = None;
        for handler in handlers {
            if let Err(e) = handler(self) {
                log::error!("Load handler failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                self.phase = MapPhase::Configured;
                Ok(())
            }
        }
    }

    /// Attaches a control in its default corner.
    pub fn add_control(&mut self, control: Control) -> Result<(), MapError> {
        let position = control.default_position();
        self.add_control_at(control, position)
    }

    pub fn add_control_at(
        &mut self,
        control: Control,
        position: ControlPosition,
    ) -> Result<(), MapError> {
        if let Control::Overlay(overlay) = &control {
            overlay.validate()?;
        }
        self.renderer.add_control(&control, position)?;
        log::info!("Added {} control at {}", control.name(), position.as_str());
        Ok(())
    }

    pub fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), MapError> {
        self.ensure_style_loaded()?;
        if self.renderer.source_type(id).is_some() {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        source.validate()?;

        self.renderer.add_source(id, source)?;
        log::info!("Added {} source {}", source.type_name(), id);
        Ok(())
    }

    pub fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError> {
        self.ensure_style_loaded()?;
        if self.renderer.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id.clone()));
        }
        if self.renderer.source_type(&layer.source).is_none() {
            return Err(MapError::SourceNotFound(layer.source.clone()));
        }
        layer.validate()?;

        self.renderer.add_layer(layer)?;
        log::info!("Added layer {} on source {}", layer.id, layer.source);
        Ok(())
    }

    pub fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), MapError> {
        self.ensure_style_loaded()?;
        match self.renderer.source_type(&terrain.source) {
            None => return Err(MapError::SourceNotFound(terrain.source.clone())),
            Some(kind) if kind != "raster-dem" => {
                return Err(MapError::InvalidTerrainSource {
                    source: terrain.source.clone(),
                    found: kind,
                })
            }
            Some(_) => {}
        }
        terrain.validate()?;

        self.renderer.set_terrain(terrain)?;
        log::info!(
            "Terrain set to {} (exaggeration {})",
            terrain.source,
            terrain.exaggeration
        );
        Ok(())
    }

    pub fn set_sky(&mut self, sky: &SkySpec) -> Result<(), MapError> {
        self.ensure_style_loaded()?;
        sky.validate()?;
        self.renderer.set_sky(sky)?;
        log::info!("Sky applied");
        Ok(())
    }

    fn ensure_style_loaded(&self) -> Result<(), MapError> {
        match self.phase {
            MapPhase::StyleLoading => Err(MapError::StyleNotLoaded),
            MapPhase::Ready | MapPhase::Configured => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::RecordingRenderer;
    use crate::protocol::ProtocolRegistry;
    use crate::style::{RasterDemSource, VectorSource};
    use std::cell::Cell;
    use std::rc::Rc;

    fn viewer() -> MapViewer<RecordingRenderer> {
        let renderer = RecordingRenderer::new(Rc::new(ProtocolRegistry::new()));
        MapViewer::new(renderer, MapOptions::default(), None).unwrap()
    }

    fn vector(url: &str) -> SourceSpec {
        SourceSpec::Vector(VectorSource {
            url: url.into(),
            minzoom: 14,
            maxzoom: 16,
            attribution: None,
        })
    }

    fn dem() -> SourceSpec {
        SourceSpec::RasterDem(RasterDemSource {
            tiles: vec!["https://example.com/{z}/{x}/{y}.png".into()],
            tile_size: 256,
            minzoom: 1,
            maxzoom: 18,
            encoding: Default::default(),
            attribution: None,
        })
    }

    #[test]
    fn test_declarations_rejected_before_style_load() {
        let mut map = viewer();
        assert_eq!(map.phase(), MapPhase::StyleLoading);

        let err = map
            .add_source("building", &vector("pmtiles://https://h/a.pmtiles"))
            .unwrap_err();
        assert_eq!(err, MapError::StyleNotLoaded);
        assert!(map.renderer().style().sources.is_empty());

        let sky_err = map
            .set_terrain(&TerrainSpec {
                source: "dem".into(),
                exaggeration: 1.0,
            })
            .unwrap_err();
        assert_eq!(sky_err, MapError::StyleNotLoaded);
        assert!(map.renderer().style().terrain.is_none());
    }

    #[test]
    fn test_load_handlers_run_exactly_once() {
        let mut map = viewer();
        let runs = Rc::new(Cell::new(0));

        let counter = runs.clone();
        map.once_load(move |map| {
            counter.set(counter.get() + 1);
            assert_eq!(map.phase(), MapPhase::Ready);
            map.add_source("dem", &dem())
        })
        .unwrap();
        assert_eq!(runs.get(), 0);

        map.notify_style_loaded().unwrap();
        map.notify_style_loaded().unwrap();

        assert_eq!(runs.get(), 1);
        assert_eq!(map.phase(), MapPhase::Configured);
        assert_eq!(map.renderer().style().sources.len(), 1);
    }

    #[test]
    fn test_handler_registered_after_load_runs_immediately() {
        let mut map = viewer();
        map.notify_style_loaded().unwrap();

        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        map.once_load(move |_| {
            flag.set(true);
            Ok(())
        })
        .unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_failed_handler_leaves_map_ready() {
        let mut map = viewer();
        map.once_load(|map| {
            map.set_terrain(&TerrainSpec {
                source: "missing".into(),
                exaggeration: 1.0,
            })
        })
        .unwrap();

        let err = map.notify_style_loaded().unwrap_err();
        assert_eq!(err, MapError::SourceNotFound("missing".into()));
        assert_eq!(map.phase(), MapPhase::Ready);
    }

    #[test]
    fn test_source_and_layer_ordering() {
        let mut map = viewer();
        map.notify_style_loaded().unwrap();

        let layer: LayerSpec = serde_json::from_value(serde_json::json!({
            "id": "bldg",
            "type": "fill-extrusion",
            "source": "building",
            "paint": {
                "fill-extrusion-color": "#FFFFFF",
                "fill-extrusion-opacity": 1,
                "fill-extrusion-height": ["get", "measuredHeight"]
            }
        }))
        .unwrap();

        assert_eq!(
            map.add_layer(&layer).unwrap_err(),
            MapError::SourceNotFound("building".into())
        );

        map.add_source("building", &vector("pmtiles://https://h/a.pmtiles"))
            .unwrap();
        assert_eq!(
            map.add_source("building", &vector("pmtiles://https://h/b.pmtiles"))
                .unwrap_err(),
            MapError::DuplicateSource("building".into())
        );

        map.add_layer(&layer).unwrap();
        assert_eq!(
            map.add_layer(&layer).unwrap_err(),
            MapError::DuplicateLayer("bldg".into())
        );
    }

    #[test]
    fn test_terrain_requires_dem_source() {
        let mut map = viewer();
        map.notify_style_loaded().unwrap();
        map.add_source("building", &vector("pmtiles://https://h/a.pmtiles"))
            .unwrap();

        let err = map
            .set_terrain(&TerrainSpec {
                source: "building".into(),
                exaggeration: 1.0,
            })
            .unwrap_err();
        assert_eq!(
            err,
            MapError::InvalidTerrainSource {
                source: "building".into(),
                found: "vector".into()
            }
        );
    }

    #[test]
    fn test_hash_fragment_overrides_camera() {
        let renderer = RecordingRenderer::new(Rc::new(ProtocolRegistry::new()));
        let fragment = Some("#12/35.6/139.7/10/45");
        let map = MapViewer::new(renderer, MapOptions::default(), fragment).unwrap();
        assert_eq!(map.camera().zoom, 12.0);
        assert_eq!(map.camera().bearing, 10.0);
        assert_eq!(map.camera().pitch, 45.0);
        assert_eq!(map.hash_fragment().as_deref(), Some("#12/35.6/139.7/10/45"));

        let renderer = RecordingRenderer::new(Rc::new(ProtocolRegistry::new()));
        let options = MapOptions {
            hash: false,
            ..MapOptions::default()
        };
        let map = MapViewer::new(renderer, options, Some("#12/35.6/139.7")).unwrap();
        assert_eq!(map.camera().zoom, 16.23);
        assert_eq!(map.hash_fragment(), None);
    }

    #[test]
    fn test_out_of_range_fragment_is_ignored() {
        let renderer = RecordingRenderer::new(Rc::new(ProtocolRegistry::new()));
        let map = MapViewer::new(renderer, MapOptions::default(), Some("#30/35.6/139.7")).unwrap();
        assert_eq!(map.camera().zoom, 16.23);
        assert_eq!(map.phase(), MapPhase::StyleLoading);
    }
}
