//! MapLibre-backed renderer.

use super::bindings::{construct, get_f64, get_string, to_js, MaplibreMap};
use crate::map::{Camera, Control, ControlPosition, MapError, MapRenderer};
use crate::overlay::{OverlaySpec, Tile3dLayer, TileContent};
use crate::style::{LayerSpec, SkySpec, SourceSpec, TerrainSpec};
use glam::DVec3;
use wasm_bindgen::prelude::*;

fn js_error(e: JsValue) -> MapError {
    MapError::Renderer(format!("{:?}", e))
}

pub struct WebRenderer {
    map: MaplibreMap,
}

impl WebRenderer {
    pub fn new(map: MaplibreMap) -> Self {
        Self { map }
    }

    pub fn camera(&self) -> Camera {
        let center = self.map.get_center();
        let mut camera = Camera::new(center.lng(), center.lat(), self.map.get_zoom());
        camera.pitch = self.map.get_pitch();
        camera.bearing = self.map.get_bearing();
        camera
    }
}

/// Builds a deck.gl `Tile3DLayer` whose tile-load callback runs the layer's hook.
fn tile3d_layer(layer: &Tile3dLayer) -> Result<JsValue, JsValue> {
    let props = to_js(layer)?;

    let hook_layer = layer.clone();
    let on_tile_load = Closure::<dyn FnMut(JsValue)>::new(move |tile: JsValue| {
        let Ok(content) = js_sys::Reflect::get(&tile, &JsValue::from_str("content")) else {
            return;
        };
        let Ok(origin) = js_sys::Reflect::get(&content, &JsValue::from_str("cartographicOrigin"))
        else {
            return;
        };
        let (Some(x), Some(y), Some(z)) = (
            get_f64(&origin, "x"),
            get_f64(&origin, "y"),
            get_f64(&origin, "z"),
        ) else {
            log::debug!("Tile without a cartographic origin, skipping hook");
            return;
        };

        let mut content = TileContent {
            id: get_string(&tile, "id").unwrap_or_default(),
            cartographic_origin: DVec3::new(x, y, z),
        };
        hook_layer.load_tile(&mut content);

        if let Err(e) = js_sys::Reflect::set(
            &origin,
            &JsValue::from_str("z"),
            &JsValue::from_f64(content.cartographic_origin.z),
        ) {
            log::warn!("Failed to update tile origin: {:?}", e);
        }
    });
    js_sys::Reflect::set(&props, &JsValue::from_str("onTileLoad"), on_tile_load.as_ref())?;
    on_tile_load.forget();

    construct("deck", "Tile3DLayer", &props)
}

fn overlay_control(overlay: &OverlaySpec) -> Result<JsValue, JsValue> {
    let layers = js_sys::Array::new();
    for layer in &overlay.layers {
        layers.push(&tile3d_layer(layer)?);
    }

    let props = js_sys::Object::new();
    js_sys::Reflect::set(
        &props,
        &JsValue::from_str("interleaved"),
        &JsValue::from_bool(overlay.interleaved),
    )?;
    js_sys::Reflect::set(&props, &JsValue::from_str("layers"), &layers)?;

    construct("deck", "MapboxOverlay", &props)
}

fn control_object(control: &Control) -> Result<JsValue, JsValue> {
    match control {
        Control::Navigation(options) => {
            construct("maplibregl", "NavigationControl", &to_js(options)?)
        }
        Control::Fullscreen => {
            construct("maplibregl", "FullscreenControl", &js_sys::Object::new())
        }
        Control::Geolocate(options) => {
            construct("maplibregl", "GeolocateControl", &to_js(options)?)
        }
        Control::Scale(options) => construct("maplibregl", "ScaleControl", &to_js(options)?),
        Control::Attribution(options) => {
            construct("maplibregl", "AttributionControl", &to_js(options)?)
        }
        Control::Overlay(overlay) => overlay_control(overlay),
    }
}

impl MapRenderer for WebRenderer {
    fn add_control(
        &mut self,
        control: &Control,
        position: ControlPosition,
    ) -> Result<(), MapError> {
        let object = control_object(control).map_err(js_error)?;
        self.map.add_control(&object, position.as_str());
        Ok(())
    }

    fn source_type(&self, id: &str) -> Option<String> {
        let source = self.map.get_source(id);
        if source.is_undefined() || source.is_null() {
            return None;
        }
        get_string(&source, "type")
    }

    fn has_layer(&self, id: &str) -> bool {
        let layer = self.map.get_layer(id);
        !(layer.is_undefined() || layer.is_null())
    }

    fn add_source(&mut self, id: &str, source: &SourceSpec) -> Result<(), MapError> {
        let spec = to_js(source).map_err(js_error)?;
        self.map.add_source(id, &spec).map_err(js_error)
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError> {
        let spec = to_js(layer).map_err(js_error)?;
        self.map.add_layer(&spec).map_err(js_error)
    }

    fn set_terrain(&mut self, terrain: &TerrainSpec) -> Result<(), MapError> {
        let spec = to_js(terrain).map_err(js_error)?;
        self.map.set_terrain(&spec).map_err(js_error)
    }

    fn set_sky(&mut self, sky: &SkySpec) -> Result<(), MapError> {
        let spec = to_js(sky).map_err(js_error)?;
        self.map.set_sky(&spec).map_err(js_error)
    }
}
