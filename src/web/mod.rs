//! Browser entry point.
//!
//! Registers the `pmtiles` protocol with MapLibre, creates the map and hands
//! it to the viewer, which applies the scene once the style has loaded.

mod archive;
mod bindings;
mod renderer;

use crate::map::{compose, MapViewer};
use crate::protocol::{
    Protocol, ProtocolRegistry, TileArchive, TileData, TileRequest, PMTILES_SCHEME,
};
use crate::state::{url_hash, SceneSettings};
use archive::PmtilesArchive;
use bindings::{add_protocol, to_js, MaplibreMap};
use renderer::WebRenderer;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Exposes `registry` to MapLibre as one protocol handler per scheme.
fn register_protocols(registry: Rc<ProtocolRegistry>, schemes: &[&str]) {
    for scheme in schemes {
        let registry = registry.clone();
        let handler = Closure::<dyn FnMut(JsValue, JsValue) -> js_sys::Promise>::new(
            move |params: JsValue, _abort: JsValue| {
                let url = bindings::get_string(&params, "url").unwrap_or_default();
                let response = registry.dispatch(&TileRequest::new(url));
                wasm_bindgen_futures::future_to_promise(async move {
                    let response = response
                        .await
                        .map_err(|e| JsValue::from_str(&e.to_string()))?;
                    let data = match response.data {
                        TileData::Bytes(bytes) => {
                            js_sys::Uint8Array::from(bytes.as_slice()).into()
                        }
                        TileData::TileJson(tilejson) => to_js(&tilejson)?,
                    };
                    let result = js_sys::Object::new();
                    js_sys::Reflect::set(&result, &JsValue::from_str("data"), &data)?;
                    Ok(result.into())
                })
            },
        );
        add_protocol(scheme, &handler);
        handler.forget();
        log::info!("Registered {}:// protocol", scheme);
    }
}

/// Keeps the viewer's camera and the URL fragment in step with the map.
fn track_camera(map: &MaplibreMap, viewer: Rc<RefCell<MapViewer<WebRenderer>>>) {
    let on_move_end = Closure::<dyn FnMut(JsValue)>::new(move |_| {
        let mut viewer = viewer.borrow_mut();
        let camera = viewer.renderer().camera();
        viewer.set_camera(camera);
        if let Some(hash) = viewer.hash_fragment() {
            url_hash::replace_in_location(&hash);
        }
    });
    map.on("moveend", &on_move_end);
    on_move_end.forget();
}

/// Stores `json` as the scene settings used on the next page load.
#[wasm_bindgen(js_name = saveSceneSettings)]
pub fn save_scene_settings(json: &str) -> Result<(), JsValue> {
    let settings = SceneSettings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    settings.save();
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    if let Err(e) = tracing_log::LogTracer::init_with_filter(log::LevelFilter::Debug) {
        web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
    }

    let settings = SceneSettings::load();

    let mut protocols = ProtocolRegistry::new();
    protocols.register(
        PMTILES_SCHEME,
        Rc::new(Protocol::new(|url| {
            Rc::new(PmtilesArchive::new(url)) as Rc<dyn TileArchive>
        })),
    );
    register_protocols(Rc::new(protocols), &[PMTILES_SCHEME]);

    // The fragment is owned by the viewer, so MapLibre's own hash handling stays off.
    let mut map_options = settings.map.clone();
    let fragment = url_hash::read_from_location();
    map_options.restore_camera(fragment.as_deref());
    let js_options = to_js(&map_options)?;
    js_sys::Reflect::set(&js_options, &JsValue::from_str("hash"), &JsValue::FALSE)?;
    let map = MaplibreMap::new(&js_options);

    let viewer = compose(WebRenderer::new(map.clone()), &settings, fragment.as_deref())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let viewer = Rc::new(RefCell::new(viewer));

    let loaded = viewer.clone();
    let on_load = Closure::<dyn FnMut(JsValue)>::new(move |_| {
        if let Err(e) = loaded.borrow_mut().notify_style_loaded() {
            log::error!("Scene setup failed: {}", e);
        }
    });
    map.once("load", &on_load);
    on_load.forget();

    track_camera(&map, viewer);

    Ok(())
}
