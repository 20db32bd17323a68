//! JavaScript bindings for MapLibre GL, PMTiles and deck.gl.
//!
//! The libraries are loaded as globals by `index.html`.

use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    #[derive(Clone)]
    pub type MaplibreMap;

    #[wasm_bindgen(constructor, js_namespace = maplibregl, js_class = "Map")]
    pub fn new(options: &JsValue) -> MaplibreMap;

    #[wasm_bindgen(method, js_name = addControl)]
    pub fn add_control(this: &MaplibreMap, control: &JsValue, position: &str);

    #[wasm_bindgen(method, js_name = getSource)]
    pub fn get_source(this: &MaplibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = getLayer)]
    pub fn get_layer(this: &MaplibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    pub fn add_source(this: &MaplibreMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    pub fn add_layer(this: &MaplibreMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setTerrain)]
    pub fn set_terrain(this: &MaplibreMap, terrain: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setSky)]
    pub fn set_sky(this: &MaplibreMap, sky: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    pub fn once(this: &MaplibreMap, event: &str, listener: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(method)]
    pub fn on(this: &MaplibreMap, event: &str, listener: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(method, js_name = getCenter)]
    pub fn get_center(this: &MaplibreMap) -> LngLat;

    #[wasm_bindgen(method, js_name = getZoom)]
    pub fn get_zoom(this: &MaplibreMap) -> f64;

    #[wasm_bindgen(method, js_name = getPitch)]
    pub fn get_pitch(this: &MaplibreMap) -> f64;

    #[wasm_bindgen(method, js_name = getBearing)]
    pub fn get_bearing(this: &MaplibreMap) -> f64;

    pub type LngLat;

    #[wasm_bindgen(method, getter)]
    pub fn lng(this: &LngLat) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn lat(this: &LngLat) -> f64;

    #[wasm_bindgen(js_namespace = maplibregl, js_name = addProtocol)]
    pub fn add_protocol(
        scheme: &str,
        handler: &Closure<dyn FnMut(JsValue, JsValue) -> js_sys::Promise>,
    );

    #[wasm_bindgen(js_namespace = pmtiles, js_name = PMTiles)]
    pub type PmTiles;

    #[wasm_bindgen(constructor, js_namespace = pmtiles, js_class = "PMTiles")]
    pub fn new(source: &str) -> PmTiles;

    #[wasm_bindgen(method, js_name = getZxy)]
    pub fn get_zxy(this: &PmTiles, z: u8, x: u32, y: u32) -> js_sys::Promise;

    #[wasm_bindgen(method, js_name = getHeader)]
    pub fn get_header(this: &PmTiles) -> js_sys::Promise;

    #[wasm_bindgen(method, js_name = getMetadata)]
    pub fn get_metadata(this: &PmTiles) -> js_sys::Promise;
}

/// Converts `value` into a plain JS object, with maps as objects.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

/// Calls `new globalThis[namespace][class](options)`.
pub fn construct(namespace: &str, class: &str, options: &JsValue) -> Result<JsValue, JsValue> {
    let ns = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str(namespace))?;
    let ctor: js_sys::Function =
        wasm_bindgen::JsCast::dyn_into(js_sys::Reflect::get(&ns, &JsValue::from_str(class))?)?;
    js_sys::Reflect::construct(&ctor, &js_sys::Array::of1(options))
}

/// Reads a numeric property, `None` when missing or not a number.
pub fn get_f64(target: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

pub fn get_string(target: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}
