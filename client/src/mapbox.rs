//! Hand-written bindings for the subset of mapbox-gl-js the viewer calls.
//! The library itself is loaded by a `<script>` tag as the `mapboxgl` global.

use js_sys::{Function, Reflect};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    #[derive(Debug, Clone)]
    pub type MapboxMap;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Map", catch)]
    pub fn new(options: &JsValue) -> Result<MapboxMap, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &MapboxMap, event: &str, handler: &Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &MapboxMap, event: &str, handler: &Function);

    /// Layer-scoped `map.on(event, layerId, handler)`.
    #[wasm_bindgen(method, js_name = on)]
    pub fn on_layer(this: &MapboxMap, event: &str, layer_id: &str, handler: &Function);

    #[wasm_bindgen(method, js_name = off)]
    pub fn off_layer(this: &MapboxMap, event: &str, layer_id: &str, handler: &Function);

    #[wasm_bindgen(method, js_name = addControl)]
    pub fn add_control(this: &MapboxMap, control: &JsValue, position: &str);

    #[wasm_bindgen(method, js_name = addSource, catch)]
    pub fn add_source(this: &MapboxMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    pub fn get_source(this: &MapboxMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = addLayer, catch)]
    pub fn add_layer(this: &MapboxMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getLayer)]
    pub fn get_layer(this: &MapboxMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = removeLayer, catch)]
    pub fn remove_layer(this: &MapboxMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = setLayoutProperty, catch)]
    pub fn set_layout_property(
        this: &MapboxMap,
        layer_id: &str,
        name: &str,
        value: &JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = setPaintProperty, catch)]
    pub fn set_paint_property(
        this: &MapboxMap,
        layer_id: &str,
        name: &str,
        value: &JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = setTerrain)]
    pub fn set_terrain(this: &MapboxMap, terrain: &JsValue);

    #[wasm_bindgen(method, js_name = flyTo)]
    pub fn fly_to(this: &MapboxMap, options: &JsValue);

    #[wasm_bindgen(method, js_name = jumpTo)]
    pub fn jump_to(this: &MapboxMap, options: &JsValue);

    #[wasm_bindgen(method, js_name = setStyle)]
    pub fn set_style(this: &MapboxMap, style: &str);

    #[wasm_bindgen(method, js_name = getCenter)]
    pub fn get_center(this: &MapboxMap) -> LngLat;

    #[wasm_bindgen(method, js_name = getZoom)]
    pub fn get_zoom(this: &MapboxMap) -> f64;

    #[wasm_bindgen(method, js_name = getPitch)]
    pub fn get_pitch(this: &MapboxMap) -> f64;

    #[wasm_bindgen(method, js_name = getBearing)]
    pub fn get_bearing(this: &MapboxMap) -> f64;

    #[wasm_bindgen(method)]
    pub fn remove(this: &MapboxMap);

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Marker)]
    #[derive(Debug, Clone)]
    pub type Marker;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Marker")]
    pub fn new(options: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    pub fn set_lng_lat(this: &Marker, lng_lat: &JsValue) -> Marker;

    #[wasm_bindgen(method, js_name = addTo)]
    pub fn add_to(this: &Marker, map: &MapboxMap) -> Marker;

    #[wasm_bindgen(method, js_name = remove)]
    pub fn remove_marker(this: &Marker);

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = NavigationControl)]
    pub type NavigationControl;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "NavigationControl")]
    pub fn new(options: &JsValue) -> NavigationControl;

    pub type LngLat;

    #[wasm_bindgen(method, getter)]
    pub fn lng(this: &LngLat) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn lat(this: &LngLat) -> f64;

    /// `click` payload.
    pub type MapMouseEvent;

    #[wasm_bindgen(method, getter, js_name = lngLat)]
    pub fn lng_lat(this: &MapMouseEvent) -> LngLat;

    /// Rendered features under the pointer; only set on layer-scoped events.
    #[wasm_bindgen(method, getter)]
    pub fn features(this: &MapMouseEvent) -> JsValue;
}

/// Sets `mapboxgl.accessToken`. Fails if the library script is missing.
pub fn set_access_token(token: &str) -> Result<(), String> {
    let global = js_sys::global();
    let namespace = Reflect::get(&global, &JsValue::from_str("mapboxgl"))
        .map_err(|e| format!("reading mapboxgl: {e:?}"))?;
    if namespace.is_undefined() {
        return Err("mapbox-gl script not loaded".into());
    }
    Reflect::set(
        &namespace,
        &JsValue::from_str("accessToken"),
        &JsValue::from_str(token),
    )
    .map_err(|e| format!("setting access token: {e:?}"))?;
    Ok(())
}

/// Message carried by an `error` event (`event.error.message`).
pub fn error_event_message(event: &JsValue) -> String {
    Reflect::get(event, &JsValue::from_str("error"))
        .and_then(|error| Reflect::get(&error, &JsValue::from_str("message")))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| "unknown map error".to_string())
}

/// First feature of a layer-scoped event as plain GeoJSON. mapbox feature
/// objects keep geometry behind getters, so this goes through their `toJSON`.
pub fn first_feature(event: &MapMouseEvent) -> Result<serde_json::Value, String> {
    let features = event.features();
    let first =
        Reflect::get_u32(&features, 0).map_err(|e| format!("reading features: {e:?}"))?;
    if first.is_undefined() {
        return Err("event carries no features".into());
    }
    let text =
        js_sys::JSON::stringify(&first).map_err(|e| format!("stringify feature: {e:?}"))?;
    serde_json::from_str(&String::from(text)).map_err(|e| e.to_string())
}
