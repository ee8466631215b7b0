use serde::Serialize;
use serde_json::{Map, Value, json};
use wasm_bindgen::{JsCast, JsValue};

use terrasync_shared::error::{InitError, SurfaceError};
use terrasync_shared::{
    CameraMove, CameraState, LayerKind, LayerSource, LayerSpec, Location, RenderSurface,
    ViewportRole,
};

use crate::mapbox::{MapboxMap, Marker, NavigationControl};

const DEM_SOURCE_ID: &str = "mapbox-dem";
const SKY_LAYER_ID: &str = "sky";

fn to_js(value: &Value) -> Result<JsValue, String> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| e.to_string())
}

fn opacity_property(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Raster => "raster-opacity",
        LayerKind::Line => "line-opacity",
        LayerKind::Fill => "fill-opacity",
        LayerKind::Circle => "circle-opacity",
        LayerKind::Symbol => "text-opacity",
    }
}

fn kind_name(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Raster => "raster",
        LayerKind::Line => "line",
        LayerKind::Fill => "fill",
        LayerKind::Circle => "circle",
        LayerKind::Symbol => "symbol",
    }
}

/// Mapbox style-spec source object.
pub(crate) fn source_json(source: &LayerSource) -> Value {
    match source {
        LayerSource::RasterTiles { tiles, tile_size } => json!({
            "type": "raster",
            "tiles": tiles,
            "tileSize": tile_size,
        }),
        LayerSource::GeoJson { data_url } => json!({
            "type": "geojson",
            "data": data_url,
        }),
        LayerSource::VectorTiles { tiles, tms, .. } => {
            let mut source = json!({ "type": "vector", "tiles": tiles });
            if *tms {
                source["scheme"] = json!("tms");
            }
            source
        }
    }
}

/// Mapbox style-spec layer object. Caller-supplied paint/layout entries win
/// over opacity; visibility always follows `spec.visible`.
pub(crate) fn layer_json(spec: &LayerSpec) -> Value {
    let mut paint = Map::new();
    paint.insert(opacity_property(spec.kind).to_string(), json!(spec.opacity));
    if let Some(Value::Object(extra)) = &spec.paint {
        paint.extend(extra.clone());
    }

    let mut layout = match &spec.layout {
        Some(Value::Object(extra)) => extra.clone(),
        _ => Map::new(),
    };
    layout.insert("visibility".into(), json!(visibility_value(spec.visible)));

    let mut layer = json!({
        "id": spec.id,
        "type": kind_name(spec.kind),
        "source": spec.source_id,
        "paint": paint,
        "layout": layout,
    });
    if let LayerSource::VectorTiles { source_layer, .. } = &spec.source {
        layer["source-layer"] = json!(source_layer);
    }
    layer
}

fn visibility_value(visible: bool) -> &'static str {
    if visible { "visible" } else { "none" }
}

pub(crate) fn camera_json(camera: &CameraState, how: CameraMove) -> Value {
    let mut options = json!({
        "center": camera.center.lng_lat(),
        "zoom": camera.zoom,
        "pitch": camera.pitch,
        "bearing": camera.bearing,
    });
    if let CameraMove::Fly { duration_ms } = how {
        options["duration"] = json!(duration_ms);
        options["essential"] = json!(true);
    }
    options
}

pub(crate) fn map_options(container: &str, style_url: &str, camera: &CameraState) -> Value {
    json!({
        "container": container,
        "style": style_url,
        "center": camera.center.lng_lat(),
        "zoom": camera.zoom,
        "pitch": camera.pitch,
        "bearing": camera.bearing,
        "antialias": true,
        "maxZoom": 18,
        "renderWorldCopies": false,
    })
}

fn dem_source_json() -> Value {
    json!({
        "type": "raster-dem",
        "url": "mapbox://mapbox.mapbox-terrain-dem-v1",
        "tileSize": 512,
        "maxzoom": 14,
    })
}

fn sky_layer_json() -> Value {
    json!({
        "id": SKY_LAYER_ID,
        "type": "sky",
        "paint": {
            "sky-type": "atmosphere",
            "sky-atmosphere-sun": [0.0, 0.0],
            "sky-atmosphere-sun-intensity": 15,
        },
    })
}

fn marker_options(role: ViewportRole) -> Value {
    match role {
        ViewportRole::Primary => json!({ "color": "#3fb1ce" }),
        ViewportRole::Detail => json!({ "color": "#ff6b6b", "scale": 1.2 }),
    }
}

/// One mapbox-gl map plus its single reusable marker.
pub(crate) struct MapboxSurface {
    map: MapboxMap,
    marker: Marker,
    marker_shown: bool,
}

impl MapboxSurface {
    pub(crate) fn create(
        role: ViewportRole,
        container: &str,
        style_url: &str,
        camera: &CameraState,
    ) -> Result<Self, InitError> {
        let present = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(container))
            .is_some();
        if !present {
            return Err(InitError::MissingContainer(container.to_string()));
        }

        let options =
            to_js(&map_options(container, style_url, camera)).map_err(InitError::Surface)?;
        let map = MapboxMap::new(&options).map_err(|e| InitError::Surface(js_message(&e)))?;
        let nav = NavigationControl::new(&JsValue::UNDEFINED);
        map.add_control(&nav, "top-left");

        let marker_opts = to_js(&marker_options(role)).map_err(InitError::Surface)?;
        Ok(Self {
            map,
            marker: Marker::new(&marker_opts),
            marker_shown: false,
        })
    }

    pub(crate) fn map(&self) -> &MapboxMap {
        &self.map
    }

    /// Where the map's camera actually is right now.
    pub(crate) fn current_camera(&self) -> Option<CameraState> {
        let center = self.map.get_center();
        let location = Location::new(center.lat(), wrap_longitude(center.lng())).ok()?;
        Some(CameraState::new(
            location,
            self.map.get_zoom(),
            self.map.get_pitch(),
            self.map.get_bearing(),
        ))
    }

    /// DEM terrain, plus the sky layer on the detail panel. Runs on every
    /// style load since a style swap drops both.
    pub(crate) fn install_terrain(&self, exaggeration: f64, with_sky: bool) -> Result<(), String> {
        if self.map.get_source(DEM_SOURCE_ID).is_falsy() {
            self.map
                .add_source(DEM_SOURCE_ID, &to_js(&dem_source_json())?)
                .map_err(|e| js_message(&e))?;
        }
        let terrain = json!({ "source": DEM_SOURCE_ID, "exaggeration": exaggeration });
        self.map.set_terrain(&to_js(&terrain)?);
        if with_sky && self.map.get_layer(SKY_LAYER_ID).is_falsy() {
            self.map
                .add_layer(&to_js(&sky_layer_json())?)
                .map_err(|e| js_message(&e))?;
        }
        Ok(())
    }
}

impl RenderSurface for MapboxSurface {
    fn register_layer(&mut self, spec: &LayerSpec) -> Result<(), SurfaceError> {
        let rejected = |reason: String| SurfaceError::LayerRejected {
            layer_id: spec.id.clone(),
            reason,
        };
        if self.map.get_source(&spec.source_id).is_falsy() {
            let source = to_js(&source_json(&spec.source)).map_err(rejected)?;
            self.map
                .add_source(&spec.source_id, &source)
                .map_err(|e| rejected(js_message(&e)))?;
        }
        let layer = to_js(&layer_json(spec)).map_err(rejected)?;
        self.map
            .add_layer(&layer)
            .map_err(|e| rejected(js_message(&e)))
    }

    fn remove_layer(&mut self, layer_id: &str) {
        if let Err(e) = self.map.remove_layer(layer_id) {
            tracing::warn!(layer_id, error = %js_message(&e), "removeLayer failed");
        }
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        !self.map.get_layer(layer_id).is_falsy()
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        let value = JsValue::from_str(visibility_value(visible));
        if let Err(e) = self.map.set_layout_property(layer_id, "visibility", &value) {
            tracing::warn!(layer_id, error = %js_message(&e), "setLayoutProperty failed");
        }
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value) {
        let result = to_js(value).and_then(|value| {
            self.map
                .set_paint_property(layer_id, property, &value)
                .map_err(|e| js_message(&e))
        });
        if let Err(error) = result {
            tracing::warn!(layer_id, property, %error, "setPaintProperty failed");
        }
    }

    fn move_camera(&mut self, camera: &CameraState, how: CameraMove) {
        let options = match to_js(&camera_json(camera, how)) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(error = %e, "camera options not serializable");
                return;
            }
        };
        match how {
            CameraMove::Jump => self.map.jump_to(&options),
            CameraMove::Fly { .. } => self.map.fly_to(&options),
        }
    }

    fn place_marker(&mut self, location: Location) {
        let lng_lat = js_sys::Array::of2(
            &JsValue::from_f64(location.longitude()),
            &JsValue::from_f64(location.latitude()),
        );
        self.marker.set_lng_lat(&lng_lat);
        if !self.marker_shown {
            self.marker.add_to(&self.map);
            self.marker_shown = true;
        }
    }

    fn clear_marker(&mut self) {
        if self.marker_shown {
            self.marker.remove_marker();
            self.marker_shown = false;
        }
    }

    fn set_style(&mut self, style_url: &str) {
        self.map.set_style(style_url);
    }

    fn destroy(&mut self) {
        self.clear_marker();
        self.map.remove();
    }
}

/// mapbox reports unwrapped longitudes once the camera pans across the antimeridian.
pub(crate) fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        lng
    } else {
        (lng + 180.0).rem_euclid(360.0) - 180.0
    }
}

pub(crate) fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
