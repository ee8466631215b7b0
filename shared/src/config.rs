use serde::{Deserialize, Serialize};

use crate::animator::DEFAULT_PERIOD_MS;
use crate::error::ConfigError;
use crate::geo::{CameraState, Location};
use crate::sync::{FlyPreset, MAX_DEBOUNCE_MS, SyncSettings};

pub const PRIMARY_CONTAINER: &str = "map1";
pub const DETAIL_CONTAINER: &str = "map2";
pub const DEFAULT_DETAIL_DEBOUNCE_MS: u32 = 100;
pub const DEFAULT_TERRAIN_EXAGGERATION: f64 = 1.5;
pub const DEFAULT_GEOSERVER_URL: &str = "http://172.18.1.47:8080/geoserver";
pub const DEFAULT_ROADS_GEOSERVER_URL: &str = "http://172.18.1.135:8080/geoserver";
pub const DEFAULT_GLOFAS_GEOSERVER_URL: &str = "http://172.18.7.21:8080/geoserver";
pub const DEFAULT_BOUNDARY_GEOSERVER_URL: &str = "http://172.18.1.4:8080/geoserver";
pub const DEFAULT_TEHSIL_GEOSERVER_URL: &str = "http://172.18.1.187:8080/geoserver";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
}

impl CameraConfig {
    pub fn to_camera(&self) -> Result<CameraState, ConfigError> {
        let center = Location::new(self.latitude, self.longitude)?;
        Ok(CameraState::new(center, self.zoom, self.pitch, self.bearing))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyConfig {
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub duration_ms: u32,
}

impl Default for FlyConfig {
    fn default() -> Self {
        let preset = FlyPreset::default();
        Self {
            zoom: preset.zoom,
            pitch: preset.pitch,
            bearing: preset.bearing,
            duration_ms: preset.duration_ms,
        }
    }
}

/// Viewer settings. Every field has a default, so a partial object works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub access_token: String,
    pub primary_container: String,
    pub detail_container: String,
    pub primary_camera: CameraConfig,
    pub detail_camera: CameraConfig,
    pub detail_style: String,
    pub default_basemap: String,
    pub detail_fly: FlyConfig,
    pub animation_period_ms: u32,
    pub detail_click_debounce_ms: u32,
    pub terrain_exaggeration: f64,
    pub geoserver_url: String,
    pub roads_geoserver_url: String,
    pub glofas_geoserver_url: String,
    pub boundary_geoserver_url: String,
    pub tehsil_geoserver_url: String,
    /// Base path of the bundled GeoJSON inventories.
    pub geojson_base: String,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            primary_container: PRIMARY_CONTAINER.to_string(),
            detail_container: DETAIL_CONTAINER.to_string(),
            primary_camera: CameraConfig {
                latitude: 30.3753,
                longitude: 69.3451,
                zoom: 4.5,
                pitch: 0.0,
                bearing: 0.0,
            },
            detail_camera: CameraConfig {
                latitude: 35.9078,
                longitude: 74.3441,
                zoom: 12.0,
                pitch: 60.0,
                bearing: 0.0,
            },
            detail_style: "mapbox://styles/mapbox/satellite-v9".to_string(),
            default_basemap: "satellite".to_string(),
            detail_fly: FlyConfig::default(),
            animation_period_ms: DEFAULT_PERIOD_MS,
            detail_click_debounce_ms: DEFAULT_DETAIL_DEBOUNCE_MS,
            terrain_exaggeration: DEFAULT_TERRAIN_EXAGGERATION,
            geoserver_url: DEFAULT_GEOSERVER_URL.to_string(),
            roads_geoserver_url: DEFAULT_ROADS_GEOSERVER_URL.to_string(),
            glofas_geoserver_url: DEFAULT_GLOFAS_GEOSERVER_URL.to_string(),
            boundary_geoserver_url: DEFAULT_BOUNDARY_GEOSERVER_URL.to_string(),
            tehsil_geoserver_url: DEFAULT_TEHSIL_GEOSERVER_URL.to_string(),
            geojson_base: "geojson".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.animation_period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if self.detail_click_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::DebounceTooLong(self.detail_click_debounce_ms));
        }
        self.primary_camera.to_camera()?;
        self.detail_camera.to_camera()?;
        Ok(())
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            detail_fly: FlyPreset {
                zoom: self.detail_fly.zoom,
                pitch: self.detail_fly.pitch,
                bearing: self.detail_fly.bearing,
                duration_ms: self.detail_fly.duration_ms,
            },
            primary_debounce_ms: 0,
            detail_debounce_ms: self.detail_click_debounce_ms,
        }
    }

    /// Log level name normalized to one `tracing` understands; unknown values fall back to info.
    pub fn log_level(&self) -> &'static str {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "info",
        }
    }
}
