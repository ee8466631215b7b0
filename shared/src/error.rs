use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
}

/// A rendering surface could not be constructed. Terminal for the adapter
/// that hit it; the host may build a fresh adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("map container #{0} not found")]
    MissingContainer(String),
    #[error("map surface failed to initialize: {0}")]
    Surface(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("layer {layer_id} rejected by surface: {reason}")]
    LayerRejected { layer_id: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown layer group '{0}'")]
    UnknownGroup(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimatorError {
    #[error("index {index} out of range for sequence '{sequence}' with {len} entries")]
    InvalidIndex {
        sequence: String,
        index: usize,
        len: usize,
    },
    #[error("unknown layer sequence '{0}'")]
    UnknownSequence(String),
    #[error("cannot scrub sequence '{0}' while the animation is running")]
    Running(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("animation period must be positive")]
    ZeroPeriod,
    #[error("click debounce of {0}ms exceeds the 150ms limit")]
    DebounceTooLong(u32),
    #[error("invalid camera in config: {0}")]
    Camera(#[from] GeoError),
    #[error("config parse error: {0}")]
    Parse(String),
}
