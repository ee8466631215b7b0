use js_sys::Reflect;
use wasm_bindgen::JsValue;

use terrasync_shared::ViewerConfig;
use terrasync_shared::error::ConfigError;

const CONFIG_GLOBAL: &str = "TERRASYNC_CONFIG";

/// Reads `window.TERRASYNC_CONFIG`. Absent means defaults; anything that
/// fails to parse or validate is returned as an error so the caller can
/// log it once logging is up.
pub(crate) fn load() -> Result<ViewerConfig, ConfigError> {
    let Some(window) = web_sys::window() else {
        return Ok(ViewerConfig::default());
    };
    let raw = Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|e| ConfigError::Parse(format!("{e:?}")))?;
    if raw.is_undefined() || raw.is_null() {
        return Ok(ViewerConfig::default());
    }
    let config: ViewerConfig =
        serde_wasm_bindgen::from_value(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
