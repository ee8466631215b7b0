use serde_json::Value;

pub const BLINK_PERIOD_MS: u32 = 500;

const DARK_PHASE: &str = "transparent";

/// Two-phase line color toggle for an outline layer.
///
/// The phase flips on every tick whether or not the layer is shown, so a
/// group switched on mid-cycle picks up wherever the clock is.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderBlink {
    layer_id: String,
    lit_color: String,
    lit: bool,
}

impl BorderBlink {
    pub fn new(layer_id: impl Into<String>, lit_color: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            lit_color: lit_color.into(),
            lit: true,
        }
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn property(&self) -> &'static str {
        "line-color"
    }

    /// Advances one phase. Returns the color to paint, or `None` while the
    /// layer is hidden.
    pub fn tick(&mut self, visible: bool) -> Option<Value> {
        let color = if self.lit {
            self.lit_color.as_str()
        } else {
            DARK_PHASE
        };
        let paint = visible.then(|| Value::from(color));
        self.lit = !self.lit;
        paint
    }
}
