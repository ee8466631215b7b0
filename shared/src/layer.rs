use serde::Serialize;

/// A stable layer identifier plus the label shown next to its slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerRef {
    pub id: String,
    pub label: String,
}

impl LayerRef {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// An ordered, exclusive run of layers: one entry is visible at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSequence {
    id: String,
    layers: Vec<LayerRef>,
    current_index: usize,
    enabled: bool,
}

impl LayerSequence {
    pub fn new(id: impl Into<String>, layers: Vec<LayerRef>) -> Self {
        Self {
            id: id.into(),
            layers,
            current_index: 0,
            enabled: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[LayerRef] {
        &self.layers
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&LayerRef> {
        self.layers.get(self.current_index)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn contains_layer(&self, layer_id: &str) -> bool {
        self.layers.iter().any(|layer| layer.id == layer_id)
    }

    /// Steps to the next entry, wrapping at the end. Returns `(previous, next)`
    /// indices, or `None` for an empty sequence.
    pub fn advance(&mut self) -> Option<(usize, usize)> {
        if self.layers.is_empty() {
            return None;
        }
        let previous = self.current_index;
        self.current_index = (previous + 1) % self.layers.len();
        Some((previous, self.current_index))
    }

    /// Moves to `index`, returning the previous index, or `None` if out of range.
    pub(crate) fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.layers.len() {
            return None;
        }
        Some(std::mem::replace(&mut self.current_index, index))
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Raster,
    Line,
    Fill,
    Circle,
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerSource {
    RasterTiles {
        tiles: Vec<String>,
        tile_size: u32,
    },
    GeoJson {
        data_url: String,
    },
    VectorTiles {
        tiles: Vec<String>,
        source_layer: String,
        tms: bool,
    },
}

/// Declarative registration of one named layer on a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    /// Source id; several layers may share one (fill + outline + labels).
    pub source_id: String,
    pub source: LayerSource,
    pub kind: LayerKind,
    pub opacity: f64,
    pub visible: bool,
    /// Library-specific paint and layout properties, passed through untouched.
    pub paint: Option<serde_json::Value>,
    pub layout: Option<serde_json::Value>,
}

impl LayerSpec {
    pub fn raster(id: impl Into<String>, tiles: Vec<String>, tile_size: u32, opacity: f64) -> Self {
        let id = id.into();
        Self {
            source_id: id.clone(),
            id,
            source: LayerSource::RasterTiles { tiles, tile_size },
            kind: LayerKind::Raster,
            opacity,
            visible: false,
            paint: None,
            layout: None,
        }
    }

    pub fn geojson(
        id: impl Into<String>,
        source_id: impl Into<String>,
        data_url: impl Into<String>,
        kind: LayerKind,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            source: LayerSource::GeoJson {
                data_url: data_url.into(),
            },
            kind,
            opacity: 1.0,
            visible: false,
            paint: None,
            layout: None,
        }
    }

    pub fn vector(
        id: impl Into<String>,
        source_id: impl Into<String>,
        source: LayerSource,
        kind: LayerKind,
    ) -> Self {
        Self {
            id: id.into(),
            source_id: source_id.into(),
            source,
            kind,
            opacity: 1.0,
            visible: false,
            paint: None,
            layout: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_paint(mut self, paint: serde_json::Value) -> Self {
        self.paint = Some(paint);
        self
    }

    pub fn with_layout(mut self, layout: serde_json::Value) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn months() -> LayerSequence {
        LayerSequence::new(
            "projections",
            ["Sep", "Oct", "Nov", "Dec"]
                .iter()
                .map(|m| LayerRef::new(*m, *m))
                .collect(),
        )
    }

    #[test]
    fn advance_wraps_modulo_length() {
        let mut seq = months();
        assert_eq!(seq.advance(), Some((0, 1)));
        assert_eq!(seq.advance(), Some((1, 2)));
        assert_eq!(seq.advance(), Some((2, 3)));
        assert_eq!(seq.advance(), Some((3, 0)));
        assert_eq!(seq.current().map(|l| l.id.as_str()), Some("Sep"));
    }

    #[test]
    fn empty_sequence_never_advances() {
        let mut seq = LayerSequence::new("empty", Vec::new());
        assert_eq!(seq.advance(), None);
        assert_eq!(seq.current_index(), 0);
        assert!(seq.current().is_none());
    }

    #[test]
    fn select_rejects_out_of_range() {
        let mut seq = months();
        assert_eq!(seq.select(4), None);
        assert_eq!(seq.select(2), Some(0));
        assert_eq!(seq.current_index(), 2);
    }

    #[test]
    fn raster_spec_uses_own_id_as_source() {
        let spec = LayerSpec::raster("Oct_25", vec!["https://t/{z}".into()], 256, 0.6);
        assert_eq!(spec.source_id, "Oct_25");
        assert!(!spec.visible);
        assert_eq!(spec.kind, LayerKind::Raster);
    }
}
