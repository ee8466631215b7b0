use crate::error::RegistryError;
use crate::layer::LayerSequence;
use crate::surface::LayerSink;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupState {
    /// A checkbox group: every member layer shares one flag.
    Toggle { layers: Vec<String>, visible: bool },
    /// An exclusive animated run; only the current entry shows while enabled.
    Sequence(LayerSequence),
}

impl GroupState {
    fn desired_visibility(&self, layer_id: &str) -> Option<bool> {
        match self {
            Self::Toggle { layers, visible } => layers
                .iter()
                .any(|id| id == layer_id)
                .then_some(*visible),
            Self::Sequence(seq) => seq.contains_layer(layer_id).then(|| {
                seq.is_enabled() && seq.current().is_some_and(|layer| layer.id == layer_id)
            }),
        }
    }
}

/// What should be visible, keyed by layer group id. Groups keep their
/// registration order so replays are deterministic.
#[derive(Debug, Clone, Default)]
pub struct LayerVisibilityRegistry {
    groups: Vec<(String, GroupState)>,
}

impl LayerVisibilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_toggle(
        &mut self,
        group_id: impl Into<String>,
        layers: Vec<String>,
        visible: bool,
    ) {
        self.insert(group_id.into(), GroupState::Toggle { layers, visible });
    }

    pub fn register_sequence(&mut self, sequence: LayerSequence) {
        self.insert(sequence.id().to_string(), GroupState::Sequence(sequence));
    }

    fn insert(&mut self, group_id: String, state: GroupState) {
        match self.groups.iter_mut().find(|(id, _)| *id == group_id) {
            Some(slot) => slot.1 = state,
            None => self.groups.push((group_id, state)),
        }
    }

    pub fn group(&self, group_id: &str) -> Option<&GroupState> {
        self.groups
            .iter()
            .find(|(id, _)| id == group_id)
            .map(|(_, state)| state)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupState)> {
        self.groups.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn sequence(&self, sequence_id: &str) -> Option<&LayerSequence> {
        match self.group(sequence_id)? {
            GroupState::Sequence(seq) => Some(seq),
            GroupState::Toggle { .. } => None,
        }
    }

    pub fn sequence_mut(&mut self, sequence_id: &str) -> Option<&mut LayerSequence> {
        self.groups
            .iter_mut()
            .find(|(id, _)| id == sequence_id)
            .and_then(|(_, state)| match state {
                GroupState::Sequence(seq) => Some(seq),
                GroupState::Toggle { .. } => None,
            })
    }

    /// Desired visibility of a single layer; unknown layers are hidden.
    pub fn layer_visible(&self, layer_id: &str) -> bool {
        self.groups
            .iter()
            .find_map(|(_, state)| state.desired_visibility(layer_id))
            .unwrap_or(false)
    }

    pub fn set_group_visible(
        &mut self,
        group_id: &str,
        visible: bool,
        sink: &mut impl LayerSink,
    ) -> Result<(), RegistryError> {
        let state = self
            .groups
            .iter_mut()
            .find(|(id, _)| id == group_id)
            .map(|(_, state)| state)
            .ok_or_else(|| RegistryError::UnknownGroup(group_id.to_string()))?;

        match state {
            GroupState::Toggle {
                layers,
                visible: flag,
            } => {
                *flag = visible;
                for id in layers.iter() {
                    sink.set_layer_visibility(id, visible);
                }
            }
            GroupState::Sequence(seq) => set_sequence_enabled(seq, visible, sink),
        }
        tracing::debug!(group_id, visible, "layer group toggled");
        Ok(())
    }
}

/// Off hides every entry; on shows exactly the current one.
pub(crate) fn set_sequence_enabled(
    seq: &mut LayerSequence,
    enabled: bool,
    sink: &mut impl LayerSink,
) {
    seq.set_enabled(enabled);
    let current = seq.current_index();
    for (idx, layer) in seq.layers().iter().enumerate() {
        if idx != current {
            sink.set_layer_visibility(&layer.id, false);
        }
    }
    if let Some(layer) = seq.current() {
        sink.set_layer_visibility(&layer.id, enabled);
        if enabled {
            sink.sequence_label_changed(seq.id(), &layer.label);
        }
    }
}
