use crate::error::AnimatorError;
use crate::registry::{LayerVisibilityRegistry, set_sequence_enabled};
use crate::surface::LayerSink;

pub const DEFAULT_PERIOD_MS: u32 = 1500;

/// Exists only while the animation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub period_ms: u32,
    pub ticks: u64,
}

/// Cycles a set of layer sequences on one shared tick.
///
/// The animator does not own a timer: the host calls [`Self::tick`] every
/// [`Self::period_ms`] while [`Self::is_running`] and drops its timer when
/// [`Self::pause`] or [`Self::teardown`] is called.
#[derive(Debug, Clone)]
pub struct TemporalLayerAnimator {
    sequences: Vec<String>,
    period_ms: u32,
    state: Option<AnimationState>,
}

impl TemporalLayerAnimator {
    pub fn new(sequences: Vec<String>, period_ms: u32) -> Self {
        Self {
            sequences,
            period_ms: period_ms.max(1),
            state: None,
        }
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn sequences(&self) -> &[String] {
        &self.sequences
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&AnimationState> {
        self.state.as_ref()
    }

    /// Returns `false` if already running.
    pub fn play(&mut self) -> bool {
        if self.state.is_some() {
            return false;
        }
        self.state = Some(AnimationState {
            period_ms: self.period_ms,
            ticks: 0,
        });
        tracing::debug!(period_ms = self.period_ms, "animation started");
        true
    }

    /// Returns `false` if not running. Indices and visibility stay as they are.
    pub fn pause(&mut self) -> bool {
        match self.state.take() {
            Some(state) => {
                tracing::debug!(ticks = state.ticks, "animation paused");
                true
            }
            None => false,
        }
    }

    /// Drops the animation state for good; the host releases its timer.
    pub fn teardown(&mut self) {
        if let Some(state) = self.state.take() {
            tracing::debug!(ticks = state.ticks, "animation torn down");
        }
    }

    /// Advances every enabled sequence by one entry. Returns how many moved.
    pub fn tick(
        &mut self,
        registry: &mut LayerVisibilityRegistry,
        sink: &mut impl LayerSink,
    ) -> usize {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        state.ticks += 1;

        let mut advanced = 0;
        for id in &self.sequences {
            let Some(seq) = registry.sequence_mut(id) else {
                tracing::warn!(sequence = %id, "animated sequence not registered");
                continue;
            };
            if !seq.is_enabled() {
                continue;
            }
            let Some((previous, next)) = seq.advance() else {
                continue;
            };
            let layers = seq.layers();
            if previous != next {
                sink.set_layer_visibility(&layers[previous].id, false);
                sink.set_layer_visibility(&layers[next].id, true);
            }
            sink.sequence_label_changed(seq.id(), &layers[next].label);
            advanced += 1;
        }
        advanced
    }

    /// Manual scrub. Only allowed while paused.
    pub fn set_index(
        &self,
        registry: &mut LayerVisibilityRegistry,
        sink: &mut impl LayerSink,
        sequence_id: &str,
        index: usize,
    ) -> Result<(), AnimatorError> {
        let seq = registry
            .sequence_mut(sequence_id)
            .ok_or_else(|| AnimatorError::UnknownSequence(sequence_id.to_string()))?;
        if self.is_running() {
            return Err(AnimatorError::Running(sequence_id.to_string()));
        }
        let previous = seq.select(index).ok_or_else(|| AnimatorError::InvalidIndex {
            sequence: sequence_id.to_string(),
            index,
            len: seq.len(),
        })?;
        if previous == index {
            return Ok(());
        }

        let layers = seq.layers();
        if seq.is_enabled() {
            sink.set_layer_visibility(&layers[previous].id, false);
            sink.set_layer_visibility(&layers[index].id, true);
        }
        sink.sequence_label_changed(seq.id(), &layers[index].label);
        Ok(())
    }

    pub fn set_enabled(
        &self,
        registry: &mut LayerVisibilityRegistry,
        sink: &mut impl LayerSink,
        sequence_id: &str,
        enabled: bool,
    ) -> Result<(), AnimatorError> {
        let seq = registry
            .sequence_mut(sequence_id)
            .ok_or_else(|| AnimatorError::UnknownSequence(sequence_id.to_string()))?;
        set_sequence_enabled(seq, enabled, sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerRef, LayerSequence};

    #[derive(Default)]
    struct Recorder {
        visibility: Vec<(String, bool)>,
        labels: Vec<(String, String)>,
    }

    impl LayerSink for Recorder {
        fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
            self.visibility.push((layer_id.to_string(), visible));
        }

        fn sequence_label_changed(&mut self, sequence_id: &str, label: &str) {
            self.labels.push((sequence_id.to_string(), label.to_string()));
        }
    }

    fn setup(ids: &[&str]) -> (LayerVisibilityRegistry, TemporalLayerAnimator) {
        let mut registry = LayerVisibilityRegistry::new();
        registry.register_sequence(LayerSequence::new(
            "months",
            ids.iter().map(|id| LayerRef::new(*id, *id)).collect(),
        ));
        let animator = TemporalLayerAnimator::new(vec!["months".into()], DEFAULT_PERIOD_MS);
        (registry, animator)
    }

    fn visible(registry: &LayerVisibilityRegistry, ids: &[&str]) -> Vec<String> {
        ids.iter()
            .filter(|id| registry.layer_visible(id))
            .map(|id| id.to_string())
            .collect()
    }

    const MONTHS: [&str; 4] = ["Sep", "Oct", "Nov", "Dec"];

    #[test]
    fn three_ticks_reach_december_and_fourth_wraps() {
        let (mut registry, mut animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        assert!(animator.play());

        for _ in 0..3 {
            assert_eq!(animator.tick(&mut registry, &mut sink), 1);
        }
        assert_eq!(registry.sequence("months").unwrap().current_index(), 3);
        assert_eq!(visible(&registry, &MONTHS), vec!["Dec"]);
        assert_eq!(sink.labels.last().unwrap().1, "Dec");

        animator.tick(&mut registry, &mut sink);
        assert_eq!(registry.sequence("months").unwrap().current_index(), 0);
        assert_eq!(visible(&registry, &MONTHS), vec!["Sep"]);
        assert_eq!(animator.state().unwrap().ticks, 4);
    }

    #[test]
    fn n_ticks_advance_modulo_length() {
        for start in 0..MONTHS.len() {
            for n in 0..10usize {
                let (mut registry, mut animator) = setup(&MONTHS);
                let mut sink = Recorder::default();
                animator
                    .set_index(&mut registry, &mut sink, "months", start)
                    .unwrap();
                animator
                    .set_enabled(&mut registry, &mut sink, "months", true)
                    .unwrap();
                animator.play();
                for _ in 0..n {
                    animator.tick(&mut registry, &mut sink);
                }
                let index = registry.sequence("months").unwrap().current_index();
                assert_eq!(index, (start + n) % MONTHS.len());
            }
        }
    }

    #[test]
    fn play_and_pause_are_noops_when_repeated() {
        let (_, mut animator) = setup(&MONTHS);
        assert!(!animator.pause());
        assert!(animator.play());
        assert!(!animator.play());
        assert!(animator.pause());
        assert!(!animator.pause());
    }

    #[test]
    fn paused_ticks_change_nothing() {
        let (mut registry, mut animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        animator.play();
        animator.tick(&mut registry, &mut sink);
        animator.pause();
        sink.visibility.clear();

        for _ in 0..5 {
            assert_eq!(animator.tick(&mut registry, &mut sink), 0);
        }
        assert_eq!(registry.sequence("months").unwrap().current_index(), 1);
        assert_eq!(visible(&registry, &MONTHS), vec!["Oct"]);
        assert!(sink.visibility.is_empty());
    }

    #[test]
    fn disabling_mid_animation_hides_all_and_freezes() {
        let (mut registry, mut animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        animator.play();
        animator.tick(&mut registry, &mut sink);
        animator.tick(&mut registry, &mut sink);

        sink.visibility.clear();
        animator
            .set_enabled(&mut registry, &mut sink, "months", false)
            .unwrap();
        assert_eq!(sink.visibility.len(), 4);
        assert!(sink.visibility.iter().all(|(_, v)| !v));

        sink.visibility.clear();
        assert_eq!(animator.tick(&mut registry, &mut sink), 0);
        assert!(sink.visibility.is_empty());
        assert_eq!(registry.sequence("months").unwrap().current_index(), 2);

        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        assert_eq!(visible(&registry, &MONTHS), vec!["Nov"]);
        let shown: Vec<_> = sink.visibility.iter().filter(|(_, v)| *v).collect();
        assert_eq!(shown, vec![&("Nov".to_string(), true)]);
    }

    #[test]
    fn repeated_set_index_has_no_extra_side_effects() {
        let (mut registry, animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        sink.visibility.clear();

        animator
            .set_index(&mut registry, &mut sink, "months", 2)
            .unwrap();
        let after_first = sink.visibility.clone();
        animator
            .set_index(&mut registry, &mut sink, "months", 2)
            .unwrap();
        assert_eq!(sink.visibility, after_first);
        assert_eq!(
            after_first,
            vec![("Sep".to_string(), false), ("Nov".to_string(), true)]
        );
        assert_eq!(visible(&registry, &MONTHS), vec!["Nov"]);
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let (mut registry, animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        let err = animator
            .set_index(&mut registry, &mut sink, "months", 99)
            .unwrap_err();
        assert_eq!(
            err,
            AnimatorError::InvalidIndex {
                sequence: "months".into(),
                index: 99,
                len: 4
            }
        );
        assert_eq!(registry.sequence("months").unwrap().current_index(), 0);
        assert!(sink.visibility.is_empty());
    }

    #[test]
    fn scrubbing_while_running_is_rejected() {
        let (mut registry, mut animator) = setup(&MONTHS);
        animator.play();
        let err = animator
            .set_index(&mut registry, &mut Recorder::default(), "months", 1)
            .unwrap_err();
        assert_eq!(err, AnimatorError::Running("months".into()));
    }

    #[test]
    fn scrubbing_disabled_sequence_only_moves_label() {
        let (mut registry, animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_index(&mut registry, &mut sink, "months", 3)
            .unwrap();
        assert!(sink.visibility.is_empty());
        assert_eq!(sink.labels, vec![("months".to_string(), "Dec".to_string())]);
    }

    #[test]
    fn empty_and_single_entry_sequences() {
        let (mut registry, mut animator) = setup(&[]);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        animator.play();
        assert_eq!(animator.tick(&mut registry, &mut sink), 0);
        assert!(sink.visibility.is_empty());

        let (mut registry, mut animator) = setup(&["only"]);
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        sink.visibility.clear();
        animator.play();
        assert_eq!(animator.tick(&mut registry, &mut sink), 1);
        assert!(sink.visibility.is_empty());
        assert_eq!(visible(&registry, &["only"]), vec!["only"]);
    }

    #[test]
    fn sequences_advance_independently() {
        let mut registry = LayerVisibilityRegistry::new();
        registry.register_sequence(LayerSequence::new(
            "a",
            vec![LayerRef::new("a0", "a0"), LayerRef::new("a1", "a1")],
        ));
        registry.register_sequence(LayerSequence::new(
            "b",
            (0..3).map(|i| LayerRef::new(format!("b{i}"), "b")).collect(),
        ));
        let mut animator = TemporalLayerAnimator::new(vec!["a".into(), "b".into()], 1500);
        let mut sink = Recorder::default();
        animator.set_enabled(&mut registry, &mut sink, "a", true).unwrap();
        animator.set_enabled(&mut registry, &mut sink, "b", true).unwrap();
        animator.play();
        for _ in 0..3 {
            assert_eq!(animator.tick(&mut registry, &mut sink), 2);
        }
        assert_eq!(registry.sequence("a").unwrap().current_index(), 1);
        assert_eq!(registry.sequence("b").unwrap().current_index(), 0);
    }

    #[test]
    fn teardown_drops_state_and_stops_ticks() {
        let (mut registry, mut animator) = setup(&MONTHS);
        let mut sink = Recorder::default();
        animator
            .set_enabled(&mut registry, &mut sink, "months", true)
            .unwrap();
        assert!(animator.play());
        animator.tick(&mut registry, &mut sink);

        animator.teardown();
        assert!(animator.state().is_none());
        assert!(!animator.is_running());
        let calls = sink.visibility.len();
        assert_eq!(animator.tick(&mut registry, &mut sink), 0);
        assert_eq!(animator.tick(&mut registry, &mut sink), 0);
        assert_eq!(sink.visibility.len(), calls);
        assert_eq!(visible(&registry, &MONTHS), vec!["Oct"]);
        assert!(!animator.pause());

        animator.teardown();
        assert!(animator.state().is_none());
    }
}
