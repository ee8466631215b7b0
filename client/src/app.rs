use std::collections::HashMap;

use leptos::prelude::*;

use terrasync_shared::{Catalog, ViewerConfig};

use crate::controls::{FeatureCard, LayerPanel, SequenceControl, ToggleControl};
use crate::runtime::{self, SequenceSignals, UiSignals};

#[derive(Clone, Copy)]
pub(crate) struct PlaybackActive(pub RwSignal<bool>);

#[component]
fn MapPanel(container: String, error: RwSignal<Option<String>>) -> impl IntoView {
    view! {
        <div class="map-panel">
            <div id=container class="map"></div>
            {move || {
                error
                    .get()
                    .map(|message| {
                        view! {
                            <div class="map-error">
                                <h3>"Map Error"</h3>
                                <p>{message}</p>
                            </div>
                        }
                    })
            }}
        </div>
    }
}

/// Root component: the two map panels and the layer control panel.
#[component]
pub fn App(config: ViewerConfig) -> impl IntoView {
    let catalog = Catalog::new(&config);

    let playing: RwSignal<bool> = RwSignal::new(false);
    let primary_error: RwSignal<Option<String>> = RwSignal::new(None);
    let detail_error: RwSignal<Option<String>> = RwSignal::new(None);
    let inspected = RwSignal::new(None);

    let toggles: Vec<ToggleControl> = catalog
        .toggles()
        .iter()
        .map(|group| ToggleControl {
            id: group.id,
            label: group.label,
        })
        .collect();
    let sequences: Vec<SequenceControl> = catalog
        .sequences()
        .iter()
        .map(|seq| SequenceControl {
            id: seq.id,
            label: seq.label,
            entry_count: seq.entries.len(),
            signals: SequenceSignals {
                index: RwSignal::new(0),
                label: RwSignal::new(
                    seq.entries
                        .first()
                        .map(|entry| entry.label.clone())
                        .unwrap_or_default(),
                ),
                enabled: RwSignal::new(false),
            },
        })
        .collect();
    let ui = UiSignals {
        playing,
        primary_error,
        detail_error,
        sequences: sequences
            .iter()
            .map(|seq| (seq.id.to_string(), seq.signals))
            .collect::<HashMap<_, _>>(),
        inspected,
    };

    provide_context(PlaybackActive(playing));

    let primary_container = config.primary_container.clone();
    let detail_container = config.detail_container.clone();
    let default_basemap = config.default_basemap.clone();

    // Map containers exist once the view is mounted.
    Effect::new(move || {
        runtime::start(config.clone(), ui.clone());
        on_cleanup(|| {
            runtime::shutdown();
            runtime::remove_unload_hook();
        });
    });

    view! {
        <div class="viewer">
            <div class="map-row">
                <MapPanel container=primary_container error=primary_error />
                <MapPanel container=detail_container error=detail_error />
            </div>
            <LayerPanel toggles=toggles sequences=sequences default_basemap=default_basemap />
            <FeatureCard inspected=inspected />
        </div>
    }
}
