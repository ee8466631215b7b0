use leptos::prelude::*;
use wasm_bindgen::JsCast;

use terrasync_shared::FeatureRecord;
use terrasync_shared::catalog::{self, BASEMAPS};

use crate::app::PlaybackActive;
use crate::playback;
use crate::runtime::{SequenceSignals, with_runtime};

#[derive(Clone)]
pub(crate) struct ToggleControl {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Clone)]
pub(crate) struct SequenceControl {
    pub id: &'static str,
    pub label: &'static str,
    pub entry_count: usize,
    pub signals: SequenceSignals,
}

fn input_element(e: &web_sys::Event) -> Option<web_sys::HtmlInputElement> {
    e.target()?.dyn_into::<web_sys::HtmlInputElement>().ok()
}

/// Checkboxes, playback controls, per-sequence sliders and the basemap picker.
#[component]
pub fn LayerPanel(
    toggles: Vec<ToggleControl>,
    sequences: Vec<SequenceControl>,
    default_basemap: String,
) -> impl IntoView {
    let PlaybackActive(playing) = expect_context();

    let toggle_rows = toggles
        .into_iter()
        .map(|toggle| {
            let id = toggle.id;
            let on_change = move |e: web_sys::Event| {
                if let Some(input) = input_element(&e) {
                    let checked = input.checked();
                    with_runtime(|rt| rt.set_group_visible(id, checked));
                }
            };
            view! {
                <label class="layer-row">
                    <input type="checkbox" on:change=on_change />
                    <span>{toggle.label}</span>
                </label>
            }
        })
        .collect_view();

    let sequence_rows = sequences
        .into_iter()
        .map(|seq| view! { <SequenceRow control=seq playing=playing /> })
        .collect_view();

    let on_basemap = move |e: web_sys::Event| {
        let Some(select) = e
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        else {
            return;
        };
        let basemap_id = select.value();
        with_runtime(|rt| rt.change_basemap(&basemap_id));
    };

    let basemap_options = BASEMAPS
        .iter()
        .map(|basemap| {
            let selected = basemap.id == default_basemap;
            view! {
                <option value=basemap.id selected=selected>
                    {catalog::basemap_label(basemap.id)}
                </option>
            }
        })
        .collect_view();

    view! {
        <aside class="layer-panel">
            <section>
                <h3>"Basemap"</h3>
                <select class="basemap-select" on:change=on_basemap>
                    {basemap_options}
                </select>
            </section>
            <section>
                <h3>"Layers"</h3>
                {toggle_rows}
            </section>
            <section>
                <h3>"Time series"</h3>
                <div class="playback-buttons">
                    <button prop:disabled=move || playing.get() on:click=move |_| playback::play()>
                        "Play"
                    </button>
                    <button
                        prop:disabled=move || !playing.get()
                        on:click=move |_| playback::pause()
                    >
                        "Pause"
                    </button>
                </div>
                {sequence_rows}
            </section>
        </aside>
    }
}

#[component]
fn SequenceRow(control: SequenceControl, playing: RwSignal<bool>) -> impl IntoView {
    let id = control.id;
    let SequenceSignals {
        index,
        label,
        enabled,
    } = control.signals;
    let max = control.entry_count.saturating_sub(1).to_string();

    let on_toggle = move |e: web_sys::Event| {
        if let Some(input) = input_element(&e) {
            let checked = input.checked();
            with_runtime(|rt| rt.set_sequence_enabled(id, checked));
        }
    };

    let on_slide = move |e: web_sys::Event| {
        if let Some(input) = input_element(&e)
            && let Ok(value) = input.value().parse::<usize>()
        {
            with_runtime(|rt| rt.scrub(id, value));
        }
    };

    view! {
        <div class="sequence-row">
            <label class="layer-row">
                <input type="checkbox" prop:checked=move || enabled.get() on:change=on_toggle />
                <span>{control.label}</span>
            </label>
            <input
                type="range"
                min="0"
                max=max
                step="1"
                prop:value=move || index.get().to_string()
                prop:disabled=move || playing.get()
                on:input=on_slide
            />
            <span class="sequence-label">{move || label.get()}</span>
        </div>
    }
}

/// Attribute card for the last clicked point feature.
#[component]
pub fn FeatureCard(inspected: RwSignal<Option<FeatureRecord>>) -> impl IntoView {
    move || {
        inspected.get().map(|record| {
            let title = record
                .text("Name")
                .unwrap_or_else(|| record.layer_id.clone());
            let position = record
                .anchor
                .map(|at| format!("{:.4}, {:.4}", at.latitude(), at.longitude()));
            let rows = record
                .properties
                .keys()
                .map(|key| {
                    let value = record.text(key).unwrap_or_else(|| "N/A".to_string());
                    view! {
                        <div class="feature-row">
                            <span class="feature-key">{key.clone()}</span>
                            <span>{value}</span>
                        </div>
                    }
                })
                .collect_view();
            view! {
                <div class="feature-card">
                    <button class="feature-close" on:click=move |_| inspected.set(None)>
                        "Close"
                    </button>
                    <h3>{title}</h3>
                    {position.map(|text| view! { <p class="feature-position">{text}</p> })}
                    {rows}
                </div>
            }
        })
    }
}
