use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::{Interval, Timeout};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use terrasync_shared::blink::BLINK_PERIOD_MS;
use terrasync_shared::catalog::{self, Catalog};
use terrasync_shared::error::InitError;
use terrasync_shared::sync::PickDisposition;
use terrasync_shared::{
    BorderBlink, FeatureRecord, LayerSink, LayerVisibilityRegistry, Location, PickEvent,
    SyncCoordinator, TemporalLayerAnimator, ViewerConfig, ViewportAdapter, ViewportRole,
};

use crate::mapbox::{self, MapMouseEvent, MapboxMap};
use crate::playback;
use crate::surface::{MapboxSurface, wrap_longitude};

/// Reactive state one animated sequence exposes to the control panel.
#[derive(Clone, Copy)]
pub(crate) struct SequenceSignals {
    pub index: RwSignal<usize>,
    pub label: RwSignal<String>,
    pub enabled: RwSignal<bool>,
}

#[derive(Clone)]
pub(crate) struct UiSignals {
    pub playing: RwSignal<bool>,
    pub primary_error: RwSignal<Option<String>>,
    pub detail_error: RwSignal<Option<String>>,
    pub sequences: HashMap<String, SequenceSignals>,
    /// The clicked feature whose attribute card is open.
    pub inspected: RwSignal<Option<FeatureRecord>>,
}

impl UiSignals {
    fn error_signal(&self, role: ViewportRole) -> RwSignal<Option<String>> {
        match role {
            ViewportRole::Primary => self.primary_error,
            ViewportRole::Detail => self.detail_error,
        }
    }
}

type Viewport = ViewportAdapter<MapboxSurface>;

/// Routes registry and animator output into the primary map and the panel labels.
struct PanelSink<'a> {
    viewport: &'a mut Viewport,
    sequences: &'a HashMap<String, SequenceSignals>,
}

impl LayerSink for PanelSink<'_> {
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        self.viewport.set_layer_visibility(layer_id, visible);
    }

    fn sequence_label_changed(&mut self, sequence_id: &str, label: &str) {
        if let Some(signals) = self.sequences.get(sequence_id) {
            signals.label.set(label.to_string());
        }
    }
}

struct MapListener {
    map: MapboxMap,
    event: &'static str,
    layer: Option<&'static str>,
    handler: Closure<dyn Fn(JsValue)>,
}

impl MapListener {
    fn attach(
        map: &MapboxMap,
        event: &'static str,
        layer: Option<&'static str>,
        handler: Closure<dyn Fn(JsValue)>,
    ) -> Self {
        let callback = handler.as_ref().unchecked_ref();
        match layer {
            Some(layer_id) => map.on_layer(event, layer_id, callback),
            None => map.on(event, callback),
        }
        Self {
            map: map.clone(),
            event,
            layer,
            handler,
        }
    }

    fn detach(&self) {
        let callback = self.handler.as_ref().unchecked_ref();
        match self.layer {
            Some(layer_id) => self.map.off_layer(self.event, layer_id, callback),
            None => self.map.off(self.event, callback),
        }
    }
}

pub(crate) struct ViewerRuntime {
    config: ViewerConfig,
    catalog: Catalog,
    registry: RefCell<LayerVisibilityRegistry>,
    animator: RefCell<TemporalLayerAnimator>,
    sync: SyncCoordinator<MapboxSurface>,
    ui: UiSignals,
    listeners: RefCell<Vec<MapListener>>,
    flush_timeout: RefCell<Option<Timeout>>,
    blink: RefCell<BorderBlink>,
    blink_interval: RefCell<Option<Interval>>,
}

struct UnloadBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn()>,
}

thread_local! {
    static RUNTIME: RefCell<Option<Rc<ViewerRuntime>>> = const { RefCell::new(None) };
    static UNLOAD_BINDING: RefCell<Option<UnloadBinding>> = const { RefCell::new(None) };
}

/// Runs `f` against the live runtime, if any. The thread-local is not
/// borrowed while `f` runs, so handlers may call back in.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&ViewerRuntime) -> R) -> Option<R> {
    let runtime = RUNTIME.with(|slot| slot.borrow().clone())?;
    Some(f(&runtime))
}

/// Creates both maps and wires their events. Replaces a runtime left over
/// from an earlier mount.
pub(crate) fn start(config: ViewerConfig, ui: UiSignals) {
    shutdown();

    if let Err(e) = mapbox::set_access_token(&config.access_token) {
        tracing::error!(error = %e, "mapbox-gl unavailable");
    }

    let basemap = catalog::basemap_url(&config.default_basemap).unwrap_or_else(|| {
        tracing::warn!(basemap = %config.default_basemap, "unknown basemap, using satellite");
        catalog::DEFAULT_BASEMAP_URL
    });
    let primary_camera = config.primary_camera.to_camera();
    let detail_camera = config.detail_camera.to_camera();
    let (Ok(primary_camera), Ok(detail_camera)) = (primary_camera, detail_camera) else {
        tracing::error!("camera configuration invalid");
        return;
    };

    let mut listeners = Vec::new();
    let primary_surface = MapboxSurface::create(
        ViewportRole::Primary,
        &config.primary_container,
        basemap,
        &primary_camera,
    );
    let detail_surface = MapboxSurface::create(
        ViewportRole::Detail,
        &config.detail_container,
        &config.detail_style,
        &detail_camera,
    );
    for (role, surface) in [
        (ViewportRole::Primary, &primary_surface),
        (ViewportRole::Detail, &detail_surface),
    ] {
        if let Ok(surface) = surface {
            listeners.extend(bind_map_events(role, surface.map()));
            if role == ViewportRole::Primary {
                listeners.extend(bind_feature_clicks(surface.map()));
            }
        }
    }

    let primary = Rc::new(RefCell::new(ViewportAdapter::new(
        ViewportRole::Primary,
        primary_surface,
        primary_camera,
    )));
    let detail = Rc::new(RefCell::new(ViewportAdapter::new(
        ViewportRole::Detail,
        detail_surface,
        detail_camera,
    )));
    ui.primary_error.set(primary.borrow().error_message());
    ui.detail_error.set(detail.borrow().error_message());

    let catalog = Catalog::new(&config);
    let mut registry = LayerVisibilityRegistry::new();
    catalog.populate(&mut registry);
    {
        let mut primary = primary.borrow_mut();
        for spec in catalog.layer_specs(&registry) {
            primary.register_layer(spec);
        }
    }

    let animator = TemporalLayerAnimator::new(catalog.sequence_ids(), config.animation_period_ms);
    let sync = SyncCoordinator::new(primary, detail, config.sync_settings());

    let runtime = Rc::new(ViewerRuntime {
        config,
        catalog,
        registry: RefCell::new(registry),
        animator: RefCell::new(animator),
        sync,
        ui,
        listeners: RefCell::new(listeners),
        flush_timeout: RefCell::new(None),
        blink: RefCell::new(BorderBlink::new(
            catalog::HOTSPOT_BORDERS,
            catalog::HOTSPOT_BORDER_COLOR,
        )),
        blink_interval: RefCell::new(None),
    });
    *runtime.blink_interval.borrow_mut() = Some(Interval::new(BLINK_PERIOD_MS, || {
        with_runtime(|rt| rt.blink_tick());
    }));
    RUNTIME.with(|slot| *slot.borrow_mut() = Some(runtime));
    install_unload_hook();
    tracing::info!("viewer started");
}

/// Tears the runtime down. Safe to call repeatedly.
pub(crate) fn shutdown() {
    let runtime = RUNTIME.with(|slot| slot.borrow_mut().take());
    if let Some(runtime) = runtime {
        runtime.teardown();
    }
}

fn install_unload_hook() {
    let Some(window) = web_sys::window() else {
        return;
    };
    remove_unload_hook();
    let handler = Closure::<dyn Fn()>::new(shutdown);
    if window
        .add_event_listener_with_callback("beforeunload", handler.as_ref().unchecked_ref())
        .is_err()
    {
        return;
    }
    UNLOAD_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(UnloadBinding { window, handler });
    });
}

/// Never call from the unload handler itself; that would drop the closure mid-call.
pub(crate) fn remove_unload_hook() {
    UNLOAD_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                "beforeunload",
                old.handler.as_ref().unchecked_ref(),
            );
        }
    });
}

fn bind_map_events(role: ViewportRole, map: &MapboxMap) -> Vec<MapListener> {
    let style_load = Closure::<dyn Fn(JsValue)>::new(move |_: JsValue| {
        with_runtime(|rt| rt.on_style_load(role));
    });
    let click = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
        let event: MapMouseEvent = event.unchecked_into();
        let lng_lat = event.lng_lat();
        with_runtime(|rt| rt.on_click(role, lng_lat.lat(), lng_lat.lng()));
    });
    let move_end = Closure::<dyn Fn(JsValue)>::new(move |_: JsValue| {
        with_runtime(|rt| rt.on_move_end(role));
    });
    let error = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
        let message = mapbox::error_event_message(&event);
        with_runtime(|rt| rt.on_map_error(role, message));
    });

    [
        ("style.load", style_load),
        ("click", click),
        ("moveend", move_end),
        ("error", error),
    ]
    .into_iter()
    .map(|(event, handler)| MapListener::attach(map, event, None, handler))
    .collect()
}

/// Clicks on point features open their attribute card. The map-wide click
/// still fires too, so the pick syncs as usual.
fn bind_feature_clicks(map: &MapboxMap) -> Vec<MapListener> {
    catalog::INSPECTABLE_LAYERS
        .into_iter()
        .map(|layer_id| {
            let handler = Closure::<dyn Fn(JsValue)>::new(move |event: JsValue| {
                let event: MapMouseEvent = event.unchecked_into();
                match mapbox::first_feature(&event) {
                    Ok(feature) => {
                        with_runtime(|rt| rt.on_feature_click(layer_id, &feature));
                    }
                    Err(error) => tracing::warn!(layer_id, %error, "feature click unreadable"),
                }
            });
            MapListener::attach(map, "click", Some(layer_id), handler)
        })
        .collect()
}

impl ViewerRuntime {
    fn with_panel<R>(
        &self,
        f: impl FnOnce(&mut LayerVisibilityRegistry, &mut PanelSink<'_>) -> R,
    ) -> R {
        let mut registry = self.registry.borrow_mut();
        let mut primary = self.sync.viewport(ViewportRole::Primary).borrow_mut();
        let mut sink = PanelSink {
            viewport: &mut *primary,
            sequences: &self.ui.sequences,
        };
        let result = f(&mut registry, &mut sink);
        for (id, signals) in &self.ui.sequences {
            if let Some(seq) = registry.sequence(id) {
                signals.index.set(seq.current_index());
                signals.enabled.set(seq.is_enabled());
            }
        }
        result
    }

    pub(crate) fn set_group_visible(&self, group_id: &str, visible: bool) {
        self.with_panel(|registry, sink| {
            if let Err(error) = registry.set_group_visible(group_id, visible, sink) {
                tracing::warn!(%error, "layer toggle ignored");
            }
        });
    }

    pub(crate) fn set_sequence_enabled(&self, sequence_id: &str, enabled: bool) {
        let animator = self.animator.borrow();
        self.with_panel(|registry, sink| {
            if let Err(error) = animator.set_enabled(registry, sink, sequence_id, enabled) {
                tracing::warn!(%error, "sequence toggle ignored");
            }
        });
    }

    pub(crate) fn scrub(&self, sequence_id: &str, index: usize) {
        let animator = self.animator.borrow();
        self.with_panel(|registry, sink| {
            if let Err(error) = animator.set_index(registry, sink, sequence_id, index) {
                tracing::warn!(%error, "slider change rejected");
            }
        });
    }

    pub(crate) fn tick(&self) {
        let mut animator = self.animator.borrow_mut();
        self.with_panel(|registry, sink| animator.tick(registry, sink));
    }

    /// Returns the tick period if the animation was not already running.
    pub(crate) fn start_animation(&self) -> Option<u32> {
        let mut animator = self.animator.borrow_mut();
        if !animator.play() {
            return None;
        }
        self.ui.playing.set(true);
        Some(animator.period_ms())
    }

    pub(crate) fn stop_animation(&self) {
        if self.animator.borrow_mut().pause() {
            self.ui.playing.set(false);
        }
    }

    pub(crate) fn change_basemap(&self, basemap_id: &str) {
        let Some(style_url) = catalog::basemap_url(basemap_id) else {
            tracing::warn!(basemap_id, "unknown basemap");
            return;
        };
        let registry = self.registry.borrow();
        let mut primary = self.sync.viewport(ViewportRole::Primary).borrow_mut();
        primary.reload_style(style_url);
        for spec in self.catalog.layer_specs(&registry) {
            primary.register_layer(spec);
        }
    }

    fn on_style_load(&self, role: ViewportRole) {
        let viewport = self.sync.viewport(role);
        // mapbox may fire this from inside a call we are still making on the same map.
        let Ok(mut adapter) = viewport.try_borrow_mut() else {
            let _ = Timeout::new(0, move || {
                with_runtime(|rt| rt.on_style_load(role));
            })
            .forget();
            return;
        };
        if let Some(surface) = adapter.surface()
            && let Err(e) = surface.install_terrain(
                self.config.terrain_exaggeration,
                role == ViewportRole::Detail,
            )
        {
            tracing::warn!(viewport = role.as_str(), error = %e, "terrain not installed");
        }
        adapter.on_ready();
    }

    fn on_click(&self, role: ViewportRole, lat: f64, lng: f64) {
        let location = match Location::new(lat, wrap_longitude(lng)) {
            Ok(location) => location,
            Err(error) => {
                tracing::warn!(%error, "click outside valid coordinates");
                return;
            }
        };
        let now = js_sys::Date::now();
        match self.sync.submit(PickEvent::user(role, location), now) {
            PickDisposition::Deferred { delay_ms } => {
                self.cancel_flush();
                let timeout = Timeout::new(delay_ms, || {
                    with_runtime(|rt| rt.sync.flush());
                });
                *self.flush_timeout.borrow_mut() = Some(timeout);
            }
            // The coordinator dropped any parked pick; its timer goes too.
            PickDisposition::Forwarded => self.cancel_flush(),
            PickDisposition::Ignored => {}
        }
    }

    fn cancel_flush(&self) {
        if let Some(timeout) = self.flush_timeout.borrow_mut().take() {
            timeout.cancel();
        }
    }

    fn on_feature_click(&self, layer_id: &str, feature: &serde_json::Value) {
        let Some(record) = FeatureRecord::from_feature(layer_id, feature) else {
            tracing::warn!(layer_id, "clicked feature is not an object");
            return;
        };
        tracing::debug!(layer_id, attributes = record.properties.len(), "feature inspected");
        self.ui.inspected.set(Some(record));
    }

    fn blink_tick(&self) {
        let Ok(registry) = self.registry.try_borrow() else {
            return;
        };
        let mut blink = self.blink.borrow_mut();
        let visible = registry.layer_visible(blink.layer_id());
        let Some(color) = blink.tick(visible) else {
            return;
        };
        match self.sync.viewport(ViewportRole::Primary).try_borrow_mut() {
            Ok(mut primary) => {
                primary.set_paint_property(blink.layer_id(), blink.property(), &color)
            }
            Err(_) => tracing::debug!("primary viewport busy, blink skipped"),
        }
    }

    fn on_move_end(&self, role: ViewportRole) {
        // jumpTo fires moveend synchronously while the adapter is still borrowed.
        let Ok(mut adapter) = self.sync.viewport(role).try_borrow_mut() else {
            return;
        };
        if let Some(camera) = adapter.surface().and_then(MapboxSurface::current_camera) {
            adapter.on_move_end(camera);
        }
    }

    fn on_map_error(&self, role: ViewportRole, message: String) {
        let Ok(mut adapter) = self.sync.viewport(role).try_borrow_mut() else {
            tracing::warn!(viewport = role.as_str(), %message, "map error");
            return;
        };
        adapter.on_init_failed(InitError::Surface(message));
        if let Some(message) = adapter.error_message() {
            self.ui.error_signal(role).set(Some(message));
        }
    }

    fn teardown(&self) {
        playback::release_interval();
        self.animator.borrow_mut().teardown();
        self.ui.playing.set(false);

        drop(self.blink_interval.borrow_mut().take());
        self.ui.inspected.set(None);

        self.cancel_flush();
        self.sync.cancel_pending();

        for listener in self.listeners.borrow_mut().drain(..) {
            listener.detach();
        }
        for role in [ViewportRole::Primary, ViewportRole::Detail] {
            match self.sync.viewport(role).try_borrow_mut() {
                Ok(mut adapter) => adapter.teardown(),
                Err(_) => {
                    tracing::warn!(viewport = role.as_str(), "viewport busy during teardown")
                }
            }
        }
        tracing::info!("viewer stopped");
    }
}
