use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;
use terrasync_shared::animator::DEFAULT_PERIOD_MS;
use terrasync_shared::blink::BorderBlink;
use terrasync_shared::catalog::{self, Catalog, HOTSPOT_BORDER_COLOR, HOTSPOT_BORDERS, PROJECTIONS};
use terrasync_shared::error::{AnimatorError, InitError, SurfaceError};
use terrasync_shared::sync::PickDisposition;
use terrasync_shared::{
    CameraMove, CameraState, LayerSink, LayerSpec, LayerVisibilityRegistry, Location, PickEvent,
    RenderSurface, SyncCoordinator, SyncSettings, TemporalLayerAnimator, ViewerConfig,
    ViewportAdapter, ViewportRole, ViewportStatus,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Register(String),
    Visibility(String, bool),
    Paint(String, Value),
    Camera(CameraState, CameraMove),
    Marker(Location),
    Style(String),
}

/// Records every call; a style swap drops all layers like a real map does.
#[derive(Default)]
struct RecordingSurface {
    layers: HashSet<String>,
    events: Vec<Event>,
}

impl RecordingSurface {
    fn visibility_events(&self) -> Vec<(String, bool)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Visibility(id, visible) => Some((id.clone(), *visible)),
                _ => None,
            })
            .collect()
    }

    fn marker_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Marker(_)))
            .count()
    }
}

impl RenderSurface for RecordingSurface {
    fn register_layer(&mut self, spec: &LayerSpec) -> Result<(), SurfaceError> {
        self.layers.insert(spec.id.clone());
        self.events.push(Event::Register(spec.id.clone()));
        Ok(())
    }

    fn remove_layer(&mut self, layer_id: &str) {
        self.layers.remove(layer_id);
    }

    fn has_layer(&self, layer_id: &str) -> bool {
        self.layers.contains(layer_id)
    }

    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        self.events
            .push(Event::Visibility(layer_id.to_string(), visible));
    }

    fn set_paint_property(&mut self, layer_id: &str, _property: &str, value: &Value) {
        self.events
            .push(Event::Paint(layer_id.to_string(), value.clone()));
    }

    fn move_camera(&mut self, camera: &CameraState, how: CameraMove) {
        self.events.push(Event::Camera(*camera, how));
    }

    fn place_marker(&mut self, location: Location) {
        self.events.push(Event::Marker(location));
    }

    fn clear_marker(&mut self) {}

    fn set_style(&mut self, style_url: &str) {
        self.layers.clear();
        self.events.push(Event::Style(style_url.to_string()));
    }

    fn destroy(&mut self) {}
}

type Shared = Rc<RefCell<ViewportAdapter<RecordingSurface>>>;

fn viewport(role: ViewportRole, config: &ViewerConfig) -> Shared {
    let camera = match role {
        ViewportRole::Primary => config.primary_camera.to_camera().unwrap(),
        ViewportRole::Detail => config.detail_camera.to_camera().unwrap(),
    };
    Rc::new(RefCell::new(ViewportAdapter::new(
        role,
        Ok(RecordingSurface::default()),
        camera,
    )))
}

fn events(vp: &Shared) -> Vec<Event> {
    vp.borrow().surface().unwrap().events.clone()
}

fn months_registry() -> LayerVisibilityRegistry {
    let config = ViewerConfig::default();
    let mut registry = LayerVisibilityRegistry::new();
    Catalog::new(&config).populate(&mut registry);
    registry
}

#[test]
fn calls_before_ready_replay_once_in_order() {
    let config = ViewerConfig::default();
    let primary = viewport(ViewportRole::Primary, &config);
    let catalog = Catalog::new(&config);
    let registry = months_registry();

    for spec in catalog.layer_specs(&registry) {
        primary.borrow_mut().register_layer(spec);
    }
    {
        let mut vp = primary.borrow_mut();
        vp.set_layer_visibility("Oct_25", true);
        vp.set_layer_visibility("Nov_25", true);
        vp.set_layer_visibility("Oct_25", false);
    }
    assert!(primary.borrow().surface().unwrap().events.is_empty());

    primary.borrow_mut().on_ready();
    primary.borrow_mut().on_ready();

    let surface_events = events(&primary);
    let registered = surface_events
        .iter()
        .filter(|event| matches!(event, Event::Register(_)))
        .count();
    assert_eq!(registered, catalog.layer_specs(&registry).len());
    assert_eq!(
        primary.borrow().surface().unwrap().visibility_events(),
        vec![
            ("Oct_25".to_string(), true),
            ("Nov_25".to_string(), true),
            ("Oct_25".to_string(), false),
        ]
    );
}

#[test]
fn primary_click_flies_detail_exactly_once() {
    let config = ViewerConfig::default();
    let primary = viewport(ViewportRole::Primary, &config);
    let detail = viewport(ViewportRole::Detail, &config);
    primary.borrow_mut().on_ready();
    detail.borrow_mut().on_ready();
    let sync = SyncCoordinator::new(primary.clone(), detail.clone(), config.sync_settings());

    let skardu = Location::new(35.2971, 75.6333).unwrap();
    assert_eq!(
        sync.submit(PickEvent::user(ViewportRole::Primary, skardu), 0.0),
        PickDisposition::Forwarded
    );

    assert_eq!(
        events(&detail),
        vec![
            Event::Marker(skardu),
            Event::Camera(
                CameraState::new(skardu, 15.0, 70.0, 0.0),
                CameraMove::Fly { duration_ms: 1500 }
            ),
        ]
    );
    assert!(events(&primary).is_empty());
    assert_eq!(detail.borrow().marker(), Some(skardu));
}

#[test]
fn detail_clicks_are_debounced_into_one_marker_update() {
    let config = ViewerConfig::default();
    let primary = viewport(ViewportRole::Primary, &config);
    let detail = viewport(ViewportRole::Detail, &config);
    primary.borrow_mut().on_ready();
    detail.borrow_mut().on_ready();
    let sync = SyncCoordinator::new(primary.clone(), detail.clone(), config.sync_settings());

    for (lat, now) in [(35.0, 0.0), (35.1, 30.0), (35.2, 60.0)] {
        let loc = Location::new(lat, 74.0).unwrap();
        assert!(matches!(
            sync.submit(PickEvent::user(ViewportRole::Detail, loc), now),
            PickDisposition::Deferred { delay_ms: 100 }
        ));
    }
    assert!(sync.flush_due(160.0));

    let last = Location::new(35.2, 74.0).unwrap();
    assert_eq!(events(&primary), vec![Event::Marker(last)]);
    assert_eq!(detail.borrow().surface().unwrap().marker_count(), 1);
    assert_eq!(sync.forwarded_count(), 1);
}

/// Pushes visibility into the primary viewport and records labels.
struct PanelSink<'a> {
    viewport: &'a mut ViewportAdapter<RecordingSurface>,
    labels: Vec<(String, String)>,
}

impl LayerSink for PanelSink<'_> {
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        self.viewport.set_layer_visibility(layer_id, visible);
    }

    fn sequence_label_changed(&mut self, sequence_id: &str, label: &str) {
        self.labels.push((sequence_id.to_string(), label.to_string()));
    }
}

#[test]
fn projection_playback_cycles_through_december_and_back() {
    let config = ViewerConfig::default();
    let catalog = Catalog::new(&config);
    let mut registry = months_registry();
    let primary = viewport(ViewportRole::Primary, &config);
    for spec in catalog.layer_specs(&registry) {
        primary.borrow_mut().register_layer(spec);
    }
    primary.borrow_mut().on_ready();

    let mut animator = TemporalLayerAnimator::new(catalog.sequence_ids(), DEFAULT_PERIOD_MS);
    let mut vp = primary.borrow_mut();
    let mut sink = PanelSink {
        viewport: &mut *vp,
        labels: Vec::new(),
    };
    animator
        .set_enabled(&mut registry, &mut sink, PROJECTIONS, true)
        .unwrap();
    assert!(animator.play());
    for _ in 0..3 {
        animator.tick(&mut registry, &mut sink);
    }
    assert_eq!(registry.sequence(PROJECTIONS).unwrap().current_index(), 3);
    assert!(registry.layer_visible("Dec_25"));

    animator.tick(&mut registry, &mut sink);
    assert_eq!(registry.sequence(PROJECTIONS).unwrap().current_index(), 0);
    assert!(registry.layer_visible("sep_sep_precipaptiuon"));
    assert_eq!(
        sink.labels.last(),
        Some(&(PROJECTIONS.to_string(), "September Precipitation".to_string()))
    );

    assert_eq!(
        animator.set_index(&mut registry, &mut sink, PROJECTIONS, 2),
        Err(AnimatorError::Running(PROJECTIONS.to_string()))
    );
    assert!(animator.pause());
    assert_eq!(
        animator.set_index(&mut registry, &mut sink, PROJECTIONS, 99),
        Err(AnimatorError::InvalidIndex {
            sequence: PROJECTIONS.to_string(),
            index: 99,
            len: 4,
        })
    );
    drop(sink);

    let shown: Vec<(String, bool)> = vp
        .surface()
        .unwrap()
        .visibility_events()
        .into_iter()
        .filter(|(_, visible)| *visible)
        .collect();
    assert_eq!(
        shown,
        vec![
            ("sep_sep_precipaptiuon".to_string(), true),
            ("Oct_25".to_string(), true),
            ("Nov_25".to_string(), true),
            ("Dec_25".to_string(), true),
            ("sep_sep_precipaptiuon".to_string(), true),
        ]
    );
}

#[test]
fn basemap_switch_restores_camera_and_layers() {
    let config = ViewerConfig::default();
    let catalog = Catalog::new(&config);
    let mut registry = months_registry();
    let primary = viewport(ViewportRole::Primary, &config);
    for spec in catalog.layer_specs(&registry) {
        primary.borrow_mut().register_layer(spec);
    }
    primary.borrow_mut().on_ready();
    registry
        .set_group_visible("national", true, &mut *primary.borrow_mut())
        .unwrap();

    let moved = CameraState::new(Location::new(34.0, 73.0).unwrap(), 8.0, 20.0, 10.0);
    primary.borrow_mut().on_move_end(moved);

    let dark = catalog::basemap_url("dark").unwrap();
    primary.borrow_mut().reload_style(dark);
    assert_eq!(*primary.borrow().status(), ViewportStatus::Loading);
    for spec in catalog.layer_specs(&registry) {
        primary.borrow_mut().register_layer(spec);
    }
    primary.borrow_mut().on_ready();

    let vp = primary.borrow();
    let surface = vp.surface().unwrap();
    let style_at = surface
        .events
        .iter()
        .position(|event| *event == Event::Style(dark.to_string()))
        .unwrap();
    assert_eq!(
        surface.events[style_at + 1],
        Event::Camera(moved, CameraMove::Jump)
    );
    assert!(surface.has_layer("nat-boundary-layer"));
    assert!(registry.layer_visible("nat-boundary-label"));
    assert_eq!(*vp.camera(), moved);
}

#[test]
fn failed_detail_panel_leaves_primary_controls_usable() {
    let config = ViewerConfig::default();
    let primary = viewport(ViewportRole::Primary, &config);
    let detail = Rc::new(RefCell::new(ViewportAdapter::<RecordingSurface>::new(
        ViewportRole::Detail,
        Err(InitError::MissingContainer("map2".into())),
        config.detail_camera.to_camera().unwrap(),
    )));
    assert_eq!(
        detail.borrow().error_message().as_deref(),
        Some("map container #map2 not found")
    );
    primary.borrow_mut().on_ready();
    let sync = SyncCoordinator::new(primary.clone(), detail.clone(), SyncSettings::default());

    let loc = Location::new(33.7, 73.1).unwrap();
    sync.submit(PickEvent::user(ViewportRole::Primary, loc), 0.0);
    sync.submit(PickEvent::user(ViewportRole::Detail, loc), 0.0);
    assert_eq!(events(&primary), vec![Event::Marker(loc)]);

    let mut registry = months_registry();
    primary
        .borrow_mut()
        .register_layer(LayerSpec::raster("risk", vec!["http://t".into()], 256, 0.8));
    registry
        .set_group_visible("risk", true, &mut *primary.borrow_mut())
        .unwrap();
    assert_eq!(
        primary.borrow().surface().unwrap().visibility_events(),
        vec![("risk".to_string(), true)]
    );
}

#[test]
fn hotspot_borders_blink_only_while_group_is_shown() {
    let config = ViewerConfig::default();
    let catalog = Catalog::new(&config);
    let mut registry = months_registry();
    let primary = viewport(ViewportRole::Primary, &config);
    for spec in catalog.layer_specs(&registry) {
        primary.borrow_mut().register_layer(spec);
    }
    primary.borrow_mut().on_ready();

    let mut blink = BorderBlink::new(HOTSPOT_BORDERS, HOTSPOT_BORDER_COLOR);
    let mut pulse = |registry: &LayerVisibilityRegistry| {
        if let Some(color) = blink.tick(registry.layer_visible(HOTSPOT_BORDERS)) {
            primary
                .borrow_mut()
                .set_paint_property(blink.layer_id(), blink.property(), &color);
        }
    };

    pulse(&registry);
    registry
        .set_group_visible("hotspot", true, &mut *primary.borrow_mut())
        .unwrap();
    pulse(&registry);
    pulse(&registry);
    registry
        .set_group_visible("hotspot", false, &mut *primary.borrow_mut())
        .unwrap();
    pulse(&registry);

    let paints: Vec<Event> = events(&primary)
        .into_iter()
        .filter(|event| matches!(event, Event::Paint(..)))
        .collect();
    assert_eq!(
        paints,
        vec![
            Event::Paint(HOTSPOT_BORDERS.to_string(), Value::from("transparent")),
            Event::Paint(HOTSPOT_BORDERS.to_string(), Value::from(HOTSPOT_BORDER_COLOR)),
        ]
    );
}
