use std::collections::HashMap;

use serde_json::Value;

use crate::error::InitError;
use crate::geo::{CameraMove, CameraState, Location};
use crate::layer::LayerSpec;
use crate::surface::{LayerSink, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportRole {
    /// 2D overview; picks here fly the detail view.
    Primary,
    /// 3D terrain view; receives animated camera transitions.
    Detail,
}

impl ViewportRole {
    pub fn companion(self) -> Self {
        match self {
            Self::Primary => Self::Detail,
            Self::Detail => Self::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Detail => "detail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportStatus {
    Loading,
    Ready,
    Failed(InitError),
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
enum DeferredOp {
    Register(LayerSpec),
    Visibility { layer_id: String, visible: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTransition {
    target: CameraState,
    duration_ms: u32,
}

/// Owns one rendering surface and its camera.
///
/// Layer operations issued before the surface reports ready are buffered
/// and replayed once, in submission order, when [`Self::on_ready`] fires.
pub struct ViewportAdapter<S> {
    role: ViewportRole,
    surface: Option<S>,
    status: ViewportStatus,
    deferred: Vec<DeferredOp>,
    // Last visibility pushed to the surface, per layer.
    applied: HashMap<String, bool>,
    camera: CameraState,
    transition: Option<ActiveTransition>,
    marker: Option<Location>,
    restore_camera_on_ready: bool,
    loaded_once: bool,
}

impl<S: RenderSurface> ViewportAdapter<S> {
    pub fn new(role: ViewportRole, surface: Result<S, InitError>, camera: CameraState) -> Self {
        let (surface, status) = match surface {
            Ok(surface) => (Some(surface), ViewportStatus::Loading),
            Err(error) => {
                tracing::error!(viewport = role.as_str(), %error, "viewport failed to initialize");
                (None, ViewportStatus::Failed(error))
            }
        };
        Self {
            role,
            surface,
            status,
            deferred: Vec::new(),
            applied: HashMap::new(),
            camera,
            transition: None,
            marker: None,
            restore_camera_on_ready: false,
            loaded_once: false,
        }
    }

    pub fn role(&self) -> ViewportRole {
        self.role
    }

    pub fn status(&self) -> &ViewportStatus {
        &self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status == ViewportStatus::Ready
    }

    /// Human-readable reason when the adapter is in its failed state.
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            ViewportStatus::Failed(error) => Some(error.to_string()),
            _ => None,
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn marker(&self) -> Option<Location> {
        self.marker
    }

    pub fn has_transition_in_flight(&self) -> bool {
        self.transition.is_some()
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// The surface finished loading its style. Flushes deferred work.
    pub fn on_ready(&mut self) {
        if self.status != ViewportStatus::Loading {
            tracing::debug!(
                viewport = self.role.as_str(),
                status = ?self.status,
                "ignoring ready signal"
            );
            return;
        }
        self.status = ViewportStatus::Ready;
        self.loaded_once = true;

        if std::mem::take(&mut self.restore_camera_on_ready) {
            let camera = self.camera;
            if let Some(surface) = self.surface.as_mut() {
                surface.move_camera(&camera, CameraMove::Jump);
            }
        }

        let deferred = std::mem::take(&mut self.deferred);
        tracing::debug!(viewport = self.role.as_str(), replayed = deferred.len(), "viewport ready");
        for op in deferred {
            match op {
                DeferredOp::Register(spec) => self.register_now(&spec),
                DeferredOp::Visibility { layer_id, visible } => {
                    self.apply_visibility(&layer_id, visible)
                }
            }
        }
    }

    /// The surface reported a fatal error before becoming usable. Errors
    /// after the first ready (tiles, a failed basemap swap) are only logged.
    pub fn on_init_failed(&mut self, error: InitError) {
        if self.status != ViewportStatus::Loading || self.loaded_once {
            tracing::warn!(viewport = self.role.as_str(), %error, "surface error after load");
            return;
        }
        tracing::error!(viewport = self.role.as_str(), %error, "viewport failed to initialize");
        if let Some(mut surface) = self.surface.take() {
            surface.destroy();
        }
        self.deferred.clear();
        self.status = ViewportStatus::Failed(error);
    }

    /// Places the marker. Before the surface is ready this does nothing.
    pub fn set_location(&mut self, location: Location) {
        if !self.is_ready() {
            tracing::debug!(viewport = self.role.as_str(), "set_location before ready");
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.place_marker(location);
            self.marker = Some(location);
        }
    }

    pub fn set_camera(&mut self, camera: CameraState, how: CameraMove) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if let Some(previous) = self.transition.take() {
            tracing::debug!(
                viewport = self.role.as_str(),
                interrupted_ms = previous.duration_ms,
                "overriding camera transition"
            );
        }
        surface.move_camera(&camera, how);
        self.camera = camera;
        if let CameraMove::Fly { duration_ms } = how
            && how.is_animated()
        {
            self.transition = Some(ActiveTransition {
                target: camera,
                duration_ms,
            });
        }
    }

    /// The surface finished (or abandoned) a camera move and reports where it ended.
    pub fn on_move_end(&mut self, camera: CameraState) {
        if let Some(transition) = self.transition.take()
            && transition.target != camera
        {
            tracing::debug!(viewport = self.role.as_str(), "camera transition ended off target");
        }
        self.camera = camera;
    }

    pub fn register_layer(&mut self, spec: LayerSpec) {
        match self.status {
            ViewportStatus::Loading => self.deferred.push(DeferredOp::Register(spec)),
            ViewportStatus::Ready => self.register_now(&spec),
            _ => {}
        }
    }

    pub fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        match self.status {
            ViewportStatus::Loading => self.deferred.push(DeferredOp::Visibility {
                layer_id: layer_id.to_string(),
                visible,
            }),
            ViewportStatus::Ready => self.apply_visibility(layer_id, visible),
            _ => {}
        }
    }

    /// Restyles a layer that is already on the surface. Paint changes are
    /// transient, so nothing is buffered while loading.
    pub fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value) {
        if !self.is_ready() {
            return;
        }
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if !surface.has_layer(layer_id) {
            tracing::warn!(
                viewport = self.role.as_str(),
                layer_id,
                property,
                "missing layer, paint ignored"
            );
            return;
        }
        surface.set_paint_property(layer_id, property, value);
    }

    /// Switches the base style. Layers this adapter registered are removed
    /// first and the adapter goes back to loading; the host re-registers
    /// layers, buffered until the new style reports ready.
    pub fn reload_style(&mut self, style_url: &str) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let mut registered: Vec<&String> = self.applied.keys().collect();
        registered.sort();
        for layer_id in registered {
            if surface.has_layer(layer_id) {
                surface.remove_layer(layer_id);
            }
        }
        surface.set_style(style_url);
        self.applied.clear();
        self.status = ViewportStatus::Loading;
        self.restore_camera_on_ready = true;
        tracing::info!(viewport = self.role.as_str(), style_url, "basemap style changed");
    }

    pub fn teardown(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.clear_marker();
            surface.destroy();
        }
        self.deferred.clear();
        self.applied.clear();
        self.transition = None;
        self.marker = None;
        if !matches!(self.status, ViewportStatus::Failed(_)) {
            self.status = ViewportStatus::Closed;
        }
    }

    fn register_now(&mut self, spec: &LayerSpec) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if surface.has_layer(&spec.id) {
            self.apply_visibility(&spec.id, spec.visible);
            return;
        }
        match surface.register_layer(spec) {
            Ok(()) => {
                self.applied.insert(spec.id.clone(), spec.visible);
            }
            Err(error) => {
                tracing::warn!(viewport = self.role.as_str(), %error, "layer registration failed");
            }
        }
    }

    fn apply_visibility(&mut self, layer_id: &str, visible: bool) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if !surface.has_layer(layer_id) {
            tracing::warn!(
                viewport = self.role.as_str(),
                layer_id,
                "missing layer, visibility ignored"
            );
            return;
        }
        if self.applied.get(layer_id) == Some(&visible) {
            return;
        }
        surface.set_layer_visibility(layer_id, visible);
        self.applied.insert(layer_id.to_string(), visible);
    }
}

impl<S: RenderSurface> LayerSink for ViewportAdapter<S> {
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool) {
        ViewportAdapter::set_layer_visibility(self, layer_id, visible);
    }
}
