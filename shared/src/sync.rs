use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::geo::{CameraMove, CameraState, DEFAULT_FLY_DURATION_MS, Location};
use crate::surface::RenderSurface;
use crate::viewport::{ViewportAdapter, ViewportRole};

/// Upper bound for coalescing rapid picks.
pub const MAX_DEBOUNCE_MS: u32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickSource {
    /// A click or tap on the surface.
    User,
    /// Fired as a side effect of a programmatic marker or camera change.
    Programmatic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickEvent {
    pub origin: ViewportRole,
    pub location: Location,
    pub source: PickSource,
}

impl PickEvent {
    pub fn user(origin: ViewportRole, location: Location) -> Self {
        Self {
            origin,
            location,
            source: PickSource::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickDisposition {
    Forwarded,
    /// Parked; call [`SyncCoordinator::flush_due`] after `delay_ms`.
    Deferred { delay_ms: u32 },
    Ignored,
}

/// Camera the detail view flies to when the primary view is picked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyPreset {
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    pub duration_ms: u32,
}

impl Default for FlyPreset {
    fn default() -> Self {
        Self {
            zoom: 15.0,
            pitch: 70.0,
            bearing: 0.0,
            duration_ms: DEFAULT_FLY_DURATION_MS,
        }
    }
}

impl FlyPreset {
    pub fn camera_at(&self, center: Location) -> CameraState {
        CameraState::new(center, self.zoom, self.pitch, self.bearing)
    }

    pub fn camera_move(&self) -> CameraMove {
        CameraMove::Fly {
            duration_ms: self.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SyncSettings {
    pub detail_fly: FlyPreset,
    /// Zero forwards immediately.
    pub primary_debounce_ms: u32,
    pub detail_debounce_ms: u32,
}

impl SyncSettings {
    fn debounce_for(&self, origin: ViewportRole) -> u32 {
        let ms = match origin {
            ViewportRole::Primary => self.primary_debounce_ms,
            ViewportRole::Detail => self.detail_debounce_ms,
        };
        ms.min(MAX_DEBOUNCE_MS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Forwarding,
}

#[derive(Debug, Clone, Copy)]
struct PendingPick {
    event: PickEvent,
    due_at_ms: f64,
}

/// Forwards picks between the primary and detail viewports.
pub struct SyncCoordinator<S> {
    primary: Rc<RefCell<ViewportAdapter<S>>>,
    detail: Rc<RefCell<ViewportAdapter<S>>>,
    settings: SyncSettings,
    state: Cell<SyncState>,
    pending: Cell<Option<PendingPick>>,
    forwarded: Cell<u64>,
}

impl<S: RenderSurface> SyncCoordinator<S> {
    pub fn new(
        primary: Rc<RefCell<ViewportAdapter<S>>>,
        detail: Rc<RefCell<ViewportAdapter<S>>>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            primary,
            detail,
            settings,
            state: Cell::new(SyncState::Idle),
            pending: Cell::new(None),
            forwarded: Cell::new(0),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state.get()
    }

    pub fn forwarded_count(&self) -> u64 {
        self.forwarded.get()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.get().is_some()
    }

    pub fn viewport(&self, role: ViewportRole) -> &Rc<RefCell<ViewportAdapter<S>>> {
        match role {
            ViewportRole::Primary => &self.primary,
            ViewportRole::Detail => &self.detail,
        }
    }

    pub fn submit(&self, pick: PickEvent, now_ms: f64) -> PickDisposition {
        if pick.source == PickSource::Programmatic {
            tracing::debug!(origin = pick.origin.as_str(), "programmatic pick not forwarded");
            return PickDisposition::Ignored;
        }
        if self.state.get() == SyncState::Forwarding {
            tracing::warn!(origin = pick.origin.as_str(), "re-entrant pick dropped");
            return PickDisposition::Ignored;
        }

        let delay_ms = self.settings.debounce_for(pick.origin);
        if delay_ms > 0 {
            self.pending.set(Some(PendingPick {
                event: pick,
                due_at_ms: now_ms + f64::from(delay_ms),
            }));
            return PickDisposition::Deferred { delay_ms };
        }

        // A parked pick is older than this one and must not land after it.
        if self.pending.take().is_some() {
            tracing::debug!(origin = pick.origin.as_str(), "superseded parked pick");
        }
        self.forward(pick);
        PickDisposition::Forwarded
    }

    /// Forwards the parked pick if its debounce window has elapsed.
    pub fn flush_due(&self, now_ms: f64) -> bool {
        match self.pending.get() {
            Some(pending) if now_ms >= pending.due_at_ms => {
                self.pending.set(None);
                self.forward(pending.event);
                true
            }
            _ => false,
        }
    }

    /// Forwards the parked pick now, for hosts whose timer already waited
    /// out the debounce window.
    pub fn flush(&self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                self.forward(pending.event);
                true
            }
            None => false,
        }
    }

    pub fn cancel_pending(&self) {
        self.pending.set(None);
    }

    fn forward(&self, pick: PickEvent) {
        self.state.set(SyncState::Forwarding);
        let location = pick.location;

        match pick.origin {
            ViewportRole::Primary => match self.detail.try_borrow_mut() {
                Ok(mut detail) => {
                    detail.set_location(location);
                    let preset = self.settings.detail_fly;
                    detail.set_camera(preset.camera_at(location), preset.camera_move());
                }
                Err(_) => tracing::warn!("detail viewport busy, pick dropped"),
            },
            ViewportRole::Detail => {
                match self.detail.try_borrow_mut() {
                    Ok(mut detail) => detail.set_location(location),
                    Err(_) => tracing::warn!("detail viewport busy, marker not moved"),
                }
                match self.primary.try_borrow_mut() {
                    Ok(mut primary) => primary.set_location(location),
                    Err(_) => tracing::warn!("primary viewport busy, pick dropped"),
                }
            }
        }

        self.forwarded.set(self.forwarded.get() + 1);
        self.state.set(SyncState::Idle);
        tracing::debug!(
            origin = pick.origin.as_str(),
            lat = location.latitude(),
            lng = location.longitude(),
            "pick forwarded"
        );
    }
}
