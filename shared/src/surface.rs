use serde_json::Value;

use crate::error::SurfaceError;
use crate::geo::{CameraMove, CameraState, Location};
use crate::layer::LayerSpec;

/// The narrow slice of a map-rendering library the core talks to.
///
/// Implementations wrap exactly one rendering surface. Ready, error and
/// click events flow the other way: the host forwards them to the owning
/// [`crate::viewport::ViewportAdapter`] and [`crate::sync::SyncCoordinator`].
pub trait RenderSurface {
    /// Adds the layer (and its source, if not yet present).
    fn register_layer(&mut self, spec: &LayerSpec) -> Result<(), SurfaceError>;

    /// Drops the layer; its source may stay behind for reuse.
    fn remove_layer(&mut self, layer_id: &str);

    fn has_layer(&self, layer_id: &str) -> bool;

    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool);

    /// Sets one library-specific paint property, such as a line color.
    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value);

    /// Starting a move must cancel any transition still in flight.
    fn move_camera(&mut self, camera: &CameraState, how: CameraMove);

    /// Places the surface's single marker, moving it if already placed.
    fn place_marker(&mut self, location: Location);

    fn clear_marker(&mut self);

    /// Swaps the base style. Every registered layer is gone afterwards and
    /// the surface fires its ready signal again once the new style loads.
    fn set_style(&mut self, style_url: &str);

    fn destroy(&mut self);
}

/// Receives desired layer visibility from the registry and the animator.
pub trait LayerSink {
    fn set_layer_visibility(&mut self, layer_id: &str, visible: bool);

    fn sequence_label_changed(&mut self, _sequence_id: &str, _label: &str) {}
}
