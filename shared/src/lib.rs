pub mod animator;
pub mod blink;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feature;
pub mod geo;
pub mod layer;
pub mod registry;
pub mod surface;
pub mod sync;
pub mod viewport;

pub use animator::{AnimationState, TemporalLayerAnimator};
pub use blink::BorderBlink;
pub use catalog::Catalog;
pub use config::ViewerConfig;
pub use error::*;
pub use feature::FeatureRecord;
pub use geo::{CameraMove, CameraState, Location};
pub use layer::{LayerKind, LayerRef, LayerSequence, LayerSource, LayerSpec};
pub use registry::{GroupState, LayerVisibilityRegistry};
pub use surface::{LayerSink, RenderSurface};
pub use sync::{PickEvent, PickSource, SyncCoordinator, SyncSettings};
pub use viewport::{ViewportAdapter, ViewportRole, ViewportStatus};
