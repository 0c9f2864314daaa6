pub mod backend;
pub mod camera;
pub mod frame;
pub mod gizmo;
pub mod icons;
pub mod pick;
pub mod ray;
pub mod software;

pub use backend::{
    DrawCall, DrawTarget, PickTarget, RasterState, RenderBackend, RenderError, RenderOptions,
    Renderable, ShadowBackend, ShadowHandle, ShadowKind, UniformSink,
};
pub use camera::{CameraController, CameraMovement};
pub use gizmo::{Axis, DragState, DragTarget, GizmoController, GizmoHandle, GizmoMode};
pub use pick::{PickId, PickSystem};
pub use ray::{Ray, ViewContext};
pub use software::SoftwareBackend;
