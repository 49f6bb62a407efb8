pub mod artwork;
pub mod canvas;
pub mod view;

pub use artwork::Posters;
pub use canvas::{RedrawHandle, SpinCompletion, WheelCanvas};
pub use view::{Frame, draw};

pub const RING_WIDTH: f64 = 3.0;
pub const POINTER_HALF_WIDTH: f64 = 14.0;
pub const POINTER_DEPTH: f64 = 22.0;
/// Placeholder titles sit at this fraction of the outer radius.
pub const LABEL_RADIUS_RATIO: f64 = 0.62;
