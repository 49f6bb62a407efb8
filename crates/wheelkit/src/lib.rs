//! Wheel of Next core
//!
//! Everything about the wheel that does not need a display:
//! - `segment` / `expand`: weighted layout and wedge splitting
//! - `spin`: stop-angle targeting and the spin state machine
//! - `hit`: pointer to item mapping
//! - `store`: reactive application state
//! - `poster`: bounded, de-duplicating artwork cache
//! - `roll`: the weighted draw and roll history

pub mod control;
pub mod expand;
pub mod geometry;
pub mod hit;
pub mod item;
pub mod macros;
pub mod poster;
pub mod redraw;
pub mod roll;
pub mod segment;
pub mod settings;
pub mod spin;
pub mod store;

pub use geometry::{Point, WheelGeometry};
pub use item::{ItemId, ItemKind, MediaType, PosterUrl, SliceInfo, WheelItem};
pub use roll::{PresetId, RollOutcome, RollService};
pub use settings::SpinSettings;
pub use store::{AppState, Store, View, WheelSnapshot};

/// Control socket shared by the desktop app and `wheelctl`.
pub const SOCKET_PATH: &str = "/tmp/next-wheel.sock";
