//! Isometric coordinate engine.
//!
//! Everything here is pure: grid positions map to screen points and back,
//! positions order themselves for painting, and neighbourhood queries
//! enumerate cells. Range validation is the caller's job; out-of-grid inputs
//! simply produce out-of-grid outputs.
mod grid;
mod position;
mod projection;

pub use grid::{Neighborhood, cells_within, neighbors, positions_in_range};
pub use position::{Direction, IsoCoords, Position3D};
pub use projection::{DepthKey, IsoProjection, ScreenBounds};
