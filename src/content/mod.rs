//! Content stream state used while extracting positioned text.

pub mod graphics_state;

pub use graphics_state::{GraphicsState, GraphicsStateStack, Matrix};
