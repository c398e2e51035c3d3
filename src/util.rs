pub mod position_index;
pub mod time;

pub use position_index::PositionIndex;
