mod block;
mod data;

pub use block::{Block, Intersection, Point};
pub use data::Data;
