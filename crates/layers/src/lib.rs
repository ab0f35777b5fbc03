pub mod html;
pub mod layer;
pub mod map;
pub mod markers;
pub mod routes;
pub mod symbology;

pub use layer::*;
pub use map::*;
