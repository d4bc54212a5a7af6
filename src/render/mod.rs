pub mod curve;
pub mod palette;
pub mod surface;
pub mod text;
