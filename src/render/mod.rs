pub mod canvas;
pub mod color;
pub mod export;
pub mod surface;
