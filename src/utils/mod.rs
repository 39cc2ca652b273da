pub mod render;
pub mod validation;
