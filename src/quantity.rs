#[macro_use]
mod macros;

pub mod area;
pub mod crop_yield;
pub mod temperature;
pub mod water;
