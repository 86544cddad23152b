pub mod commands;
mod service;

pub use service::{PlantEdit, PlantService};
