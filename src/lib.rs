pub mod animator;
pub mod app;
pub mod capability;
pub mod color;
pub mod config;
pub mod geometry;
pub mod layer;
pub mod motif;
pub mod render;
pub mod surface;
pub mod terminal;
