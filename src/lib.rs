pub mod app;
pub mod attraction;
pub mod config;
pub mod gpu;
pub mod gravity;
pub mod io;
pub mod physics;
pub mod placement;
pub mod render;
pub mod scene;
pub mod swarm;
pub mod view;

pub use log;
pub use nalgebra_glm;
pub use winit;

pub use self::{
    app::{init_logging, run},
    config::SwarmConfig,
    swarm::Swarm,
};

#[cfg(target_arch = "wasm32")]
pub use wasm_bindgen;

#[cfg(target_arch = "wasm32")]
pub use wasm_bindgen_futures;
