#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn run() {
    swarm::init_logging();
    swarm::run(swarm::Swarm::new(swarm::SwarmConfig::default()));
}
