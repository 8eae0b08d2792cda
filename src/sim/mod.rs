/// Simulation layer: world state, level loading, assets, the per-tick step
/// function and the events it emits.

pub mod assets;
pub mod event;
pub mod level;
pub mod step;
pub mod world;
