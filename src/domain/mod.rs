/// Pure simulation types. Nothing in here touches the terminal, the clock,
/// or the filesystem.

pub mod animation;
pub mod entity;
pub mod fx;
pub mod physics;
pub mod tile;
pub mod tilemap;
