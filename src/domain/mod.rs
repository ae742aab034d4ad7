pub mod animation;
pub mod entity;
pub mod physics;
pub mod tile;
