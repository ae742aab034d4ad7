pub mod assets;
pub mod control;
pub mod event;
pub mod level;
pub mod step;
pub mod world;
