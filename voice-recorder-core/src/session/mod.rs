pub mod player;
pub mod recorder;
