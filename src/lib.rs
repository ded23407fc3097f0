pub mod hl1;
pub mod logging;

pub use hl1::{LEVELS, load_game_levels, load_level};
