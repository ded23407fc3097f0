pub mod entities;
pub mod level;
pub mod read_entities;

pub use level::{LEVELS, load_game_levels, load_level};
pub use read_entities::{LevelEntities, read_entities};
