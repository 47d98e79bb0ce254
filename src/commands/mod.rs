pub mod inspect;
pub mod resources;
pub mod structures;
