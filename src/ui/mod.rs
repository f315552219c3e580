pub mod console;
pub mod render;
pub mod setup;
