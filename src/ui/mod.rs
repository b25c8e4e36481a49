/// Widgets for the sprite gallery

pub mod gallery;
pub mod sprite;
