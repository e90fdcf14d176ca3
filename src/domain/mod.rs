pub mod collision;
pub mod entity;
pub mod geometry;
pub mod grid;
pub mod physics;
pub mod tile;
