//! Core types and definitions for the Tidewater coastline engine.
//!
//! This crate defines the vocabulary shared by the engine and its tools:
//! grid and tile coordinates, tile border sides, typed indices, tile kinds
//! and the numeric tolerances used by the geometry code.
//! It has no dependency on image loading or any rendering framework.

pub mod constants;
pub mod enums;
pub mod types;

pub use glam::DVec2;
