//! Stagehand: an interactive 3D scene editor core.
//!
//! Scene objects and lights live in [`scene`], picking, gizmos and the frame
//! loop in [`render`], asset loading and browsing in [`assets`], and the egui
//! panels in [`ui`]. [`app::run`] wires them into a winit window.

pub mod app;
pub mod assets;
pub mod config;
pub mod render;
pub mod scene;
pub mod ui;
