pub mod camera;
pub mod config;
pub mod engine;
pub mod event;
pub mod history;
pub mod prelude;
pub mod render;
pub mod session;
