pub mod audio;
pub mod config;
pub mod data;
pub mod event;
pub mod http;
pub mod model;
pub mod sync;
pub mod ui;
pub mod util;
