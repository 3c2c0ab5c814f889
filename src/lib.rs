pub mod calibration;
pub mod config;
pub mod fetch;
pub mod linkage;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod recording;
pub mod session;
