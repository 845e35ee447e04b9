pub mod app;
pub mod cache;
pub mod calculator;
pub mod config;
pub mod haptics;
pub mod history;

pub use app::Calculator;
