// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod csv;
pub mod file;
pub mod progress;
pub mod render;
pub mod schedule;
pub mod scrape;
pub mod signal;
pub mod specs;
pub mod store;
