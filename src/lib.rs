pub mod config;
pub mod error;
pub mod line;
pub mod logging;
pub mod models;
pub mod monitor;
pub mod parsers;
pub mod runner;
pub mod scrapers;
pub mod storage;
pub mod utils;
