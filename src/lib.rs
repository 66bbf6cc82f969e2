pub mod browser;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod http;
pub mod images;
pub mod logging;
pub mod output;
pub mod scoring;
pub mod scrape;
pub mod server;
