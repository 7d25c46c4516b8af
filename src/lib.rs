pub mod app;
pub mod cli;
pub mod compare;
pub mod config;
pub mod creator;
pub mod dashboard;
pub mod dataset;
pub mod export;
pub mod notice;
pub mod profile;
pub mod render;
pub mod scout;
pub mod search;
pub mod table;
pub mod watchlist;
