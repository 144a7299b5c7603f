pub mod config;
pub mod db;
pub mod models;
pub mod storage;
pub mod utils;
