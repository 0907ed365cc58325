pub mod browser;
pub mod config;
pub mod page;
pub mod snipe;
pub mod times;
