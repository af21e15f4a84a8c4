pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod gate;
pub mod i18n;
pub mod invalidator;
pub mod loaders;
pub mod merge;
pub mod model;
pub mod scheduler;
pub mod server;
pub mod service;
