pub mod analyzer;
pub mod catalog;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod image;
pub mod model;
pub mod parsers;
pub mod prompt;
pub mod response;
pub mod routine;
pub mod server;
pub mod store;
pub mod tools;
