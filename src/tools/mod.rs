pub mod analysis;
pub mod chat;
pub mod products;
pub mod routine;
