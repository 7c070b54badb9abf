// DMED export handling: parsing, lookup and the per-upload session.

pub mod format;
pub mod handlers;
pub mod models;
pub mod parser;
pub mod search;
pub mod session;
