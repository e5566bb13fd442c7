//! An authoritative-only DNS nameserver core: a zone database and a
//! synchronous query engine, with no recursion, caching, or zone
//! transfer.

pub mod arena;
pub mod auth;
pub mod config;
pub mod db;
pub mod denial;
pub mod message;
pub mod name;
pub mod query;
pub mod tree;
pub mod wire;
pub mod zonefile;

pub use db::Namedb;
pub use query::answer_query;
