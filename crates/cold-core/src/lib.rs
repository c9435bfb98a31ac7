pub mod catalog;
pub mod classify;
pub mod config;
pub mod db;
pub mod llm;
pub mod pipeline;
pub mod registry;
pub mod steps;
pub mod system;
pub mod themes;
pub mod types;

pub use types::*;
