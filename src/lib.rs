//! GossipAI: submit a conversation as text, a chat screenshot or a voice
//! recording, have a generative-language model analyse its emotional
//! dynamics, keep the result in a hosted table and render it as cards.

pub mod analysis;
pub mod analyzer;
pub mod app;
pub mod cache;
pub mod chat;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;
pub mod render;
pub mod retry;
pub mod store;

pub use error::{GossipError, Result};
