//! HTTP API for question submission

mod client;
mod types;

pub use client::AskClient;
pub use types::{AskRequest, AskResponse, SessionId};
