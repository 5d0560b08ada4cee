//! Flow Guide Conversation - one turn of the flow-building assistant
//!
//! Takes the conversation so far, asks the configured LLM for the next
//! clarifying question, and publishes the assistant's reply (or a terminal
//! error) as an event.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
