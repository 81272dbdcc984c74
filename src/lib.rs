//! Pravka - a Telegram bot that fixes spelling, grammar and punctuation.
//!
//! Text and mini-app payloads go to an OpenAI-compatible completion
//! endpoint; voice messages are transcribed through Deepgram first.

pub mod config;
pub mod deepgram;
pub mod editor;
pub mod openrouter;
pub mod webapp;
