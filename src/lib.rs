pub mod config;
pub mod error;
pub mod events;
pub mod i18n;
pub mod openai;
pub mod orchestrator;
pub mod output;
pub mod render;
pub mod tokenizer;
pub mod usage;
