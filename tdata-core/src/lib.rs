#![doc = "tdata-core: core logic library for tdata."]

//! This crate contains the data models and pipeline stages for turning a hardware
//! datasheet plus a reference driver source into training data:
//!
//! - [`classify`]: rule-based bucketing of extracted elements into the [`taxonomy`]
//! - [`enrich`]: optional LLM rewrite of a [`summary::Summary`]
//! - [`synthesise`]: LLM generation of the instruction-tuning dataset
//! - [`pipeline`]: orchestration over a working directory [`layout`]
//!
//! The PDF partition engine and the LLM completion service are consumed through the
//! traits in [`contract`]; concrete HTTP clients live in the CLI crate.

pub mod classify;
pub mod config;
pub mod contract;
pub mod enrich;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod summary;
pub mod synthesise;
pub mod taxonomy;
