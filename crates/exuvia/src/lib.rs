//! exuvia: split a monolithic Python file into a package of modules.
//!
//! The pipeline is `extractor` -> `graph` -> `components` -> `packing` ->
//! `renderer`, orchestrated per file by `orchestrator`. Package naming is
//! pluggable via `namer`; `discovery` serves the batch CLI.

pub mod components;
pub mod config;
pub mod discovery;
pub mod extractor;
pub mod graph;
pub mod namer;
pub mod naming;
pub mod orchestrator;
pub mod packing;
pub mod renderer;
pub mod types;
pub mod visitors;
