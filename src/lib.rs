//! Declarative, step-based migrations for hierarchical term taxonomies.
//!
//! A migration file lists `create`, `update` and `reassign` steps. The
//! [`migration`] module parses and runs them against any [`store::TermStore`],
//! recording a result on every step.
pub mod cli;
pub mod config;
pub mod fixtures;
pub mod logging;
pub mod migration;
pub mod report;
pub mod store;
pub mod workflow;
