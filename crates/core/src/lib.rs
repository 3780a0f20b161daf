//! Core library for prdgen
//!
//! This crate implements the **Functional Core** of the prdgen application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The prdgen project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`prdgen_core`** (this crate): Pure transformation functions with zero I/O
//! - **`prdgen`**: I/O operations and orchestration (the Imperative Shell)
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Deterministic**: Behavior is predictable and reproducible
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! The core crate is organized by domain:
//!
//! - [`model`]: The generation model catalog (providers, context windows, pricing)
//! - [`prd`]: PRD assembly and project-name derivation
//! - [`project`]: Structured project descriptor types
//! - [`prompt`]: Prompt construction for the upstream completion APIs
//! - [`recover`]: Best-effort recovery of descriptors from raw model output
//! - [`tokens`]: Token estimation and cost calculation
//!
//! The [`recover`] module is the heart of the crate: model responses are not
//! guaranteed to be well-formed JSON, and the recovery cascade turns whatever
//! came back into something the shell can always persist.

pub mod model;
pub mod prd;
pub mod project;
pub mod prompt;
pub mod recover;
pub mod tokens;
