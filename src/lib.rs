//! Toy-donation triage worker.
//!
//! Photos of a donated toy go through image preprocessing, four parallel
//! vision-model classifiers (type, material, damage, soiling), defensive
//! parsing into typed labels, and a deterministic decision engine that
//! produces the final donation-eligibility record.

#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod clients;
pub mod config;
pub mod observability;
pub mod pipeline;
pub mod schema;
