#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod observability;
pub mod registry;
pub mod report;
pub mod util;
