//! # lmprobe
//!
//! Memory growth probe for language-model reasoning modules.
//!
//! lmprobe repeatedly builds a reasoning module over a fresh language-model
//! client, fans a batch of concurrent calls through it, drops it, and records
//! how the process resident set size evolves. A steadily rising line in the
//! growth log points at state retained across supposedly independent
//! instances.
//!
//! ## Components
//!
//! - **Memory sampling**: `VmRSS`/`VmSize`/`VmData` from `/proc/self/status`
//! - **Language models**: explicit per-iteration settings, OpenAI backend
//! - **Reasoning modules**: `Predict` and `ChainOfThought` over a fixed signature
//! - **Driver and runner**: concurrent fan-out, cleanup, growth logging

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]

pub mod cli;
pub mod driver;
pub mod error;
pub mod growth;
pub mod lm;
pub mod memory;
pub mod module;
pub mod runner;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use cli::{Cli, OutputFormat, ProbeConfig};
pub use driver::{IterationDriver, IterationOutcome};
pub use growth::{Growth, GrowthLog, IterationReport};
pub use lm::{LanguageModel, LmFactory, LmRequest, LmSettings, OpenAiFactory, OpenAiModel};
pub use memory::{MemorySample, MemorySampler};
pub use module::{ModuleInput, ModuleKind, Prediction, ReasoningModule};
pub use runner::{RunOutcome, run};
