//! # Contracts
//!
//! Frozen interface contracts shared by every pipeline crate: stage catalogue,
//! artifact references, configuration tree, runtime records and the
//! `StageRunner` execution interface.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.

mod artifact;
mod config;
mod error;
mod runner;
mod runtime;
mod stage;

pub use artifact::*;
pub use config::*;
pub use error::*;
pub use runner::{LocalStageRunner, StageRunner};
pub use runtime::*;
pub use stage::*;
