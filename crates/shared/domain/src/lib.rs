//! # Domain Models
//!
//! This crate contains pure loader domain types with minimal dependencies
//! (`serde`, `serde_json`, `bitflags`). Keep it lean: no I/O, no scheduling,
//! no async — just data and simple helpers shared by the kernel and facade.

pub mod constants;
pub mod unit;
pub mod value;

pub use unit::{DependencyRef, UnitKind, UnitSnapshot, UnitState};
pub use value::{Value, ValueExt};
