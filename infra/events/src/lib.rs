//! # Event Bus
//!
//! A type-safe broadcast bus: the loader's only observability channel.
//!
//! ## Overview
//!
//! Provides a centralized [`EventBus`] connecting the scheduling kernel to
//! external UI code. Events are identified by their Rust type; each type gets
//! its own `tokio` broadcast channel with fan-out semantics.
//!
//! The kernel consults [`EventBus::subscriber_count`] before assembling
//! costly diagnostic payloads, so unobserved event types stay free.
//!
//! # Example
//!
//! ```rust
//! use bootlace_event_bus::{EventBus, EventBusError, EventReceiverExt};
//!
//! #[derive(Debug)]
//! struct UnitLoaded { name: String }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let mut rx = bus.subscribe::<UnitLoaded>()?;
//!     bus.publish(UnitLoaded { name: "tabs".into() })?;
//!     assert_eq!(rx.recv_event().await.unwrap().name, "tabs");
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{Event, EventBus};
pub use error::EventBusError;
pub use receiver::EventReceiverExt;
