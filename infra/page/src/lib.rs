//! # Page
//!
//! A minimal element tree standing in for whatever host document the loader
//! runs against. The scheduling kernel treats this crate as an external
//! collaborator and relies only on its documented contract:
//!
//! * select elements by class name within a root, in document order;
//! * scan attributes carrying a given prefix, root included;
//! * hand out a stable per-element identity token.
//!
//! The tree is append-only: an [`ElementId`] minted by a page stays valid for
//! the lifetime of that page. Handles are cheap to clone and share one
//! underlying arena.

mod element;
mod page;

pub use element::{ElementId, ElementRef};
pub use page::Page;
