//! Wire models for the Google APIs firerules talks to.
//!
//! # Core Concepts
//!
//! ## Rules
//!
//! - [`Ruleset`]: Immutable bundle of rule source files. Every deployment mints a
//!   new one; the server assigns its name.
//! - [`Release`]: Mutable pointer from a logical target (the Firestore database)
//!   to exactly one ruleset. Activation rewrites this pointer.
//!
//! ## Admin bootstrap
//!
//! - [`AuthUser`]: Firebase Auth account, identified by its `localId`.
//! - [`Document`]: Firestore document, used for the `users/{uid}` profile.

mod account;
mod document;
mod release;
mod ruleset;

pub use account::*;
pub use document::*;
pub use release::*;
pub use ruleset::*;
