//! Account lifecycle engine
//!
//! One parameterized engine drives every email-confirmed flow (activation,
//! deactivation, deletion, password reset, username change, email change)
//! plus login. Per-flow differences live in a small static profile table;
//! the issue/verify/invalidate steps are implemented exactly once.

pub mod engine;
mod flow;

pub use engine::{IssuedToken, LifecycleEngine, LoginGrant};
