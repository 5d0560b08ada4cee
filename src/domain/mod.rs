//! Domain layer - turn logic with no I/O.

pub mod conversation;
pub mod foundation;
