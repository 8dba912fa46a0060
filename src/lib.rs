//! TetrECS (workspace facade crate).
//!
//! Re-exports the member crates under stable module names
//! (`tetrecs::{types, core, engine, net}`) so callers need one dependency.

pub use tetrecs_core as core;
pub use tetrecs_engine as engine;
pub use tetrecs_net as net;
pub use tetrecs_types as types;
