//! Tetris Battle (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so binaries, integration
//! tests and benches can use `tetris_battle::{core,net,types}`.

pub use tetris_battle_core as core;
pub use tetris_battle_net as net;
pub use tetris_battle_types as types;
