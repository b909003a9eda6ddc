//! Command implementations.

pub mod cleanup;
pub mod seed;
pub mod verify;

pub use cleanup::run_cleanup;
pub use seed::run_seed;
pub use verify::{run_verify, verify_login};
