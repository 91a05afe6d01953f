//! Stable exit codes for the agent CLI.

/// The model produced an answer (or stopped cleanly without one).
pub const OK: i32 = 0;
/// Invalid usage/config, or a fatal error (model transport, bad root).
pub const INVALID: i32 = 1;
/// The iteration budget was exhausted before a final answer.
pub const EXHAUSTED: i32 = 2;
