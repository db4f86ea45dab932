//! Background operation for the synchronizer
//!
//! Detaching from the terminal, PID file management and the control socket
//! used by `trigger` and `status`.

pub mod ipc;
pub mod process;
