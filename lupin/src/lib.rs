pub mod cli; // command line arguments of the `lupin` binary
pub mod config; // session configuration
pub mod controller; // selection state machine
pub mod cursor; // pagination over a ranking
pub mod payload; // what the rendering layer receives
pub mod ranking; // signed, magnitude-ordered gene rankings
pub mod render; // plain-text rendering for the terminal session
pub mod session; // event entry points
pub mod sparkline; // per-row normalized timecourse series

pub use topic_beans::{DataStore, Result, TableKind, ViewerError};
