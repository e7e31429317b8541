use std::io;
use thiserror::Error;

/// Failure raised by the external machine while it was doing work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MachineFault(pub String);

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("machine initialization failed with status {status}")]
    Init { status: i32 },

    #[error("machine fault: {0}")]
    Fault(#[from] MachineFault),

    #[error("{name} view at 0x{addr:04x} ({len} bytes) is not backed by machine memory")]
    View {
        name: &'static str,
        addr: usize,
        len: usize,
    },

    #[error("driver halted after an earlier fault")]
    Halted,

    #[error("bad config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("bad config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
