use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // System errors
    IoError(std::io::Error),

    // CLI surface errors
    InvalidPreload(String),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
            SimulatorError::InvalidPreload(spec) => {
                write!(f, "Invalid preload specification: {}", spec)
            },
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}
