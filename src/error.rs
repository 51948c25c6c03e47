//! Error types for the iapflash command line tool

use std::io;
use std::path::PathBuf;

use iapflash_core::profile::ProfileDbError;
use thiserror::Error;

/// Errors reported by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Device database could not be loaded
    #[error("Device database error: {0}")]
    Database(#[from] ProfileDbError),

    /// Device database path does not exist
    #[error("Device database path not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),

    /// No profile with the requested name
    #[error("Unknown device '{0}' (see list-devices)")]
    UnknownDevice(String),

    /// Flash engine error
    #[error("Flash error: {0}")]
    Flash(#[from] iapflash_core::Error),

    /// Input does not fit in the target region
    #[error("Input of {size} bytes does not fit in {available} bytes from block {start_block}")]
    InputTooLarge {
        size: usize,
        available: usize,
        start_block: u16,
    },

    /// Read-back after programming differs
    #[error("Verification failed at 0x{addr:06X}: expected 0x{expected:02X}, found 0x{actual:02X}")]
    VerifyFailed { addr: u32, expected: u8, actual: u8 },

    /// Progress bar template error
    #[error("Progress bar error: {0}")]
    Progress(#[from] indicatif::style::TemplateError),
}

/// Result type for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
