//! Error types for iapflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

use crate::flash::{MemoryRegion, OPTION_BYTE_ERROR};

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Parameter errors
    /// Address is outside program and data memory
    AddressOutOfRange {
        /// The rejected address
        addr: u32,
    },
    /// Block index is beyond the end of the memory region
    BlockOutOfRange {
        /// Region the block was requested in
        region: MemoryRegion,
        /// The rejected block index
        block: u16,
    },
    /// Block buffer length differs from the device block size
    InvalidBufferLength {
        /// Device block size
        expected: usize,
        /// Length of the buffer that was passed in
        actual: usize,
    },
    /// Address is not inside the option byte area
    InvalidOptionByteAddress {
        /// The rejected address
        addr: u16,
    },

    // Operation errors
    /// The controller did not report completion within the poll budget
    Timeout,
    /// The controller rejected a write to a locked or protected area
    WriteProtected,
    /// Option byte and its complement disagree
    OptionByteCorrupted {
        /// Address of the option byte
        addr: u16,
        /// Value byte found at `addr`
        value: u8,
        /// Complement byte found at `addr + 1`
        complement: u8,
    },

    // Placement errors
    /// Block routines would execute from the region they modify
    PlacementViolation {
        /// Region that was about to be erased or programmed
        region: MemoryRegion,
    },
}

impl Error {
    /// Returns true for errors caused by a bad argument from the caller.
    ///
    /// These are detected before any register is touched.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            Self::AddressOutOfRange { .. }
                | Self::BlockOutOfRange { .. }
                | Self::InvalidBufferLength { .. }
                | Self::InvalidOptionByteAddress { .. }
        )
    }

    /// Packed 16-bit form of an option byte error.
    ///
    /// Returns [`OPTION_BYTE_ERROR`] for [`Error::OptionByteCorrupted`], for
    /// callers that store option byte reads as a single word.
    pub fn option_byte_sentinel(&self) -> Option<u16> {
        match self {
            Self::OptionByteCorrupted { .. } => Some(OPTION_BYTE_ERROR),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfRange { addr } => {
                write!(f, "address 0x{:06X} is outside program and data memory", addr)
            }
            Self::BlockOutOfRange { region, block } => {
                write!(f, "block {} is out of range for {}", block, region)
            }
            Self::InvalidBufferLength { expected, actual } => write!(
                f,
                "block buffer must be {} bytes, got {}",
                expected, actual
            ),
            Self::InvalidOptionByteAddress { addr } => {
                write!(f, "0x{:04X} is not an option byte address", addr)
            }
            Self::Timeout => write!(f, "flash operation timed out"),
            Self::WriteProtected => write!(f, "write protection error"),
            Self::OptionByteCorrupted {
                addr,
                value,
                complement,
            } => write!(
                f,
                "option byte at 0x{:04X} corrupted: value 0x{:02X}, complement 0x{:02X}",
                addr, value, complement
            ),
            Self::PlacementViolation { region } => {
                write!(f, "block routines execute from {} being modified", region)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
