//! Flash enums and their register encodings

use core::fmt;

use crate::regs::{Cr1, Cr2, Iapsr, FLASH_DUKR, FLASH_PUKR, RASS_KEY1, RASS_KEY2};

/// Memory array targeted by an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Program memory (flash)
    Program,
    /// Data memory (EEPROM)
    Data,
}

impl MemoryRegion {
    /// Key register the unlock sequence is written to
    pub const fn key_register(self) -> u32 {
        match self {
            Self::Program => FLASH_PUKR,
            Self::Data => FLASH_DUKR,
        }
    }

    /// Unlock keys in the order the hardware expects them
    ///
    /// Data memory takes the keys in reverse order.
    pub const fn keys(self) -> [u8; 2] {
        match self {
            Self::Program => [RASS_KEY1, RASS_KEY2],
            Self::Data => [RASS_KEY2, RASS_KEY1],
        }
    }

    /// IAPSR bit reporting that the region is unlocked
    pub const fn unlock_flag(self) -> Iapsr {
        match self {
            Self::Program => Iapsr::PUL,
            Self::Data => Iapsr::DUL,
        }
    }

    /// Mask ANDed into IAPSR to lock the region
    pub const fn lock_mask(self) -> u8 {
        !self.unlock_flag().bits()
    }
}

impl fmt::Display for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program => write!(f, "program memory"),
            Self::Data => write!(f, "data memory"),
        }
    }
}

/// Block programming mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgrammingMode {
    /// Erase then program (CR2.PRG)
    #[default]
    Standard,
    /// Program without erase (CR2.FPRG)
    Fast,
}

impl ProgrammingMode {
    /// CR2 bit arming this mode
    pub const fn cr2_bit(self) -> Cr2 {
        match self {
            Self::Standard => Cr2::PRG,
            Self::Fast => Cr2::FPRG,
        }
    }
}

/// Flash power state in halt and active-halt modes (CR1.HALT / CR1.AHALT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LowPowerMode {
    /// Standby in both halt and active-halt (reset value)
    PowerDownStandby = 0x00,
    /// Power-down in active-halt, standby in halt
    PowerDown = 0x04,
    /// Power-down in halt, standby in active-halt
    Standby = 0x08,
    /// Power-down in both halt and active-halt
    StandbyPowerDown = 0x0C,
}

impl LowPowerMode {
    /// Decode the low power field of CR1
    pub fn from_cr1(cr1: u8) -> Self {
        match Cr1::from_bits_truncate(cr1) & Cr1::LP_MASK {
            x if x == Cr1::AHALT => Self::PowerDown,
            x if x == Cr1::HALT => Self::Standby,
            x if x == Cr1::LP_MASK => Self::StandbyPowerDown,
            _ => Self::PowerDownStandby,
        }
    }

    /// CR1 bits for this mode
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Byte programming time (CR1.FIX)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ProgrammingTime {
    /// Erase is skipped when the target is already erased
    #[default]
    Standard = 0x00,
    /// Always erase then program
    Fixed = 0x01,
}

impl ProgrammingTime {
    /// Decode the FIX bit of CR1
    pub fn from_cr1(cr1: u8) -> Self {
        if Cr1::from_bits_truncate(cr1).contains(Cr1::FIX) {
            Self::Fixed
        } else {
            Self::Standard
        }
    }

    /// CR1 bits for this time setting
    pub const fn bits(self) -> u8 {
        self as u8
    }
}
