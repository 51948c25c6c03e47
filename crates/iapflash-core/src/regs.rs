//! STM8 flash controller register definitions
//!
//! Absolute addresses and bit definitions for the FLASH peripheral of STM8S
//! devices. Every register is 8 bits wide.
//!
//! # Redundant encoding
//!
//! CR2 and NCR2 carry the same bit layout. Setting a mode bit in CR2 only
//! arms the mode when the matching bit in NCR2 is cleared, so both registers
//! are always updated together.

use bitflags::bitflags;

// ============================================================================
// Register addresses
// ============================================================================

/// Flash control register 1
pub const FLASH_CR1: u32 = 0x505A;
/// Flash control register 2
pub const FLASH_CR2: u32 = 0x505B;
/// Flash complementary control register 2
pub const FLASH_NCR2: u32 = 0x505C;
/// Flash protection register (boot area size)
pub const FLASH_FPR: u32 = 0x505D;
/// Flash complementary protection register
pub const FLASH_NFPR: u32 = 0x505E;
/// Flash in-application programming status register
pub const FLASH_IAPSR: u32 = 0x505F;
/// Flash program memory unprotection key register
pub const FLASH_PUKR: u32 = 0x5062;
/// Data EEPROM unprotection key register
pub const FLASH_DUKR: u32 = 0x5064;

// ============================================================================
// Unlock keys
// ============================================================================

/// First memory access security key
pub const RASS_KEY1: u8 = 0x56;
/// Second memory access security key
pub const RASS_KEY2: u8 = 0xAE;

// ============================================================================
// Reset values
// ============================================================================

/// CR1 reset value
pub const CR1_RESET: u8 = 0x00;
/// CR2 reset value
pub const CR2_RESET: u8 = 0x00;
/// NCR2 reset value
pub const NCR2_RESET: u8 = 0xFF;
/// IAPSR reset value (high voltage off)
pub const IAPSR_RESET: u8 = 0x40;

/// Boot area granularity reported by FPR
pub const BOOT_PAGE_SIZE: u32 = 512;

// ============================================================================
// Bit definitions
// ============================================================================

bitflags! {
    /// CR1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cr1: u8 {
        /// Fixed byte programming time
        const FIX   = 0x01;
        /// Flash interrupt enable
        const IE    = 0x02;
        /// Power-down in active-halt mode
        const AHALT = 0x04;
        /// Power-down in halt mode
        const HALT  = 0x08;

        /// Low power mode field
        const LP_MASK = Self::AHALT.bits() | Self::HALT.bits();
    }
}

bitflags! {
    /// CR2 mode bits, also the layout of NCR2 (complemented)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cr2: u8 {
        /// Standard block programming
        const PRG   = 0x01;
        /// Fast block programming
        const FPRG  = 0x10;
        /// Block erase
        const ERASE = 0x20;
        /// Word programming
        const WPRG  = 0x40;
        /// Write option bytes
        const OPT   = 0x80;
    }
}

bitflags! {
    /// IAPSR status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Iapsr: u8 {
        /// Write attempted to a protected page
        const WR_PG_DIS = 0x01;
        /// Program memory unlocked
        const PUL       = 0x02;
        /// End of programming (write or erase) operation
        const EOP       = 0x04;
        /// Data EEPROM unlocked
        const DUL       = 0x08;
        /// High voltage off (no operation in progress)
        const HVOFF     = 0x40;
    }
}
