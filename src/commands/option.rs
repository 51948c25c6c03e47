//! Option byte command implementations

use iapflash_core::MemoryRegion;

use crate::device::Session;
use crate::error::Result;

use super::with_unlocked;

/// Read an option byte
pub fn run_read(session: &mut Session, addr: u16) -> Result<()> {
    let value = session.flash.read_option_byte(addr)?;
    if addr == session.flash.profile().rop_address {
        println!("0x{:04X}: 0x{:02X} (ROP)", addr, value);
    } else {
        println!(
            "0x{:04X}: 0x{:02X} (complement 0x{:02X})",
            addr,
            value >> 8,
            value & 0xFF
        );
    }
    Ok(())
}

/// Program an option byte
///
/// Option bytes are written with data memory unlocked.
pub fn run_write(session: &mut Session, addr: u16, value: u8) -> Result<()> {
    with_unlocked(&mut session.flash, MemoryRegion::Data, |flash| {
        Ok(flash.program_option_byte(addr, value)?.into_result()?)
    })?;
    println!("Programmed option byte 0x{:04X} = 0x{:02X}", addr, value);
    Ok(())
}

/// Erase an option byte
pub fn run_erase(session: &mut Session, addr: u16) -> Result<()> {
    with_unlocked(&mut session.flash, MemoryRegion::Data, |flash| {
        Ok(flash.erase_option_byte(addr)?.into_result()?)
    })?;
    println!("Erased option byte 0x{:04X}", addr);
    Ok(())
}
