//! Byte and word command implementations

use iapflash_core::{FlashController, MemoryRegion, RegisterFile};

use crate::device::Session;
use crate::error::Result;

use super::with_unlocked;

fn region_of<R: RegisterFile>(
    flash: &FlashController<R>,
    addr: u32,
    len: u32,
) -> Result<MemoryRegion> {
    Ok(flash.profile().check_span(addr, len)?)
}

/// Program one byte
pub fn run_write_byte(session: &mut Session, addr: u32, value: u8) -> Result<()> {
    let region = region_of(&session.flash, addr, 1)?;
    with_unlocked(&mut session.flash, region, |flash| {
        flash.program_byte(addr, value)?;
        Ok(flash.wait_for_last_operation(region).into_result()?)
    })?;
    println!("Programmed 0x{:02X} at 0x{:06X}", value, addr);
    Ok(())
}

/// Erase one byte
pub fn run_erase_byte(session: &mut Session, addr: u32) -> Result<()> {
    let region = region_of(&session.flash, addr, 1)?;
    with_unlocked(&mut session.flash, region, |flash| {
        flash.erase_byte(addr)?;
        Ok(flash.wait_for_last_operation(region).into_result()?)
    })?;
    println!("Erased byte at 0x{:06X}", addr);
    Ok(())
}

/// Program a 32-bit word
pub fn run_write_word(session: &mut Session, addr: u32, value: u32) -> Result<()> {
    let region = region_of(&session.flash, addr, 4)?;
    with_unlocked(&mut session.flash, region, |flash| {
        flash.program_word(addr, value)?;
        Ok(flash.wait_for_last_operation(region).into_result()?)
    })?;
    println!("Programmed word 0x{:08X} at 0x{:06X}", value, addr);
    Ok(())
}
