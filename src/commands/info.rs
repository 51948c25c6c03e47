//! Info command implementation

use iapflash_core::regs::{Iapsr, FLASH_IAPSR};
use iapflash_core::{MemoryRegion, RegisterFile};

use crate::device::Session;
use crate::error::Result;

use super::format_size;

/// Show the device profile and controller state
pub fn show_info(session: &mut Session, as_ron: bool) -> Result<()> {
    if as_ron {
        println!("{}", session.device.to_ron()?);
        return Ok(());
    }

    let p = *session.flash.profile();
    println!("Device: {} ({})", session.device.name, session.device.family);
    for region in [MemoryRegion::Program, MemoryRegion::Data] {
        let range = p.region(region);
        println!(
            "  {:<15} 0x{:06X}..0x{:06X} ({}, {} blocks of {} bytes)",
            format!("{}:", region),
            range.start,
            range.end(),
            format_size(range.size),
            p.block_count(region),
            p.block_size
        );
    }
    println!(
        "  {:<15} 0x{:04X}..0x{:04X} (ROP at 0x{:04X})",
        "option bytes:",
        p.option_bytes.start,
        p.option_bytes.end(),
        p.rop_address
    );
    println!("  {:<15} {:?}", "erase trigger:", p.erase_trigger);
    println!(
        "  {:<15} {}",
        "wait masks:",
        if p.dual_voltage_erase {
            "dual voltage (HVOFF for data memory)"
        } else {
            "single (EOP)"
        }
    );

    let flash = &mut session.flash;
    println!();
    println!("Controller:");
    println!("  {:<17} {}", "boot area:", format_size(flash.boot_size()));
    println!("  {:<17} {:?}", "low power mode:", flash.low_power_mode());
    println!("  {:<17} {:?}", "programming time:", flash.programming_time());

    // Single read, the hardware clears EOP and WR_PG_DIS on access
    let iapsr = Iapsr::from_bits_truncate(flash.bus_mut().read8(FLASH_IAPSR));
    let names: Vec<&str> = iapsr.iter_names().map(|(name, _)| name).collect();
    println!("  {:<17} {}", "status flags:", names.join(" "));

    Ok(())
}
