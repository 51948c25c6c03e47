//! List command implementation

use iapflash_core::profile::ProfileDatabase;
use iapflash_core::MemoryRegion;

use super::format_size;

/// List all known device profiles
pub fn list_devices(db: &ProfileDatabase) {
    println!("Known devices:");
    println!();
    println!(
        "{:<12} {:<8} {:>10} {:>10} {:>6} {:>6}",
        "Name", "Family", "Program", "Data", "Block", "Dual"
    );
    println!("{}", "-".repeat(57));

    for device in db.iter() {
        let p = &device.profile;
        println!(
            "{:<12} {:<8} {:>10} {:>10} {:>6} {:>6}",
            device.name,
            device.family,
            format_size(p.region(MemoryRegion::Program).size),
            format_size(p.region(MemoryRegion::Data).size),
            p.block_size,
            if p.dual_voltage_erase { "yes" } else { "no" }
        );
    }
}
