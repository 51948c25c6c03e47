//! Block erase and block write command implementations

use indicatif::{ProgressBar, ProgressStyle};
use iapflash_core::{
    ExecutionRange, FlashController, MemoryRegion, ProgrammingMode, RegisterFile,
};
use std::fs;
use std::path::Path;

use crate::device::Session;
use crate::error::{CliError, Result};

use super::with_unlocked;

/// Host-side block routines run from the device's RAM window
fn ram_placement<R: RegisterFile>(flash: &FlashController<R>) -> ExecutionRange {
    flash.profile().ram.into()
}

/// Erase one block
pub fn run_erase_block(session: &mut Session, region: MemoryRegion, block: u16) -> Result<()> {
    with_unlocked(&mut session.flash, region, |flash| {
        let placement = ram_placement(flash);
        let mut routines = flash.ram_routines(placement);
        routines.erase_block(region, block)?;
        Ok(routines.wait_for_last_operation(region).into_result()?)
    })?;
    println!("Erased {} block {}", region, block);
    Ok(())
}

/// Program a file into consecutive blocks starting at `start_block`
pub fn run_write(
    session: &mut Session,
    region: MemoryRegion,
    input: &Path,
    start_block: u16,
    fast: bool,
    verify: bool,
) -> Result<()> {
    let data = fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    let mode = if fast {
        ProgrammingMode::Fast
    } else {
        ProgrammingMode::Standard
    };
    let written = write_blocks(&mut session.flash, region, start_block, &data, mode)?;

    if verify {
        verify_blocks(&mut session.flash, region, start_block, &data)?;
        println!("Verification passed");
    }

    println!("Programmed {} blocks of {}", written, region);
    Ok(())
}

/// Program `data` block by block, zero-padding the final block
///
/// Returns the number of blocks programmed.
pub fn write_blocks<R: RegisterFile>(
    flash: &mut FlashController<R>,
    region: MemoryRegion,
    start_block: u16,
    data: &[u8],
    mode: ProgrammingMode,
) -> Result<usize> {
    let profile = *flash.profile();
    let block_size = profile.block_size as usize;
    let available =
        (profile.block_count(region) as usize).saturating_sub(start_block as usize) * block_size;
    if data.len() > available {
        return Err(CliError::InputTooLarge {
            size: data.len(),
            available,
            start_block,
        });
    }

    let blocks = data.len().div_ceil(block_size);
    let pb = ProgressBar::new(data.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}")?
            .progress_chars("#>-"),
    );

    with_unlocked(flash, region, |flash| {
        let placement = ram_placement(flash);
        let mut routines = flash.ram_routines(placement);
        let mut buffer = vec![0u8; block_size];

        for (i, chunk) in data.chunks(block_size).enumerate() {
            let block = start_block + i as u16;
            buffer.fill(0);
            buffer[..chunk.len()].copy_from_slice(chunk);

            pb.set_message(format!("block {}", block));
            routines.program_block(region, block, mode, &buffer)?;
            routines.wait_for_last_operation(region).into_result()?;
            pb.inc(chunk.len() as u64);
        }
        Ok(())
    })?;

    pb.finish_with_message("Write complete");
    Ok(blocks)
}

/// Compare memory against `data` starting at `start_block`
pub fn verify_blocks<R: RegisterFile>(
    flash: &mut FlashController<R>,
    region: MemoryRegion,
    start_block: u16,
    data: &[u8],
) -> Result<()> {
    let base = flash.profile().block_address(region, start_block)?;
    let mut actual = vec![0u8; data.len()];
    flash.read(base, &mut actual)?;

    if let Some(offset) = data.iter().zip(&actual).position(|(a, b)| a != b) {
        return Err(CliError::VerifyFailed {
            addr: base + offset as u32,
            expected: data[offset],
            actual: actual[offset],
        });
    }
    Ok(())
}
