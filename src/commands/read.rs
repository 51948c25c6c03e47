//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use iapflash_core::{FlashController, RegisterFile};
use std::fs;
use std::path::Path;

use crate::device::Session;
use crate::error::Result;

/// Reads larger than this get a progress bar
const PROGRESS_THRESHOLD: usize = 4096;

/// Run the read command
pub fn run_read(
    session: &mut Session,
    addr: u32,
    length: u32,
    output: Option<&Path>,
) -> Result<()> {
    let data = read_with_progress(&mut session.flash, addr, length as usize)?;

    match output {
        Some(path) => {
            fs::write(path, &data)?;
            println!("Wrote {} bytes to {:?}", data.len(), path);
        }
        None => print!("{}", hex_dump(addr, &data)),
    }

    Ok(())
}

/// Read `length` bytes at `addr` in block-sized chunks
pub fn read_with_progress<R: RegisterFile>(
    flash: &mut FlashController<R>,
    addr: u32,
    length: usize,
) -> Result<Vec<u8>> {
    let mut data = vec![0u8; length];
    // Validate the whole span before the first chunk
    flash.profile().check_span(addr, length as u32)?;

    let pb = if length > PROGRESS_THRESHOLD {
        let pb = ProgressBar::new(length as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let chunk_size = flash.profile().block_size as usize;
    for (i, chunk) in data.chunks_mut(chunk_size).enumerate() {
        flash.read(addr + (i * chunk_size) as u32, chunk)?;
        if let Some(pb) = &pb {
            pb.inc(chunk.len() as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Read complete");
    }
    Ok(data)
}

/// Format `data` as a hex dump starting at `addr`
pub fn hex_dump(addr: u32, data: &[u8]) -> String {
    let mut out = String::new();
    for (i, line) in data.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02X}", b)).collect();
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!(
            "0x{:06X}: {:<47}  |{}|\n",
            addr + (i * 16) as u32,
            hex.join(" "),
            ascii
        ));
    }
    out
}
