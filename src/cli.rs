//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let value = parse_hex_u32(s)?;
    u16::try_from(value).map_err(|_| format!("Value out of range for 16 bits: {}", s))
}

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    u8::try_from(value).map_err(|_| format!("Value out of range for 8 bits: {}", s))
}

#[derive(Parser)]
#[command(name = "iapflash")]
#[command(author, version, about = "STM8 flash and data EEPROM programmer", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Device profile name (see list-devices)
    #[arg(short, long, default_value = "STM8S103", global = true)]
    pub device: String,

    /// Path to device database file or directory (contains .ron files)
    /// Defaults to looking in ./devices/ and /usr/share/iapflash/devices/
    #[arg(long, global = true)]
    pub device_db: Option<PathBuf>,

    /// Memory image backing the emulated device (created if missing)
    #[arg(long, default_value = "iapflash.img", global = true)]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Memory region selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionArg {
    /// Program memory (flash)
    Program,
    /// Data memory (EEPROM)
    Data,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show device profile and controller state
    Info {
        /// Print the profile in device database format
        #[arg(long)]
        ron: bool,
    },

    /// List known device profiles
    ListDevices,

    /// Read memory
    Read {
        /// Start address (hex, e.g., 0x8000)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// Write raw bytes to this file instead of printing a hex dump
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Program one byte
    WriteByte {
        /// Address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Byte value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u8)]
        value: u8,
    },

    /// Erase one byte
    EraseByte {
        /// Address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,
    },

    /// Program a 32-bit word
    WriteWord {
        /// Address (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Word value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        value: u32,
    },

    /// Option byte operations
    #[command(subcommand)]
    Option(OptionCommands),

    /// Erase one block
    EraseBlock {
        /// Memory region
        #[arg(short, long, value_enum)]
        region: RegionArg,

        /// Block index within the region
        #[arg(short, long)]
        block: u16,
    },

    /// Program a file block by block
    Write {
        /// Memory region
        #[arg(short, long, value_enum)]
        region: RegionArg,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// First block to program
        #[arg(long, default_value_t = 0)]
        start_block: u16,

        /// Use fast block programming (no erase, target must be blank)
        #[arg(long)]
        fast: bool,

        /// Verify after writing
        #[arg(long)]
        verify: bool,
    },
}

impl Commands {
    /// Returns true if the command can change the memory image
    pub fn modifies_image(&self) -> bool {
        match self {
            Commands::Info { .. } | Commands::ListDevices | Commands::Read { .. } => false,
            Commands::Option(OptionCommands::Read { .. }) => false,
            _ => true,
        }
    }
}

#[derive(Subcommand)]
pub enum OptionCommands {
    /// Read an option byte and its complement
    Read {
        /// Option byte address (hex, e.g., 0x4803)
        #[arg(short, long, value_parser = parse_hex_u16)]
        address: u16,
    },

    /// Program an option byte and its complement
    Write {
        /// Option byte address (hex, e.g., 0x4803)
        #[arg(short, long, value_parser = parse_hex_u16)]
        address: u16,

        /// Option value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u8)]
        value: u8,
    },

    /// Erase an option byte and its complement
    Erase {
        /// Option byte address (hex, e.g., 0x4803)
        #[arg(short, long, value_parser = parse_hex_u16)]
        address: u16,
    },
}
