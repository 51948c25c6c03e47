//! iapflash - STM8 flash and data EEPROM programmer
//!
//! Drives the `iapflash-core` programming engine against an emulated STM8
//! flash controller whose memory is kept in an image file. This exercises the
//! exact register sequences the engine issues on a real device: unlock keys,
//! mode arming, block triggers and status polling.
//!
//! Device profiles come from the built-in presets and, optionally, a RON
//! device database (`--device-db` or `./devices/`).

mod cli;
mod commands;
mod device;
mod error;

use clap::Parser;
use cli::{Cli, Commands, OptionCommands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load device database
    let db = match device::load_profile_database(cli.device_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load device database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} device profiles", db.len());

    if let Commands::ListDevices = cli.command {
        commands::list_devices(&db);
        return Ok(());
    }

    let mut session = device::open(&db, &cli.device, &cli.image)?;
    let modifies_image = cli.command.modifies_image();

    match cli.command {
        Commands::ListDevices => {}
        Commands::Info { ron } => commands::show_info(&mut session, ron)?,
        Commands::Read {
            address,
            length,
            output,
        } => commands::read::run_read(&mut session, address, length, output.as_deref())?,
        Commands::WriteByte { address, value } => {
            commands::byte::run_write_byte(&mut session, address, value)?
        }
        Commands::EraseByte { address } => commands::byte::run_erase_byte(&mut session, address)?,
        Commands::WriteWord { address, value } => {
            commands::byte::run_write_word(&mut session, address, value)?
        }
        Commands::Option(subcmd) => match subcmd {
            OptionCommands::Read { address } => commands::option::run_read(&mut session, address)?,
            OptionCommands::Write { address, value } => {
                commands::option::run_write(&mut session, address, value)?
            }
            OptionCommands::Erase { address } => {
                commands::option::run_erase(&mut session, address)?
            }
        },
        Commands::EraseBlock { region, block } => {
            commands::block::run_erase_block(&mut session, region.into(), block)?
        }
        Commands::Write {
            region,
            input,
            start_block,
            fast,
            verify,
        } => commands::block::run_write(
            &mut session,
            region.into(),
            &input,
            start_block,
            fast,
            verify,
        )?,
    }

    if modifies_image {
        session.save()?;
    }

    Ok(())
}
