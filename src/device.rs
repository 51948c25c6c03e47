//! Device selection and the emulated target
//!
//! Every command runs against a [`DummyController`] whose address space is
//! loaded from an image file and, for commands that modify memory, written
//! back afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use iapflash_core::profile::{NamedProfile, ProfileDatabase};
use iapflash_core::FlashController;
use iapflash_dummy::{DummyConfig, DummyController};

use crate::error::{CliError, Result};

/// An opened device: profile, controller and backing image
pub struct Session {
    /// Profile the device was opened with
    pub device: NamedProfile,
    /// Flash controller driving the emulated device
    pub flash: FlashController<DummyController>,
    image: PathBuf,
}

impl Session {
    /// Write the emulated address space back to the image file
    pub fn save(&self) -> Result<()> {
        fs::write(&self.image, self.flash.bus().memory())?;
        log::debug!(
            "Saved {} bytes to {}",
            self.flash.bus().memory().len(),
            self.image.display()
        );
        Ok(())
    }
}

/// Load the device database from the specified path or default locations
///
/// Built-in presets are always available; database entries with the same
/// name override them.
pub fn load_profile_database(path: Option<&Path>) -> Result<ProfileDatabase> {
    let mut db = ProfileDatabase::with_presets();

    if let Some(path) = path {
        // User specified a path
        if path.is_dir() {
            db.load_dir(path)?;
        } else if path.is_file() {
            db.load_file(path)?;
        } else {
            return Err(CliError::DatabaseNotFound(path.to_path_buf()));
        }
    } else {
        let default_paths = [
            PathBuf::from("devices"),
            PathBuf::from("/usr/share/iapflash/devices"),
            PathBuf::from("/usr/local/share/iapflash/devices"),
        ];

        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => {
                        log::debug!("Loaded {} devices from {}", count, dir.display());
                    }
                    Err(e) => {
                        log::warn!("Failed to load devices from {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }

    Ok(db)
}

/// Open the emulated device `name`, backed by `image`
pub fn open(db: &ProfileDatabase, name: &str, image: &Path) -> Result<Session> {
    let device = db
        .find(name)
        .cloned()
        .ok_or_else(|| CliError::UnknownDevice(name.to_string()))?;

    let mut dummy = DummyController::new(DummyConfig::for_profile(device.profile));
    if image.exists() {
        let data = fs::read(image)?;
        let loaded = dummy.load_image(&data);
        if loaded < data.len() {
            log::warn!(
                "Image {} is larger than the address space, ignoring {} bytes",
                image.display(),
                data.len() - loaded
            );
        }
        log::debug!("Loaded {} bytes from {}", loaded, image.display());
    } else {
        log::info!("Image {} not found, starting blank", image.display());
    }

    log::info!("Using device {} ({})", device.name, device.family);
    let flash = FlashController::new(dummy, device.profile);
    Ok(Session {
        device,
        flash,
        image: image.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use iapflash_core::MemoryRegion;
    use std::env;
    use std::process;

    fn temp_image(tag: &str) -> PathBuf {
        env::temp_dir().join(format!("iapflash-{}-{}.img", tag, process::id()))
    }

    #[test]
    fn test_open_unknown_device() {
        let db = load_profile_database(None).unwrap();
        let result = open(&db, "PIC16F84", &temp_image("unknown"));
        assert!(matches!(result, Err(CliError::UnknownDevice(_))));
    }

    #[test]
    fn test_missing_database_path() {
        let result = load_profile_database(Some(Path::new("/nonexistent/iapflash")));
        assert!(matches!(result, Err(CliError::DatabaseNotFound(_))));
    }

    #[test]
    fn test_save_and_reopen() {
        let path = temp_image("reopen");
        let _ = fs::remove_file(&path);
        let db = ProfileDatabase::with_presets();

        let mut session = open(&db, "stm8s103", &path).unwrap();
        session.flash.unlock(MemoryRegion::Data);
        session.flash.program_byte(0x4005, 0x77).unwrap();
        session
            .flash
            .wait_for_last_operation(MemoryRegion::Data)
            .into_result()
            .unwrap();
        session.save().unwrap();

        let mut session = open(&db, "STM8S103", &path).unwrap();
        assert_eq!(session.flash.read_byte(0x4005), Ok(0x77));
        // Unlock state does not survive a reopen
        assert!(!session.flash.is_unlocked(MemoryRegion::Data));

        fs::remove_file(&path).unwrap();
    }
}
