//! Device database for runtime loading and lookup
//!
//! This module provides the `ProfileDatabase` type for loading device
//! definitions from RON files at runtime:
//!
//! ```ron
//! (
//!     family: "STM8S",
//!     devices: [
//!         (
//!             name: "STM8S103F3",
//!             program: (start: 0x8000, size: KiB(8)),
//!             data: (start: 0x4000, size: B(640)),
//!             ram: (start: 0x0000, size: KiB(1)),
//!             block_size: 64,
//!             erase_trigger: WordStore,
//!         ),
//!     ],
//! )
//! ```

use alloc::{format, string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::{
    DeviceProfile, EraseTrigger, MemoryRange, PRESETS, DEFAULT_OPERATION_TIMEOUT,
    DEFAULT_ROP_ADDRESS,
};

/// Error type for device database operations
#[derive(Debug)]
pub enum ProfileDbError {
    /// I/O error reading files
    Io(io::Error),
    /// RON parsing error
    Parse(ron::error::SpannedError),
    /// RON serialization error
    Serialize(ron::Error),
    /// Validation error
    Validation(String),
}

impl From<io::Error> for ProfileDbError {
    fn from(e: io::Error) -> Self {
        ProfileDbError::Io(e)
    }
}

impl From<ron::error::SpannedError> for ProfileDbError {
    fn from(e: ron::error::SpannedError) -> Self {
        ProfileDbError::Parse(e)
    }
}

impl From<ron::Error> for ProfileDbError {
    fn from(e: ron::Error) -> Self {
        ProfileDbError::Serialize(e)
    }
}

impl std::fmt::Display for ProfileDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileDbError::Io(e) => write!(f, "I/O error: {}", e),
            ProfileDbError::Parse(e) => write!(f, "Parse error: {}", e),
            ProfileDbError::Serialize(e) => write!(f, "Serialize error: {}", e),
            ProfileDbError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ProfileDbError {}

// ============================================================================
// RON (de)serialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
}

impl Size {
    /// Convert to bytes, `None` if the size does not fit in 32 bits
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
        }
    }
}

impl From<u32> for Size {
    fn from(bytes: u32) -> Self {
        if bytes != 0 && bytes % 1024 == 0 {
            Size::KiB(bytes / 1024)
        } else {
            Size::B(bytes)
        }
    }
}

/// Address range in RON format
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize)]
struct RangeDef {
    start: u32,
    size: Size,
}

impl RangeDef {
    fn to_range(self, device: &str, field: &str) -> Result<MemoryRange, ProfileDbError> {
        let size = self.size.to_bytes().ok_or_else(|| {
            ProfileDbError::Validation(format!("{}: {} size overflows", device, field))
        })?;
        Ok(MemoryRange::new(self.start, size))
    }
}

impl From<MemoryRange> for RangeDef {
    fn from(range: MemoryRange) -> Self {
        RangeDef {
            start: range.start,
            size: range.size.into(),
        }
    }
}

fn default_option_bytes() -> RangeDef {
    RangeDef {
        start: 0x4800,
        size: Size::B(0x80),
    }
}

fn default_rop_address() -> u16 {
    DEFAULT_ROP_ADDRESS
}

fn default_operation_timeout() -> u16 {
    DEFAULT_OPERATION_TIMEOUT
}

/// Single device definition in RON format
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
struct DeviceDef {
    name: String,
    program: RangeDef,
    data: RangeDef,
    #[serde(default = "default_option_bytes")]
    option_bytes: RangeDef,
    ram: RangeDef,
    #[serde(default = "default_rop_address")]
    rop_address: u16,
    block_size: u16,
    #[serde(default)]
    dual_voltage_erase: bool,
    #[serde(default)]
    erase_trigger: EraseTrigger,
    #[serde(default = "default_operation_timeout")]
    operation_timeout: u16,
}

/// Device family containing multiple devices
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
struct FamilyDef {
    family: String,
    devices: Vec<DeviceDef>,
}

// ============================================================================
// Device database
// ============================================================================

/// A device profile together with its names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProfile {
    /// Device family (e.g., "STM8S")
    pub family: String,
    /// Part number (e.g., "STM8S103F3")
    pub name: String,
    /// Device description
    pub profile: DeviceProfile,
}

impl NamedProfile {
    /// Render this profile in the database file format
    pub fn to_ron(&self) -> Result<String, ProfileDbError> {
        let p = &self.profile;
        let def = FamilyDef {
            family: self.family.clone(),
            devices: alloc::vec![DeviceDef {
                name: self.name.clone(),
                program: p.program.into(),
                data: p.data.into(),
                option_bytes: p.option_bytes.into(),
                ram: p.ram.into(),
                rop_address: p.rop_address,
                block_size: p.block_size,
                dual_voltage_erase: p.dual_voltage_erase,
                erase_trigger: p.erase_trigger,
                operation_timeout: p.operation_timeout,
            }],
        };
        let config = ron::ser::PrettyConfig::new().struct_names(false);
        Ok(ron::ser::to_string_pretty(&def, config)?)
    }
}

/// Runtime device database
///
/// Holds a collection of device definitions that can be loaded from RON files.
#[derive(Debug, Clone, Default)]
pub struct ProfileDatabase {
    devices: Vec<NamedProfile>,
}

impl ProfileDatabase {
    /// Create an empty device database
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Create a database holding the built-in presets
    pub fn with_presets() -> Self {
        let devices = PRESETS
            .iter()
            .map(|preset| NamedProfile {
                family: String::from("STM8"),
                name: String::from(preset.name),
                profile: preset.profile,
            })
            .collect();
        Self { devices }
    }

    /// Load device definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ProfileDbError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load device definitions from a RON string
    ///
    /// A definition whose name matches an existing entry replaces it.
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ProfileDbError> {
        let family_def: FamilyDef = ron::from_str(content)?;
        let count = family_def.devices.len();

        for def in family_def.devices {
            let name = def.name.as_str();
            let profile = DeviceProfile {
                program: def.program.to_range(name, "program")?,
                data: def.data.to_range(name, "data")?,
                option_bytes: def.option_bytes.to_range(name, "option_bytes")?,
                ram: def.ram.to_range(name, "ram")?,
                rop_address: def.rop_address,
                block_size: def.block_size,
                dual_voltage_erase: def.dual_voltage_erase,
                erase_trigger: def.erase_trigger,
                operation_timeout: def.operation_timeout,
            };
            profile
                .validate()
                .map_err(|msg| ProfileDbError::Validation(format!("{}: {}", def.name, msg)))?;

            let named = NamedProfile {
                family: family_def.family.clone(),
                name: def.name,
                profile,
            };
            match self
                .devices
                .iter_mut()
                .find(|d| d.name.eq_ignore_ascii_case(&named.name))
            {
                Some(existing) => {
                    log::debug!("Overriding device definition {}", named.name);
                    *existing = named;
                }
                None => self.devices.push(named),
            }
        }

        Ok(count)
    }

    /// Load all RON files from a directory
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, ProfileDbError> {
        let mut total = 0;

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "ron") {
                total += self.load_file(&path)?;
            }
        }

        Ok(total)
    }

    /// Get all devices in the database
    pub fn devices(&self) -> &[NamedProfile] {
        &self.devices
    }

    /// Get the number of devices in the database
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Find a device by exact part number (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&NamedProfile> {
        self.devices
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    /// Find devices by name (case-insensitive partial match)
    pub fn find_by_name(&self, name: &str) -> Vec<&NamedProfile> {
        let name_lower = name.to_lowercase();
        self.devices
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&name_lower))
            .collect()
    }

    /// Iterate over all devices
    pub fn iter(&self) -> impl Iterator<Item = &NamedProfile> {
        self.devices.iter()
    }
}
