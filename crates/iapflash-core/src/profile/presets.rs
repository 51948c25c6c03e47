//! Built-in device profiles
//!
//! One preset per STM8S density class. Part numbers sharing a class share a
//! profile, see the aliases in [`PRESETS`].

use super::{
    DeviceProfile, EraseTrigger, MemoryRange, DEFAULT_OPERATION_TIMEOUT, DEFAULT_ROP_ADDRESS,
};

const OPTION_BYTES: MemoryRange = MemoryRange::new(0x4800, 0x80);
const PROGRAM_START: u32 = 0x8000;
const DATA_START: u32 = 0x4000;

/// High density (STM8S208/207/007, STM8AF52/62): 128 KiB flash, 2 KiB EEPROM
pub const STM8S208: DeviceProfile = DeviceProfile {
    program: MemoryRange::new(PROGRAM_START, 128 * 1024),
    data: MemoryRange::new(DATA_START, 2 * 1024),
    option_bytes: OPTION_BYTES,
    ram: MemoryRange::new(0x0000, 6 * 1024),
    rop_address: DEFAULT_ROP_ADDRESS,
    block_size: 128,
    dual_voltage_erase: true,
    erase_trigger: EraseTrigger::ByteWrites,
    operation_timeout: DEFAULT_OPERATION_TIMEOUT,
};

/// Medium density (STM8S105/005, STM8AF626x): 32 KiB flash, 1 KiB EEPROM
pub const STM8S105: DeviceProfile = DeviceProfile {
    program: MemoryRange::new(PROGRAM_START, 32 * 1024),
    data: MemoryRange::new(DATA_START, 1024),
    option_bytes: OPTION_BYTES,
    ram: MemoryRange::new(0x0000, 2 * 1024),
    rop_address: DEFAULT_ROP_ADDRESS,
    block_size: 128,
    dual_voltage_erase: true,
    erase_trigger: EraseTrigger::WordStore,
    operation_timeout: DEFAULT_OPERATION_TIMEOUT,
};

/// Low density (STM8S103/003/903, STM8AF622x): 8 KiB flash, 640 B EEPROM
pub const STM8S103: DeviceProfile = DeviceProfile {
    program: MemoryRange::new(PROGRAM_START, 8 * 1024),
    data: MemoryRange::new(DATA_START, 640),
    option_bytes: OPTION_BYTES,
    ram: MemoryRange::new(0x0000, 1024),
    rop_address: DEFAULT_ROP_ADDRESS,
    block_size: 64,
    dual_voltage_erase: false,
    erase_trigger: EraseTrigger::WordStore,
    operation_timeout: DEFAULT_OPERATION_TIMEOUT,
};

/// A built-in profile and the part number it is listed under
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    /// Part number
    pub name: &'static str,
    /// Device description
    pub profile: DeviceProfile,
}

/// All built-in presets, including part number aliases
pub const PRESETS: &[Preset] = &[
    Preset {
        name: "STM8S208",
        profile: STM8S208,
    },
    Preset {
        name: "STM8S207",
        profile: STM8S208,
    },
    Preset {
        name: "STM8S007",
        profile: STM8S208,
    },
    Preset {
        name: "STM8AF52",
        profile: STM8S208,
    },
    Preset {
        name: "STM8AF62",
        profile: STM8S208,
    },
    Preset {
        name: "STM8S105",
        profile: STM8S105,
    },
    Preset {
        name: "STM8S005",
        profile: STM8S105,
    },
    Preset {
        name: "STM8AF626",
        profile: STM8S105,
    },
    Preset {
        name: "STM8S103",
        profile: STM8S103,
    },
    Preset {
        name: "STM8S003",
        profile: STM8S103,
    },
    Preset {
        name: "STM8S903",
        profile: STM8S103,
    },
    Preset {
        name: "STM8AF622",
        profile: STM8S103,
    },
];

/// Find a built-in preset by part number (case-insensitive)
pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
