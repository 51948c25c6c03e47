//! iapflash-dummy - Emulated STM8 flash controller for testing
//!
//! This crate provides [`DummyController`], an in-memory model of the STM8
//! flash controller and its memory arrays. It implements
//! [`RegisterFile`](iapflash_core::RegisterFile), so the flash engine can be
//! driven against it exactly as against real hardware:
//!
//! - unlock key state machines for PUKR and DUKR, including the lockout
//!   after a wrong key
//! - CR2/NCR2 mode arming with word, block and erase sequencing
//! - IAPSR status bits with configurable completion latency
//! - write protection of locked regions, the user boot area and the option
//!   bytes
//! - a trace of every bus access

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use iapflash_core::profile::{DeviceProfile, STM8S103};
#[cfg(feature = "alloc")]
use iapflash_core::regs::*;
#[cfg(feature = "alloc")]
use iapflash_core::{MemoryRegion, RegisterFile};

/// Configuration for the emulated controller
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device being emulated
    pub profile: DeviceProfile,
    /// IAPSR reads that see an operation still running before it completes
    pub completion_polls: u32,
    /// Never complete started operations
    pub stall: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            profile: STM8S103,
            completion_polls: 0,
            stall: false,
        }
    }
}

impl DummyConfig {
    /// Configuration emulating `profile` with immediate completion
    pub fn for_profile(profile: DeviceProfile) -> Self {
        Self {
            profile,
            ..Self::default()
        }
    }
}

/// One recorded bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusAccess {
    /// Byte read and the value returned
    Read8 {
        /// Address read
        addr: u32,
        /// Value returned
        value: u8,
    },
    /// Byte write
    Write8 {
        /// Address written
        addr: u32,
        /// Value written
        value: u8,
    },
    /// 32-bit store
    Write32 {
        /// Address written
        addr: u32,
        /// Value written
        value: u32,
    },
}

impl BusAccess {
    /// Returns true for writes of either width
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Read8 { .. })
    }

    /// Address of the access
    pub fn addr(&self) -> u32 {
        match *self {
            Self::Read8 { addr, .. } | Self::Write8 { addr, .. } | Self::Write32 { addr, .. } => {
                addr
            }
        }
    }
}

/// Unlock key register state
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    /// Waiting for the first key
    Idle,
    /// First key accepted
    FirstKey,
    /// Wrong key seen, register ignores writes until reset
    Faulted,
}

/// Emulated flash controller
#[cfg(feature = "alloc")]
pub struct DummyController {
    config: DummyConfig,
    memory: Vec<u8>,
    cr1: u8,
    cr2: u8,
    ncr2: u8,
    fpr: u8,
    iapsr: u8,
    program_keys: KeyState,
    data_keys: KeyState,
    /// Remaining IAPSR polls before the running operation completes
    pending: Option<u32>,
    /// Bytes collected while a word, block or erase mode is armed
    staged: Vec<(u32, u8)>,
    trace: Vec<BusAccess>,
}

#[cfg(feature = "alloc")]
impl DummyController {
    /// Create an emulated controller with erased memories
    pub fn new(config: DummyConfig) -> Self {
        let p = &config.profile;
        let size = [p.program, p.data, p.option_bytes, p.ram]
            .iter()
            .map(|r| r.end())
            .chain([FLASH_DUKR + 1])
            .max()
            .unwrap_or(0) as usize;

        let mut memory = vec![0x00; size];
        let opt = p.option_bytes;
        for addr in opt.start..opt.end() {
            // Complements sit at even offsets from the ROP byte
            if addr != p.rop_address as u32 && (addr - opt.start) % 2 == 0 {
                memory[addr as usize] = 0xFF;
            }
        }

        let mut dummy = Self {
            config,
            memory,
            cr1: CR1_RESET,
            cr2: CR2_RESET,
            ncr2: NCR2_RESET,
            fpr: 0,
            iapsr: IAPSR_RESET,
            program_keys: KeyState::Idle,
            data_keys: KeyState::Idle,
            pending: None,
            staged: Vec::new(),
            trace: Vec::new(),
        };
        dummy.reset();
        dummy
    }

    /// Create an emulated STM8S103
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Configuration in use
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Mutable configuration, e.g. to stall operations mid-test
    pub fn config_mut(&mut self) -> &mut DummyConfig {
        &mut self.config
    }

    /// Emulate a device reset
    ///
    /// Registers return to their reset values, both regions lock, a faulted
    /// key register recovers and the user boot area size is latched from the
    /// UBC option byte. Memory contents are kept.
    pub fn reset(&mut self) {
        self.cr1 = CR1_RESET;
        self.cr2 = CR2_RESET;
        self.ncr2 = NCR2_RESET;
        self.iapsr = IAPSR_RESET;
        self.program_keys = KeyState::Idle;
        self.data_keys = KeyState::Idle;
        self.pending = None;
        self.staged.clear();

        let ubc = self.config.profile.rop_address as usize + 1;
        self.fpr = match (self.memory.get(ubc), self.memory.get(ubc + 1)) {
            (Some(&v), Some(&n)) if v == !n => v,
            _ => 0,
        };
    }

    /// Full address space image
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable address space image, bypassing the controller
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Replace memory contents from an image and reset
    ///
    /// Copies at most the size of the address space. Returns the number of
    /// bytes copied.
    pub fn load_image(&mut self, image: &[u8]) -> usize {
        let len = image.len().min(self.memory.len());
        self.memory[..len].copy_from_slice(&image[..len]);
        self.reset();
        len
    }

    /// Recorded bus accesses
    pub fn trace(&self) -> &[BusAccess] {
        &self.trace
    }

    /// Forget recorded bus accesses
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Recorded writes
    pub fn writes(&self) -> impl Iterator<Item = &BusAccess> + '_ {
        self.trace.iter().filter(|a| a.is_write())
    }

    /// Number of recorded IAPSR reads
    pub fn status_polls(&self) -> usize {
        self.trace
            .iter()
            .filter(|a| matches!(a, BusAccess::Read8 { addr, .. } if *addr == FLASH_IAPSR))
            .count()
    }

    /// Check whether a region is unlocked
    pub fn is_unlocked(&self, region: MemoryRegion) -> bool {
        self.iapsr & region.unlock_flag().bits() != 0
    }

    /// Size of the write protected user boot area
    pub fn boot_size(&self) -> u32 {
        let mut size = self.fpr as u32 * BOOT_PAGE_SIZE;
        if self.fpr == 0xFF {
            size += BOOT_PAGE_SIZE;
        }
        size
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Modes armed in both CR2 and NCR2
    fn armed(&self) -> Cr2 {
        Cr2::from_bits_truncate(self.cr2 & !self.ncr2)
    }

    /// Hardware clears the mode once the operation is latched
    fn finish_mode(&mut self, mode: Cr2) {
        self.cr2 &= !mode.bits();
        self.ncr2 |= mode.bits();
        self.staged.clear();
    }

    fn start_operation(&mut self) {
        self.iapsr &= !Iapsr::HVOFF.bits();
        self.pending = Some(self.config.completion_polls);
    }

    fn reject_write(&mut self, addr: u32) {
        log::debug!("Dummy: write to protected address 0x{:06X}", addr);
        self.iapsr |= Iapsr::WR_PG_DIS.bits();
    }

    fn read_iapsr(&mut self) -> u8 {
        if let Some(remaining) = self.pending {
            if !self.config.stall {
                if remaining == 0 {
                    self.pending = None;
                    self.iapsr |= (Iapsr::EOP | Iapsr::HVOFF).bits();
                } else {
                    self.pending = Some(remaining - 1);
                }
            }
        }
        let value = self.iapsr;
        self.iapsr &= !(Iapsr::EOP | Iapsr::WR_PG_DIS).bits();
        value
    }

    fn write_key(&mut self, region: MemoryRegion, value: u8) {
        let keys = region.keys();
        let state = match region {
            MemoryRegion::Program => &mut self.program_keys,
            MemoryRegion::Data => &mut self.data_keys,
        };
        let mut unlocked = false;
        *state = match *state {
            KeyState::Idle if value == keys[0] => KeyState::FirstKey,
            KeyState::FirstKey if value == keys[1] => {
                unlocked = true;
                KeyState::Idle
            }
            KeyState::Faulted => KeyState::Faulted,
            _ => {
                log::debug!("Dummy: wrong key 0x{:02X} for {}", value, region);
                KeyState::Faulted
            }
        };
        if unlocked {
            self.iapsr |= region.unlock_flag().bits();
        }
    }

    fn writable(&self, region: MemoryRegion, addr: u32) -> bool {
        if !self.is_unlocked(region) {
            return false;
        }
        let program = self.config.profile.program;
        !(region == MemoryRegion::Program && addr < program.start + self.boot_size())
    }

    fn block_base(&self, region: MemoryRegion, addr: u32) -> u32 {
        let start = self.config.profile.region(region).start;
        let block = self.config.profile.block_size as u32;
        addr - (addr - start) % block
    }

    fn erase_block(&mut self, region: MemoryRegion, addr: u32) {
        let base = self.block_base(region, addr) as usize;
        let block = self.config.profile.block_size as usize;
        log::trace!("Dummy: erasing block at 0x{:06X}", base);
        self.memory[base..base + block].fill(0x00);
        self.finish_mode(Cr2::ERASE);
        self.start_operation();
    }

    fn write_memory(&mut self, region: MemoryRegion, addr: u32, value: u8) {
        if !self.writable(region, addr) {
            self.reject_write(addr);
            return;
        }

        let armed = self.armed();
        if armed.contains(Cr2::ERASE) {
            self.staged.push((addr, value));
            if self.staged.len() == 4 {
                let first = self.staged[0].0;
                self.erase_block(region, first);
            }
        } else if armed.intersects(Cr2::PRG | Cr2::FPRG) {
            self.staged.push((addr, value));
            if self.staged.len() == self.config.profile.block_size as usize {
                let fast = !armed.contains(Cr2::PRG);
                let base = self.block_base(region, self.staged[0].0) as usize;
                if !fast {
                    let block = self.config.profile.block_size as usize;
                    self.memory[base..base + block].fill(0x00);
                }
                for &(a, v) in &self.staged {
                    self.memory[a as usize] |= v;
                }
                self.finish_mode(Cr2::PRG | Cr2::FPRG);
                self.start_operation();
            }
        } else if armed.contains(Cr2::WPRG) {
            self.staged.push((addr, value));
            if self.staged.len() == 4 {
                for &(a, v) in &self.staged {
                    self.memory[a as usize] = v;
                }
                self.finish_mode(Cr2::WPRG);
                self.start_operation();
            }
        } else {
            self.memory[addr as usize] = value;
            self.start_operation();
        }
    }

    fn write_option(&mut self, addr: u32, value: u8) {
        if !self.armed().contains(Cr2::OPT) || !self.is_unlocked(MemoryRegion::Data) {
            self.reject_write(addr);
            return;
        }
        self.memory[addr as usize] = value;
        self.start_operation();
    }

    fn store(&mut self, addr: u32, value: u8) {
        let profile = self.config.profile;
        match addr {
            FLASH_CR1 => self.cr1 = value,
            FLASH_CR2 => self.cr2 = value,
            FLASH_NCR2 => self.ncr2 = value,
            // Only the unlock bits are writable, and only to zero
            FLASH_IAPSR => self.iapsr &= value | !(Iapsr::PUL | Iapsr::DUL).bits(),
            FLASH_PUKR => self.write_key(MemoryRegion::Program, value),
            FLASH_DUKR => self.write_key(MemoryRegion::Data, value),
            FLASH_FPR | FLASH_NFPR => {}
            _ if profile.option_bytes.contains(addr) => self.write_option(addr, value),
            _ => match profile.region_of(addr) {
                Some(region) => self.write_memory(region, addr, value),
                None => {
                    if let Some(cell) = self.memory.get_mut(addr as usize) {
                        *cell = value;
                    }
                }
            },
        }
    }

    fn load(&mut self, addr: u32) -> u8 {
        match addr {
            FLASH_CR1 => self.cr1,
            FLASH_CR2 => self.cr2,
            FLASH_NCR2 => self.ncr2,
            FLASH_FPR => self.fpr,
            FLASH_NFPR => !self.fpr,
            FLASH_IAPSR => self.read_iapsr(),
            FLASH_PUKR | FLASH_DUKR => 0x00,
            _ => self.memory.get(addr as usize).copied().unwrap_or(0x00),
        }
    }
}

#[cfg(feature = "alloc")]
impl RegisterFile for DummyController {
    fn read8(&mut self, addr: u32) -> u8 {
        let value = self.load(addr);
        self.trace.push(BusAccess::Read8 { addr, value });
        value
    }

    fn write8(&mut self, addr: u32, value: u8) {
        self.trace.push(BusAccess::Write8 { addr, value });
        self.store(addr, value);
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.trace.push(BusAccess::Write32 { addr, value });

        if self.armed().contains(Cr2::ERASE) {
            if let Some(region) = self.config.profile.region_of(addr) {
                if !self.writable(region, addr) {
                    self.reject_write(addr);
                } else if value == 0 {
                    self.erase_block(region, addr);
                }
                return;
            }
        }

        for (i, byte) in value.to_be_bytes().iter().enumerate() {
            self.store(addr + i as u32, *byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iapflash_core::profile::{STM8S105, STM8S208};
    use iapflash_core::{
        Error, ExecutionRange, FlashController, FlashStatus, LowPowerMode, ProgrammingMode,
        ProgrammingTime, OPTION_BYTE_ERROR,
    };

    const RAM: ExecutionRange = ExecutionRange::new(0x0000, 0x0400);

    fn controller(config: DummyConfig) -> FlashController<DummyController> {
        let profile = config.profile;
        FlashController::new(DummyController::new(config), profile)
    }

    fn default_controller() -> FlashController<DummyController> {
        controller(DummyConfig::default())
    }

    /// Writes that reached program, data or option memory
    fn memory_writes(flash: &FlashController<DummyController>) -> Vec<BusAccess> {
        let p = *flash.profile();
        flash
            .bus()
            .writes()
            .filter(|a| {
                let addr = a.addr();
                p.program.contains(addr) || p.data.contains(addr) || p.option_bytes.contains(addr)
            })
            .copied()
            .collect()
    }

    #[test]
    fn test_byte_round_trip() {
        let mut flash = default_controller();

        for (region, addr) in [
            (MemoryRegion::Data, 0x4010),
            (MemoryRegion::Program, 0x9FFF),
        ] {
            flash.unlock(region);
            assert!(flash.is_unlocked(region));
            flash.program_byte(addr, 0x42).unwrap();
            assert_eq!(
                flash.wait_for_last_operation(region),
                FlashStatus::EndOfOperation
            );
            assert_eq!(flash.read_byte(addr), Ok(0x42));

            flash.erase_byte(addr).unwrap();
            assert_eq!(
                flash.wait_for_last_operation(region),
                FlashStatus::EndOfOperation
            );
            assert_eq!(flash.read_byte(addr), Ok(0x00));
            flash.lock(region);
            assert!(!flash.is_unlocked(region));
        }
    }

    #[test]
    fn test_unlock_key_sequences() {
        let mut flash = default_controller();

        flash.unlock(MemoryRegion::Program);
        assert_eq!(
            &flash.bus().writes().copied().collect::<Vec<_>>()[..],
            &[
                BusAccess::Write8 {
                    addr: FLASH_PUKR,
                    value: 0x56
                },
                BusAccess::Write8 {
                    addr: FLASH_PUKR,
                    value: 0xAE
                },
            ]
        );
        assert!(flash.is_unlocked(MemoryRegion::Program));
        assert!(!flash.is_unlocked(MemoryRegion::Data));

        flash.bus_mut().clear_trace();
        flash.unlock(MemoryRegion::Data);
        assert_eq!(
            &flash.bus().writes().copied().collect::<Vec<_>>()[..],
            &[
                BusAccess::Write8 {
                    addr: FLASH_DUKR,
                    value: 0xAE
                },
                BusAccess::Write8 {
                    addr: FLASH_DUKR,
                    value: 0x56
                },
            ]
        );
        assert!(flash.is_unlocked(MemoryRegion::Data));
    }

    #[test]
    fn test_data_unlock_rejects_program_key_order() {
        let mut flash = default_controller();

        // Program memory order on the data key register
        flash.bus_mut().write8(FLASH_DUKR, RASS_KEY1);
        flash.bus_mut().write8(FLASH_DUKR, RASS_KEY2);
        assert!(!flash.is_unlocked(MemoryRegion::Data));

        // A wrong key locks the register until reset
        flash.unlock(MemoryRegion::Data);
        assert!(!flash.is_unlocked(MemoryRegion::Data));

        flash.bus_mut().reset();
        flash.unlock(MemoryRegion::Data);
        assert!(flash.is_unlocked(MemoryRegion::Data));
    }

    #[test]
    fn test_write_to_locked_region() {
        let mut flash = default_controller();

        flash.program_byte(0x4000, 0x42).unwrap();
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Data),
            FlashStatus::WriteProtectionError
        );
        assert_eq!(flash.read_byte(0x4000), Ok(0x00));
    }

    #[test]
    fn test_address_out_of_range() {
        let mut flash = default_controller();
        flash.bus_mut().clear_trace();

        assert_eq!(
            flash.program_byte(0x6000, 0x42),
            Err(Error::AddressOutOfRange { addr: 0x6000 })
        );
        assert_eq!(
            flash.program_word(0x9FFE, 0x11223344),
            Err(Error::AddressOutOfRange { addr: 0x9FFE })
        );
        assert!(flash.read_byte(0xA000).is_err());
        assert!(flash.bus().trace().is_empty());
    }

    #[test]
    fn test_read_span() {
        let mut flash = default_controller();
        flash.bus_mut().memory_mut()[0x4000..0x4004].copy_from_slice(&[1, 2, 3, 4]);

        let mut buf = [0u8; 4];
        flash.read(0x4000, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        // Spans must not leave the region
        let mut buf = [0u8; 8];
        assert!(flash.read(0x427C, &mut buf).is_err());
    }

    #[test]
    fn test_program_word_byte_order() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Program);
        flash.bus_mut().clear_trace();

        flash.program_word(0x8800, 0x11223344).unwrap();
        assert_eq!(
            memory_writes(&flash),
            [0x44, 0x33, 0x22, 0x11]
                .iter()
                .enumerate()
                .map(|(i, &value)| BusAccess::Write8 {
                    addr: 0x8800 + i as u32,
                    value
                })
                .collect::<Vec<_>>()
        );
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );
        assert_eq!(&flash.bus().memory()[0x8800..0x8804], &[0x44, 0x33, 0x22, 0x11]);

        // Word mode is cleared by hardware once the word is latched
        assert_eq!(flash.bus_mut().read8(FLASH_CR2), 0x00);
        assert_eq!(flash.bus_mut().read8(FLASH_NCR2), 0xFF);
    }

    #[test]
    fn test_option_byte_round_trip() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Data);

        assert_eq!(
            flash.program_option_byte(0x4803, 0x5A),
            Ok(FlashStatus::EndOfOperation)
        );
        assert_eq!(flash.read_option_byte(0x4803), Ok(0x5AA5));
        assert_eq!(&flash.bus().memory()[0x4803..0x4805], &[0x5A, 0xA5]);

        // OPT is disarmed afterwards
        assert_eq!(flash.bus_mut().read8(FLASH_CR2), 0x00);
        assert_eq!(flash.bus_mut().read8(FLASH_NCR2), 0xFF);

        assert_eq!(
            flash.erase_option_byte(0x4803),
            Ok(FlashStatus::EndOfOperation)
        );
        assert_eq!(flash.read_option_byte(0x4803), Ok(0x00FF));
    }

    /// Check that an option byte access arms OPT, writes, waits, then disarms
    fn assert_option_sequence(trace: &[BusAccess], addr: u32, value: u8, complement: u8) {
        let writes: Vec<BusAccess> = trace.iter().filter(|a| a.is_write()).copied().collect();
        let w = |addr, value| BusAccess::Write8 { addr, value };
        assert_eq!(
            writes,
            [
                w(FLASH_CR2, 0x80),
                w(FLASH_NCR2, 0x7F),
                w(addr, value),
                w(addr + 1, complement),
                w(FLASH_CR2, 0x00),
                w(FLASH_NCR2, 0xFF),
            ]
        );

        let position = |access: BusAccess| trace.iter().position(|a| *a == access);
        let complement_write = position(w(addr + 1, complement)).unwrap();
        let disarm = position(w(FLASH_CR2, 0x00)).unwrap();
        let polls = trace[complement_write..disarm]
            .iter()
            .filter(|a| matches!(a, BusAccess::Read8 { addr, .. } if *addr == FLASH_IAPSR))
            .count();
        assert!(polls >= 1, "no status poll between write and disarm");
    }

    #[test]
    fn test_option_byte_sequence_order() {
        let mut flash = controller(DummyConfig {
            completion_polls: 2,
            ..DummyConfig::default()
        });
        flash.unlock(MemoryRegion::Data);

        flash.bus_mut().clear_trace();
        assert_eq!(
            flash.program_option_byte(0x4803, 0x5A),
            Ok(FlashStatus::EndOfOperation)
        );
        assert_option_sequence(flash.bus().trace(), 0x4803, 0x5A, 0xA5);
        assert_eq!(flash.bus().status_polls(), 3);

        flash.bus_mut().clear_trace();
        assert_eq!(
            flash.erase_option_byte(0x4803),
            Ok(FlashStatus::EndOfOperation)
        );
        assert_option_sequence(flash.bus().trace(), 0x4803, 0x00, 0xFF);
        assert_eq!(flash.bus().status_polls(), 3);
    }

    #[test]
    fn test_option_byte_requires_data_unlock() {
        let mut flash = default_controller();

        assert_eq!(
            flash.program_option_byte(0x4803, 0x5A),
            Ok(FlashStatus::WriteProtectionError)
        );
        assert_eq!(flash.read_option_byte(0x4803), Ok(0x00FF));
    }

    #[test]
    fn test_option_byte_corrupted() {
        let mut flash = default_controller();
        flash.bus_mut().memory_mut()[0x4805] = 0x12;
        flash.bus_mut().memory_mut()[0x4806] = 0x34;

        let err = flash.read_option_byte(0x4805).unwrap_err();
        assert_eq!(
            err,
            Error::OptionByteCorrupted {
                addr: 0x4805,
                value: 0x12,
                complement: 0x34
            }
        );
        assert_eq!(err.option_byte_sentinel(), Some(OPTION_BYTE_ERROR));
        assert_eq!(Error::Timeout.option_byte_sentinel(), None);
    }

    #[test]
    fn test_rop_is_single_byte() {
        let mut flash = default_controller();
        flash.bus_mut().memory_mut()[0x4800] = 0xAA;
        flash.bus_mut().memory_mut()[0x4801] = 0x77;

        // Raw value, no complement check
        assert_eq!(flash.read_option_byte(0x4800), Ok(0x00AA));

        flash.unlock(MemoryRegion::Data);
        flash.bus_mut().clear_trace();
        assert_eq!(
            flash.erase_option_byte(0x4800),
            Ok(FlashStatus::EndOfOperation)
        );
        assert_eq!(
            memory_writes(&flash),
            [BusAccess::Write8 {
                addr: 0x4800,
                value: 0x00
            }]
        );
        assert_eq!(flash.bus().memory()[0x4800], 0x00);
        assert_eq!(flash.bus().memory()[0x4801], 0x77);

        flash.bus_mut().clear_trace();
        flash.program_option_byte(0x4800, 0xAA).unwrap();
        assert_eq!(memory_writes(&flash).len(), 1);
    }

    #[test]
    fn test_invalid_option_byte_address() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Data);
        flash.bus_mut().clear_trace();

        assert_eq!(
            flash.program_option_byte(0x4900, 0x00),
            Err(Error::InvalidOptionByteAddress { addr: 0x4900 })
        );
        // Complement would fall outside the option area
        assert_eq!(
            flash.read_option_byte(0x487F),
            Err(Error::InvalidOptionByteAddress { addr: 0x487F })
        );
        assert!(flash.bus().trace().is_empty());
    }

    #[test]
    fn test_wait_timeout_when_stalled() {
        let mut profile = STM8S103;
        profile.operation_timeout = 50;
        let mut flash = controller(DummyConfig {
            profile,
            stall: true,
            ..DummyConfig::default()
        });

        flash.unlock(MemoryRegion::Data);
        flash.program_byte(0x4000, 0x01).unwrap();
        flash.bus_mut().clear_trace();

        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Data),
            FlashStatus::Timeout
        );
        assert_eq!(flash.bus().status_polls(), 50);
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Data).into_result(),
            Err(Error::Timeout)
        );
    }

    #[test]
    fn test_wait_completes_after_polls() {
        let mut flash = controller(DummyConfig {
            completion_polls: 5,
            ..DummyConfig::default()
        });

        flash.unlock(MemoryRegion::Program);
        flash.program_byte(0x8000, 0x01).unwrap();
        flash.bus_mut().clear_trace();

        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );
        assert_eq!(flash.bus().status_polls(), 6);
    }

    #[test]
    fn test_dual_voltage_wait_masks() {
        let mut flash = controller(DummyConfig {
            profile: STM8S208,
            completion_polls: 3,
            stall: false,
        });

        flash.unlock(MemoryRegion::Data);
        flash.program_byte(0x4000, 0x01).unwrap();
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Data),
            FlashStatus::HighVoltageOff
        );

        flash.unlock(MemoryRegion::Program);
        flash.program_byte(0x8000, 0x01).unwrap();
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );
    }

    #[test]
    fn test_erase_block_word_store() {
        let mut flash = default_controller();
        flash.bus_mut().memory_mut()[0x8000..0x8100].fill(0xA5);
        flash.unlock(MemoryRegion::Program);
        flash.bus_mut().clear_trace();

        let mut routines = flash.ram_routines(RAM);
        routines.erase_block(MemoryRegion::Program, 1).unwrap();
        assert_eq!(
            routines.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );

        assert_eq!(
            memory_writes(&flash),
            [BusAccess::Write32 {
                addr: 0x8040,
                value: 0
            }]
        );
        let mem = flash.bus().memory();
        assert!(mem[0x8000..0x8040].iter().all(|&b| b == 0xA5));
        assert!(mem[0x8040..0x8080].iter().all(|&b| b == 0x00));
        assert!(mem[0x8080..0x8100].iter().all(|&b| b == 0xA5));
    }

    #[test]
    fn test_erase_block_byte_writes() {
        let mut flash = controller(DummyConfig::for_profile(STM8S208));
        flash.bus_mut().memory_mut()[0x4000..0x4100].fill(0xA5);
        flash.unlock(MemoryRegion::Data);
        flash.bus_mut().clear_trace();

        let mut routines = flash.ram_routines(RAM);
        routines.erase_block(MemoryRegion::Data, 1).unwrap();
        assert_eq!(
            routines.wait_for_last_operation(MemoryRegion::Data),
            FlashStatus::HighVoltageOff
        );

        assert_eq!(
            memory_writes(&flash),
            (0..4)
                .map(|i| BusAccess::Write8 {
                    addr: 0x4080 + i,
                    value: 0
                })
                .collect::<Vec<_>>()
        );
        let mem = flash.bus().memory();
        assert!(mem[0x4000..0x4080].iter().all(|&b| b == 0xA5));
        assert!(mem[0x4080..0x4100].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_program_block_modes() {
        let mut flash = controller(DummyConfig::for_profile(STM8S105));
        flash.bus_mut().memory_mut()[0x8000..0x8080].fill(0xF0);
        flash.unlock(MemoryRegion::Program);

        let block = [0x0Fu8; 128];
        let mut routines = flash.ram_routines(RAM);

        routines
            .program_block(MemoryRegion::Program, 0, ProgrammingMode::Fast, &block)
            .unwrap();
        assert_eq!(
            routines.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );

        routines
            .program_block(MemoryRegion::Program, 1, ProgrammingMode::Standard, &block)
            .unwrap();
        assert_eq!(
            routines.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );

        let mem = flash.bus().memory();
        // Fast mode skips the erase
        assert!(mem[0x8000..0x8080].iter().all(|&b| b == 0xFF));
        assert!(mem[0x8080..0x8100].iter().all(|&b| b == 0x0F));
    }

    #[test]
    fn test_program_block_rejects_wrong_length() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Program);
        flash.bus_mut().clear_trace();

        let short = [0x55u8; 63];
        let mut routines = flash.ram_routines(RAM);
        assert_eq!(
            routines.program_block(MemoryRegion::Program, 0, ProgrammingMode::Standard, &short),
            Err(Error::InvalidBufferLength {
                expected: 64,
                actual: 63
            })
        );
        assert!(flash.bus().trace().is_empty());

        let long = [0x55u8; 65];
        let mut routines = flash.ram_routines(RAM);
        assert_eq!(
            routines.program_block(MemoryRegion::Program, 0, ProgrammingMode::Fast, &long),
            Err(Error::InvalidBufferLength {
                expected: 64,
                actual: 65
            })
        );
        assert!(flash.bus().trace().is_empty());
        assert!(flash.bus().memory()[0x8000..0x8041].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_block_out_of_range() {
        let mut flash = default_controller();
        flash.bus_mut().clear_trace();

        let mut routines = flash.ram_routines(RAM);
        assert_eq!(
            routines.erase_block(MemoryRegion::Data, 10),
            Err(Error::BlockOutOfRange {
                region: MemoryRegion::Data,
                block: 10
            })
        );
        assert!(flash.bus().trace().is_empty());
    }

    #[test]
    fn test_placement_violation() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Data);
        flash.bus_mut().clear_trace();

        // Routines executing from program memory
        let program = flash.profile().program;
        let mut routines = flash.ram_routines(program);
        let err = routines
            .erase_block(MemoryRegion::Program, 0)
            .unwrap_err();
        assert_eq!(
            err,
            Error::PlacementViolation {
                region: MemoryRegion::Program
            }
        );
        assert!(!err.is_invalid_parameter());

        // Modifying another region is fine
        routines.erase_block(MemoryRegion::Data, 0).unwrap();
        assert_eq!(
            routines.wait_for_last_operation(MemoryRegion::Data),
            FlashStatus::EndOfOperation
        );
        assert_eq!(flash.bus().writes().filter(|a| a.addr() >= 0x8000).count(), 0);
    }

    #[test]
    fn test_lock_clears_only_its_bit() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Program);
        flash.unlock(MemoryRegion::Data);

        flash.lock(MemoryRegion::Program);
        assert!(!flash.bus().is_unlocked(MemoryRegion::Program));
        assert!(flash.bus().is_unlocked(MemoryRegion::Data));

        flash.lock(MemoryRegion::Data);
        assert!(!flash.bus().is_unlocked(MemoryRegion::Data));
    }

    #[test]
    fn test_flag_status_clears_sticky_bits() {
        let mut flash = default_controller();
        flash.unlock(MemoryRegion::Data);
        flash.program_byte(0x4000, 0x01).unwrap();

        assert!(flash.flag_status(Iapsr::EOP));
        // EOP is cleared by the read above, DUL is not
        assert!(!flash.flag_status(Iapsr::EOP));
        assert!(flash.flag_status(Iapsr::DUL | Iapsr::WR_PG_DIS));
        assert!(!flash.flag_status(Iapsr::PUL));
    }

    #[test]
    fn test_boot_area() {
        let mut dummy = DummyController::new_default();
        dummy.memory_mut()[0x4801] = 4;
        dummy.memory_mut()[0x4802] = !4;
        dummy.reset();

        let mut flash = FlashController::new(dummy, STM8S103);
        assert_eq!(flash.boot_size(), 2048);

        flash.unlock(MemoryRegion::Program);
        flash.program_byte(0x87FF, 0x01).unwrap();
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::WriteProtectionError
        );
        flash.program_byte(0x8800, 0x01).unwrap();
        assert_eq!(
            flash.wait_for_last_operation(MemoryRegion::Program),
            FlashStatus::EndOfOperation
        );
    }

    #[test]
    fn test_boot_size_saturated() {
        let mut dummy = DummyController::new(DummyConfig::for_profile(STM8S208));
        dummy.memory_mut()[0x4801] = 0xFF;
        dummy.memory_mut()[0x4802] = 0x00;
        dummy.reset();

        let mut flash = FlashController::new(dummy, STM8S208);
        assert_eq!(flash.boot_size(), 0xFF * 512 + 512);
    }

    #[test]
    fn test_configuration_fields() {
        let mut flash = default_controller();

        for mode in [
            LowPowerMode::PowerDown,
            LowPowerMode::Standby,
            LowPowerMode::StandbyPowerDown,
            LowPowerMode::PowerDownStandby,
        ] {
            flash.set_low_power_mode(mode);
            assert_eq!(flash.low_power_mode(), mode);
        }

        flash.set_programming_time(ProgrammingTime::Fixed);
        flash.set_interrupt(true);
        flash.set_low_power_mode(LowPowerMode::StandbyPowerDown);
        assert_eq!(flash.programming_time(), ProgrammingTime::Fixed);
        assert_eq!(flash.bus_mut().read8(FLASH_CR1), 0x0F);

        flash.set_interrupt(false);
        flash.set_programming_time(ProgrammingTime::Standard);
        assert_eq!(flash.programming_time(), ProgrammingTime::Standard);
        assert_eq!(flash.low_power_mode(), LowPowerMode::StandbyPowerDown);
        assert_eq!(flash.bus_mut().read8(FLASH_CR1), 0x0C);
    }

    #[test]
    fn test_deinit() {
        let mut flash = default_controller();
        flash.set_interrupt(true);
        flash.set_programming_time(ProgrammingTime::Fixed);
        flash.unlock(MemoryRegion::Program);
        flash.unlock(MemoryRegion::Data);
        flash.bus_mut().clear_trace();

        flash.deinit();

        let iapsr_writes: Vec<u8> = flash
            .bus()
            .writes()
            .filter_map(|a| match *a {
                BusAccess::Write8 { addr, value } if addr == FLASH_IAPSR => Some(value),
                _ => None,
            })
            .collect();
        // Data memory is locked first
        assert_eq!(iapsr_writes.len(), 2);
        assert_eq!(iapsr_writes[0] & Iapsr::DUL.bits(), 0);
        assert_ne!(iapsr_writes[0] & Iapsr::PUL.bits(), 0);
        assert_eq!(iapsr_writes[1] & (Iapsr::DUL | Iapsr::PUL).bits(), 0);
        assert!(matches!(
            flash.bus().trace().last(),
            Some(BusAccess::Read8 { addr: FLASH_IAPSR, .. })
        ));

        let bus = flash.bus_mut();
        assert_eq!(bus.read8(FLASH_CR1), CR1_RESET);
        assert_eq!(bus.read8(FLASH_CR2), CR2_RESET);
        assert_eq!(bus.read8(FLASH_NCR2), NCR2_RESET);
        assert_eq!(bus.read8(FLASH_IAPSR), IAPSR_RESET);
    }

    #[test]
    fn test_load_image() {
        let mut dummy = DummyController::new_default();
        let mut image = vec![0u8; 0x4810];
        image[0x4000] = 0x99;
        image[0x4801] = 2;
        image[0x4802] = !2;

        assert_eq!(dummy.load_image(&image), 0x4810);
        assert_eq!(dummy.memory()[0x4000], 0x99);
        assert_eq!(dummy.boot_size(), 1024);

        let oversized = vec![0u8; dummy.memory().len() + 16];
        assert_eq!(dummy.load_image(&oversized), dummy.memory().len());
    }
}
