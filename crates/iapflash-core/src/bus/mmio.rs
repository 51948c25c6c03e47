//! Memory-mapped register access
//!
//! Volatile access to the controller through raw pointers, for use on the
//! target itself or on a mapped window of its address space.
//!
//! # Safety
//!
//! Accessing hardware through raw addresses is inherently unsafe. The
//! constructor is `unsafe`; once a [`Mmio`] exists, every access is assumed
//! to land on valid, mapped device memory.

use super::RegisterFile;

/// Volatile register access relative to a base address
#[derive(Debug)]
pub struct Mmio {
    /// Host address that corresponds to device address 0
    base: usize,
}

impl Mmio {
    /// Create an accessor for the device address space mapped at `base`
    ///
    /// On the device itself `base` is 0.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    /// - `base + addr` is a valid, mapped location for every device address
    ///   the flash engine will touch (registers, memory arrays, option bytes)
    /// - No other code accesses the flash controller while this exists
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    #[inline(always)]
    fn ptr(&self, addr: u32) -> *mut u8 {
        (self.base + addr as usize) as *mut u8
    }
}

impl RegisterFile for Mmio {
    #[inline(always)]
    fn read8(&mut self, addr: u32) -> u8 {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.ptr(addr)) }
    }

    #[inline(always)]
    fn write8(&mut self, addr: u32, value: u8) {
        // SAFETY: guaranteed by the contract of `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.ptr(addr), value) }
    }

    /// Single 32-bit store, as required by the word-store erase trigger
    #[inline(always)]
    fn write32(&mut self, addr: u32, value: u32) {
        debug_assert!(addr & 3 == 0, "unaligned 32-bit write");
        // SAFETY: guaranteed by the contract of `Mmio::new`; block start
        // addresses are always word aligned.
        unsafe { core::ptr::write_volatile(self.ptr(addr) as *mut u32, value.to_be()) }
    }
}
