//! Register access
//!
//! The register layout of each peripheral is described with
//! [`tock_registers`]: `register_bitfields!` for the fields and
//! `register_structs!` for the offsets. The drivers are generic over any
//! pointer to such a block, so the same code runs on the device and on a
//! host.
//!
//! On the device the block is reached through a [`RegisterRef`] built from
//! the peripheral base address:
//!
//! ```no_run
//! use stm32n6xx_hal::rcc::RccRegisters;
//! use stm32n6xx_hal::reg::{RegisterRef, RCC_BASE};
//!
//! // unsafe: the caller owns the RCC peripheral
//! let rcc_regs = unsafe { RegisterRef::<RccRegisters>::new(RCC_BASE) };
//! ```
//!
//! On a host, a [`RegisterFile`] holds a zeroed copy of the block in plain
//! memory. Status registers that only the hardware writes can be set with
//! [`RegisterFile::poke`].

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::mem::{size_of, MaybeUninit};
use core::ops::Deref;
use core::ptr::NonNull;

/// Secure alias of the RCC base address
#[cfg(not(feature = "non-secure"))]
pub const RCC_BASE: usize = 0x5602_8000;
/// Non-secure alias of the RCC base address
#[cfg(feature = "non-secure")]
pub const RCC_BASE: usize = 0x4602_8000;

/// Secure alias of the LTDC base address
#[cfg(not(feature = "non-secure"))]
pub const LTDC_BASE: usize = 0x5800_1000;
/// Non-secure alias of the LTDC base address
#[cfg(feature = "non-secure")]
pub const LTDC_BASE: usize = 0x4800_1000;

/// A register block made only of registers and padding
///
/// # Safety
///
/// All zeros must be a valid value of the type, and every field must be a
/// `tock_registers` register, an array of them, or padding.
pub unsafe trait RegisterMap {}

/// Shared access to a register block
///
/// Dereferences to the block. Each access goes through the register types,
/// so no reference outlives a single read or write.
pub struct RegisterRef<'a, T> {
    ptr: NonNull<T>,
    _block: PhantomData<&'a T>,
}

impl<T: RegisterMap> RegisterRef<'static, T> {
    /// Access the register block at `address`
    ///
    /// # Safety
    ///
    /// `address` must be the base address of a peripheral laid out as `T`,
    /// and the caller must ensure no other code accesses that peripheral
    /// concurrently.
    pub const unsafe fn new(address: usize) -> Self {
        RegisterRef {
            ptr: NonNull::new_unchecked(address as *mut T),
            _block: PhantomData,
        }
    }
}

impl<T> RegisterRef<'_, T> {
    /// Address of the register block
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl<T> Clone for RegisterRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RegisterRef<'_, T> {}

impl<T> Deref for RegisterRef<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        // unsafe: the pointer comes from `new` or from a live RegisterFile
        unsafe { self.ptr.as_ref() }
    }
}

// unsafe: a 'static reference only comes from `new`, whose caller owns the
// peripheral
unsafe impl<T> Send for RegisterRef<'static, T> {}

/// A register block in plain memory, reset to zero
///
/// Reads return the last value written, whether by a driver or with
/// [`poke`](RegisterFile::poke). Write-only registers can be read back with
/// [`peek`](RegisterFile::peek).
pub struct RegisterFile<T> {
    block: UnsafeCell<MaybeUninit<T>>,
}

impl<T: RegisterMap> Default for RegisterFile<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RegisterMap> RegisterFile<T> {
    /// A register block with all registers reset to zero
    pub fn new() -> Self {
        RegisterFile {
            block: UnsafeCell::new(MaybeUninit::zeroed()),
        }
    }

    /// A reference for a driver, valid as long as the file
    pub fn registers(&self) -> RegisterRef<'_, T> {
        RegisterRef {
            // unsafe: the pointer comes from a reference, so it is not null
            ptr: unsafe { NonNull::new_unchecked(self.block.get().cast()) },
            _block: PhantomData,
        }
    }

    /// Current value of the register selected by `reg`
    pub fn peek<U>(&self, reg: impl FnOnce(&T) -> &U) -> u32 {
        let word = self.word(reg);
        // unsafe: `word` lies within the block
        unsafe { word.read_volatile() }
    }

    /// Overwrite the register selected by `reg`, as the hardware would
    pub fn poke<U>(&self, reg: impl FnOnce(&T) -> &U, value: u32) {
        let word = self.word(reg);
        // unsafe: `word` lies within the block
        unsafe { word.write_volatile(value) }
    }

    /// All words of the block, in address order
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        let base = self.block.get().cast::<u32>();
        // unsafe: every index lies within the block
        (0..size_of::<T>() / 4).map(move |i| unsafe { base.add(i).read_volatile() })
    }

    /// Byte offset of the item selected by `reg` from the start of the
    /// block
    pub fn offset<U>(&self, reg: impl FnOnce(&T) -> &U) -> usize {
        let block: &T = self;
        reg(block) as *const U as usize - block as *const T as usize
    }

    /// Pointer to the 32-bit register selected by `reg`
    fn word<U>(&self, reg: impl FnOnce(&T) -> &U) -> *mut u32 {
        let offset = self.offset(reg);
        assert!(
            size_of::<U>() == 4 && offset % 4 == 0 && offset < size_of::<T>(),
            "Not a register of the block: offset {offset:#x}"
        );
        self.block.get().cast::<u32>().wrapping_add(offset / 4)
    }
}

impl<T: RegisterMap> Deref for RegisterFile<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // unsafe: all zeros is a valid `T`, and the registers only change
        // through their own interior mutability
        unsafe { (*self.block.get()).assume_init_ref() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
    use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
    use tock_registers::{register_bitfields, register_structs};

    register_bitfields![u32,
        CTRL [
            EN OFFSET(0) NUMBITS(1) [],
            MODE OFFSET(8) NUMBITS(4) []
        ]
    ];

    register_structs! {
        Block {
            (0x0 => ctrl: ReadWrite<u32, CTRL::Register>),
            (0x4 => status: ReadOnly<u32>),
            (0x8 => clear: WriteOnly<u32>),
            (0xC => @END),
        }
    }

    unsafe impl RegisterMap for Block {}

    #[test]
    fn driver_and_file_share_the_block() {
        let file = RegisterFile::<Block>::new();
        let regs = file.registers();

        regs.ctrl.modify(CTRL::MODE.val(0xA) + CTRL::EN::SET);
        assert_eq!(file.peek(|r| &r.ctrl), 0xA01);
        assert_eq!(file.ctrl.read(CTRL::MODE), 0xA);

        // Status bits are set by the hardware only
        file.poke(|r| &r.status, 0x8000_0000);
        assert_eq!(regs.status.get(), 0x8000_0000);

        regs.clear.set(0x55);
        assert_eq!(file.peek(|r| &r.clear), 0x55);
        assert_eq!(file.words().collect::<Vec<_>>(), [0xA01, 0x8000_0000, 0x55]);
        assert_eq!(file.offset(|r| &r.clear), 0x8);
    }

    #[test]
    #[should_panic(expected = "Not a register of the block")]
    fn peek_rejects_whole_block() {
        let file = RegisterFile::<Block>::new();
        file.peek(|r| r);
    }
}
