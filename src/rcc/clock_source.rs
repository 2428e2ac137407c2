//! Packed kernel clock source selector
//!
//! A [`ClockSource`] describes one value of one kernel clock multiplexer
//! field in a single `u32`, so that a single pair of methods can program
//! any field of the `CCIPR1` to `CCIPR14` registers:
//!
//! | bits   | content                                         |
//! |--------|-------------------------------------------------|
//! | 0..8   | byte offset of the register from `CCIPR1`       |
//! | 8..13  | bit position of the field                       |
//! | 16..24 | value of the field, unshifted                   |
//! | 24..32 | mask of the field, unshifted                    |
//!
//! The typed selectors in this module (for example
//! [`LtdcClkSel`](super::LtdcClkSel)) convert into tokens with
//! [`KernelClockSel::token`](super::KernelClockSel::token).

use super::{regs, Error, Rcc};
use tock_registers::fields::{Field, FieldValue};
use tock_registers::interfaces::{ReadWriteable, Readable};

const REG_SHIFT: u32 = 0;
const POS_SHIFT: u32 = 8;
const CONFIG_SHIFT: u32 = 16;
const MASK_SHIFT: u32 = 24;

/// Offset of the last kernel clock configuration register from `CCIPR1`
const MAX_OFFSET: u32 = 4 * (regs::CCIPR_COUNT as u32 - 1);

/// Packed kernel clock source selector
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSource(u32);

impl ClockSource {
    /// Pack a selector
    ///
    /// `register_offset` is the byte offset from `CCIPR1`, `mask` the
    /// unshifted mask of the field, `position` its lowest bit and `config`
    /// the unshifted field value. Values wider than their slot are
    /// truncated.
    pub const fn encode(
        register_offset: u8,
        mask: u8,
        position: u8,
        config: u8,
    ) -> Self {
        ClockSource(
            ((mask as u32) << MASK_SHIFT)
                | (((position & 0x1F) as u32) << POS_SHIFT)
                | ((register_offset as u32) << REG_SHIFT)
                | ((config as u32) << CONFIG_SHIFT),
        )
    }

    /// Recreate a selector from its raw value
    pub const fn from_raw(raw: u32) -> Self {
        ClockSource(raw)
    }

    /// Raw value
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Byte offset of the register from `CCIPR1`
    pub const fn register_offset(self) -> u32 {
        (self.0 >> REG_SHIFT) & 0xFF
    }

    /// Lowest bit of the field
    pub const fn position(self) -> u32 {
        (self.0 >> POS_SHIFT) & 0x1F
    }

    /// Mask of the field, unshifted
    pub const fn field_mask(self) -> u32 {
        (self.0 >> MASK_SHIFT) & 0xFF
    }

    /// Mask of the field, shifted into place
    pub const fn mask(self) -> u32 {
        self.field_mask() << self.position()
    }

    /// Value of the field, unshifted
    pub const fn config_value(self) -> u32 {
        (self.0 >> CONFIG_SHIFT) & 0xFF
    }

    /// Value of the field, shifted into place
    pub const fn config(self) -> u32 {
        self.config_value() << self.position()
    }

    /// The same field with another value
    pub const fn with_config(self, config: u8) -> Self {
        ClockSource(
            (self.0 & !(0xFF << CONFIG_SHIFT))
                | ((config as u32) << CONFIG_SHIFT),
        )
    }

    /// Multiplexer field within its register
    pub(super) fn field(self) -> Field<u32, ()> {
        Field::new(self.field_mask(), self.position() as usize)
    }

    /// Index of the register in `CCIPR1` to `CCIPR14`, if the selector lies
    /// within the kernel clock configuration registers
    pub(super) fn checked_register(self) -> Result<usize, Error> {
        let offset = self.register_offset();
        let width = 32 - self.field_mask().leading_zeros();
        if offset % 4 != 0
            || offset > MAX_OFFSET
            || self.field_mask() == 0
            || self.position() + width > 32
            || self.config_value() & !self.field_mask() != 0
        {
            return Err(Error::InvalidClockSource);
        }
        Ok(offset as usize / 4)
    }
}

impl Rcc<'_> {
    /// Program a kernel clock multiplexer from a packed selector
    pub fn set_clock_source(&mut self, source: ClockSource) -> Result<(), Error> {
        let reg = source.checked_register()?;
        self.rb.ccipr[reg].modify(FieldValue::<u32, ()>::new(
            source.field_mask(),
            source.position() as usize,
            source.config_value(),
        ));
        Ok(())
    }

    /// Read the field described by `source`. The value is shifted into
    /// place, so it compares directly with [`ClockSource::config`].
    pub fn get_clock_source(&self, source: ClockSource) -> Result<u32, Error> {
        let reg = source.checked_register()?;
        Ok(self.rb.ccipr[reg].get() & source.mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::RccRegisterFile;
    use tock_registers::interfaces::Writeable;

    #[test]
    fn encode_decode() {
        for (offset, mask, position, config) in [
            (0u8, 0x7u8, 0u8, 0x5u8),
            (0x34, 0x3, 24, 0x2),
            (0x30, 0xFF, 24, 0xA5),
            (0x2C, 0x1, 31, 0x1),
        ] {
            let source = ClockSource::encode(offset, mask, position, config);
            assert_eq!(source.register_offset(), offset as u32);
            assert_eq!(source.position(), position as u32);
            assert_eq!(source.field_mask(), mask as u32);
            assert_eq!(source.mask(), (mask as u32) << position);
            assert_eq!(source.config(), (config as u32) << position);
            assert_eq!(ClockSource::from_raw(source.raw()), source);
        }
    }

    #[test]
    fn set_and_get() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers());
        file.ccipr[3].set(0xFFFF_FFFF);

        // LTDCSEL = IC16
        let ic16 = ClockSource::encode(0x0C, 0x3, 24, 0x2);
        rcc.set_clock_source(ic16).unwrap();
        assert_eq!(file.ccipr[3].get(), 0xFEFF_FFFF);
        assert_eq!(rcc.get_clock_source(ic16), Ok(ic16.config()));

        let hsi = ic16.with_config(0x3);
        assert_ne!(rcc.get_clock_source(hsi), Ok(hsi.config()));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers());

        for source in [
            // Unaligned
            ClockSource::encode(0x02, 0x3, 0, 0),
            // Past CCIPR14
            ClockSource::encode(0x38, 0x3, 0, 0),
            // Field crosses bit 31
            ClockSource::encode(0x00, 0x7, 30, 0),
            // Value wider than the field
            ClockSource::encode(0x00, 0x3, 0, 0x4),
            // No field
            ClockSource::encode(0x00, 0x0, 0, 0),
        ] {
            assert_eq!(
                rcc.set_clock_source(source),
                Err(Error::InvalidClockSource)
            );
        }
    }
}
