//! Peripheral Reset and Enable Control (REC)
//!
//! This module contains safe accessors to the RCC functionality for each
//! peripheral.
//!
//! Each peripheral implements [`ResetEnable`]. Peripherals with a kernel
//! clock multiplexer also have methods `kernel_clk_mux` and
//! `get_kernel_clk_mux`, which set and get the state of the multiplexer.
//!
//! All reset and enable bits are changed through the set and clear aliases
//! of the `xxxRSTR` and `xxxENR` registers. Each change is a single write,
//! so no critical section is needed when peripherals are enabled from
//! different contexts.
//!
//! # Reset/Enable Example
//!
//! ```no_run
//! # use stm32n6xx_hal::rcc::{LtdcClkSel, Rcc, ResetEnable};
//! let rcc = unsafe { Rcc::steal() };
//! let rec = unsafe { rcc.steal_peripheral_rec() };
//!
//! // Select the pixel clock, then enable the clock to the LTDC and reset it
//! let ltdc_rec = rec.LTDC.kernel_clk_mux(LtdcClkSel::Ic16).enable().reset();
//!
//! assert_eq!(ltdc_rec.get_kernel_clk_mux(), Some(LtdcClkSel::Ic16));
//! ```
//!
//! # REC object
//!
//! There is a REC object for each peripheral. If a REC object is dropped
//! by user code, then the Reset or Enable state of this peripheral cannot
//! be modified for the lifetime of the program.
#![deny(missing_docs)]

use super::kernel_clk::{read_kernel_clk_mux, write_kernel_clk_mux};
use super::{regs, Rcc, RccRegisters};
use crate::reg::RegisterRef;
use tock_registers::interfaces::{Readable, Writeable};

#[cfg(feature = "log")]
use log::trace;

/// A trait for Resetting, Enabling and Disabling a single peripheral
pub trait ResetEnable {
    /// Enable this peripheral
    #[allow(clippy::return_self_not_must_use)]
    fn enable(self) -> Self;
    /// Disable this peripheral
    #[allow(clippy::return_self_not_must_use)]
    fn disable(self) -> Self;
    /// Reset this peripheral
    #[allow(clippy::return_self_not_must_use)]
    fn reset(self) -> Self;
    /// True if the bus clock of this peripheral is enabled
    fn is_enabled(&self) -> bool;
}

impl<'a> Rcc<'a> {
    /// Returns all the peripheral resets / enables / kernel clocks.
    ///
    /// # Safety
    ///
    /// Every call returns a new set of REC objects for the same bits. The
    /// caller must ensure that each peripheral is controlled through only
    /// one of them.
    #[inline]
    pub unsafe fn steal_peripheral_rec(&self) -> PeripheralREC<'a> {
        PeripheralREC::new(self.rb)
    }
}

// This macro uses the paste::item! macro to create identifiers.
//
// https://crates.io/crates/paste
macro_rules! peripheral_reset_and_enable_control {
    ($( $AXBn:ident => [
        $( $p:ident: $bit:literal $([ kernel $Sel:ident ])?, )+
    ];)+) => {
        paste::item! {
            /// Peripheral Reset and Enable Control
            #[allow(non_snake_case)]
            #[non_exhaustive]
            pub struct PeripheralREC<'a> {
                $($(
                    #[allow(missing_docs)]
                    pub [< $p:upper >]: $p<'a>,
                )+)+
            }

            impl<'a> PeripheralREC<'a> {
                fn new(rb: RegisterRef<'a, RccRegisters>) -> Self {
                    PeripheralREC {
                        $($(
                            [< $p:upper >]: $p { rb },
                        )+)+
                    }
                }
            }

            $($(
                #[doc = "Owned ability to Reset, Enable and Disable peripheral " $p]
                pub struct $p<'a> {
                    rb: RegisterRef<'a, RccRegisters>,
                }

                impl $p<'_> {
                    /// Reset, enable and disable bit of this peripheral
                    pub const BIT: u32 = 1 << $bit;
                    /// Index of the bus in the reset and enable registers
                    pub const BUS: usize = regs::$AXBn;
                }

                impl ResetEnable for $p<'_> {
                    #[inline(always)]
                    fn enable(self) -> Self {
                        #[cfg(feature = "log")]
                        trace!(concat!(stringify!($AXBn), ": enable ", stringify!($p)));

                        self.rb.set.busenr[Self::BUS].set(Self::BIT);
                        // Read back, so that the clock is running before
                        // the peripheral is accessed
                        let _ = self.rb.busenr[Self::BUS].get();
                        self
                    }
                    #[inline(always)]
                    fn disable(self) -> Self {
                        self.rb.clear.busenr[Self::BUS].set(Self::BIT);
                        self
                    }
                    #[inline(always)]
                    fn reset(self) -> Self {
                        self.rb.set.busrstr[Self::BUS].set(Self::BIT);
                        self.rb.clear.busrstr[Self::BUS].set(Self::BIT);
                        self
                    }
                    #[inline(always)]
                    fn is_enabled(&self) -> bool {
                        self.rb.busenr[Self::BUS].get() & Self::BIT != 0
                    }
                }

                $(
                    impl $p<'_> {
                        /// Modify the kernel clock multiplexer of this
                        /// peripheral
                        #[must_use]
                        pub fn kernel_clk_mux(self, sel: super::$Sel) -> Self {
                            write_kernel_clk_mux(&self.rb, sel);
                            self
                        }

                        /// Return the current kernel clock selection, `None`
                        /// if the multiplexer holds a reserved value
                        pub fn get_kernel_clk_mux(&self) -> Option<super::$Sel> {
                            read_kernel_clk_mux(&self.rb)
                        }
                    }
                )?
            )+)+
        }
    };
}

peripheral_reset_and_enable_control! {
    AHB1 => [
        Adc12: 5 [kernel Adc12ClkSel],
    ];
    AHB3 => [
        Adf1: 17 [kernel Adf1ClkSel],
    ];
    AHB5 => [
        Fmc: 4 [kernel FmcClkSel],
        Xspi1: 5 [kernel Xspi1ClkSel],
        Sdmmc2: 7 [kernel Sdmmc2ClkSel],
        Sdmmc1: 8 [kernel Sdmmc1ClkSel],
        Xspi2: 12 [kernel Xspi2ClkSel],
    ];
    APB1_1 => [
        Usart2: 17 [kernel Usart2ClkSel],
        I2c1: 21 [kernel I2c1ClkSel],
        I2c2: 22 [kernel I2c2ClkSel],
        I2c3: 23 [kernel I2c3ClkSel],
    ];
    APB2 => [
        Usart1: 4 [kernel Usart1ClkSel],
        Spi1: 12 [kernel Spi1ClkSel],
    ];
    APB5 => [
        Ltdc: 1 [kernel LtdcClkSel],
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::{LtdcClkSel, RccRegisterFile};

    #[test]
    fn enable_and_reset_use_aliases() {
        let file = RccRegisterFile::new();
        let rcc = Rcc::new(file.registers());
        let rec = unsafe { rcc.steal_peripheral_rec() };

        let ltdc = rec.LTDC.enable();
        assert_eq!(file.peek(|r| &r.set.busenr[regs::APB5]), 1 << 1);
        assert_eq!(file.busenr[regs::APB5].get(), 0);
        assert!(!ltdc.is_enabled());

        // The hardware reflects the set alias into the register
        file.busenr[regs::APB5].set(1 << 1);
        assert!(ltdc.is_enabled());

        let ltdc = ltdc.reset();
        assert_eq!(file.peek(|r| &r.set.busrstr[regs::APB5]), 1 << 1);
        assert_eq!(file.peek(|r| &r.clear.busrstr[regs::APB5]), 1 << 1);

        let _ = ltdc.disable();
        assert_eq!(file.peek(|r| &r.clear.busenr[regs::APB5]), 1 << 1);

        let _ = rec.I2C2.enable();
        assert_eq!(file.peek(|r| &r.set.busenr[regs::APB1_1]), 1 << 22);
        // Other busses untouched
        assert_eq!(file.peek(|r| &r.set.busenr[regs::APB1_2]), 0);
    }

    #[test]
    fn kernel_clock_through_rec() {
        let file = RccRegisterFile::new();
        let rcc = Rcc::new(file.registers());
        let rec = unsafe { rcc.steal_peripheral_rec() };

        let ltdc = rec.LTDC.kernel_clk_mux(LtdcClkSel::Ic16);
        assert_eq!(ltdc.get_kernel_clk_mux(), Some(LtdcClkSel::Ic16));
        assert_eq!(
            rcc.get_kernel_clk_mux::<LtdcClkSel>(),
            Some(LtdcClkSel::Ic16)
        );
    }
}
