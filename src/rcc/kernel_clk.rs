//! Kernel clock multiplexers
//!
//! Each peripheral kernel clock multiplexer is described by an enum
//! implementing [`KernelClockSel`]. The enum knows where its field lives in
//! the `CCIPRx` registers and which clock each of its values selects.
//!
//! ```no_run
//! # use stm32n6xx_hal::rcc::{LtdcClkSel, Rcc};
//! # let mut rcc = unsafe { Rcc::steal() };
//! rcc.kernel_clk_mux(LtdcClkSel::Ic16);
//!
//! assert_eq!(rcc.get_kernel_clk_mux::<LtdcClkSel>(), Some(LtdcClkSel::Ic16));
//! let pixel_clock = rcc.ltdc_clock_freq();
//! ```
//!
//! Resolving a kernel clock frequency re-reads every register on the path
//! from the multiplexer to the oscillator, so the result always reflects
//! the current hardware state.

use super::{regs, Apb, ClockSource, Ic, Oscillator, Rcc, RccRegisters};
use crate::time::Hertz;
use crate::Sealed;
use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable};

#[cfg(feature = "log")]
use log::debug;

/// A clock that can be selected by a kernel clock multiplexer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KernelSource {
    /// AHB clock
    Hclk,
    /// APB clock
    Pclk(Apb),
    /// Common peripheral clock, itself selected by [`PerClkSel`]
    Clkp,
    /// IC divider output
    Ic(Ic),
    /// MSI
    Msi,
    /// HSI after the HSI divider
    Hsi,
    /// HSE
    Hse,
    /// LSE
    Lse,
    /// External clock on the I2S_CKIN pin
    I2sCkin,
    /// Timer kernel clock
    Timg,
}

/// A kernel clock multiplexer value
pub trait KernelClockSel: Sealed + core::fmt::Debug + Copy + Sized {
    /// Location of the multiplexer field. The value part is zero.
    const FIELD: ClockSource;

    /// Location of a divider applied after the multiplexer, if any, as
    /// (index of the `CCIPRx` register, field). The division factor is the
    /// field value plus one.
    const PRESCALER: Option<(usize, Field<u32, ()>)> = None;

    /// Field value
    fn bits(self) -> u8;

    /// Multiplexer value for a field value, `None` if the value is
    /// reserved
    fn from_bits(bits: u8) -> Option<Self>;

    /// Clock selected by this value
    fn kernel_source(self) -> KernelSource;

    /// Packed selector for this value
    fn token(self) -> ClockSource {
        Self::FIELD.with_config(self.bits())
    }
}

// This macro uses the paste::item! macro to create identifiers.
//
// https://crates.io/crates/paste
macro_rules! kernel_clock_mux {
    ($( $(#[$doc:meta])* $Sel:ident, $clk_doc:literal: ccipr($n:literal), $pos:literal, $width:literal
        $(, prescaler(ccipr($pre_n:literal), $pre:ident))? => [
            $( $Variant:ident = $bits:literal => $Src:ident $(($arg:expr))?, )+
        ];
    )+) => {
        paste::item! {
            $(
                $(#[$doc])*
                #[doc = $clk_doc " kernel clock source selection"]
                #[derive(Debug, Copy, Clone, PartialEq, Eq)]
                #[cfg_attr(feature = "defmt", derive(defmt::Format))]
                #[allow(missing_docs)]
                pub enum [< $Sel ClkSel >] {
                    $( $Variant = $bits, )+
                }

                impl Sealed for [< $Sel ClkSel >] {}

                impl KernelClockSel for [< $Sel ClkSel >] {
                    const FIELD: ClockSource = ClockSource::encode(
                        4 * ($n - 1),
                        ((1u32 << $width) - 1) as u8,
                        $pos,
                        0,
                    );
                    $(
                        const PRESCALER: Option<(usize, Field<u32, ()>)> =
                            Some(($pre_n - 1, regs::$pre));
                    )?

                    #[inline(always)]
                    fn bits(self) -> u8 {
                        self as u8
                    }

                    fn from_bits(bits: u8) -> Option<Self> {
                        match bits {
                            $( $bits => Some(Self::$Variant), )+
                            _ => None,
                        }
                    }

                    fn kernel_source(self) -> KernelSource {
                        match self {
                            $( Self::$Variant => KernelSource::$Src $(($arg))?, )+
                        }
                    }
                }

                impl Rcc<'_> {
                    #[doc = "Returns `Some(frequency)` of the " $clk_doc
                      " kernel clock if its source is running, otherwise `None`"]
                    pub fn [< $Sel:lower _clock_freq >](&self) -> Option<Hertz> {
                        self.kernel_clock_freq::<[< $Sel ClkSel >]>()
                    }
                }
            )+
        }
    };
}

kernel_clock_mux! {
    Per, "Common peripheral clock (CLKP)": ccipr(7), 0, 3 => [
        Hsi = 0 => Hsi,
        Msi = 1 => Msi,
        Hse = 2 => Hse,
        Ic19 = 3 => Ic(Ic::IC19),
        Ic5 = 4 => Ic(Ic::IC5),
        Ic10 = 5 => Ic(Ic::IC10),
        Ic15 = 6 => Ic(Ic::IC15),
        Ic20 = 7 => Ic(Ic::IC20),
    ];
    Adf1, "ADF1": ccipr(1), 0, 3 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic7 = 2 => Ic(Ic::IC7),
        Ic8 = 3 => Ic(Ic::IC8),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
        I2sCkin = 6 => I2sCkin,
        Timg = 7 => Timg,
    ];
    /// The ADC kernel clock is further divided by the ADC prescaler, see
    /// [`Rcc::set_adc_prescaler`].
    Adc12, "ADC1/ADC2": ccipr(1), 4, 3, prescaler(ccipr(1), ADCPRE) => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic7 = 2 => Ic(Ic::IC7),
        Ic8 = 3 => Ic(Ic::IC8),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
        I2sCkin = 6 => I2sCkin,
        Timg = 7 => Timg,
    ];
    Fmc, "FMC": ccipr(3), 0, 2 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic3 = 2 => Ic(Ic::IC3),
        Ic4 = 3 => Ic(Ic::IC4),
    ];
    Sdmmc1, "SDMMC1": ccipr(4), 0, 2 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic4 = 2 => Ic(Ic::IC4),
        Ic5 = 3 => Ic(Ic::IC5),
    ];
    Sdmmc2, "SDMMC2": ccipr(4), 4, 2 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic4 = 2 => Ic(Ic::IC4),
        Ic5 = 3 => Ic(Ic::IC5),
    ];
    Ltdc, "LTDC pixel clock": ccipr(4), 24, 2 => [
        Pclk5 = 0 => Pclk(Apb::Apb5),
        Clkp = 1 => Clkp,
        Ic16 = 2 => Ic(Ic::IC16),
        Hsi = 3 => Hsi,
    ];
    Xspi1, "XSPI1": ccipr(6), 0, 2 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic3 = 2 => Ic(Ic::IC3),
        Ic4 = 3 => Ic(Ic::IC4),
    ];
    Xspi2, "XSPI2": ccipr(6), 4, 2 => [
        Hclk = 0 => Hclk,
        Clkp = 1 => Clkp,
        Ic3 = 2 => Ic(Ic::IC3),
        Ic4 = 3 => Ic(Ic::IC4),
    ];
    I2c1, "I2C1": ccipr(12), 0, 3 => [
        Pclk1 = 0 => Pclk(Apb::Apb1),
        Clkp = 1 => Clkp,
        Ic10 = 2 => Ic(Ic::IC10),
        Ic15 = 3 => Ic(Ic::IC15),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
    ];
    I2c2, "I2C2": ccipr(12), 4, 3 => [
        Pclk1 = 0 => Pclk(Apb::Apb1),
        Clkp = 1 => Clkp,
        Ic10 = 2 => Ic(Ic::IC10),
        Ic15 = 3 => Ic(Ic::IC15),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
    ];
    I2c3, "I2C3": ccipr(12), 8, 3 => [
        Pclk1 = 0 => Pclk(Apb::Apb1),
        Clkp = 1 => Clkp,
        Ic10 = 2 => Ic(Ic::IC10),
        Ic15 = 3 => Ic(Ic::IC15),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
    ];
    Spi1, "SPI1": ccipr(13), 0, 3 => [
        Pclk2 = 0 => Pclk(Apb::Apb2),
        Clkp = 1 => Clkp,
        Ic8 = 2 => Ic(Ic::IC8),
        Ic9 = 3 => Ic(Ic::IC9),
        Msi = 4 => Msi,
        Hsi = 5 => Hsi,
        I2sCkin = 6 => I2sCkin,
    ];
    Usart1, "USART1": ccipr(13), 16, 3 => [
        Pclk2 = 0 => Pclk(Apb::Apb2),
        Clkp = 1 => Clkp,
        Ic9 = 2 => Ic(Ic::IC9),
        Ic14 = 3 => Ic(Ic::IC14),
        Lse = 4 => Lse,
        Msi = 5 => Msi,
        Hsi = 6 => Hsi,
    ];
    Usart2, "USART2": ccipr(13), 20, 3 => [
        Pclk1 = 0 => Pclk(Apb::Apb1),
        Clkp = 1 => Clkp,
        Ic9 = 2 => Ic(Ic::IC9),
        Ic14 = 3 => Ic(Ic::IC14),
        Lse = 4 => Lse,
        Msi = 5 => Msi,
        Hsi = 6 => Hsi,
    ];
}

/// Index of the `CCIPRx` register holding the multiplexer of `S`
fn mux_register<S: KernelClockSel>() -> usize {
    S::FIELD.register_offset() as usize / 4
}

/// Write a kernel clock multiplexer field
pub(crate) fn write_kernel_clk_mux<S: KernelClockSel>(
    rb: &RccRegisters,
    sel: S,
) {
    rb.ccipr[mux_register::<S>()].modify(S::FIELD.field().val(sel.bits() as u32));
}

/// Read a kernel clock multiplexer field
pub(crate) fn read_kernel_clk_mux<S: KernelClockSel>(
    rb: &RccRegisters,
) -> Option<S> {
    let bits = rb.ccipr[mux_register::<S>()].read(S::FIELD.field());
    S::from_bits(bits as u8)
}

impl Rcc<'_> {
    /// Modify a kernel clock multiplexer.
    ///
    /// It is possible to switch this clock dynamically without generating
    /// spurs or timing violations. However, the user must ensure that both
    /// clocks are running.
    pub fn kernel_clk_mux<S: KernelClockSel>(&mut self, sel: S) {
        #[cfg(feature = "log")]
        debug!("Kernel clock -> {:?}", sel);

        write_kernel_clk_mux(&self.rb, sel);
    }

    /// Return the current kernel clock selection, `None` if the field holds
    /// a reserved value
    pub fn get_kernel_clk_mux<S: KernelClockSel>(&self) -> Option<S> {
        read_kernel_clk_mux(&self.rb)
    }

    /// Set the ADC prescaler, 1 to 256. Applies to the ADC1/ADC2 kernel
    /// clock.
    pub fn set_adc_prescaler(&mut self, div: u16) -> Result<(), super::Error> {
        if !(1..=256).contains(&div) {
            return Err(super::Error::InvalidDivider);
        }
        if let Some((reg, field)) = Adc12ClkSel::PRESCALER {
            self.rb.ccipr[reg].modify(field.val(div as u32 - 1));
        }
        Ok(())
    }

    /// Returns `Some(frequency)` of the kernel clock selected by a
    /// multiplexer, otherwise `None`
    pub fn kernel_clock_freq<S: KernelClockSel>(&self) -> Option<Hertz> {
        let source = self.get_kernel_clk_mux::<S>()?.kernel_source();
        let freq = self.kernel_source_freq(source)?;
        match S::PRESCALER {
            Some((reg, field)) => {
                Some(freq / (self.rb.ccipr[reg].read(field) + 1))
            }
            None => Some(freq),
        }
    }

    /// Returns `Some(frequency)` of a clock that kernel clock multiplexers
    /// can select, if it is running
    pub fn kernel_source_freq(&self, source: KernelSource) -> Option<Hertz> {
        match source {
            KernelSource::Hclk => self.hclk_freq(),
            KernelSource::Pclk(apb) => self.pclk_freq(apb),
            KernelSource::Clkp => self.per_clock_freq(),
            KernelSource::Ic(ic) => self.ic_clock_freq(ic),
            KernelSource::Msi => self.oscillator_freq(Oscillator::Msi),
            KernelSource::Hsi => self.oscillator_freq(Oscillator::Hsi),
            KernelSource::Hse => self.oscillator_freq(Oscillator::Hse),
            KernelSource::Lse => self.oscillator_freq(Oscillator::Lse),
            KernelSource::I2sCkin => self.audio_ck_freq(),
            KernelSource::Timg => self.timg_freq(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::regs::{CFGR1, SR};
    use crate::rcc::{Pll, PllConfig, PllSource, RccRegisterFile, SysClkSource};
    use tock_registers::interfaces::Writeable;
    use fugit::RateExtU32;

    #[test]
    fn mux_fields() {
        assert_eq!(LtdcClkSel::FIELD.register_offset(), 0x0C);
        assert_eq!(LtdcClkSel::FIELD.mask(), 0b11 << 24);
        assert_eq!(LtdcClkSel::Ic16.token().config(), 0b10 << 24);
        assert_eq!(Usart2ClkSel::FIELD.mask(), 0b111 << 20);
        assert_eq!(Adc12ClkSel::from_bits(7), Some(Adc12ClkSel::Timg));
        assert_eq!(Usart1ClkSel::from_bits(7), None);
    }

    #[test]
    fn typed_and_packed_agree() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers());

        rcc.kernel_clk_mux(I2c2ClkSel::Msi);
        assert_eq!(file.ccipr[11].get(), 4 << 4);
        assert_eq!(
            rcc.get_clock_source(I2c2ClkSel::Msi.token()),
            Ok(I2c2ClkSel::Msi.token().config())
        );

        rcc.set_clock_source(I2c2ClkSel::Ic15.token()).unwrap();
        assert_eq!(rcc.get_kernel_clk_mux::<I2c2ClkSel>(), Some(I2c2ClkSel::Ic15));
        // Neighbouring fields untouched
        assert_eq!(rcc.get_kernel_clk_mux::<I2c1ClkSel>(), Some(I2c1ClkSel::Pclk1));

        // Reserved value
        file.ccipr[12].set(7 << 16);
        assert_eq!(rcc.get_kernel_clk_mux::<Usart1ClkSel>(), None);
        assert_eq!(rcc.usart1_clock_freq(), None);
    }

    #[test]
    fn ltdc_pixel_clock_from_ic16() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers()).use_hse(48.MHz());

        // 48 MHz / 3 * 50 = 800 MHz, IC16 = 800 MHz / 32 = 25 MHz
        rcc.configure_pll(
            Pll::Pll1,
            &PllConfig::integer(PllSource::Hse, 3, 50, 1, 1),
        )
        .unwrap();
        rcc.configure_ic(Ic::IC16, Pll::Pll1, 32).unwrap();
        file.poke(|r| &r.sr, (SR::HSERDY::SET + SR::PLL1RDY::SET).value);
        file.divenr.set(1 << 15);

        rcc.kernel_clk_mux(LtdcClkSel::Ic16);
        assert_eq!(rcc.ltdc_clock_freq(), Some(25.MHz()));

        // HSI selected, but not running
        rcc.kernel_clk_mux(LtdcClkSel::Hsi);
        assert_eq!(rcc.ltdc_clock_freq(), None);
    }

    #[test]
    fn bus_and_per_clock_paths() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers()).use_hse(48.MHz()).lse_ck(32_768.Hz());
        file.poke(
            |r| &r.sr,
            (SR::HSERDY::SET + SR::HSIRDY::SET + SR::LSERDY::SET).value,
        );

        rcc.set_sys_clock_source(SysClkSource::Hse);
        file.cfgr1.modify(CFGR1::SYSSWS.val(2));
        rcc.set_pclk_prescaler(Apb::Apb1, 2).unwrap();

        // I2C1 on PCLK1
        assert_eq!(rcc.i2c1_clock_freq(), Some(24.MHz()));

        // CLKP from HSE, I2C3 and SDMMC2 from CLKP
        rcc.kernel_clk_mux(PerClkSel::Hse);
        rcc.kernel_clk_mux(I2c3ClkSel::Clkp);
        rcc.kernel_clk_mux(Sdmmc2ClkSel::Clkp);
        assert_eq!(rcc.per_clock_freq(), Some(48.MHz()));
        assert_eq!(rcc.i2c3_clock_freq(), Some(48.MHz()));
        assert_eq!(rcc.sdmmc2_clock_freq(), Some(48.MHz()));

        rcc.kernel_clk_mux(Usart2ClkSel::Lse);
        assert_eq!(rcc.usart2_clock_freq(), Some(32_768.Hz()));

        // ADC on HSI, divided by the ADC prescaler
        rcc.kernel_clk_mux(Adc12ClkSel::Hsi);
        rcc.set_adc_prescaler(4).unwrap();
        assert_eq!(rcc.adc12_clock_freq(), Some(16.MHz()));
        assert_eq!(
            rcc.set_adc_prescaler(0),
            Err(crate::rcc::Error::InvalidDivider)
        );

        // External clock never specified
        rcc.kernel_clk_mux(Spi1ClkSel::I2sCkin);
        assert_eq!(rcc.spi1_clock_freq(), None);
        let rcc = rcc.audio_ck(12_288.kHz());
        assert_eq!(rcc.spi1_clock_freq(), Some(12_288.kHz()));
    }
}
