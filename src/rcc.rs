//! Reset and Clock Control
//!
//! This module gives access to the STM32N6 clock tree: the oscillators,
//! the four PLLs, the twenty IC dividers that derive usable clocks from
//! the PLL outputs, the CPU and system bus clock switches, the bus
//! prescalers and the kernel clock multiplexers of the peripherals.
//!
//! See Figure 52 "Clock tree" in Reference Manual RM0486 for more
//! information.
//!
//! HSI is 64 MHz.
//! MSI is 4 MHz or 16 MHz.
//! LSI is 32 kHz.
//!
//! # Usage
//!
//! The driver accesses the [`RccRegisters`] block through a
//! [`RegisterRef`]. On the device this is the memory mapped RCC, on a host
//! it can point into a simulated [`RccRegisterFile`].
//!
//! The frequencies of clocks that come from outside the device (HSE, LSE
//! and the I2S_CKIN pin) must be supplied with the builder methods:
//!
//! ```no_run
//! use stm32n6xx_hal::prelude::*;
//! use stm32n6xx_hal::rcc::{Oscillator, Pll, PllConfig, PllSource, Rcc};
//!
//! let mut rcc = unsafe { Rcc::steal() }.use_hse(48.MHz());
//!
//! rcc.enable_oscillator(Oscillator::Hse);
//! rcc.wait_oscillator_ready(Oscillator::Hse, 100_000).unwrap();
//!
//! // 48 MHz / 3 * 50 / 1 / 1 = 800 MHz
//! let cfg = PllConfig::integer(PllSource::Hse, 3, 50, 1, 1);
//! rcc.configure_pll(Pll::Pll1, &cfg).unwrap();
//! rcc.enable_pll(Pll::Pll1);
//! ```
//!
//! # Frequencies
//!
//! All frequency getters re-read the registers on every call. They return
//! `None` when the clock (or one of the clocks it is derived from) is not
//! running. [`to_sentinel`] turns that into the raw
//! [`PERIPH_FREQUENCY_NO`] value.
//!
//!```no_run
//! # use stm32n6xx_hal::rcc::{Pll, Rcc};
//! # let rcc = unsafe { Rcc::steal() };
//! // Runtime confirmation that pll1 is running at 800MHz
//! assert_eq!(rcc.pll_clock_freq(Pll::Pll1).unwrap().raw(), 800_000_000);
//!```
#![deny(missing_docs)]

use crate::reg::{RegisterFile, RegisterMap, RegisterRef, RCC_BASE};
use crate::time::Hertz;
use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::register_structs;

#[cfg(feature = "log")]
use log::debug;

mod clock_source;
mod core_clocks;
mod ic;
mod kernel_clk;
mod pll;
pub mod rec;
pub mod regs;

pub use clock_source::ClockSource;
pub use core_clocks::CoreClocks;
pub use ic::{Ic, IcSource};
pub use kernel_clk::*;
pub use pll::{
    calc_pll_clock_freq, Pll, PllConfig, PllConfigStrategy, PllDividers,
    PllSource,
};
pub use rec::{PeripheralREC, ResetEnable};

use regs::{
    BUS_COUNT, CCIPR_COUNT, CFGR1, CFGR2, CR, HSECFGR, HSICFGR, ICCFGR,
    MSICFGR, PLLCFGR1, PLLCFGR2, PLLCFGR3, SR,
};

register_structs! {
    /// RCC register block
    pub RccRegisters {
        (0x000 => cr: ReadWrite<u32, CR::Register>),
        (0x004 => sr: ReadOnly<u32, SR::Register>),
        (0x008 => _reserved0),
        (0x020 => cfgr1: ReadWrite<u32, CFGR1::Register>),
        (0x024 => cfgr2: ReadWrite<u32, CFGR2::Register>),
        (0x028 => _reserved1),
        (0x044 => msicfgr: ReadWrite<u32, MSICFGR::Register>),
        (0x048 => hsicfgr: ReadWrite<u32, HSICFGR::Register>),
        (0x04C => _reserved2),
        (0x050 => hsecfgr: ReadWrite<u32, HSECFGR::Register>),
        (0x054 => _reserved3),
        (0x080 => pll: [PllRegisters; 4]),
        (0x0C0 => _reserved4),
        (0x0C4 => iccfgr: [ReadWrite<u32, ICCFGR::Register>; 20]),
        (0x114 => _reserved5),
        (0x144 => ccipr: [ReadWrite<u32>; CCIPR_COUNT]),
        (0x17C => _reserved6),
        (0x210 => busrstr: [ReadWrite<u32>; BUS_COUNT]),
        (0x240 => divenr: ReadWrite<u32>),
        (0x244 => _reserved7),
        (0x250 => busenr: [ReadWrite<u32>; BUS_COUNT]),
        (0x280 => _reserved8),
        (0x800 => set: AliasRegisters),
        (0x1000 => clear: AliasRegisters),
        (0x1800 => @END),
    },

    /// Configuration registers of one PLL
    pub PllRegisters {
        (0x0 => cfgr1: ReadWrite<u32, PLLCFGR1::Register>),
        (0x4 => cfgr2: ReadWrite<u32, PLLCFGR2::Register>),
        (0x8 => cfgr3: ReadWrite<u32, PLLCFGR3::Register>),
        (0xC => _reserved0),
        (0x10 => @END),
    },

    /// Set or clear alias of the enable registers. Writing a one sets or
    /// clears the bit, zeros have no effect.
    pub AliasRegisters {
        (0x000 => cr: WriteOnly<u32, CR::Register>),
        (0x004 => _reserved0),
        (0x210 => busrstr: [WriteOnly<u32>; BUS_COUNT]),
        (0x240 => divenr: WriteOnly<u32>),
        (0x244 => _reserved1),
        (0x250 => busenr: [WriteOnly<u32>; BUS_COUNT]),
        (0x280 => _reserved2),
        (0x800 => @END),
    }
}

// unsafe: registers and padding only
unsafe impl RegisterMap for RccRegisters {}

/// A simulated RCC register block
pub type RccRegisterFile = RegisterFile<RccRegisters>;

/// Raw frequency value of a clock that is not running
pub const PERIPH_FREQUENCY_NO: u32 = 0xFFFF_FFFF;

/// Convert a frequency from one of the getters in this module into the raw
/// sentinel convention, where a stopped clock reads as
/// [`PERIPH_FREQUENCY_NO`]
pub fn to_sentinel(freq: Option<Hertz>) -> u32 {
    freq.map_or(PERIPH_FREQUENCY_NO, |f| f.raw())
}

pub(crate) const HSI: u32 = 64_000_000; // Hz
const MSI_4MHZ: u32 = 4_000_000; // Hz
const MSI_16MHZ: u32 = 16_000_000; // Hz
const LSI: u32 = 32_000; // Hz
const LSE: u32 = 32_768; // Hz

/// RCC errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A divider or multiplier is outside the range supported by the
    /// hardware
    InvalidDivider,
    /// A clock source token addresses a register or field outside the
    /// kernel clock configuration registers
    InvalidClockSource,
    /// The PLL must be disabled before it is configured
    PllEnabled,
    /// The oscillator must be disabled before it is configured
    OscillatorEnabled,
    /// A clock did not become ready in time
    Timeout,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidDivider => f.write_str("divider out of range"),
            Error::InvalidClockSource => f.write_str("invalid clock source"),
            Error::PllEnabled => f.write_str("PLL is enabled"),
            Error::OscillatorEnabled => f.write_str("oscillator is enabled"),
            Error::Timeout => f.write_str("clock not ready"),
        }
    }
}

/// Configuration of the clocks supplied from outside the device
pub struct Config {
    hse: Option<u32>,
    bypass_hse: bool,
    lse: u32,
    audio_ck: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hse: None,
            bypass_hse: false,
            lse: LSE,
            audio_ck: None,
        }
    }
}

/// RCC peripheral
pub struct Rcc<'a> {
    config: Config,
    pub(crate) rb: RegisterRef<'a, RccRegisters>,
}

impl Rcc<'static> {
    /// Access the RCC of the device
    ///
    /// # Safety
    ///
    /// The caller must ensure that no other `Rcc` exists, as both would
    /// access the same registers.
    pub unsafe fn steal() -> Self {
        Rcc::new(RegisterRef::new(RCC_BASE))
    }
}

impl<'a> Rcc<'a> {
    /// Create a driver for the RCC registers in `rb`
    pub fn new(rb: RegisterRef<'a, RccRegisters>) -> Self {
        Rcc {
            config: Config::default(),
            rb,
        }
    }

    /// Release the registers
    pub fn free(self) -> RegisterRef<'a, RccRegisters> {
        self.rb
    }

    /// Frequency of the external oscillator (HSE) connected to the device.
    #[must_use]
    pub fn use_hse(mut self, freq: Hertz) -> Self {
        self.config.hse = Some(freq.raw());
        self
    }

    /// Use an external clock signal rather than a crystal oscillator,
    /// bypassing the XTAL driver. Applied the next time HSE is enabled.
    #[must_use]
    pub fn bypass_hse(mut self) -> Self {
        self.config.bypass_hse = true;
        self
    }

    /// Set low speed external clock frequency. Defaults to 32.768 kHz.
    #[must_use]
    pub fn lse_ck(mut self, freq: Hertz) -> Self {
        self.config.lse = freq.raw();
        self
    }

    /// Set the frequency of the external I2S_CKIN clock
    #[must_use]
    pub fn audio_ck(mut self, freq: Hertz) -> Self {
        self.config.audio_ck = Some(freq.raw());
        self
    }

    /// Returns `Some(frequency)` of the external I2S_CKIN clock, if one was
    /// specified
    pub fn audio_ck_freq(&self) -> Option<Hertz> {
        self.config.audio_ck.map(Hertz::from_raw)
    }
}

/// Oscillators of the RCC
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    /// Low speed internal RC, 32 kHz
    Lsi,
    /// Low speed external crystal
    Lse,
    /// Multi-speed internal RC, 4 or 16 MHz
    Msi,
    /// High speed internal RC, 64 MHz
    Hsi,
    /// High speed external crystal or clock
    Hse,
}

impl Oscillator {
    fn on(self) -> Field<u32, CR::Register> {
        match self {
            Oscillator::Lsi => CR::LSION,
            Oscillator::Lse => CR::LSEON,
            Oscillator::Msi => CR::MSION,
            Oscillator::Hsi => CR::HSION,
            Oscillator::Hse => CR::HSEON,
        }
    }

    fn ready(self) -> Field<u32, SR::Register> {
        match self {
            Oscillator::Lsi => SR::LSIRDY,
            Oscillator::Lse => SR::LSERDY,
            Oscillator::Msi => SR::MSIRDY,
            Oscillator::Hsi => SR::HSIRDY,
            Oscillator::Hse => SR::HSERDY,
        }
    }
}

/// HSI output divider
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HsiDiv {
    /// 64 MHz
    Div1 = 0,
    /// 32 MHz
    Div2 = 1,
    /// 16 MHz
    Div4 = 2,
    /// 8 MHz
    Div8 = 3,
}

/// MSI frequency
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MsiFreq {
    /// 4 MHz
    Freq4MHz,
    /// 16 MHz
    Freq16MHz,
}

impl Rcc<'_> {
    /// Turn on an oscillator. It is ready once
    /// [`is_oscillator_ready`](Rcc::is_oscillator_ready) returns true.
    pub fn enable_oscillator(&mut self, osc: Oscillator) {
        if osc == Oscillator::Hse && !self.is_oscillator_enabled(osc) {
            // HSEBYP can only be written while HSE is off
            self.rb
                .hsecfgr
                .modify(HSECFGR::HSEBYP.val(self.config.bypass_hse as u32));
        }
        self.rb.set.cr.write(osc.on().val(1));
    }

    /// Turn off an oscillator
    pub fn disable_oscillator(&mut self, osc: Oscillator) {
        self.rb.clear.cr.write(osc.on().val(1));
    }

    /// True if the oscillator has been turned on
    pub fn is_oscillator_enabled(&self, osc: Oscillator) -> bool {
        self.rb.cr.is_set(osc.on())
    }

    /// True if the oscillator is running and stable
    pub fn is_oscillator_ready(&self, osc: Oscillator) -> bool {
        self.rb.sr.is_set(osc.ready())
    }

    /// Poll the ready flag of an oscillator at most `max_polls` times
    pub fn wait_oscillator_ready(
        &self,
        osc: Oscillator,
        max_polls: u32,
    ) -> Result<(), Error> {
        wait_for(max_polls, || self.is_oscillator_ready(osc))
    }

    /// Set the HSI divider. The divided HSI feeds the PLLs, the CPU and
    /// system clock switches and the kernel clock multiplexers.
    pub fn set_hsi_divider(&mut self, div: HsiDiv) {
        self.rb.hsicfgr.modify(HSICFGR::HSIDIV.val(div as u32));
    }

    /// Current HSI divider
    pub fn hsi_divider(&self) -> HsiDiv {
        match self.rb.hsicfgr.read(HSICFGR::HSIDIV) {
            0 => HsiDiv::Div1,
            1 => HsiDiv::Div2,
            2 => HsiDiv::Div4,
            _ => HsiDiv::Div8,
        }
    }

    /// Select the MSI frequency. MSI must be off.
    pub fn set_msi_frequency(&mut self, freq: MsiFreq) -> Result<(), Error> {
        if self.is_oscillator_enabled(Oscillator::Msi) {
            return Err(Error::OscillatorEnabled);
        }
        self.rb.msicfgr.modify(match freq {
            MsiFreq::Freq4MHz => MSICFGR::MSIFREQSEL::Freq4MHz,
            MsiFreq::Freq16MHz => MSICFGR::MSIFREQSEL::Freq16MHz,
        });
        Ok(())
    }

    /// Current MSI frequency selection
    pub fn msi_frequency(&self) -> MsiFreq {
        match self.rb.msicfgr.read_as_enum(MSICFGR::MSIFREQSEL) {
            Some(MSICFGR::MSIFREQSEL::Value::Freq16MHz) => MsiFreq::Freq16MHz,
            _ => MsiFreq::Freq4MHz,
        }
    }

    /// Returns `Some(frequency)` if the oscillator is ready, otherwise
    /// `None`. For HSI this is the frequency after the HSI divider.
    ///
    /// HSE also returns `None` if its frequency was never specified with
    /// [`use_hse`](Rcc::use_hse).
    pub fn oscillator_freq(&self, osc: Oscillator) -> Option<Hertz> {
        if !self.is_oscillator_ready(osc) {
            return None;
        }
        let hz = match osc {
            Oscillator::Lsi => LSI,
            Oscillator::Lse => self.config.lse,
            Oscillator::Msi => match self.msi_frequency() {
                MsiFreq::Freq4MHz => MSI_4MHZ,
                MsiFreq::Freq16MHz => MSI_16MHZ,
            },
            Oscillator::Hsi => HSI >> (self.hsi_divider() as u32),
            Oscillator::Hse => self.config.hse?,
        };
        Some(Hertz::from_raw(hz))
    }
}

/// CPU clock (`cpu_ck`) switch positions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CpuClkSource {
    /// HSI after the HSI divider
    Hsi = 0,
    /// MSI
    Msi = 1,
    /// HSE
    Hse = 2,
    /// IC1 divider output
    Ic1 = 3,
}

/// System bus clock (`sys_bus_ck`) switch positions
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClkSource {
    /// HSI after the HSI divider
    Hsi = 0,
    /// MSI
    Msi = 1,
    /// HSE
    Hse = 2,
    /// IC2 divider output. IC6 and IC11 must be configured as well.
    Ic2 = 3,
}

/// APB busses
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Apb {
    /// APB1
    Apb1,
    /// APB2
    Apb2,
    /// APB4
    Apb4,
    /// APB5
    Apb5,
}

impl Apb {
    fn ppre(self) -> Field<u32, CFGR2::Register> {
        match self {
            Apb::Apb1 => CFGR2::PPRE1,
            Apb::Apb2 => CFGR2::PPRE2,
            Apb::Apb4 => CFGR2::PPRE4,
            Apb::Apb5 => CFGR2::PPRE5,
        }
    }
}

/// Power of two prescaler: returns log2(div) if `div` is a power of two
/// no larger than `1 << max_shift`
fn prescaler_shift(div: u32, max_shift: u32) -> Result<u32, Error> {
    if div.is_power_of_two() && div.trailing_zeros() <= max_shift {
        Ok(div.trailing_zeros())
    } else {
        Err(Error::InvalidDivider)
    }
}

macro_rules! clock_switch {
    ($($(#[$doc:meta])* $set:ident, $get:ident: $Source:ident, $sw:ident, $sws:ident
       [ $($Variant:ident),+ ];)+) => {
        $(
            $(#[$doc])*
            pub fn $set(&mut self, src: $Source) {
                #[cfg(feature = "log")]
                debug!(concat!(stringify!($Source), " -> {:?}"), src);

                self.rb.cfgr1.modify(CFGR1::$sw.val(src as u32));
            }

            /// Returns the source currently used by the switch, as
            /// reported by the status field
            pub fn $get(&self) -> $Source {
                let bits = self.rb.cfgr1.read(CFGR1::$sws);
                [$($Source::$Variant),+]
                    .into_iter()
                    .find(|src| *src as u32 == bits)
                    .unwrap_or($Source::Hsi)
            }
        )+
    };
}

impl Rcc<'_> {
    clock_switch! {
        /// Select the source of the CPU clock. The switch takes effect
        /// once the selected clock is running.
        set_cpu_clock_source, cpu_clock_source:
            CpuClkSource, CPUSW, CPUSWS [Hsi, Msi, Hse, Ic1];
        /// Select the source of the system bus clock. The switch takes
        /// effect once the selected clock is running.
        set_sys_clock_source, sys_clock_source:
            SysClkSource, SYSSW, SYSSWS [Hsi, Msi, Hse, Ic2];
    }

    /// Set the AHB prescaler. `div` is one of 1, 2, 4, ..., 128.
    pub fn set_hclk_prescaler(&mut self, div: u32) -> Result<(), Error> {
        let shift = prescaler_shift(div, 7)?;
        self.rb.cfgr2.modify(CFGR2::HPRE.val(shift));
        Ok(())
    }

    /// Set the prescaler of an APB bus. `div` is one of 1, 2, 4, ..., 128.
    pub fn set_pclk_prescaler(
        &mut self,
        apb: Apb,
        div: u32,
    ) -> Result<(), Error> {
        let shift = prescaler_shift(div, 7)?;
        self.rb.cfgr2.modify(apb.ppre().val(shift));
        Ok(())
    }

    /// Set the timer prescaler. `div` is one of 1, 2, 4 or 8.
    pub fn set_timer_prescaler(&mut self, div: u32) -> Result<(), Error> {
        let shift = prescaler_shift(div, 3)?;
        self.rb.cfgr2.modify(CFGR2::TIMPRE.val(shift));
        Ok(())
    }

    /// Returns `Some(frequency)` of the CPU clock if its source is running
    pub fn cpu_clock_freq(&self) -> Option<Hertz> {
        match self.cpu_clock_source() {
            CpuClkSource::Hsi => self.oscillator_freq(Oscillator::Hsi),
            CpuClkSource::Msi => self.oscillator_freq(Oscillator::Msi),
            CpuClkSource::Hse => self.oscillator_freq(Oscillator::Hse),
            CpuClkSource::Ic1 => self.ic_clock_freq(Ic::IC1),
        }
    }

    /// Returns `Some(frequency)` of the system bus clock if its source is
    /// running
    pub fn sys_clock_freq(&self) -> Option<Hertz> {
        match self.sys_clock_source() {
            SysClkSource::Hsi => self.oscillator_freq(Oscillator::Hsi),
            SysClkSource::Msi => self.oscillator_freq(Oscillator::Msi),
            SysClkSource::Hse => self.oscillator_freq(Oscillator::Hse),
            SysClkSource::Ic2 => self.ic_clock_freq(Ic::IC2),
        }
    }

    /// Returns `Some(frequency)` of the AHB clock
    pub fn hclk_freq(&self) -> Option<Hertz> {
        let hpre = self.rb.cfgr2.read(CFGR2::HPRE);
        self.sys_clock_freq()
            .map(|sys| Hertz::from_raw(sys.raw() >> hpre))
    }

    /// Returns `Some(frequency)` of an APB clock
    pub fn pclk_freq(&self, apb: Apb) -> Option<Hertz> {
        let ppre = self.rb.cfgr2.read(apb.ppre());
        self.hclk_freq()
            .map(|hclk| Hertz::from_raw(hclk.raw() >> ppre))
    }

    /// Returns `Some(frequency)` of the timer kernel clock (TIMG)
    pub fn timg_freq(&self) -> Option<Hertz> {
        let timpre = self.rb.cfgr2.read(CFGR2::TIMPRE);
        self.sys_clock_freq()
            .map(|sys| Hertz::from_raw(sys.raw() >> timpre))
    }

    /// Snapshot of the core clock frequencies
    pub fn clocks(&self) -> CoreClocks {
        CoreClocks {
            cpu_ck: self.cpu_clock_freq(),
            sys_ck: self.sys_clock_freq(),
            hclk: self.hclk_freq(),
            pclk1: self.pclk_freq(Apb::Apb1),
            pclk2: self.pclk_freq(Apb::Apb2),
            pclk4: self.pclk_freq(Apb::Apb4),
            pclk5: self.pclk_freq(Apb::Apb5),
            timg_ck: self.timg_freq(),
            hsi_ck: self.oscillator_freq(Oscillator::Hsi),
            msi_ck: self.oscillator_freq(Oscillator::Msi),
            hse_ck: self.oscillator_freq(Oscillator::Hse),
            lse_ck: self.oscillator_freq(Oscillator::Lse),
            lsi_ck: self.oscillator_freq(Oscillator::Lsi),
            per_ck: self.kernel_clock_freq::<PerClkSel>(),
        }
    }
}

/// Evaluate `ready` up to `max_polls` times
pub(crate) fn wait_for<F>(max_polls: u32, mut ready: F) -> Result<(), Error>
where
    F: FnMut() -> bool,
{
    for _ in 0..max_polls {
        if ready() {
            return Ok(());
        }
    }
    Err(Error::Timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fugit::RateExtU32;

    #[test]
    fn oscillator_enable_uses_set_and_clear_aliases() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers()).use_hse(48.MHz()).bypass_hse();

        rcc.enable_oscillator(Oscillator::Hse);
        assert_eq!(file.peek(|r| &r.set.cr), 1 << 4);
        assert!(file.hsecfgr.is_set(HSECFGR::HSEBYP));

        rcc.disable_oscillator(Oscillator::Msi);
        assert_eq!(file.peek(|r| &r.clear.cr), 1 << 2);
    }

    #[test]
    fn register_offsets() {
        let file = RccRegisterFile::new();

        assert_eq!(file.offset(|r| &r.cfgr2), 0x024);
        assert_eq!(file.offset(|r| &r.pll[2].cfgr3), 0x0A8);
        assert_eq!(file.offset(|r| &r.iccfgr[15]), 0x100);
        assert_eq!(file.offset(|r| &r.ccipr[13]), 0x178);
        assert_eq!(file.offset(|r| &r.busenr[regs::APB5]), 0x27C);
        assert_eq!(file.offset(|r| &r.set.busenr[regs::APB5]), 0xA7C);
        assert_eq!(file.offset(|r| &r.clear.cr), 0x1000);
    }

    #[test]
    fn oscillator_frequencies() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers());

        // Nothing ready
        assert_eq!(rcc.oscillator_freq(Oscillator::Hsi), None);
        assert_eq!(
            rcc.wait_oscillator_ready(Oscillator::Hsi, 10),
            Err(Error::Timeout)
        );

        file.poke(
            |r| &r.sr,
            (SR::HSIRDY::SET + SR::MSIRDY::SET + SR::HSERDY::SET).value,
        );
        assert_eq!(rcc.wait_oscillator_ready(Oscillator::Hsi, 10), Ok(()));
        assert_eq!(rcc.oscillator_freq(Oscillator::Hsi), Some(64.MHz()));

        rcc.set_hsi_divider(HsiDiv::Div8);
        assert_eq!(rcc.hsi_divider(), HsiDiv::Div8);
        assert_eq!(rcc.oscillator_freq(Oscillator::Hsi), Some(8.MHz()));

        assert_eq!(rcc.oscillator_freq(Oscillator::Msi), Some(4.MHz()));
        assert_eq!(rcc.set_msi_frequency(MsiFreq::Freq16MHz), Ok(()));
        assert_eq!(rcc.oscillator_freq(Oscillator::Msi), Some(16.MHz()));

        // HSE is ready but its frequency is unknown
        assert_eq!(rcc.oscillator_freq(Oscillator::Hse), None);
        let rcc = rcc.use_hse(25.MHz());
        assert_eq!(rcc.oscillator_freq(Oscillator::Hse), Some(25.MHz()));
    }

    #[test]
    fn msi_frequency_requires_msi_off() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers());
        file.cr.write(CR::MSION::SET);

        assert_eq!(
            rcc.set_msi_frequency(MsiFreq::Freq16MHz),
            Err(Error::OscillatorEnabled)
        );
        assert_eq!(rcc.msi_frequency(), MsiFreq::Freq4MHz);
    }

    #[test]
    fn bus_clocks_from_hse() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers()).use_hse(48.MHz());
        file.poke(|r| &r.sr, SR::HSERDY::SET.value);

        rcc.set_sys_clock_source(SysClkSource::Hse);
        // The status field follows the switch once the hardware has
        // switched
        file.cfgr1.modify(CFGR1::SYSSWS.val(2));
        assert_eq!(rcc.sys_clock_source(), SysClkSource::Hse);

        rcc.set_hclk_prescaler(2).unwrap();
        rcc.set_pclk_prescaler(Apb::Apb5, 4).unwrap();
        rcc.set_timer_prescaler(8).unwrap();
        assert_eq!(rcc.set_pclk_prescaler(Apb::Apb1, 3), Err(Error::InvalidDivider));
        assert_eq!(rcc.set_hclk_prescaler(256), Err(Error::InvalidDivider));

        let clocks = rcc.clocks();
        assert_eq!(clocks.sys_ck(), Some(48.MHz()));
        assert_eq!(clocks.hclk(), Some(24.MHz()));
        assert_eq!(clocks.pclk1(), Some(24.MHz()));
        assert_eq!(clocks.pclk5(), Some(6.MHz()));
        assert_eq!(clocks.timg_ck(), Some(6.MHz()));
        // CPU switch still reports HSI, which is not ready
        assert_eq!(clocks.cpu_ck(), None);
    }

    #[test]
    fn sentinel() {
        assert_eq!(to_sentinel(None), PERIPH_FREQUENCY_NO);
        assert_eq!(to_sentinel(Some(Hertz::from_raw(42))), 42);
    }
}
