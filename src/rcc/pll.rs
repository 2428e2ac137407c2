//! Phase Locked Loop Configuration

use core::ops::RangeInclusive;

use super::regs::{CR, PLLCFGR1, PLLCFGR2, PLLCFGR3, SR};
use super::{Error, Oscillator, PllRegisters, Rcc};
use crate::time::Hertz;
use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

#[cfg(feature = "log")]
use log::debug;

const FRACN_DIVISOR: f64 = 16_777_216.0; // 2 ** 24
const FRACN_MAX: u32 = (1 << 24) - 1;

const PLL_M: RangeInclusive<u8> = 1..=63;
const PLL_N_INTEGER: RangeInclusive<u16> = 16..=2500;
const PLL_N_FRACTIONAL: RangeInclusive<u16> = 20..=500;
const PLL_P: RangeInclusive<u8> = 1..=7;

// Limits of the phase frequency detector input and of the VCO
const REF_RANGE: RangeInclusive<u32> = 5_000_000..=50_000_000;
const VCO_RANGE: RangeInclusive<u64> = 800_000_000..=3_200_000_000;

/// Phase Locked Loops
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pll {
    /// PLL1
    Pll1 = 0,
    /// PLL2
    Pll2 = 1,
    /// PLL3
    Pll3 = 2,
    /// PLL4
    Pll4 = 3,
}

impl Pll {
    fn on(self) -> Field<u32, CR::Register> {
        match self {
            Pll::Pll1 => CR::PLL1ON,
            Pll::Pll2 => CR::PLL2ON,
            Pll::Pll3 => CR::PLL3ON,
            Pll::Pll4 => CR::PLL4ON,
        }
    }

    fn ready(self) -> Field<u32, SR::Register> {
        match self {
            Pll::Pll1 => SR::PLL1RDY,
            Pll::Pll2 => SR::PLL2RDY,
            Pll::Pll3 => SR::PLL3RDY,
            Pll::Pll4 => SR::PLL4RDY,
        }
    }
}

/// Reference clock of a PLL
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllSource {
    /// HSI after the HSI divider
    Hsi = 0,
    /// MSI
    Msi = 1,
    /// HSE
    Hse = 2,
    /// External clock on the I2S_CKIN pin
    I2sCkin = 3,
}

/// Strategies for configuring a Phase Locked Loop (PLL)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PllConfigStrategy {
    /// No fractional component
    Integer,
    /// PLL configured with fractional divider
    Fractional,
}

/// Configuration of a Phase Locked Loop (PLL)
///
/// The output frequency is `input / m * (n + fracn / 2^24) / p1 / p2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllConfig {
    pub(super) source: PllSource,
    pub(super) strategy: PllConfigStrategy,
    pub(super) bypass: bool,
    pub(super) dividers: PllDividers,
}

/// Divider and multiplier values of a PLL
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllDividers {
    /// Reference divider, 1 to 63
    pub m: u8,
    /// Integer part of the feedback multiplier
    pub n: u16,
    /// Fractional part of the feedback multiplier, in units of 2^-24
    pub fracn: u32,
    /// First post divider, 1 to 7
    pub p1: u8,
    /// Second post divider, 1 to 7
    pub p2: u8,
}

impl PllConfig {
    /// Integer-N configuration
    pub const fn integer(
        source: PllSource,
        m: u8,
        n: u16,
        p1: u8,
        p2: u8,
    ) -> Self {
        PllConfig {
            source,
            strategy: PllConfigStrategy::Integer,
            bypass: false,
            dividers: PllDividers {
                m,
                n,
                fracn: 0,
                p1,
                p2,
            },
        }
    }

    /// Fractional-N configuration
    pub const fn fractional(
        source: PllSource,
        m: u8,
        n: u16,
        fracn: u32,
        p1: u8,
        p2: u8,
    ) -> Self {
        PllConfig {
            source,
            strategy: PllConfigStrategy::Fractional,
            bypass: false,
            dividers: PllDividers {
                m,
                n,
                fracn,
                p1,
                p2,
            },
        }
    }

    /// The PLL output follows its reference clock
    pub const fn bypassed(source: PllSource) -> Self {
        let mut cfg = Self::integer(source, 1, 16, 1, 1);
        cfg.bypass = true;
        cfg
    }

    /// Find dividers that produce `output` from a reference clock of
    /// `input`. Uses the highest VCO frequency possible.
    ///
    /// Note that this will never produce a clock _faster_ than that
    /// requested. With [`PllConfigStrategy::Integer`] the output may be up
    /// to one reference clock step slower.
    pub fn for_output(
        source: PllSource,
        input: Hertz,
        output: Hertz,
        strategy: PllConfigStrategy,
    ) -> Result<Self, Error> {
        let input = input.raw();
        let output = output.raw() as u64;

        // Highest reference clock the phase detector accepts
        let m = input.div_ceil(*REF_RANGE.end()).max(1);
        let ref_ck = input / m;
        if m > *PLL_M.end() as u32 || !REF_RANGE.contains(&ref_ck) {
            return Err(Error::InvalidDivider);
        }

        let (p1, p2) = PLL_P
            .flat_map(|p1| (1..=p1).map(move |p2| (p1, p2)))
            .filter(|&(p1, p2)| {
                VCO_RANGE.contains(&(output * (p1 * p2) as u64))
            })
            .max_by_key(|&(p1, p2)| p1 * p2)
            .ok_or(Error::InvalidDivider)?;
        let vco_ck = output * (p1 * p2) as u64;

        // Feedback divider. Integer part
        let n = (vco_ck / ref_ck as u64) as u16;

        let cfg = match strategy {
            PllConfigStrategy::Integer => {
                Self::integer(source, m as u8, n, p1, p2)
            }
            PllConfigStrategy::Fractional => {
                let fracn = calc_fracn(ref_ck, n, vco_ck);
                Self::fractional(source, m as u8, n, fracn, p1, p2)
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reference clock
    pub fn source(&self) -> PllSource {
        self.source
    }

    /// Divider values
    pub fn dividers(&self) -> PllDividers {
        self.dividers
    }

    fn validate(&self) -> Result<(), Error> {
        if self.bypass {
            return Ok(());
        }
        let d = &self.dividers;
        let n_range = match self.strategy {
            PllConfigStrategy::Integer => PLL_N_INTEGER,
            PllConfigStrategy::Fractional => PLL_N_FRACTIONAL,
        };
        if PLL_M.contains(&d.m)
            && n_range.contains(&d.n)
            && d.fracn <= FRACN_MAX
            && PLL_P.contains(&d.p1)
            && PLL_P.contains(&d.p2)
        {
            Ok(())
        } else {
            Err(Error::InvalidDivider)
        }
    }
}

/// Calculate the Fractional-N part of the multiplier
///
/// ref_ck - Frequency at the PFD input
/// pll_n - Integer-N part of the multiplier
/// vco_ck - Wanted VCO frequency
fn calc_fracn(ref_ck: u32, pll_n: u16, vco_ck: u64) -> u32 {
    let fracn =
        FRACN_DIVISOR * ((vco_ck as f64 / ref_ck as f64) - pll_n as f64);
    // Rounding down by casting gives up the lowest without going over
    (fracn as u32).min(FRACN_MAX)
}

/// Calculates the output frequency of a PLL
///
/// `input * (n + fracn / 2^24) / m / p1 / p2`, truncated to an integer
/// number of Hz. `m`, `p1` and `p2` must not be zero.
pub fn calc_pll_clock_freq(
    input: u32,
    m: u32,
    n: u32,
    fracn: u32,
    p1: u32,
    p2: u32,
) -> u32 {
    let freq =
        (input as f64 * (n as f64 + (fracn as f64 / FRACN_DIVISOR))) / m as f64;
    let freq = freq / p1 as f64;
    let freq = freq / p2 as f64;
    freq as u32
}

impl Rcc<'_> {
    fn pll_regs(&self, pll: Pll) -> &PllRegisters {
        &self.rb.pll[pll as usize]
    }

    /// Turn on a PLL. It is locked once
    /// [`is_pll_ready`](Rcc::is_pll_ready) returns true.
    pub fn enable_pll(&mut self, pll: Pll) {
        self.rb.set.cr.write(pll.on().val(1));
    }

    /// Turn off a PLL
    pub fn disable_pll(&mut self, pll: Pll) {
        self.rb.clear.cr.write(pll.on().val(1));
    }

    /// True if the PLL has been turned on
    pub fn is_pll_enabled(&self, pll: Pll) -> bool {
        self.rb.cr.is_set(pll.on())
    }

    /// True if the PLL is locked
    pub fn is_pll_ready(&self, pll: Pll) -> bool {
        self.rb.sr.is_set(pll.ready())
    }

    /// Poll the ready flag of a PLL at most `max_polls` times
    pub fn wait_pll_ready(&self, pll: Pll, max_polls: u32) -> Result<(), Error> {
        super::wait_for(max_polls, || self.is_pll_ready(pll))
    }

    /// Configure a PLL. The PLL must be disabled.
    pub fn configure_pll(
        &mut self,
        pll: Pll,
        cfg: &PllConfig,
    ) -> Result<(), Error> {
        if self.is_pll_enabled(pll) {
            return Err(Error::PllEnabled);
        }
        cfg.validate()?;

        #[cfg(feature = "log")]
        debug!("{:?} <- {:?}", pll, cfg);

        let d = &cfg.dividers;
        let regs = self.pll_regs(pll);
        if cfg.bypass {
            regs.cfgr1.modify(
                PLLCFGR1::PLLSEL.val(cfg.source as u32) + PLLCFGR1::PLLBYP::SET,
            );
            // The bypassed reference clock still leaves through the post
            // divider output
            regs.cfgr3.modify(PLLCFGR3::PLLPDIVEN::SET);
            return Ok(());
        }
        regs.cfgr1.modify(
            PLLCFGR1::PLLSEL.val(cfg.source as u32)
                + PLLCFGR1::PLLDIVM.val(d.m as u32)
                + PLLCFGR1::PLLDIVN.val(d.n as u32)
                + PLLCFGR1::PLLBYP::CLEAR,
        );
        regs.cfgr2.write(PLLCFGR2::PLLDIVNFRAC.val(d.fracn));
        regs.cfgr3.modify(
            PLLCFGR3::PLLPDIV1.val(d.p1 as u32)
                + PLLCFGR3::PLLPDIV2.val(d.p2 as u32)
                + PLLCFGR3::PLLPDIVEN::SET,
        );
        Ok(())
    }

    /// Enable or disable the post divider output of a PLL
    pub fn set_pll_output(&mut self, pll: Pll, enable: bool) {
        self.pll_regs(pll)
            .cfgr3
            .modify(PLLCFGR3::PLLPDIVEN.val(enable as u32));
    }

    /// True if the post divider output of the PLL is enabled
    pub fn is_pll_output_enabled(&self, pll: Pll) -> bool {
        self.pll_regs(pll).cfgr3.is_set(PLLCFGR3::PLLPDIVEN)
    }

    /// True if the PLL is bypassed
    pub fn is_pll_bypassed(&self, pll: Pll) -> bool {
        self.pll_regs(pll).cfgr1.is_set(PLLCFGR1::PLLBYP)
    }

    /// Current reference clock of a PLL
    pub fn pll_source(&self, pll: Pll) -> PllSource {
        match self.pll_regs(pll).cfgr1.read(PLLCFGR1::PLLSEL) {
            0 => PllSource::Hsi,
            1 => PllSource::Msi,
            2 => PllSource::Hse,
            _ => PllSource::I2sCkin,
        }
    }

    /// Current divider values of a PLL
    pub fn pll_dividers(&self, pll: Pll) -> PllDividers {
        let regs = self.pll_regs(pll);
        let cfgr1 = regs.cfgr1.extract();
        let cfgr3 = regs.cfgr3.extract();
        PllDividers {
            m: cfgr1.read(PLLCFGR1::PLLDIVM) as u8,
            n: cfgr1.read(PLLCFGR1::PLLDIVN) as u16,
            fracn: regs.cfgr2.read(PLLCFGR2::PLLDIVNFRAC),
            p1: cfgr3.read(PLLCFGR3::PLLPDIV1) as u8,
            p2: cfgr3.read(PLLCFGR3::PLLPDIV2) as u8,
        }
    }

    /// Returns `Some(frequency)` of the reference clock of a PLL if that
    /// clock is running
    pub fn pll_input_freq(&self, pll: Pll) -> Option<Hertz> {
        match self.pll_source(pll) {
            PllSource::Hsi => self.oscillator_freq(Oscillator::Hsi),
            PllSource::Msi => self.oscillator_freq(Oscillator::Msi),
            PllSource::Hse => self.oscillator_freq(Oscillator::Hse),
            PllSource::I2sCkin => self.audio_ck_freq(),
        }
    }

    /// Returns `Some(frequency)` of the output of a PLL
    ///
    /// `None` if the PLL is not locked, its post divider output is
    /// disabled, or its reference clock is not running.
    pub fn pll_clock_freq(&self, pll: Pll) -> Option<Hertz> {
        if !self.is_pll_ready(pll) || !self.is_pll_output_enabled(pll) {
            return None;
        }
        let input = self.pll_input_freq(pll)?;
        if self.is_pll_bypassed(pll) {
            return Some(input);
        }

        let d = self.pll_dividers(pll);
        if d.m == 0 || d.p1 == 0 || d.p2 == 0 {
            return None;
        }
        Some(Hertz::from_raw(calc_pll_clock_freq(
            input.raw(),
            d.m as u32,
            d.n as u32,
            d.fracn,
            d.p1 as u32,
            d.p2 as u32,
        )))
    }
}
