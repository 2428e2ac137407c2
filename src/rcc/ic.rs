//! IC dividers
//!
//! Each of the twenty IC dividers takes the output of one of the four PLLs
//! and divides it by an integer between 1 and 256. The IC outputs feed the
//! CPU and bus clock switches and most of the kernel clock multiplexers.

use super::regs::ICCFGR;
use super::{Error, Pll, Rcc};
use crate::time::Hertz;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};

#[cfg(feature = "log")]
use log::debug;

/// One of the IC dividers IC1 to IC20
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ic(u8);

/// PLL feeding an IC divider
pub type IcSource = Pll;

macro_rules! ic_constants {
    ($($name:ident: $n:expr,)+) => {
        $(
            #[doc = concat!("IC", stringify!($n))]
            pub const $name: Ic = Ic($n);
        )+
    };
}

impl Ic {
    ic_constants! {
        IC1: 1, IC2: 2, IC3: 3, IC4: 4, IC5: 5,
        IC6: 6, IC7: 7, IC8: 8, IC9: 9, IC10: 10,
        IC11: 11, IC12: 12, IC13: 13, IC14: 14, IC15: 15,
        IC16: 16, IC17: 17, IC18: 18, IC19: 19, IC20: 20,
    }

    /// ICn, for n in 1 to 20
    pub const fn new(n: u8) -> Option<Self> {
        if n >= 1 && n <= 20 {
            Some(Ic(n))
        } else {
            None
        }
    }

    /// Number of this IC
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Index in the IC configuration register array
    const fn index(self) -> usize {
        self.0 as usize - 1
    }

    const fn enable_bit(self) -> u32 {
        1 << (self.0 - 1)
    }
}

impl Rcc<'_> {
    /// Select the PLL that feeds an IC and its divider, 1 to 256
    pub fn configure_ic(
        &mut self,
        ic: Ic,
        source: IcSource,
        divider: u16,
    ) -> Result<(), Error> {
        if !(1..=256).contains(&divider) {
            return Err(Error::InvalidDivider);
        }

        #[cfg(feature = "log")]
        debug!("IC{} <- {:?} / {}", ic.number(), source, divider);

        self.rb.iccfgr[ic.index()].modify(
            ICCFGR::ICINT.val(divider as u32 - 1)
                + ICCFGR::ICSEL.val(source as u32),
        );
        Ok(())
    }

    /// Enable the output of an IC divider
    pub fn enable_ic(&mut self, ic: Ic) {
        self.rb.set.divenr.set(ic.enable_bit());
    }

    /// Disable the output of an IC divider
    pub fn disable_ic(&mut self, ic: Ic) {
        self.rb.clear.divenr.set(ic.enable_bit());
    }

    /// True if the output of the IC divider is enabled
    pub fn is_ic_enabled(&self, ic: Ic) -> bool {
        self.rb.divenr.get() & ic.enable_bit() != 0
    }

    /// Division factor of an IC, 1 to 256
    pub fn ic_divider(&self, ic: Ic) -> u16 {
        self.rb.iccfgr[ic.index()].read(ICCFGR::ICINT) as u16 + 1
    }

    /// PLL feeding an IC
    pub fn ic_source(&self, ic: Ic) -> IcSource {
        match self.rb.iccfgr[ic.index()].read(ICCFGR::ICSEL) {
            0 => Pll::Pll1,
            1 => Pll::Pll2,
            2 => Pll::Pll3,
            _ => Pll::Pll4,
        }
    }

    /// Returns `Some(frequency)` of the output of an IC divider
    ///
    /// `None` if the IC is disabled or its PLL has no output.
    pub fn ic_clock_freq(&self, ic: Ic) -> Option<Hertz> {
        if !self.is_ic_enabled(ic) {
            return None;
        }
        let pll = self.pll_clock_freq(self.ic_source(ic))?;
        Some(pll / self.ic_divider(ic) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rcc::regs::SR;
    use crate::rcc::{PllConfig, PllSource, RccRegisterFile};
    use fugit::RateExtU32;

    #[test]
    fn numbering() {
        assert_eq!(Ic::new(0), None);
        assert_eq!(Ic::new(21), None);
        assert_eq!(Ic::new(16), Some(Ic::IC16));
        let file = RccRegisterFile::new();
        assert_eq!(file.offset(|r| &r.iccfgr[Ic::IC1.index()]), 0x0C4);
        assert_eq!(file.offset(|r| &r.iccfgr[Ic::IC20.index()]), 0x110);
        assert_eq!(Ic::IC20.enable_bit(), 1 << 19);
    }

    #[test]
    fn ic_frequency_follows_pll() {
        let file = RccRegisterFile::new();
        let mut rcc = Rcc::new(file.registers()).use_hse(48.MHz());

        // 48 MHz / 3 * 50 = 800 MHz
        rcc.configure_pll(
            Pll::Pll2,
            &PllConfig::integer(PllSource::Hse, 3, 50, 1, 1),
        )
        .unwrap();
        file.poke(|r| &r.sr, (SR::HSERDY::SET + SR::PLL2RDY::SET).value);

        rcc.configure_ic(Ic::IC16, Pll::Pll2, 32).unwrap();
        assert_eq!(rcc.ic_divider(Ic::IC16), 32);
        assert_eq!(rcc.ic_source(Ic::IC16), Pll::Pll2);

        // Not enabled yet
        assert_eq!(rcc.ic_clock_freq(Ic::IC16), None);
        rcc.enable_ic(Ic::IC16);
        assert_eq!(file.peek(|r| &r.set.divenr), 1 << 15);

        // The hardware reflects the set alias into DIVENR
        file.divenr.set(1 << 15);
        assert_eq!(rcc.ic_clock_freq(Ic::IC16), Some(25.MHz()));

        assert_eq!(
            rcc.configure_ic(Ic::IC16, Pll::Pll2, 0),
            Err(Error::InvalidDivider)
        );
        assert_eq!(
            rcc.configure_ic(Ic::IC16, Pll::Pll2, 257),
            Err(Error::InvalidDivider)
        );
        rcc.configure_ic(Ic::IC16, Pll::Pll4, 256).unwrap();
        assert_eq!(rcc.ic_divider(Ic::IC16), 256);
        // PLL4 is not running
        assert_eq!(rcc.ic_clock_freq(Ic::IC16), None);

        rcc.disable_ic(Ic::IC16);
        assert_eq!(file.peek(|r| &r.clear.divenr), 1 << 15);
    }
}
