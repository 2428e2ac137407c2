//! Delay providers
//!
//! # Examples
//!
//! ## Delay
//!
//! ```no_run
//! use stm32n6xx_hal::prelude::*;
//! use stm32n6xx_hal::rcc::Rcc;
//!
//! let core = cortex_m::Peripherals::take().unwrap();
//! let rcc = unsafe { Rcc::steal() };
//!
//! let mut delay = core.SYST.delay(&rcc.clocks()).unwrap();
//! delay.delay_ms(500);
//!
//! // Release SYST from the delay
//! let syst = delay.free();
//! ```
//!
//! The delay also drives the vertical synchronisation timeout of
//! [`Ltdc::deinit`](crate::ltdc::Ltdc::deinit).

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::delay::DelayNs;
use fugit::SecsDurationU64;

use crate::rcc::CoreClocks;
use crate::time::Hertz;

/// Extension trait that turns the system timer into a [`Delay`]
pub trait DelayExt {
    /// Use the system timer as a delay provider. `None` if the CPU clock
    /// is not running.
    fn delay(self, clocks: &CoreClocks) -> Option<Delay>;
}

impl DelayExt for SYST {
    fn delay(self, clocks: &CoreClocks) -> Option<Delay> {
        Delay::new(self, clocks)
    }
}

/// System timer (SysTick) as a delay provider
pub struct Delay {
    cpu_hz: u32,
    syst: SYST,
}

/// Reload value for `ns` nanoseconds of a clock at `hz`
fn calc_rvr(ns: u32, hz: u32) -> u32 {
    let ticks: u64 = SecsDurationU64::secs(1).to_nanos();
    ((ns as u64 * hz as u64) / ticks) as u32
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider, counting
    /// CPU clock cycles
    pub fn new(syst: SYST, clocks: &CoreClocks) -> Option<Self> {
        clocks.cpu_ck().map(|cpu_ck| Delay::with_frequency(syst, cpu_ck))
    }

    /// As [`new`](Delay::new), for a known CPU clock frequency
    pub fn with_frequency(mut syst: SYST, cpu_ck: Hertz) -> Self {
        syst.set_clock_source(SystClkSource::Core);

        Delay {
            cpu_hz: cpu_ck.raw(),
            syst,
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        // The SysTick Reload Value register supports values between 1 and 0x00FFFFFF.
        const MAX_RVR: u32 = 0x00FF_FFFF;

        let mut total_rvr = calc_rvr(ns, self.cpu_hz);

        while total_rvr != 0 {
            let current_rvr = total_rvr.min(MAX_RVR);

            self.syst.set_reload(current_rvr);
            self.syst.clear_current();
            self.syst.enable_counter();

            total_rvr -= current_rvr;

            while !self.syst.has_wrapped() {}

            self.syst.disable_counter();
        }
    }
}
