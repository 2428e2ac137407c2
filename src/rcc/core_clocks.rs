//! Structure to represent a snapshot of the core clock frequencies

use crate::time::Hertz;

/// Core clock frequencies
///
/// Captured by [`Rcc::clocks`](super::Rcc::clocks). A clock that was not
/// running when the snapshot was taken reads as `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoreClocks {
    pub(super) cpu_ck: Option<Hertz>,
    pub(super) sys_ck: Option<Hertz>,
    pub(super) hclk: Option<Hertz>,
    pub(super) pclk1: Option<Hertz>,
    pub(super) pclk2: Option<Hertz>,
    pub(super) pclk4: Option<Hertz>,
    pub(super) pclk5: Option<Hertz>,
    pub(super) timg_ck: Option<Hertz>,
    pub(super) hsi_ck: Option<Hertz>,
    pub(super) msi_ck: Option<Hertz>,
    pub(super) hse_ck: Option<Hertz>,
    pub(super) lse_ck: Option<Hertz>,
    pub(super) lsi_ck: Option<Hertz>,
    pub(super) per_ck: Option<Hertz>,
}

/// Getters for optional clocks
macro_rules! optional_ck_getter {
    ($($opt_ck:ident: $doc:expr,)+) => {
        $(
            /// Returns `Some(frequency)` if
            #[doc=$doc]
            /// was running, otherwise `None`
            pub fn $opt_ck(&self) -> Option<Hertz> {
                self.$opt_ck
            }
        )+
    };
}

impl CoreClocks {
    optional_ck_getter! {
        cpu_ck: "the CPU clock",
        sys_ck: "the system bus clock",
        hclk: "the AHB clock",
        pclk1: "the APB1 clock",
        pclk2: "the APB2 clock",
        pclk4: "the APB4 clock",
        pclk5: "the APB5 clock",
        timg_ck: "the timer kernel clock",
        hsi_ck: "hsi_ck",
        msi_ck: "msi_ck",
        hse_ck: "hse_ck",
        lse_ck: "lse_ck",
        lsi_ck: "lsi_ck",
        per_ck: "per_ck",
    }

    /// Returns the system bus clock - ALIAS
    pub fn sysclk(&self) -> Option<Hertz> {
        self.sys_ck
    }
}
