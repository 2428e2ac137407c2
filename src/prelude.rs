//! Prelude

pub use crate::delay::DelayExt as _stm32n6xx_hal_delay_DelayExt;
pub use crate::rcc::ResetEnable as _stm32n6xx_hal_rcc_ResetEnable;

pub use embedded_hal::delay::DelayNs as _embedded_hal_delay_DelayNs;
pub use fugit::{ExtU32 as _, RateExtU32 as _};
