//! Hardware abstraction for the RCC and LTDC peripherals of the STM32N6
//!
//! Register layouts are described with `tock-registers`. The drivers hold a
//! [`reg::RegisterRef`] to their block: on the device it points at the
//! memory mapped peripheral, on a host at a [`reg::RegisterFile`] so the
//! clock and layer arithmetic can be tested.
//!
//! The LTDC driver implements `DisplayController` from
//! `embedded-display-controller`.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod board;
pub mod delay;
pub mod ltdc;
pub mod prelude;
pub mod rcc;
pub mod reg;
pub mod time;

mod sealed {
    pub trait Sealed {}
}

pub(crate) use sealed::Sealed;
