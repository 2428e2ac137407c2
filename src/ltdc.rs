//! LCD-TFT Display Controller (LTDC)
//!
//! The LTDC reads up to two layers from frame buffers in memory, blends
//! them over a background colour and drives a parallel RGB panel.
//!
//! # Usage
//!
//! The pixel clock is selected in the RCC with the LTDC kernel clock
//! multiplexer, and the bus clock enabled through the LTDC REC object.
//! The driver then needs the panel timing, as a [`DisplayConfiguration`]:
//!
//! ```no_run
//! use embedded_display_controller::DisplayConfiguration;
//! use stm32n6xx_hal::ltdc::{Config, Layer, LayerConfig, Ltdc, PixelFormat};
//!
//! let panel = DisplayConfiguration {
//!     active_width: 800,
//!     active_height: 480,
//!     h_back_porch: 46,
//!     h_front_porch: 210,
//!     v_back_porch: 23,
//!     v_front_porch: 22,
//!     h_sync: 1,
//!     v_sync: 1,
//!     h_sync_pol: false,
//!     v_sync_pol: false,
//!     not_data_enable_pol: false,
//!     pixel_clock_pol: false,
//! };
//! let mut ltdc = unsafe { Ltdc::steal(Config::new(panel)) };
//! ltdc.init().unwrap();
//!
//! let layer = LayerConfig::new(PixelFormat::Argb8888, 0x3420_0000, 800, 480);
//! ltdc.config_layer(Layer::Layer1, &layer).unwrap();
//! ```
//!
//! # Callbacks
//!
//! Board specific initialisation (pins, clocks) and interrupt
//! notifications are supplied as an implementation of [`LtdcCallbacks`]:
//!
//! ```no_run
//! # use embedded_display_controller::DisplayConfiguration;
//! # use stm32n6xx_hal::ltdc::{Config, ErrorCode, Ltdc, LtdcCallbacks};
//! # let panel: DisplayConfiguration = unimplemented!();
//! struct Panel;
//!
//! impl LtdcCallbacks for Panel {
//!     fn msp_init(&mut self) {
//!         // enable the backlight
//!     }
//!     fn error(&mut self, code: ErrorCode) {
//!         // count underruns
//!     }
//! }
//!
//! let mut ltdc = unsafe { Ltdc::steal(Config::new(panel)) }.with_callbacks(Panel);
//! ```
//!
//! [`Ltdc::on_interrupt`] must be called from the LTDC and LTDC error
//! interrupt handlers.
//!
//! # State
//!
//! The handle starts in [`State::Reset`]. [`init`](Ltdc::init) moves it to
//! [`State::Ready`], in which layers can be configured. An error interrupt
//! moves it to [`State::Error`], from which only `init` and `deinit` are
//! accepted.
//!
//! The handle also implements
//! [`DisplayController`](embedded_display_controller::DisplayController),
//! for drivers written against that trait.
#![deny(missing_docs)]

use embedded_display_controller::{DisplayConfiguration, DisplayController};
use embedded_hal::delay::DelayNs;
use tock_registers::fields::Field;
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::registers::{ReadOnly, ReadWrite, WriteOnly};
use tock_registers::{register_structs, LocalRegisterCopy};

use crate::reg::{RegisterFile, RegisterMap, RegisterRef, LTDC_BASE};

#[cfg(feature = "log")]
use log::{debug, warn};

pub mod config;
mod layer;
pub mod mirror;
pub mod regs;
pub mod yuv;

pub use config::{
    BlendingFactor, Color, Component, Config, FlexibleFormat, LayerConfig,
    PixelFormat, Window,
};
pub use layer::CLUT_SIZE;
pub use mirror::{
    mirrored_start_address, unmirrored_start_address, MirrorMode, Plane,
};
pub use yuv::{Coefficients, YuvConverter, YuvLayout};

use regs::{
    BFCR, CACR, CDSR, CLUTWR, CPSR, CYR, FBLNR, FBLR, FPF, GCR, INTERRUPT,
    LCR, LIPCR, PCR, PFCR, SRCR, TIMING, TIMING_LIMIT, WINDOW,
};

register_structs! {
    /// LTDC register block
    pub LtdcRegisters {
        (0x000 => _reserved0),
        (0x008 => sscr: ReadWrite<u32, TIMING::Register>),
        (0x00C => bpcr: ReadWrite<u32, TIMING::Register>),
        (0x010 => awcr: ReadWrite<u32, TIMING::Register>),
        (0x014 => twcr: ReadWrite<u32, TIMING::Register>),
        (0x018 => gcr: ReadWrite<u32, GCR::Register>),
        (0x01C => _reserved1),
        (0x024 => srcr: ReadWrite<u32, SRCR::Register>),
        (0x028 => _reserved2),
        (0x02C => bccr: ReadWrite<u32>),
        (0x030 => _reserved3),
        (0x034 => ier: ReadWrite<u32, INTERRUPT::Register>),
        (0x038 => isr: ReadOnly<u32, INTERRUPT::Register>),
        (0x03C => icr: WriteOnly<u32, INTERRUPT::Register>),
        (0x040 => lipcr: ReadWrite<u32, LIPCR::Register>),
        (0x044 => cpsr: ReadOnly<u32, CPSR::Register>),
        (0x048 => cdsr: ReadOnly<u32, CDSR::Register>),
        (0x04C => _reserved4),
        (0x100 => layer: [LayerRegisters; 2]),
        (0x300 => @END),
    },

    /// Registers of one layer
    pub LayerRegisters {
        (0x00 => _reserved0),
        (0x0C => lcr: ReadWrite<u32, LCR::Register>),
        (0x10 => whpcr: ReadWrite<u32, WINDOW::Register>),
        (0x14 => wvpcr: ReadWrite<u32, WINDOW::Register>),
        (0x18 => ckcr: ReadWrite<u32>),
        (0x1C => pfcr: ReadWrite<u32, PFCR::Register>),
        (0x20 => cacr: ReadWrite<u32, CACR::Register>),
        (0x24 => dccr: ReadWrite<u32>),
        (0x28 => bfcr: ReadWrite<u32, BFCR::Register>),
        (0x2C => _reserved1),
        (0x30 => pcr: ReadWrite<u32, PCR::Register>),
        (0x34 => cfbar: ReadWrite<u32>),
        (0x38 => cfblr: ReadWrite<u32, FBLR::Register>),
        (0x3C => cfblnr: ReadWrite<u32, FBLNR::Register>),
        (0x40 => afbar: [ReadWrite<u32>; 2]),
        (0x48 => afblr: ReadWrite<u32, FBLR::Register>),
        (0x4C => afblnr: ReadWrite<u32, FBLNR::Register>),
        (0x50 => clutwr: WriteOnly<u32, CLUTWR::Register>),
        (0x54 => _reserved2),
        (0x5C => cyr0r: ReadWrite<u32, CYR::Register>),
        (0x60 => cyr1r: ReadWrite<u32, CYR::Register>),
        (0x64 => fpf0r: ReadWrite<u32, FPF::Register>),
        (0x68 => fpf1r: ReadWrite<u32, FPF::Register>),
        (0x6C => _reserved3),
        (0x100 => @END),
    }
}

// unsafe: registers and padding only
unsafe impl RegisterMap for LtdcRegisters {}

/// A simulated LTDC register block
pub type LtdcRegisterFile = RegisterFile<LtdcRegisters>;

/// Time allowed for the vertical synchronisation before the controller is
/// disabled
const DEINIT_TIMEOUT_US: u32 = 100_000;
const DEINIT_POLL_US: u32 = 100;

/// LTDC error
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A timing, window or frame buffer parameter is out of range
    InvalidParameter,
    /// Another operation is in progress
    Busy,
    /// The handle is not initialised, or in the error state
    NotReady,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidParameter => f.write_str("invalid parameter"),
            Error::Busy => f.write_str("busy"),
            Error::NotReady => f.write_str("not ready"),
        }
    }
}

/// State of the handle
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Not initialised
    Reset,
    /// Initialised and idle
    Ready,
    /// An operation is in progress
    Busy,
    /// An error interrupt occurred
    Error,
}

bitflags::bitflags! {
    /// Errors seen since the last [`init`](Ltdc::init)
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
    pub struct ErrorCode: u32 {
        /// Bus error while reading a frame buffer
        const TRANSFER = 1 << 0;
        /// A layer FIFO ran empty
        const FIFO_UNDERRUN = 1 << 1;
        /// CRC mismatch
        const CRC = 1 << 2;
    }
}

/// Board and application hooks
///
/// All methods default to doing nothing.
pub trait LtdcCallbacks {
    /// Called by [`Ltdc::init`] when leaving the reset state, before any
    /// register is written. Set up pins and clocks here.
    fn msp_init(&mut self) {}
    /// Called by [`Ltdc::deinit`] after the controller is disabled
    fn msp_deinit(&mut self) {}
    /// An error interrupt. `code` holds all errors since init.
    fn error(&mut self, _code: ErrorCode) {}
    /// The line programmed with [`Ltdc::program_line_event`] was reached
    fn line_event(&mut self) {}
    /// A reload requested at vertical blanking has been applied
    fn reload_event(&mut self) {}
}

/// Callbacks that do nothing
#[derive(Debug, Default, Copy, Clone)]
pub struct NoCallbacks;

impl LtdcCallbacks for NoCallbacks {}

/// One of the two layers. Layer 2 is blended over layer 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layer {
    /// Bottom layer, blended over the background
    Layer1,
    /// Top layer, blended over layer 1
    Layer2,
}

impl Layer {
    const fn index(self) -> usize {
        match self {
            Layer::Layer1 => 0,
            Layer::Layer2 => 1,
        }
    }
}

/// When shadow registers are copied into the active registers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reload {
    /// At once
    Immediate,
    /// At the next vertical blanking. Completion is signalled by
    /// [`LtdcCallbacks::reload_event`].
    VerticalBlanking,
    /// Not now. The change is applied by a later reload.
    None,
}

/// LTDC handle
pub struct Ltdc<'a, C = NoCallbacks> {
    rb: RegisterRef<'a, LtdcRegisters>,
    config: Config,
    callbacks: C,
    state: State,
    error_code: ErrorCode,
    layers: [Option<LayerConfig>; 2],
}

impl Ltdc<'static> {
    /// Access the LTDC of the device
    ///
    /// # Safety
    ///
    /// The caller must ensure that no other `Ltdc` exists, as both would
    /// access the same registers.
    pub unsafe fn steal(config: Config) -> Self {
        Ltdc::new(RegisterRef::new(LTDC_BASE), config)
    }
}

impl<'a> Ltdc<'a> {
    /// Create a handle for the LTDC registers in `rb`. Nothing is written
    /// until [`init`](Ltdc::init).
    pub fn new(rb: RegisterRef<'a, LtdcRegisters>, config: Config) -> Self {
        Ltdc {
            rb,
            config,
            callbacks: NoCallbacks,
            state: State::Reset,
            error_code: ErrorCode::empty(),
            layers: [None; 2],
        }
    }
}

impl<'a, C> Ltdc<'a, C> {
    /// Replace the callbacks
    pub fn with_callbacks<C2: LtdcCallbacks>(self, callbacks: C2) -> Ltdc<'a, C2> {
        Ltdc {
            rb: self.rb,
            config: self.config,
            callbacks,
            state: self.state,
            error_code: self.error_code,
            layers: self.layers,
        }
    }

    /// Release the registers and the callbacks
    pub fn free(self) -> (RegisterRef<'a, LtdcRegisters>, C) {
        (self.rb, self.callbacks)
    }

    /// Current state of the handle
    pub fn state(&self) -> State {
        self.state
    }

    /// Errors seen since the last [`init`](Ltdc::init)
    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    /// Configuration applied by [`init`](Ltdc::init)
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The board and application hooks
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    /// Mutable access to the board and application hooks
    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// Last configuration applied to a layer through this handle
    pub fn layer_config(&self, layer: Layer) -> Option<&LayerConfig> {
        self.layers[layer.index()].as_ref()
    }

    fn layer_regs(&self, layer: Layer) -> &LayerRegisters {
        &self.rb.layer[layer.index()]
    }
}

impl<C: LtdcCallbacks> Ltdc<'_, C> {
    /// Run `f` in the busy state. Requires the ready state.
    fn locked<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Self) -> Result<T, Error>,
    {
        match self.state {
            State::Ready => {}
            State::Busy => return Err(Error::Busy),
            State::Reset | State::Error => return Err(Error::NotReady),
        }
        self.state = State::Busy;
        let result = f(self);
        self.state = State::Ready;
        result
    }

    /// Program the timing, polarities and background colour, enable the
    /// error interrupts and the controller
    pub fn init(&mut self) -> Result<(), Error> {
        if self.state == State::Busy {
            return Err(Error::Busy);
        }
        let t = self.config.timing;
        if t.hsync == 0
            || t.vsync == 0
            || t.width == 0
            || t.height == 0
            || t.total_width() > TIMING_LIMIT
            || t.total_height() > TIMING_LIMIT
        {
            return Err(Error::InvalidParameter);
        }

        if self.state == State::Reset {
            self.callbacks.msp_init();
        }
        self.state = State::Busy;

        #[cfg(feature = "log")]
        debug!(
            "LTDC init {}x{}, total {}x{}",
            t.width,
            t.height,
            t.total_width(),
            t.total_height()
        );

        let cfg = &self.config;
        self.rb.gcr.modify(
            GCR::HSPOL.val(cfg.hsync_active_high as u32)
                + GCR::VSPOL.val(cfg.vsync_active_high as u32)
                + GCR::DEPOL.val(cfg.data_enable_active_high as u32)
                + GCR::PCPOL.val(cfg.pixel_clock_inverted as u32),
        );

        let ahbp = t.accumulated_hbp();
        let avbp = t.accumulated_vbp();
        self.rb.sscr.write(
            TIMING::H.val(t.hsync as u32 - 1) + TIMING::V.val(t.vsync as u32 - 1),
        );
        self.rb.bpcr.write(TIMING::H.val(ahbp) + TIMING::V.val(avbp));
        self.rb.awcr.write(
            TIMING::H.val(ahbp + t.width as u32)
                + TIMING::V.val(avbp + t.height as u32),
        );
        self.rb.twcr.write(
            TIMING::H.val(t.total_width() - 1)
                + TIMING::V.val(t.total_height() - 1),
        );

        self.rb.bccr.set(cfg.background.to_rgb888());
        self.rb
            .ier
            .modify(INTERRUPT::TERRIF::SET + INTERRUPT::FUIF::SET);
        self.rb.gcr.modify(GCR::LTDCEN::SET);

        self.error_code = ErrorCode::empty();
        self.state = State::Ready;
        Ok(())
    }

    /// Disable both layers and the controller
    ///
    /// The layers are switched off at the next vertical blanking, so that
    /// the panel is not left with a torn frame. The controller is disabled
    /// once the vertical synchronisation has been seen, or after 100 ms
    /// regardless.
    pub fn deinit<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        match self.state {
            State::Ready | State::Error => {}
            State::Busy => return Err(Error::Busy),
            State::Reset => return Err(Error::NotReady),
        }
        self.state = State::Busy;

        for layer in self.rb.layer.iter() {
            layer.lcr.modify(LCR::LEN::CLEAR);
        }
        self.rb.srcr.write(SRCR::VBR::SET);

        let mut waited = 0;
        while !self.rb.cdsr.is_set(CDSR::VSYNCS) {
            if waited >= DEINIT_TIMEOUT_US {
                #[cfg(feature = "log")]
                warn!("LTDC deinit: no vertical synchronisation");

                break;
            }
            delay.delay_us(DEINIT_POLL_US);
            waited += DEINIT_POLL_US;
        }

        self.rb.ier.set(0);
        self.rb.gcr.modify(GCR::LTDCEN::CLEAR);
        self.callbacks.msp_deinit();

        #[cfg(feature = "log")]
        debug!("LTDC deinit");

        self.layers = [None; 2];
        self.error_code = ErrorCode::empty();
        self.state = State::Reset;
        Ok(())
    }

    /// Copy the shadow registers into the active registers
    pub fn reload(&mut self, reload: Reload) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.apply_reload(reload);
            Ok(())
        })
    }

    fn apply_reload(&mut self, reload: Reload) {
        match reload {
            Reload::Immediate => self.rb.srcr.write(SRCR::IMR::SET),
            Reload::VerticalBlanking => {
                self.rb.ier.modify(INTERRUPT::RRIF::SET);
                self.rb.srcr.write(SRCR::VBR::SET);
            }
            Reload::None => {}
        }
    }

    /// Enable dithering of the output
    pub fn enable_dithering(&mut self) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.rb.gcr.modify(GCR::DEN::SET);
            Ok(())
        })
    }

    /// Disable dithering of the output
    pub fn disable_dithering(&mut self) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.rb.gcr.modify(GCR::DEN::CLEAR);
            Ok(())
        })
    }

    /// Call [`LtdcCallbacks::line_event`] once the display reaches `line`,
    /// counted from the start of the vertical synchronisation
    pub fn program_line_event(&mut self, line: u16) -> Result<(), Error> {
        if line as u32 >= TIMING_LIMIT {
            return Err(Error::InvalidParameter);
        }
        self.locked(|ltdc| {
            ltdc.rb.lipcr.write(LIPCR::LIPOS.val(line as u32));
            ltdc.rb.ier.modify(INTERRUPT::LIF::SET);
            Ok(())
        })
    }

    /// Current scan position as (x, y), including blanking
    pub fn position(&self) -> (u16, u16) {
        let cpsr = self.rb.cpsr.extract();
        (cpsr.read(CPSR::CXPOS) as u16, cpsr.read(CPSR::CYPOS) as u16)
    }

    /// Handle the LTDC interrupts. Call this from both the LTDC and the
    /// LTDC error interrupt handlers.
    ///
    /// Each pending event is acknowledged and its interrupt disabled, then
    /// the matching callback runs. Error events also move the handle to
    /// [`State::Error`]; the error interrupts are enabled again by
    /// [`init`](Ltdc::init).
    pub fn on_interrupt(&mut self) {
        let pending = LocalRegisterCopy::<u32, INTERRUPT::Register>::new(
            self.rb.isr.get() & self.rb.ier.get(),
        );

        for (flag, code) in [
            (INTERRUPT::TERRIF, ErrorCode::TRANSFER),
            (INTERRUPT::FUIF, ErrorCode::FIFO_UNDERRUN),
            (INTERRUPT::CRCIF, ErrorCode::CRC),
        ] {
            if pending.is_set(flag) {
                self.acknowledge(flag);

                #[cfg(feature = "log")]
                warn!("LTDC error {:?}", code);

                self.error_code |= code;
                self.state = State::Error;
                self.callbacks.error(self.error_code);
            }
        }

        if pending.is_set(INTERRUPT::LIF) {
            self.acknowledge(INTERRUPT::LIF);
            self.callbacks.line_event();
        }

        if pending.is_set(INTERRUPT::RRIF) {
            self.acknowledge(INTERRUPT::RRIF);
            self.callbacks.reload_event();
        }
    }

    fn acknowledge(&mut self, flag: Field<u32, INTERRUPT::Register>) {
        self.rb.ier.modify(flag.val(0));
        self.rb.icr.write(flag.val(1));
    }
}

impl<C: LtdcCallbacks> DisplayController for Ltdc<'_, C> {
    /// Apply the timing and polarities of `config`, keeping the background
    /// colour and the pixel clock, then [`init`](Ltdc::init). A rejected
    /// configuration is not kept.
    fn init(&mut self, config: DisplayConfiguration) {
        if self.state == State::Busy {
            #[cfg(feature = "log")]
            warn!("LTDC init: busy");

            return;
        }
        let config = Config {
            background: self.config.background,
            pixel_clock: self.config.pixel_clock,
            ..Config::new(config)
        };
        let previous = core::mem::replace(&mut self.config, config);

        if let Err(_e) = Ltdc::init(self) {
            #[cfg(feature = "log")]
            warn!("LTDC init: {}", _e);

            self.config = previous;
        }
    }

    /// Pixel clock in Hz, 0 if it was not given with
    /// [`Config::pixel_clock`]
    fn clock(&self) -> u32 {
        self.config.pixel_clock.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    pub(super) struct Events {
        pub msp_init: u32,
        pub msp_deinit: u32,
        pub errors: Vec<ErrorCode>,
        pub lines: u32,
        pub reloads: u32,
    }

    impl LtdcCallbacks for Events {
        fn msp_init(&mut self) {
            self.msp_init += 1;
        }
        fn msp_deinit(&mut self) {
            self.msp_deinit += 1;
        }
        fn error(&mut self, code: ErrorCode) {
            self.errors.push(code);
        }
        fn line_event(&mut self) {
            self.lines += 1;
        }
        fn reload_event(&mut self) {
            self.reloads += 1;
        }
    }

    /// Counts the requested delay
    struct Elapsed(u64);

    impl DelayNs for Elapsed {
        fn delay_ns(&mut self, ns: u32) {
            self.0 += ns as u64;
        }
    }

    pub(super) const DISPLAY: DisplayConfiguration = DisplayConfiguration {
        active_width: 800,
        active_height: 480,
        h_back_porch: 46,
        h_front_porch: 210,
        v_back_porch: 23,
        v_front_porch: 22,
        h_sync: 1,
        v_sync: 1,
        h_sync_pol: false,
        v_sync_pol: false,
        not_data_enable_pol: false,
        pixel_clock_pol: false,
    };

    #[test]
    fn register_offsets() {
        let file = LtdcRegisterFile::new();
        assert_eq!(file.offset(|r| &r.gcr), 0x18);
        assert_eq!(file.offset(|r| &r.bccr), 0x2C);
        assert_eq!(file.offset(|r| &r.cdsr), 0x48);
        assert_eq!(file.offset(|r| &r.layer[0].lcr), 0x10C);
        assert_eq!(file.offset(|r| &r.layer[1].lcr), 0x20C);
        assert_eq!(file.offset(|r| &r.layer[0].clutwr), 0x150);
        assert_eq!(file.offset(|r| &r.layer[1].fpf1r), 0x268);
    }

    #[test]
    fn init_programs_timing() {
        let file = LtdcRegisterFile::new();
        let display = DisplayConfiguration {
            h_sync_pol: true,
            pixel_clock_pol: true,
            ..DISPLAY
        };
        let config = Config::new(display).background(Color::rgb(0x10, 0x20, 0x30));
        let mut ltdc =
            Ltdc::new(file.registers(), config).with_callbacks(Events::default());
        assert_eq!(ltdc.state(), State::Reset);

        ltdc.init().unwrap();
        assert_eq!(ltdc.state(), State::Ready);
        assert_eq!(ltdc.callbacks().msp_init, 1);

        assert_eq!(file.sscr.get(), 0);
        assert_eq!(file.bpcr.get(), (46 << 16) | 23);
        assert_eq!(file.awcr.get(), (846 << 16) | 503);
        assert_eq!(file.twcr.get(), (1056 << 16) | 525);
        assert_eq!(file.bccr.get(), 0x10_2030);
        assert!(file.gcr.is_set(GCR::HSPOL));
        assert!(file.gcr.is_set(GCR::PCPOL));
        assert!(file.gcr.is_set(GCR::LTDCEN));
        assert!(!file.gcr.is_set(GCR::VSPOL));
        assert!(!file.gcr.is_set(GCR::DEPOL));
        assert_eq!(
            file.ier.get(),
            (INTERRUPT::TERRIF::SET + INTERRUPT::FUIF::SET).value
        );

        // Initialising again does not repeat the board setup
        ltdc.init().unwrap();
        assert_eq!(ltdc.callbacks().msp_init, 1);
    }

    #[test]
    fn init_rejects_bad_timing() {
        let file = LtdcRegisterFile::new();
        let config = Config::new(DisplayConfiguration { h_sync: 0, ..DISPLAY });
        let mut ltdc = Ltdc::new(file.registers(), config);
        assert_eq!(ltdc.init(), Err(Error::InvalidParameter));
        assert_eq!(ltdc.state(), State::Reset);

        let config = Config::new(DisplayConfiguration {
            h_front_porch: 4000,
            ..DISPLAY
        });
        let mut ltdc = Ltdc::new(file.registers(), config);
        assert_eq!(ltdc.init(), Err(Error::InvalidParameter));
        assert_eq!(file.gcr.get(), 0);
    }

    #[test]
    fn state_guards() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY));

        assert_eq!(ltdc.enable_dithering(), Err(Error::NotReady));
        assert_eq!(ltdc.reload(Reload::Immediate), Err(Error::NotReady));
        assert_eq!(ltdc.deinit(&mut Elapsed(0)), Err(Error::NotReady));

        ltdc.init().unwrap();
        ltdc.enable_dithering().unwrap();
        assert!(file.gcr.is_set(GCR::DEN));
        ltdc.disable_dithering().unwrap();
        assert!(!file.gcr.is_set(GCR::DEN));

        ltdc.state = State::Busy;
        assert_eq!(ltdc.reload(Reload::Immediate), Err(Error::Busy));
        assert_eq!(ltdc.init(), Err(Error::Busy));
        assert_eq!(ltdc.deinit(&mut Elapsed(0)), Err(Error::Busy));
        ltdc.state = State::Ready;
    }

    #[test]
    fn reload_modes() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY));
        ltdc.init().unwrap();

        ltdc.reload(Reload::Immediate).unwrap();
        assert_eq!(file.srcr.get(), SRCR::IMR::SET.value);
        assert!(!file.ier.is_set(INTERRUPT::RRIF));

        file.srcr.set(0);
        ltdc.reload(Reload::None).unwrap();
        assert_eq!(file.srcr.get(), 0);
        assert!(!file.ier.is_set(INTERRUPT::RRIF));

        ltdc.reload(Reload::VerticalBlanking).unwrap();
        assert_eq!(file.srcr.get(), SRCR::VBR::SET.value);
        assert!(file.ier.is_set(INTERRUPT::RRIF));
        assert_eq!(ltdc.state(), State::Ready);
    }

    #[test]
    fn interrupt_dispatch() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY))
            .with_callbacks(Events::default());
        ltdc.init().unwrap();
        let errors = (INTERRUPT::FUIF::SET + INTERRUPT::TERRIF::SET).value;

        ltdc.program_line_event(100).unwrap();
        assert_eq!(file.lipcr.read(LIPCR::LIPOS), 100);
        assert_eq!(ltdc.program_line_event(4096), Err(Error::InvalidParameter));

        // Line event only
        file.poke(|r| &r.isr, INTERRUPT::LIF::SET.value);
        ltdc.on_interrupt();
        assert_eq!(ltdc.callbacks().lines, 1);
        assert_eq!(file.peek(|r| &r.icr), INTERRUPT::LIF::SET.value);
        assert!(!file.ier.is_set(INTERRUPT::LIF));

        // Disabled now, so not dispatched again
        ltdc.on_interrupt();
        assert_eq!(ltdc.callbacks().lines, 1);

        ltdc.reload(Reload::VerticalBlanking).unwrap();
        file.poke(|r| &r.isr, INTERRUPT::RRIF::SET.value);
        ltdc.on_interrupt();
        assert_eq!(ltdc.callbacks().reloads, 1);
        assert_eq!(ltdc.state(), State::Ready);

        // Errors accumulate
        file.poke(|r| &r.isr, errors);
        ltdc.on_interrupt();
        assert_eq!(ltdc.state(), State::Error);
        assert_eq!(
            ltdc.error_code(),
            ErrorCode::TRANSFER | ErrorCode::FIFO_UNDERRUN
        );
        assert_eq!(
            ltdc.callbacks().errors,
            [
                ErrorCode::TRANSFER,
                ErrorCode::TRANSFER | ErrorCode::FIFO_UNDERRUN
            ]
        );
        assert_eq!(file.ier.get() & errors, 0);

        // Rejected until initialised again
        assert_eq!(ltdc.enable_dithering(), Err(Error::NotReady));
        ltdc.init().unwrap();
        assert_eq!(ltdc.error_code(), ErrorCode::empty());
        assert_eq!(ltdc.callbacks().msp_init, 1);
        assert_eq!(file.ier.get() & errors, errors);
    }

    #[test]
    fn position_reads_scan_counters() {
        let file = LtdcRegisterFile::new();
        let ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY));
        file.poke(|r| &r.cpsr, (120 << 16) | 34);
        assert_eq!(ltdc.position(), (120, 34));
    }

    #[test]
    fn deinit_waits_for_vsync() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY))
            .with_callbacks(Events::default());
        ltdc.init().unwrap();

        file.poke(|r| &r.cdsr, CDSR::VSYNCS::SET.value);
        let mut delay = Elapsed(0);
        ltdc.deinit(&mut delay).unwrap();
        assert_eq!(delay.0, 0);
        assert_eq!(ltdc.state(), State::Reset);
        assert!(!file.gcr.is_set(GCR::LTDCEN));
        assert_eq!(file.ier.get(), 0);
        assert_eq!(ltdc.callbacks().msp_deinit, 1);

        // Leaving reset again runs the board setup
        ltdc.init().unwrap();
        assert_eq!(ltdc.callbacks().msp_init, 2);
    }

    #[test]
    fn deinit_without_vsync_disables_anyway() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY))
            .with_callbacks(Events::default());
        ltdc.init().unwrap();
        file.layer[0].lcr.modify(LCR::LEN::SET + LCR::CLUTEN::SET);
        file.layer[1].lcr.modify(LCR::LEN::SET);

        let mut delay = Elapsed(0);
        assert_eq!(ltdc.deinit(&mut delay), Ok(()));
        assert_eq!(delay.0, 100_000_000);

        assert!(!file.layer[0].lcr.is_set(LCR::LEN));
        assert!(file.layer[0].lcr.is_set(LCR::CLUTEN));
        assert!(!file.layer[1].lcr.is_set(LCR::LEN));
        assert_eq!(file.srcr.get(), SRCR::VBR::SET.value);
        assert!(!file.gcr.is_set(GCR::LTDCEN));
        assert_eq!(ltdc.state(), State::Reset);
        assert_eq!(ltdc.error_code(), ErrorCode::empty());
        assert_eq!(ltdc.callbacks().msp_deinit, 1);
    }

    #[test]
    fn deinit_from_error_state() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY));
        ltdc.init().unwrap();
        file.poke(|r| &r.isr, INTERRUPT::FUIF::SET.value);
        ltdc.on_interrupt();
        assert_eq!(ltdc.state(), State::Error);

        file.poke(|r| &r.cdsr, CDSR::VSYNCS::SET.value);
        ltdc.deinit(&mut Elapsed(0)).unwrap();
        assert_eq!(ltdc.state(), State::Reset);
        assert_eq!(ltdc.error_code(), ErrorCode::empty());
    }

    #[test]
    fn display_controller_trait() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY))
            .with_callbacks(Events::default());
        assert_eq!(DisplayController::clock(&ltdc), 0);

        let panel = DisplayConfiguration {
            active_width: 480,
            active_height: 272,
            v_sync_pol: true,
            ..DISPLAY
        };
        DisplayController::init(&mut ltdc, panel);
        assert_eq!(ltdc.state(), State::Ready);
        assert_eq!(ltdc.config().active_width(), 480);
        assert_eq!(file.awcr.get(), (526 << 16) | 295);
        assert!(file.gcr.is_set(GCR::VSPOL));

        // Rejected parameters leave the handle where it was
        DisplayController::init(&mut ltdc, DisplayConfiguration { v_sync: 0, ..DISPLAY });
        assert_eq!(ltdc.state(), State::Ready);
        assert_eq!(ltdc.config().active_width(), 480);
        assert_eq!(ltdc.callbacks().msp_init, 1);

        let file = LtdcRegisterFile::new();
        let config = Config::new(DISPLAY).pixel_clock(crate::time::Hertz::MHz(33));
        let ltdc = Ltdc::new(file.registers(), config);
        assert_eq!(DisplayController::clock(&ltdc), 33_000_000);
    }
}
