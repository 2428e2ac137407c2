//! Layer configuration
//!
//! [`Ltdc::config_layer`] programs every register of a layer from a
//! [`LayerConfig`]. [`Ltdc::retrieve_config`] does the inverse, so that
//! the partial updates (`set_window_position`, `set_mirror`, ...) only
//! change the one parameter they are given.

use tock_registers::fields::{Field, FieldValue};
use tock_registers::interfaces::{ReadWriteable, Readable, Writeable};
use tock_registers::LocalRegisterCopy;

use super::config::{BlendingFactor, Color, Component, FlexibleFormat, Window};
use super::mirror::{mirrored_start_address, unmirrored_start_address, MirrorMode};
use super::regs::{
    BFCR, CACR, CLUTWR, CYR, FBLNR, FBLR, FPF, LCR, LINE_LENGTH_EXTRA, PCR,
    PFCR, TIMING, WINDOW,
};
use super::yuv::{Coefficients, YuvConverter, YuvLayout};
use super::{Error, Layer, LayerConfig, Ltdc, LtdcCallbacks, PixelFormat, Reload};

#[cfg(feature = "log")]
use log::debug;

/// Number of CLUT entries
pub const CLUT_SIZE: usize = 256;

fn position(start: u32, stop: u32) -> FieldValue<u32, WINDOW::Register> {
    WINDOW::START.val(start) + WINDOW::STOP.val(stop)
}

fn components(low: Component, high: Component) -> FieldValue<u32, FPF::Register> {
    FPF::LOW_POS.val(low.pos as u32)
        + FPF::LOW_LEN.val(low.len as u32)
        + FPF::HIGH_POS.val(high.pos as u32)
        + FPF::HIGH_LEN.val(high.len as u32)
}

fn read_components(r: LocalRegisterCopy<u32, FPF::Register>) -> (Component, Component) {
    (
        Component {
            pos: r.read(FPF::LOW_POS) as u8,
            len: r.read(FPF::LOW_LEN) as u8,
        },
        Component {
            pos: r.read(FPF::HIGH_POS) as u8,
            len: r.read(FPF::HIGH_LEN) as u8,
        },
    )
}

/// Frame buffer line register: signed pitch and line length
fn line(pitch: i32, line_bytes: u32) -> FieldValue<u32, FBLR::Register> {
    FBLR::PITCH.val(pitch as i16 as u16 as u32)
        + FBLR::LL.val(line_bytes + LINE_LENGTH_EXTRA)
}

impl<C: LtdcCallbacks> Ltdc<'_, C> {
    /// Configure a layer, enable it and reload at once
    pub fn config_layer(
        &mut self,
        layer: Layer,
        config: &LayerConfig,
    ) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.validate(config)?;
            ltdc.set_config(layer, config);
            ltdc.apply_reload(Reload::Immediate);
            Ok(())
        })
    }

    /// Check a layer configuration against the panel and the register
    /// widths
    fn validate(&self, cfg: &LayerConfig) -> Result<(), Error> {
        let timing = &self.config.timing;
        let w = &cfg.window;
        let bpp = cfg.pixel_format.bytes_per_pixel();
        let pitch = cfg.image_width as u32 * bpp;

        let window_ok = w.x0 < w.x1
            && w.y0 < w.y1
            && w.x1 <= timing.width
            && w.y1 <= timing.height
            && w.width() <= cfg.image_width
            && w.height() <= cfg.image_height;
        let buffer_ok = pitch <= i16::MAX as u32
            && w.width() as u32 * bpp + LINE_LENGTH_EXTRA <= FBLR::LL.mask
            && cfg.image_height as u32 <= FBLNR::LN.mask;
        let format_ok = match cfg.pixel_format {
            PixelFormat::Flexible(f) => f.is_valid(),
            PixelFormat::Yuv(YuvLayout::Coplanar) => cfg.image_width % 2 == 0,
            PixelFormat::Yuv(_) => {
                cfg.image_width % 2 == 0 && cfg.image_height % 2 == 0
            }
            _ => true,
        };

        if window_ok && buffer_ok && format_ok {
            Ok(())
        } else {
            #[cfg(feature = "log")]
            debug!("Rejected layer configuration {:?}", cfg);

            Err(Error::InvalidParameter)
        }
    }

    /// Write a layer configuration to the shadow registers and enable the
    /// layer
    fn set_config(&mut self, layer: Layer, cfg: &LayerConfig) {
        let rb = self.rb;
        let lr = &rb.layer[layer.index()];
        let ahbp = rb.bpcr.read(TIMING::H);
        let avbp = rb.bpcr.read(TIMING::V);
        let w = &cfg.window;

        lr.whpcr
            .write(position(w.x0 as u32 + ahbp + 1, w.x1 as u32 + ahbp));
        lr.wvpcr
            .write(position(w.y0 as u32 + avbp + 1, w.y1 as u32 + avbp));

        lr.pfcr.write(PFCR::PF.val(cfg.pixel_format.bits()));
        match cfg.pixel_format {
            PixelFormat::Flexible(f) => {
                lr.fpf0r.write(components(f.alpha, f.red));
                lr.fpf1r.write(
                    components(f.green, f.blue)
                        + FPF::PSIZE.val(f.bytes_per_pixel as u32),
                );
                lr.pcr.set(0);
            }
            PixelFormat::Yuv(yuv) => {
                lr.fpf0r.set(0);
                lr.fpf1r.write(FPF::PSIZE.val(yuv.luma_bytes_per_pixel()));

                let conv = cfg.yuv_converter;
                lr.pcr.write(
                    PCR::YCEN::SET
                        + PCR::YCM.val(yuv as u32)
                        + PCR::YREN.val(conv.is_reduced_range() as u32),
                );

                let coef = conv.coefficients();
                let pair = |low: u16, high: u16| {
                    CYR::LOW.val(low as u32) + CYR::HIGH.val(high as u32)
                };
                lr.cyr0r.write(pair(coef.cr_r, coef.cb_b));
                lr.cyr1r.write(pair(coef.cr_g, coef.cb_g));
            }
            _ => lr.pcr.set(0),
        }

        lr.dccr.set(cfg.default_color.to_argb8888());
        lr.cacr.write(CACR::CONSTA.val(cfg.alpha as u32));
        lr.bfcr.write(
            BFCR::BF1.val(cfg.blending_factor1.bf1())
                + BFCR::BF2.val(cfg.blending_factor2.bf2()),
        );

        // Frame buffer, read in mirrored order
        let mode = cfg.mirror;
        let plane = cfg.plane();
        lr.lcr.modify(LCR::HMEN.val(mode.is_horizontal() as u32));
        lr.cfbar
            .set(mirrored_start_address(cfg.address, mode, plane));
        lr.cfblr.write(line(
            plane.pitch(mode),
            w.width() as u32 * plane.bytes_per_pixel,
        ));
        lr.cfblnr.write(FBLNR::LN.val(plane.height));

        if let (Some(chroma), PixelFormat::Yuv(yuv)) =
            (cfg.chroma_plane(), cfg.pixel_format)
        {
            for (reg, address) in lr
                .afbar
                .iter()
                .zip(cfg.chroma_address)
                .take(yuv.chroma_planes())
            {
                reg.set(mirrored_start_address(address, mode, chroma));
            }
            lr.afblr.write(line(
                chroma.pitch(mode),
                w.width() as u32 / 2 * chroma.bytes_per_pixel,
            ));
            lr.afblnr.write(FBLNR::LN.val(chroma.height));
        }

        lr.lcr.modify(LCR::LEN::SET);

        #[cfg(feature = "log")]
        debug!("{:?}: {:?}", layer, cfg);

        self.layers[layer.index()] = Some(*cfg);
    }

    /// Reconstruct the configuration of a layer from its registers
    ///
    /// The frame buffer addresses are returned as they were given to
    /// [`config_layer`](Ltdc::config_layer), before the mirror adjustment.
    pub fn retrieve_config(&self, layer: Layer) -> LayerConfig {
        let lr = self.layer_regs(layer);
        let ahbp = self.rb.bpcr.read(TIMING::H);
        let avbp = self.rb.bpcr.read(TIMING::V);

        let window = Window {
            x0: lr.whpcr.read(WINDOW::START).saturating_sub(ahbp + 1) as u16,
            x1: lr.whpcr.read(WINDOW::STOP).saturating_sub(ahbp) as u16,
            y0: lr.wvpcr.read(WINDOW::START).saturating_sub(avbp + 1) as u16,
            y1: lr.wvpcr.read(WINDOW::STOP).saturating_sub(avbp) as u16,
        };

        let pcr = lr.pcr.extract();
        let (pixel_format, yuv_converter) = if pcr.is_set(PCR::YCEN) {
            let layout = YuvLayout::from_bits(pcr.read(PCR::YCM))
                .unwrap_or(YuvLayout::Coplanar);
            let coef = Coefficients {
                cr_r: lr.cyr0r.read(CYR::LOW) as u16,
                cb_b: lr.cyr0r.read(CYR::HIGH) as u16,
                cr_g: lr.cyr1r.read(CYR::LOW) as u16,
                cb_g: lr.cyr1r.read(CYR::HIGH) as u16,
            };
            (
                PixelFormat::Yuv(layout),
                YuvConverter::from_coefficients(coef, pcr.is_set(PCR::YREN)),
            )
        } else {
            let pf = lr.pfcr.read(PFCR::PF);
            let format = PixelFormat::fixed_from_bits(pf).unwrap_or_else(|| {
                let (alpha, red) = read_components(lr.fpf0r.extract());
                let fpf1 = lr.fpf1r.extract();
                let (green, blue) = read_components(fpf1);
                PixelFormat::Flexible(FlexibleFormat {
                    bytes_per_pixel: fpf1.read(FPF::PSIZE) as u8,
                    alpha,
                    red,
                    green,
                    blue,
                })
            });
            (format, YuvConverter::default())
        };

        let pitch = lr.cfblr.read(FBLR::PITCH) as u16 as i16 as i32;
        let mirror = MirrorMode::from_flags(lr.lcr.is_set(LCR::HMEN), pitch < 0);
        let bpp = pixel_format.bytes_per_pixel().max(1);
        let image_width = (pitch.unsigned_abs() / bpp) as u16;
        let image_height = lr.cfblnr.read(FBLNR::LN) as u16;

        let mut cfg = LayerConfig::new(pixel_format, 0, image_width, image_height)
            .blending(
                BlendingFactor::from_bits(lr.bfcr.read(BFCR::BF1)),
                BlendingFactor::from_bits(lr.bfcr.read(BFCR::BF2)),
            )
            .alpha(lr.cacr.read(CACR::CONSTA) as u8)
            .default_color(Color::from_argb8888(lr.dccr.get()))
            .yuv_converter(yuv_converter)
            .mirror(mirror);
        cfg.window = window;
        cfg.address = unmirrored_start_address(lr.cfbar.get(), mirror, cfg.plane());

        if let (Some(chroma), PixelFormat::Yuv(yuv)) =
            (cfg.chroma_plane(), pixel_format)
        {
            for (address, reg) in cfg
                .chroma_address
                .iter_mut()
                .zip(lr.afbar.iter())
                .take(yuv.chroma_planes())
            {
                *address = unmirrored_start_address(reg.get(), mirror, chroma);
            }
        }
        cfg
    }

    /// Retrieve the configuration of a layer, change it with `f` and apply
    /// it again
    fn update<F>(&mut self, layer: Layer, reload: Reload, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut LayerConfig),
    {
        self.locked(|ltdc| {
            let mut cfg = ltdc.retrieve_config(layer);
            f(&mut cfg);
            ltdc.validate(&cfg)?;
            ltdc.set_config(layer, &cfg);
            ltdc.apply_reload(reload);
            Ok(())
        })
    }

    /// Change the size of the window and of the image behind it
    pub fn set_window_size(
        &mut self,
        layer: Layer,
        width: u16,
        height: u16,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| {
            cfg.window.x1 = cfg.window.x0.saturating_add(width);
            cfg.window.y1 = cfg.window.y0.saturating_add(height);
            cfg.image_width = width;
            cfg.image_height = height;
        })
    }

    /// Move the window, keeping its size
    pub fn set_window_position(
        &mut self,
        layer: Layer,
        x0: u16,
        y0: u16,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| {
            let (width, height) = (cfg.window.width(), cfg.window.height());
            cfg.window = Window {
                x0,
                x1: x0.saturating_add(width),
                y0,
                y1: y0.saturating_add(height),
            };
        })
    }

    /// Change the pixel format. The frame buffer keeps its address and its
    /// width in pixels.
    pub fn set_pixel_format(
        &mut self,
        layer: Layer,
        format: PixelFormat,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| cfg.pixel_format = format)
    }

    /// Set the constant alpha
    pub fn set_alpha(
        &mut self,
        layer: Layer,
        alpha: u8,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| cfg.alpha = alpha)
    }

    /// Point the layer at another frame buffer of the same geometry
    pub fn set_address(
        &mut self,
        layer: Layer,
        address: u32,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| cfg.address = address)
    }

    /// Set the line pitch of the frame buffer, in pixels
    ///
    /// Use this when the frame buffer is wider than the window.
    pub fn set_pitch(
        &mut self,
        layer: Layer,
        pitch: u16,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| cfg.image_width = pitch)
    }

    /// Change the mirror mode. The frame buffer addresses given to
    /// [`config_layer`](Ltdc::config_layer) stay the same.
    pub fn set_mirror(
        &mut self,
        layer: Layer,
        mode: MirrorMode,
        reload: Reload,
    ) -> Result<(), Error> {
        self.update(layer, reload, |cfg| cfg.mirror = mode)
    }

    /// Set or clear one bit of the layer control register
    fn layer_control(
        &mut self,
        layer: Layer,
        bit: Field<u32, LCR::Register>,
        enable: bool,
        reload: Reload,
    ) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.layer_regs(layer).lcr.modify(bit.val(enable as u32));
            ltdc.apply_reload(reload);
            Ok(())
        })
    }

    /// Enable a layer, keeping its configuration
    pub fn enable_layer(&mut self, layer: Layer, reload: Reload) -> Result<(), Error> {
        self.layer_control(layer, LCR::LEN, true, reload)
    }

    /// Disable a layer
    pub fn disable_layer(&mut self, layer: Layer, reload: Reload) -> Result<(), Error> {
        self.layer_control(layer, LCR::LEN, false, reload)
    }

    /// Set the colour key. Pixels of this colour become transparent once
    /// colour keying is enabled. Alpha is ignored.
    pub fn config_color_keying(
        &mut self,
        layer: Layer,
        key: Color,
        reload: Reload,
    ) -> Result<(), Error> {
        self.locked(|ltdc| {
            ltdc.layer_regs(layer).ckcr.set(key.to_rgb888());
            ltdc.apply_reload(reload);
            Ok(())
        })
    }

    /// Make the pixels matching the colour key transparent
    pub fn enable_color_keying(
        &mut self,
        layer: Layer,
        reload: Reload,
    ) -> Result<(), Error> {
        self.layer_control(layer, LCR::COLKEN, true, reload)
    }

    /// Show the pixels matching the colour key again
    pub fn disable_color_keying(
        &mut self,
        layer: Layer,
        reload: Reload,
    ) -> Result<(), Error> {
        self.layer_control(layer, LCR::COLKEN, false, reload)
    }

    /// Load the colour lookup table of a layer, starting at entry 0
    ///
    /// With an L8 layer the table maps indices to colours. With the
    /// identity mapping replaced by a curve, it serves as a gamma table.
    pub fn config_clut(
        &mut self,
        layer: Layer,
        clut: &[Color],
        reload: Reload,
    ) -> Result<(), Error> {
        if clut.len() > CLUT_SIZE {
            return Err(Error::InvalidParameter);
        }
        self.locked(|ltdc| {
            let lr = ltdc.layer_regs(layer);
            for (i, color) in clut.iter().enumerate() {
                lr.clutwr.write(
                    CLUTWR::CLUTADD.val(i as u32) + CLUTWR::RGB.val(color.to_rgb888()),
                );
            }
            ltdc.apply_reload(reload);
            Ok(())
        })
    }

    /// Pass the pixels through the lookup table loaded with
    /// [`config_clut`](Ltdc::config_clut)
    pub fn enable_clut(&mut self, layer: Layer, reload: Reload) -> Result<(), Error> {
        self.layer_control(layer, LCR::CLUTEN, true, reload)
    }

    /// Bypass the lookup table
    pub fn disable_clut(&mut self, layer: Layer, reload: Reload) -> Result<(), Error> {
        self.layer_control(layer, LCR::CLUTEN, false, reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ltdc::regs::{INTERRUPT, SRCR};
    use crate::ltdc::tests::{Events, DISPLAY};
    use crate::ltdc::{Config, LtdcRegisterFile, State};

    fn ready(file: &LtdcRegisterFile) -> Ltdc<'_, Events> {
        let mut ltdc = Ltdc::new(file.registers(), Config::new(DISPLAY))
            .with_callbacks(Events::default());
        ltdc.init().unwrap();
        ltdc
    }

    fn snapshot(file: &LtdcRegisterFile) -> Vec<u32> {
        file.words().collect()
    }

    #[test]
    fn argb8888_800x480() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);

        let cfg = LayerConfig::new(PixelFormat::Argb8888, 0x3420_0000, 800, 480);
        ltdc.config_layer(Layer::Layer1, &cfg).unwrap();

        let l1 = &file.layer[0];
        assert_eq!(l1.cfblr.read(FBLR::PITCH), 3200);
        assert_eq!(l1.cfblr.read(FBLR::LL), 3207);
        assert_eq!(l1.cfblnr.get(), 480);
        assert_eq!(l1.cfbar.get(), 0x3420_0000);
        assert_eq!(l1.pfcr.get(), 0);
        assert_eq!(l1.whpcr.get(), (846 << 16) | 47);
        assert_eq!(l1.wvpcr.get(), (503 << 16) | 24);
        assert_eq!(l1.cacr.get(), 0xFF);
        assert_eq!(l1.bfcr.get(), (6 << 8) | 7);
        assert_eq!(l1.lcr.get(), LCR::LEN::SET.value);
        assert_eq!(file.srcr.get(), SRCR::IMR::SET.value);

        // Layer 2 untouched
        assert_eq!(file.layer[1].lcr.get(), 0);
        assert_eq!(ltdc.layer_config(Layer::Layer1), Some(&cfg));
        assert_eq!(ltdc.state(), State::Ready);
    }

    #[test]
    fn vertical_mirror_registers() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);

        let cfg = LayerConfig::new(PixelFormat::Rgb565, 0x3400_0000, 800, 480)
            .mirror(MirrorMode::Vertical);
        ltdc.config_layer(Layer::Layer2, &cfg).unwrap();

        let l2 = &file.layer[1];
        assert_eq!(l2.cfbar.get(), 0x3400_0000 + 1600 * 479);
        // -1600 in the signed pitch field
        assert_eq!(l2.cfblr.read(FBLR::PITCH), 0x10000 - 1600);
        assert!(!l2.lcr.is_set(LCR::HMEN));

        ltdc.set_mirror(Layer::Layer2, MirrorMode::Horizontal, Reload::Immediate)
            .unwrap();
        assert_eq!(l2.cfbar.get(), 0x3400_0000 + 1599);
        assert_eq!(l2.cfblr.read(FBLR::PITCH), 1600);
        assert!(l2.lcr.is_set(LCR::HMEN));
        assert_eq!(ltdc.retrieve_config(Layer::Layer2).address, 0x3400_0000);
    }

    #[test]
    fn retrieve_then_set_is_idempotent() {
        let modes = [
            MirrorMode::None,
            MirrorMode::Horizontal,
            MirrorMode::Vertical,
            MirrorMode::Both,
        ];
        let configs = [
            LayerConfig::new(PixelFormat::Argb8888, 0x3420_0000, 800, 480),
            LayerConfig::new(PixelFormat::Rgb888, 0x9000_0000, 640, 480)
                .window(100, 420, 10, 250)
                .alpha(0x40)
                .default_color(Color::argb(0x80, 1, 2, 3))
                .blending(
                    BlendingFactor::ConstantAlpha,
                    BlendingFactor::PixelAlphaTimesConstantAlpha,
                ),
            LayerConfig::new(
                PixelFormat::Flexible(FlexibleFormat::ARGB1555),
                0x3410_0000,
                320,
                240,
            ),
            LayerConfig::new(PixelFormat::Yuv(YuvLayout::Coplanar), 0x3400_0000, 640, 480)
                .yuv_converter(YuvConverter::Bt709Reduced),
            LayerConfig::new(PixelFormat::Yuv(YuvLayout::SemiPlanar), 0x3400_0000, 640, 480)
                .chroma_address(0x3404_B000),
            LayerConfig::new(PixelFormat::Yuv(YuvLayout::FullPlanar), 0x3400_0000, 640, 480)
                .chroma_addresses(0x3404_B000, 0x3405_E000)
                .yuv_converter(YuvConverter::Bt601Reduced),
        ];

        for base in configs {
            for mode in modes {
                let file = LtdcRegisterFile::new();
                let mut ltdc = ready(&file);
                let cfg = base.mirror(mode);

                ltdc.config_layer(Layer::Layer1, &cfg).unwrap();
                let registers = snapshot(&file);

                let retrieved = ltdc.retrieve_config(Layer::Layer1);
                assert_eq!(retrieved, cfg, "{mode:?}");

                ltdc.config_layer(Layer::Layer1, &retrieved).unwrap();
                assert_eq!(snapshot(&file), registers, "{cfg:?}");
            }
        }
    }

    #[test]
    fn yuv_registers() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);

        let cfg = LayerConfig::new(PixelFormat::Yuv(YuvLayout::FullPlanar), 0x3400_0000, 640, 480)
            .chroma_addresses(0x3410_0000, 0x3420_0000)
            .yuv_converter(YuvConverter::Bt709Reduced)
            .mirror(MirrorMode::Vertical);
        ltdc.config_layer(Layer::Layer1, &cfg).unwrap();

        let l1 = &file.layer[0];
        assert_eq!(
            l1.pcr.get(),
            (PCR::YCEN::SET + PCR::YCM.val(2) + PCR::YREN::SET).value
        );
        assert_eq!(l1.cyr0r.get(), (541 << 16) | 459);
        assert_eq!(l1.cyr1r.get(), (55 << 16) | 136);
        assert!(l1.pfcr.matches_all(PFCR::PF::Flexible));
        // Luma 640 bytes per line, chroma 320 bytes on 240 lines
        assert_eq!(l1.cfbar.get(), 0x3400_0000 + 640 * 479);
        assert_eq!(l1.afbar[0].get(), 0x3410_0000 + 320 * 239);
        assert_eq!(l1.afbar[1].get(), 0x3420_0000 + 320 * 239);
        assert_eq!(l1.afblr.read(FBLR::PITCH), 0x10000 - 320);
        assert_eq!(l1.afblnr.get(), 240);

        // Odd sizes cannot be subsampled
        let odd = LayerConfig::new(PixelFormat::Yuv(YuvLayout::SemiPlanar), 0, 641, 480)
            .window(0, 640, 0, 480);
        assert_eq!(
            ltdc.config_layer(Layer::Layer2, &odd),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn partial_updates() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);

        let cfg = LayerConfig::new(PixelFormat::Argb8888, 0x3420_0000, 400, 240)
            .mirror(MirrorMode::Both);
        ltdc.config_layer(Layer::Layer1, &cfg).unwrap();
        file.srcr.set(0);

        ltdc.set_window_position(Layer::Layer1, 200, 100, Reload::None)
            .unwrap();
        assert_eq!(file.srcr.get(), 0);
        let moved = ltdc.retrieve_config(Layer::Layer1);
        assert_eq!(moved.window, Window { x0: 200, x1: 600, y0: 100, y1: 340 });
        assert_eq!(moved.address, 0x3420_0000);
        assert_eq!(moved.mirror, MirrorMode::Both);

        ltdc.set_address(Layer::Layer1, 0x3430_0000, Reload::VerticalBlanking)
            .unwrap();
        assert_eq!(file.srcr.get(), SRCR::VBR::SET.value);
        assert_eq!(ltdc.retrieve_config(Layer::Layer1).address, 0x3430_0000);

        ltdc.set_alpha(Layer::Layer1, 0x10, Reload::Immediate).unwrap();
        assert_eq!(file.layer[0].cacr.read(CACR::CONSTA), 0x10);

        ltdc.set_pixel_format(Layer::Layer1, PixelFormat::Rgb565, Reload::Immediate)
            .unwrap();
        let rgb565 = ltdc.retrieve_config(Layer::Layer1);
        assert_eq!(rgb565.pixel_format, PixelFormat::Rgb565);
        assert_eq!(rgb565.image_width, 400);
        assert_eq!(rgb565.address, 0x3430_0000);

        // A pitch wider than the window
        ltdc.set_pitch(Layer::Layer1, 512, Reload::Immediate).unwrap();
        assert_eq!(file.layer[0].cfblr.read(FBLR::PITCH), 0x10000 - 1024);
        assert_eq!(ltdc.retrieve_config(Layer::Layer1).image_width, 512);

        ltdc.set_window_size(Layer::Layer1, 100, 50, Reload::Immediate)
            .unwrap();
        let small = ltdc.retrieve_config(Layer::Layer1);
        assert_eq!(small.window, Window { x0: 200, x1: 300, y0: 100, y1: 150 });
        assert_eq!((small.image_width, small.image_height), (100, 50));
        assert_eq!(small.address, 0x3430_0000);

        // Outside of the panel
        assert_eq!(
            ltdc.set_window_position(Layer::Layer1, 750, 0, Reload::Immediate),
            Err(Error::InvalidParameter)
        );
        assert_eq!(ltdc.retrieve_config(Layer::Layer1), small);
        assert_eq!(ltdc.state(), State::Ready);
    }

    #[test]
    fn window_validation() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);

        for cfg in [
            // Empty
            LayerConfig::new(PixelFormat::Argb8888, 0, 800, 480).window(10, 10, 0, 480),
            // Wider than the panel
            LayerConfig::new(PixelFormat::Argb8888, 0, 801, 480),
            // Wider than the image
            LayerConfig::new(PixelFormat::Argb8888, 0, 100, 100).window(0, 200, 0, 100),
            // Pitch does not fit
            LayerConfig::new(PixelFormat::Argb8888, 0, 8192, 480).window(0, 800, 0, 480),
        ] {
            assert_eq!(
                ltdc.config_layer(Layer::Layer1, &cfg),
                Err(Error::InvalidParameter),
                "{cfg:?}"
            );
        }
        assert_eq!(ltdc.layer_config(Layer::Layer1), None);
    }

    #[test]
    fn layer_control() {
        let file = LtdcRegisterFile::new();
        let mut ltdc = ready(&file);
        let l2 = &file.layer[1];

        ltdc.enable_layer(Layer::Layer2, Reload::Immediate).unwrap();
        ltdc.enable_color_keying(Layer::Layer2, Reload::Immediate).unwrap();
        ltdc.enable_clut(Layer::Layer2, Reload::Immediate).unwrap();
        assert_eq!(
            l2.lcr.get(),
            (LCR::LEN::SET + LCR::COLKEN::SET + LCR::CLUTEN::SET).value
        );

        ltdc.disable_color_keying(Layer::Layer2, Reload::Immediate).unwrap();
        ltdc.disable_clut(Layer::Layer2, Reload::Immediate).unwrap();
        assert_eq!(l2.lcr.get(), LCR::LEN::SET.value);
        ltdc.disable_layer(Layer::Layer2, Reload::VerticalBlanking).unwrap();
        assert_eq!(l2.lcr.get(), 0);
        assert!(file.ier.is_set(INTERRUPT::RRIF));

        ltdc.config_color_keying(Layer::Layer2, Color::rgb(0xFF, 0, 0xFF), Reload::None)
            .unwrap();
        assert_eq!(l2.ckcr.get(), 0xFF_00FF);

        // Gamma ramp, the last entry written stays in CLUTWR
        let ramp: Vec<Color> = (0..=255u8).map(|v| Color::rgb(v, v, v)).collect();
        ltdc.config_clut(Layer::Layer2, &ramp, Reload::Immediate).unwrap();
        assert_eq!(file.peek(|r| &r.layer[1].clutwr), 0xFFFF_FFFF);

        let too_long = [Color::default(); CLUT_SIZE + 1];
        assert_eq!(
            ltdc.config_clut(Layer::Layer2, &too_long, Reload::Immediate),
            Err(Error::InvalidParameter)
        );
    }
}
