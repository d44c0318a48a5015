/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    devices::asic::mod.rs

    Implementation of the CPC Plus ASIC register page.

    Once unlocked, the ASIC registers are paged into 0x4000-0x7FFF. Offsets
    used here are relative to the start of that page:

    0000-0FFF  sprite pixel RAM
    2000-207F  sprite attributes
    2400-243F  palette RAM
    2800       PRI       2801  SPLT     2802-2803  SSA
    2804       SSCR      2805  IVR
    2C00-2C0B  DMA address and prescaler, 4 bytes per channel
    2C0F       DCSR

*/

pub mod dma;
pub mod pri;
pub mod scroll;
pub mod sprites;

use modular_bitfield::{bitfield, prelude::*};

use crate::devices::gate_array::palette::{PaletteState, ASIC_PALETTE_SIZE};
use dma::{dma_interrupt_bit, DmaEngine, DMA_CHANNELS};
use pri::RasterInterrupt;
use scroll::{ScrollState, SplitScreenState};
use sprites::SpriteBank;

pub const ASIC_PAGE_SIZE: usize = 0x4000;

const SPRITE_PIXEL_BASE: usize = 0x0000;
const SPRITE_PIXEL_LAST: usize = 0x0FFF;
const SPRITE_ATTR_BASE: usize = 0x2000;
const SPRITE_ATTR_LAST: usize = 0x207F;
const PALETTE_BASE: usize = 0x2400;
const PALETTE_LAST: usize = PALETTE_BASE + ASIC_PALETTE_SIZE - 1;
const REG_PRI: usize = 0x2800;
const REG_SPLT: usize = 0x2801;
const REG_SSA_HIGH: usize = 0x2802;
const REG_SSA_LOW: usize = 0x2803;
const REG_SSCR: usize = 0x2804;
const REG_IVR: usize = 0x2805;
const DMA_BASE: usize = 0x2C00;
const DMA_LAST: usize = DMA_BASE + DMA_CHANNELS * 4 - 1;
const REG_DCSR: usize = 0x2C0F;

/// DCSR bit 7: raster interrupt pending.
const DCSR_RASTER_PENDING: u8 = 0x80;

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct InterruptVectorRegister {
    /// When set, DMA interrupt flags are only cleared through the DCSR.
    pub manual_dma_clear: bool,
    #[skip]
    unused: B2,
    pub vector: B5,
}

/// Source of an ASIC interrupt, encoded as the low vector bits it produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterruptCause {
    Raster = 0x06,
    Dma0 = 0x04,
    Dma1 = 0x02,
    Dma2 = 0x00,
}

impl InterruptCause {
    fn dma(channel: usize) -> Self {
        match channel {
            0 => InterruptCause::Dma0,
            1 => InterruptCause::Dma1,
            _ => InterruptCause::Dma2,
        }
    }
}

pub struct Asic {
    enabled: bool,
    pub sprites: SpriteBank,
    pub pri: RasterInterrupt,
    pub split: SplitScreenState,
    pub scroll: ScrollState,
    pub dma: DmaEngine,
    ivr: InterruptVectorRegister,
    raster_pending: bool,
    reset_prescalers: [u8; DMA_CHANNELS],
}

impl Asic {
    pub fn new(enabled: bool, prescalers: [u8; DMA_CHANNELS]) -> Self {
        Self {
            enabled,
            sprites: SpriteBank::default(),
            pri: RasterInterrupt::default(),
            split: SplitScreenState::default(),
            scroll: ScrollState::default(),
            dma: DmaEngine::new(prescalers),
            ivr: InterruptVectorRegister::new(),
            raster_pending: false,
            reset_prescalers: prescalers,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.enabled, self.reset_prescalers);
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            log::debug!("ASIC register page {}", if enabled { "unlocked" } else { "locked" });
        }
        self.enabled = enabled;
    }

    /// PRI programmed and ASIC active: the Gate Array's periodic interrupt
    /// is suppressed.
    pub fn pri_owns_interrupts(&self) -> bool {
        self.enabled && self.pri.owns_interrupts()
    }

    pub fn set_raster_pending(&mut self) {
        self.raster_pending = true;
    }

    pub fn raster_pending(&self) -> bool {
        self.raster_pending
    }

    pub fn ivr(&self) -> u8 {
        self.ivr.into_bytes()[0]
    }

    pub fn dcsr(&self) -> u8 {
        let raster = if self.raster_pending { DCSR_RASTER_PENDING } else { 0 };
        raster | self.dma.pending() | self.dma.enable_bits()
    }

    /// Highest priority pending cause, if any.
    pub fn pending_cause(&self) -> Option<InterruptCause> {
        if self.raster_pending {
            return Some(InterruptCause::Raster);
        }
        (0..DMA_CHANNELS)
            .find(|&ch| self.dma.pending() & dma_interrupt_bit(ch) != 0)
            .map(InterruptCause::dma)
    }

    /// Z80 interrupt acknowledge. Returns the cause being serviced and the
    /// vector byte placed on the bus for IM 2.
    pub fn acknowledge(&mut self) -> (InterruptCause, u8) {
        let cause = self.pending_cause().unwrap_or(InterruptCause::Raster);
        match cause {
            InterruptCause::Raster => self.raster_pending = false,
            InterruptCause::Dma0 | InterruptCause::Dma1 | InterruptCause::Dma2 => {
                if !self.ivr.manual_dma_clear() {
                    let ch = (0x04 - cause as usize) / 2;
                    self.dma.clear_pending(dma_interrupt_bit(ch));
                }
            }
        }
        let vector = (self.ivr() & 0xF8) | cause as u8;
        log::trace!("ASIC: acknowledge {:?}, vector {:02X}", cause, vector);
        (cause, vector)
    }

    pub fn mmio_write(&mut self, offset: usize, data: u8, palette: &mut PaletteState) {
        if !self.enabled {
            log::debug!("ASIC: write to locked register page {:04X}:{:02X}", offset, data);
            return;
        }
        let offset = offset % ASIC_PAGE_SIZE;
        match offset {
            SPRITE_PIXEL_BASE..=SPRITE_PIXEL_LAST => self.sprites.write_pixel_ram(offset - SPRITE_PIXEL_BASE, data),
            SPRITE_ATTR_BASE..=SPRITE_ATTR_LAST => self.sprites.write_attr(offset - SPRITE_ATTR_BASE, data),
            PALETTE_BASE..=PALETTE_LAST => palette.write_asic(offset - PALETTE_BASE, data),
            REG_PRI => self.pri.set_target(data),
            REG_SPLT => self.split.set_line(data),
            REG_SSA_HIGH => self.split.set_address_high(data),
            REG_SSA_LOW => self.split.set_address_low(data),
            REG_SSCR => self.scroll.write(data),
            REG_IVR => self.ivr = InterruptVectorRegister::from_bytes([data]),
            DMA_BASE..=DMA_LAST => {
                let ch = (offset - DMA_BASE) / 4;
                match offset & 0x03 {
                    0 => self.dma.write_address(ch, false, data),
                    1 => self.dma.write_address(ch, true, data),
                    2 => self.dma.set_prescaler(ch, data),
                    _ => log::debug!("ASIC: write to unused DMA register {:04X}", offset),
                }
            }
            REG_DCSR => {
                self.dma.set_enable_bits(data & 0x07);
                self.dma.clear_pending(data & 0x70);
            }
            _ => log::debug!("ASIC: write to unmapped offset {:04X}:{:02X}", offset, data),
        }
    }

    pub fn mmio_read(&self, offset: usize, palette: &PaletteState) -> u8 {
        if !self.enabled {
            return 0xFF;
        }
        let offset = offset % ASIC_PAGE_SIZE;
        match offset {
            SPRITE_PIXEL_BASE..=SPRITE_PIXEL_LAST => self.sprites.read_pixel_ram(offset - SPRITE_PIXEL_BASE),
            SPRITE_ATTR_BASE..=SPRITE_ATTR_LAST => self.sprites.read_attr(offset - SPRITE_ATTR_BASE),
            PALETTE_BASE..=PALETTE_LAST => palette.read_asic(offset - PALETTE_BASE),
            REG_PRI => self.pri.target(),
            REG_SPLT => self.split.line(),
            REG_SSA_HIGH => (self.split.address() >> 8) as u8,
            REG_SSA_LOW => (self.split.address() & 0xFF) as u8,
            REG_SSCR => self.scroll.read(),
            REG_IVR => self.ivr(),
            DMA_BASE..=DMA_LAST => {
                let ch = (offset - DMA_BASE) / 4;
                match offset & 0x03 {
                    0 => self.dma.read_address(ch, false),
                    1 => self.dma.read_address(ch, true),
                    2 => self.dma.channel(ch).prescaler_cfg(),
                    _ => 0xFF,
                }
            }
            REG_DCSR => self.dcsr(),
            _ => {
                log::debug!("ASIC: read from unmapped offset {:04X}", offset);
                0xFF
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineVariant;

    fn asic() -> (Asic, PaletteState) {
        (Asic::new(true, [0; 3]), PaletteState::new(MachineVariant::Plus))
    }

    #[test]
    fn register_page_routing() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x0305, 0x0C, &mut pal);
        assert_eq!(asic.sprites.sprite(3).read_pixel(5), 0x0C);
        asic.mmio_write(0x2000 + 2 * 8 + 4, 0b1010, &mut pal);
        assert_eq!(asic.sprites.sprite(2).x_mag(), sprites::Magnification::X2);
        asic.mmio_write(0x2400 + 4, 0xF0, &mut pal);
        assert_eq!(pal.asic_color(2), 0x0F0);
        asic.mmio_write(0x2800, 80, &mut pal);
        asic.mmio_write(0x2801, 40, &mut pal);
        asic.mmio_write(0x2802, 0x30, &mut pal);
        asic.mmio_write(0x2803, 0x00, &mut pal);
        asic.mmio_write(0x2804, 0x83, &mut pal);
        assert_eq!(asic.mmio_read(0x2800, &pal), 80);
        assert_eq!(asic.split.line(), 40);
        assert_eq!(asic.split.address(), 0x3000);
        assert_eq!(asic.scroll.x_offset(), 3);
        assert!(asic.scroll.border_extend());
        assert!(asic.pri_owns_interrupts());
        assert_eq!(asic.mmio_read(0x3000, &pal), 0xFF);
    }

    #[test]
    fn locked_page_ignores_access() {
        let mut asic = Asic::new(false, [0; 3]);
        let mut pal = PaletteState::new(MachineVariant::Plus);
        asic.mmio_write(0x2800, 5, &mut pal);
        assert_eq!(asic.pri.target(), 0);
        assert_eq!(asic.mmio_read(0x2800, &pal), 0xFF);
        asic.pri.set_target(5);
        assert!(!asic.pri_owns_interrupts());
    }

    #[test]
    fn lock_and_unlock_page() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x2800, 40, &mut pal);
        assert!(asic.pri_owns_interrupts());

        asic.set_enabled(false);
        assert!(!asic.enabled());
        assert!(!asic.pri_owns_interrupts());
        assert_eq!(asic.mmio_read(0x2800, &pal), 0xFF);
        asic.mmio_write(0x2800, 90, &mut pal);

        asic.set_enabled(true);
        assert_eq!(asic.mmio_read(0x2800, &pal), 40);
        assert!(asic.pri_owns_interrupts());
    }

    #[test]
    fn dma_registers() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x2C04, 0x00, &mut pal);
        asic.mmio_write(0x2C05, 0x12, &mut pal);
        asic.mmio_write(0x2C06, 0x07, &mut pal);
        assert_eq!(asic.dma.channel(1).address(), 0x1200);
        assert_eq!(asic.dma.channel(1).prescaler_cfg(), 7);
        assert_eq!(asic.mmio_read(0x2C0F, &pal) & 0x07, 0x02);
        asic.mmio_write(0x2C0F, 0x05, &mut pal);
        assert_eq!(asic.dcsr() & 0x07, 0x05);
    }

    #[test]
    fn raster_vector() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x2805, 0xA0, &mut pal);
        asic.set_raster_pending();
        assert_eq!(asic.dcsr() & 0x80, 0x80);
        let (cause, vector) = asic.acknowledge();
        assert_eq!(cause, InterruptCause::Raster);
        assert_eq!(vector, 0xA6);
        assert!(!asic.raster_pending());
        assert_eq!(asic.pending_cause(), None);
    }

    struct NullPsg;

    impl crate::device_traits::PsgPort for NullPsg {
        fn selected_register(&self) -> u8 {
            0
        }
        fn select_register(&mut self, _index: u8) {}
        fn write_data(&mut self, _value: u8) {}
    }

    // Channels 1 and 2 both execute INT on the first tick.
    fn dma_interrupts(asic: &mut Asic, pal: &mut PaletteState) {
        let mut mem = vec![0u8; 0x10000];
        mem[0x0100] = 0x10;
        mem[0x0101] = 0x40;
        for ch in 1..3 {
            asic.mmio_write(0x2C00 + ch * 4, 0x00, pal);
            asic.mmio_write(0x2C01 + ch * 4, 0x01, pal);
        }
        let mut irq = crate::device_traits::interrupt::IrqLatch::default();
        asic.dma.tick(&mem, &mut NullPsg, &mut irq);
        assert_eq!(irq.count, 2);
    }

    #[test]
    fn dma_vectors_auto_clear() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x2805, 0x40, &mut pal);
        dma_interrupts(&mut asic, &mut pal);
        assert_eq!(asic.dcsr() & 0x70, 0x30);

        assert_eq!(asic.acknowledge(), (InterruptCause::Dma1, 0x42));
        assert_eq!(asic.acknowledge(), (InterruptCause::Dma2, 0x40));
        assert_eq!(asic.dcsr() & 0x70, 0x00);
    }

    #[test]
    fn dma_vectors_manual_clear() {
        let (mut asic, mut pal) = asic();
        asic.mmio_write(0x2805, 0x41, &mut pal);
        dma_interrupts(&mut asic, &mut pal);
        assert_eq!(asic.acknowledge(), (InterruptCause::Dma1, 0x42));
        assert_eq!(asic.acknowledge(), (InterruptCause::Dma1, 0x42));
        // Writing 1 to the pending bit clears it and keeps the channels running.
        asic.mmio_write(0x2C0F, 0x20 | asic.dma.enable_bits(), &mut pal);
        assert_eq!(asic.pending_cause(), Some(InterruptCause::Dma2));
        assert_eq!(asic.dcsr() & 0x07, 0x06);
    }
}
