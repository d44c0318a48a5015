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

    devices::asic::sprites.rs

    ASIC hardware sprites.

    Sixteen 16x16 sprites with 4-bit pixels. Pixel RAM is addressed one pixel
    per byte (only the low nibble is kept) and stored packed here, two pixels
    per byte. The packed store is the 16 x 128 byte bitmap layout; the
    register page exposes it as 256 one-pixel addresses per sprite. Each
    sprite has an 8 byte attribute block: X low, X high,
    Y low, Y high, magnification, three unused.

    Sprites are drawn over the finished frame once per VSYNC rather than
    per scanline. Sprite 0 has the highest priority.

*/

use modular_bitfield::{bitfield, prelude::*};

use crate::devices::gate_array::palette::{PaletteState, SPRITE_PEN_BASE};

pub const SPRITE_COUNT: usize = 16;
pub const SPRITE_DIM: usize = 16;
pub const SPRITE_PIXELS: usize = SPRITE_DIM * SPRITE_DIM;
pub const SPRITE_PACKED_SIZE: usize = SPRITE_PIXELS / 2;
pub const SPRITE_ATTR_SIZE: usize = 8;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, BitfieldSpecifier)]
#[bits = 2]
pub enum Magnification {
    #[default]
    Off,
    X1,
    X2,
    X4,
}

impl Magnification {
    pub const fn factor(&self) -> usize {
        match self {
            Magnification::Off => 0,
            Magnification::X1 => 1,
            Magnification::X2 => 2,
            Magnification::X4 => 4,
        }
    }
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct MagnificationRegister {
    pub y_mag: Magnification,
    pub x_mag: Magnification,
    #[skip]
    unused: B4,
}

/// Visible window sprites are clipped to, in field coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClipRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Clone)]
pub struct SpriteEntry {
    pixels: [u8; SPRITE_PACKED_SIZE],
    attr: [u8; SPRITE_ATTR_SIZE],
    mag: MagnificationRegister,
}

impl Default for SpriteEntry {
    fn default() -> Self {
        Self {
            pixels: [0; SPRITE_PACKED_SIZE],
            attr: [0; SPRITE_ATTR_SIZE],
            mag: MagnificationRegister::new(),
        }
    }
}

impl SpriteEntry {
    pub fn write_pixel(&mut self, index: usize, value: u8) {
        let index = index % SPRITE_PIXELS;
        let byte = &mut self.pixels[index >> 1];
        if index & 1 == 0 {
            *byte = (*byte & 0x0F) | (value & 0x0F) << 4;
        }
        else {
            *byte = (*byte & 0xF0) | (value & 0x0F);
        }
    }

    pub fn read_pixel(&self, index: usize) -> u8 {
        let index = index % SPRITE_PIXELS;
        let byte = self.pixels[index >> 1];
        if index & 1 == 0 {
            byte >> 4
        }
        else {
            byte & 0x0F
        }
    }

    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.read_pixel(y * SPRITE_DIM + x)
    }

    pub fn write_attr(&mut self, offset: usize, byte: u8) {
        let offset = offset % SPRITE_ATTR_SIZE;
        self.attr[offset] = byte;
        if offset == 4 {
            self.mag = MagnificationRegister::from_bytes([byte]);
        }
    }

    pub fn read_attr(&self, offset: usize) -> u8 {
        self.attr[offset % SPRITE_ATTR_SIZE]
    }

    /// 10-bit signed X. Raw values 768-1023 are -256 to -1.
    pub fn x(&self) -> i32 {
        let raw = (self.attr[0] as i32 | (self.attr[1] as i32) << 8) & 0x3FF;
        if raw >= 0x300 {
            raw - 0x400
        }
        else {
            raw
        }
    }

    /// 9-bit signed Y.
    pub fn y(&self) -> i32 {
        let raw = (self.attr[2] as i32 | (self.attr[3] as i32) << 8) & 0x1FF;
        if raw >= 0x100 {
            raw - 0x200
        }
        else {
            raw
        }
    }

    pub fn x_mag(&self) -> Magnification {
        self.mag.x_mag()
    }

    pub fn y_mag(&self) -> Magnification {
        self.mag.y_mag()
    }

    pub fn visible(&self) -> bool {
        self.x_mag() != Magnification::Off && self.y_mag() != Magnification::Off
    }
}

#[derive(Clone, Default)]
pub struct SpriteBank {
    sprites: [SpriteEntry; SPRITE_COUNT],
}

impl SpriteBank {
    pub fn sprite(&self, n: usize) -> &SpriteEntry {
        &self.sprites[n % SPRITE_COUNT]
    }

    pub fn sprite_mut(&mut self, n: usize) -> &mut SpriteEntry {
        &mut self.sprites[n % SPRITE_COUNT]
    }

    /// Pixel RAM write. `offset` is relative to the start of pixel RAM.
    pub fn write_pixel_ram(&mut self, offset: usize, byte: u8) {
        self.sprite_mut(offset >> 8).write_pixel(offset & 0xFF, byte);
    }

    pub fn read_pixel_ram(&self, offset: usize) -> u8 {
        self.sprite(offset >> 8).read_pixel(offset & 0xFF)
    }

    /// Attribute table write. `offset` is relative to the start of the table.
    pub fn write_attr(&mut self, offset: usize, byte: u8) {
        self.sprite_mut(offset >> 3).write_attr(offset & 0x07, byte);
    }

    pub fn read_attr(&self, offset: usize) -> u8 {
        self.sprite(offset >> 3).read_attr(offset & 0x07)
    }

    /// Draw all visible sprites into a finished frame.
    ///
    /// Sprite positions are relative to `origin`, the field position of the
    /// first displayed dot of the frame. Output is clipped to `clip` and to
    /// the field. Pen 0 is transparent; pen n takes palette entry 16 + n.
    pub fn composite_frame(
        &self,
        buf: &mut [u32],
        field_w: usize,
        field_h: usize,
        origin: (i32, i32),
        clip: ClipRect,
        palette: &PaletteState,
    ) {
        let left = clip.x.max(0);
        let top = clip.y.max(0);
        let right = (clip.x + clip.w).min(field_w as i32);
        let bottom = (clip.y + clip.h).min(field_h as i32);
        if left >= right || top >= bottom {
            return;
        }

        for sprite in self.sprites.iter().rev() {
            if !sprite.visible() {
                continue;
            }
            let xf = sprite.x_mag().factor();
            let yf = sprite.y_mag().factor();
            let sx = origin.0 + sprite.x();
            let sy = origin.1 + sprite.y();

            for py in 0..SPRITE_DIM {
                let row_top = sy + (py * yf) as i32;
                if row_top >= bottom || row_top + (yf as i32) <= top {
                    continue;
                }
                for px in 0..SPRITE_DIM {
                    let pen = sprite.pixel(px, py) as usize;
                    if pen == 0 {
                        continue;
                    }
                    let color = palette.resolve(SPRITE_PEN_BASE + pen);
                    let col_left = sx + (px * xf) as i32;
                    for y in row_top..row_top + yf as i32 {
                        if y < top || y >= bottom {
                            continue;
                        }
                        let line = y as usize * field_w;
                        for x in col_left..col_left + xf as i32 {
                            if x >= left && x < right {
                                buf[line + x as usize] = color;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineVariant;

    const W: usize = 128;
    const H: usize = 64;
    const BG: u32 = 0x123456;

    fn palette() -> PaletteState {
        let mut palette = PaletteState::new(MachineVariant::Plus);
        for pen in 1..16 {
            // Red channel encodes the pen.
            palette.write_asic((SPRITE_PEN_BASE + pen) * 2, (pen as u8) << 4);
        }
        palette
    }

    fn bar_sprite(bank: &mut SpriteBank, n: usize, pen: u8, mag: u8) {
        for x in 0..SPRITE_DIM {
            bank.write_pixel_ram(n * 256 + x, pen);
        }
        bank.write_attr(n * 8 + 4, mag);
    }

    fn count_not(buf: &[u32], color: u32) -> usize {
        buf.iter().filter(|&&c| c != color).count()
    }

    fn full_clip() -> ClipRect {
        ClipRect { x: 0, y: 0, w: W as i32, h: H as i32 }
    }

    #[test]
    fn pixel_ram_packs_nibbles() {
        let mut bank = SpriteBank::default();
        bank.write_pixel_ram(0x0100, 0xFA);
        bank.write_pixel_ram(0x0101, 0x05);
        assert_eq!(bank.read_pixel_ram(0x0100), 0x0A);
        assert_eq!(bank.read_pixel_ram(0x0101), 0x05);
        assert_eq!(bank.sprite(1).pixel(1, 0), 5);
        assert_eq!(bank.sprite(0).pixel(0, 0), 0);
    }

    #[test]
    fn signed_coordinates() {
        let mut s = SpriteEntry::default();
        s.write_attr(0, 0xFF);
        s.write_attr(1, 0x03);
        assert_eq!(s.x(), -1);
        s.write_attr(0, 0x80);
        s.write_attr(1, 0x02);
        assert_eq!(s.x(), 640);
        s.write_attr(2, 0xF0);
        s.write_attr(3, 0x01);
        assert_eq!(s.y(), -16);
    }

    #[test]
    fn x2_draws_double_width() {
        let pal = palette();
        let mut bank = SpriteBank::default();
        bar_sprite(&mut bank, 0, 3, 0b0101);
        let mut buf = vec![BG; W * H];
        bank.composite_frame(&mut buf, W, H, (0, 0), full_clip(), &pal);
        let narrow = count_not(&buf, BG);
        assert_eq!(narrow, 16);

        bank.write_attr(4, 0b1001);
        let mut buf = vec![BG; W * H];
        bank.composite_frame(&mut buf, W, H, (0, 0), full_clip(), &pal);
        assert_eq!(count_not(&buf, BG), narrow * 2);
        assert_eq!(buf[31], pal.resolve(SPRITE_PEN_BASE + 3));
        assert_eq!(buf[32], BG);
        assert_eq!(buf[W], BG);
    }

    #[test]
    fn mag_off_on_either_axis_hides() {
        let pal = palette();
        for mag in [0b0000, 0b0100, 0b0001, 0b1100, 0b0011] {
            let mut bank = SpriteBank::default();
            bar_sprite(&mut bank, 5, 7, mag);
            let mut buf = vec![BG; W * H];
            bank.composite_frame(&mut buf, W, H, (0, 0), full_clip(), &pal);
            assert_eq!(count_not(&buf, BG), 0, "mag {:04b}", mag);
        }
    }

    #[test]
    fn lower_index_wins() {
        let pal = palette();
        let mut bank = SpriteBank::default();
        bar_sprite(&mut bank, 2, 2, 0b0101);
        bar_sprite(&mut bank, 9, 9, 0b0101);
        let mut buf = vec![BG; W * H];
        bank.composite_frame(&mut buf, W, H, (4, 4), full_clip(), &pal);
        assert_eq!(buf[4 * W + 4], pal.resolve(SPRITE_PEN_BASE + 2));
    }

    #[test]
    fn pen_zero_is_transparent() {
        let pal = palette();
        let mut bank = SpriteBank::default();
        bar_sprite(&mut bank, 0, 1, 0b0101);
        bank.write_pixel_ram(3, 0);
        let mut buf = vec![BG; W * H];
        bank.composite_frame(&mut buf, W, H, (0, 0), full_clip(), &pal);
        assert_eq!(buf[3], BG);
        assert_eq!(count_not(&buf, BG), 15);
    }

    #[test]
    fn clipped_to_visible_window() {
        let pal = palette();
        let mut bank = SpriteBank::default();
        bar_sprite(&mut bank, 0, 1, 0b1111);
        // x4 in both axes: a 64x4 bar, clipped to a 40 dot wide window at 8.
        let mut buf = vec![BG; W * H];
        let clip = ClipRect { x: 8, y: 0, w: 40, h: 2 };
        bank.composite_frame(&mut buf, W, H, (0, 0), clip, &pal);
        assert_eq!(count_not(&buf, BG), 40 * 2);
        assert_eq!(buf[7], BG);
        assert_ne!(buf[8], BG);
        assert_eq!(buf[2 * W + 8], BG);
    }

    #[test]
    fn negative_position_clips_at_field_edge() {
        let pal = palette();
        let mut bank = SpriteBank::default();
        bar_sprite(&mut bank, 0, 1, 0b0101);
        bank.write_attr(0, 0xF8);
        bank.write_attr(1, 0x03);
        let mut buf = vec![BG; W * H];
        bank.composite_frame(&mut buf, W, H, (0, 0), full_clip(), &pal);
        assert_eq!(count_not(&buf, BG), 8);
    }
}
