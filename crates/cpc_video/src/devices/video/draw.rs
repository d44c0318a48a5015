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

    devices::video::draw.rs

    Per-character drawing routines for the CPC video core.

*/

use super::*;
use crate::devices::{asic::scroll::GROUP_DOTS, gate_array::tablegen::decode_byte};

pub const HBLANK_DEBUG_COLOR: u32 = 0x00_30_00_40;
pub const VBLANK_DEBUG_COLOR: u32 = 0x00_40_30_00;

/// What a single character clock outputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawPath {
    HBlank,
    VBlank,
    Border,
    Pixels(VideoMode),
}

impl DrawPath {
    pub fn select(hsync: bool, vsync: bool, display_enable: bool, border_mask: bool, mode: VideoMode) -> Self {
        match (hsync, vsync, display_enable && !border_mask) {
            (true, _, _) => DrawPath::HBlank,
            (false, true, _) => DrawPath::VBlank,
            (false, false, false) => DrawPath::Border,
            (false, false, true) => DrawPath::Pixels(mode),
        }
    }
}

/// Byte address of a character in the 64K map, from the CRTC address.
#[inline(always)]
pub fn video_address(ma: u16, ra: u8) -> usize {
    let ma = ma as usize;
    ((ma & 0x3000) << 2) | (((ra & 0x07) as usize) << 11) | ((ma & 0x03FF) << 1)
}

impl CpcVideo {
    pub(super) fn draw_group(&mut self, path: DrawPath, ma: u16, ra: u8, mem: &[u8]) {
        let mut cur = [0u32; GROUP_DOTS];
        match path {
            DrawPath::HBlank => {
                cur.fill(if self.config.debug_blanking { HBLANK_DEBUG_COLOR } else { 0 });
            }
            DrawPath::VBlank => {
                cur.fill(if self.config.debug_blanking { VBLANK_DEBUG_COLOR } else { 0 });
            }
            DrawPath::Border => cur.fill(self.gate_array.palette.border()),
            DrawPath::Pixels(mode) => self.decode_group(mode, ma, ra, mem, &mut cur),
        }

        if self.asic_active() && self.asic.scroll.x_offset() > 0 {
            let mut out = [0u32; GROUP_DOTS];
            self.asic.scroll.shift_group(&self.prev_group, &cur, &mut out);
            self.prev_group = cur;
            self.put_group(&out);
        }
        else {
            self.prev_group = cur;
            self.put_group(&cur);
        }
    }

    /// Fetch the two bytes for this character and expand them to 16 dots.
    fn decode_group(&self, mode: VideoMode, ma: u16, ra: u8, mem: &[u8], out: &mut [u32; GROUP_DOTS]) {
        let addr = video_address(ma, ra);
        let dpp = mode.dots_per_pixel();
        let palette = &self.gate_array.palette;

        for (b, byte_addr) in [addr, addr + 1].into_iter().enumerate() {
            let byte = read_u8(mem, byte_addr);
            for (i, &pen) in decode_byte(mode, byte).iter().enumerate() {
                let start = b * 8 + i * dpp;
                out[start..start + dpp].fill(palette.resolve(pen as usize));
            }
        }
    }

    fn put_group(&mut self, dots: &[u32; GROUP_DOTS]) {
        let buf = &mut self.buf[self.back_buf];
        match (self.raster.field_offset(0), self.raster.field_offset(GROUP_DOTS as i32 - 1)) {
            (Some(start), Some(_)) => buf[start..start + GROUP_DOTS].copy_from_slice(dots),
            _ => {
                for (i, &dot) in dots.iter().enumerate() {
                    if let Some(offset) = self.raster.field_offset(i as i32) {
                        buf[offset] = dot;
                    }
                }
            }
        }
    }
}
