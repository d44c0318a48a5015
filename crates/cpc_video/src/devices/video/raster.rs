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

    devices::video::raster.rs

    Beam position, mode latch and the Gate Array HSYNC interrupt counter.

*/

use crate::{config::ModeLatch, devices::gate_array::VideoMode};

/// 64 CRTC characters of 16 dots.
pub const FIELD_W: usize = 1024;
pub const FIELD_H: usize = 312;
pub const FIELD_SIZE: usize = FIELD_W * FIELD_H;
pub const TOTAL_LINES: u32 = 312;

/// Beam column loaded at the start of HSYNC. The first half of the sync
/// pulse falls outside the field.
pub const HSYNC_BEAM_X: i32 = -128;
/// Beam row loaded at the start of VSYNC.
pub const VSYNC_BEAM_Y: i32 = -16;

/// The Gate Array interrupts every 52 HSYNCs.
pub const HSYNC_INTERRUPT_PERIOD: u8 = 52;
/// HSYNCs after VSYNC start before the counter is resynchronised.
pub const VSYNC_HSYNC_DELAY: u8 = 2;
/// Counter value at or above which the VSYNC resync raises an interrupt.
pub const VSYNC_INTERRUPT_THRESHOLD: u8 = 32;

#[derive(Clone, Debug)]
pub struct RasterState {
    pub beam_x: i32,
    pub beam_y: i32,
    pub scanline: u32,
    pub hsync_counter: u8,
    pub hsyncs_after_vsync: u8,
    pub programmed_mode: VideoMode,
    pub latched_mode: VideoMode,
    pub hsync: bool,
    pub vsync: bool,
    pub display_enable: bool,
    /// Display enable has been seen on the current scanline.
    pub line_started: bool,
    /// Border extend was set when the current line started. The whole line
    /// is drawn in the border colour.
    pub border_extended: bool,
    /// Field position of the first displayed dot of the frame.
    pub frame_origin: Option<(i32, i32)>,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            beam_x: 0,
            beam_y: 0,
            scanline: 0,
            hsync_counter: 0,
            hsyncs_after_vsync: 0,
            programmed_mode: VideoMode::Mode1,
            latched_mode: VideoMode::Mode1,
            hsync: false,
            vsync: false,
            display_enable: false,
            line_started: false,
            border_extended: false,
            frame_origin: None,
        }
    }
}

impl RasterState {
    pub fn set_mode(&mut self, mode: VideoMode, latch: ModeLatch) {
        self.programmed_mode = mode;
        if latch == ModeLatch::Immediate {
            self.latched_mode = mode;
        }
    }

    /// HSYNC asserted: latch the mode and move the beam to the next line.
    pub fn hsync_start(&mut self, latch: ModeLatch) {
        if latch == ModeLatch::Hsync {
            self.latched_mode = self.programmed_mode;
        }
        self.beam_x = HSYNC_BEAM_X;
        self.beam_y += 1;
        self.scanline = (self.scanline + 1) % TOTAL_LINES;
        self.line_started = false;
        self.border_extended = false;
    }

    /// Clock the interrupt counter on an HSYNC. Returns true if the Gate Array
    /// raises an interrupt, which does not happen while the PRI owns the line.
    pub fn count_hsync(&mut self, pri_owns: bool) -> bool {
        let mut irq = false;
        self.hsync_counter += 1;
        if self.hsync_counter >= HSYNC_INTERRUPT_PERIOD {
            self.hsync_counter = 0;
            irq = true;
        }
        if self.hsyncs_after_vsync > 0 {
            self.hsyncs_after_vsync -= 1;
            if self.hsyncs_after_vsync == 0 {
                if self.hsync_counter >= VSYNC_INTERRUPT_THRESHOLD {
                    irq = true;
                }
                self.hsync_counter = 0;
            }
        }
        irq && !pri_owns
    }

    pub fn vsync_start(&mut self) {
        self.beam_y = VSYNC_BEAM_Y;
        self.hsyncs_after_vsync = VSYNC_HSYNC_DELAY;
        self.frame_origin = None;
    }

    /// Interrupt acknowledge clears bit 5 of the counter.
    pub fn acknowledge(&mut self) {
        self.hsync_counter &= 0x1F;
    }

    pub fn reset_counter(&mut self) {
        self.hsync_counter = 0;
    }

    /// Offset of the current beam position in the field, if on screen.
    #[inline(always)]
    pub fn field_offset(&self, dx: i32) -> Option<usize> {
        let x = self.beam_x + dx;
        if self.beam_y < 0 || self.beam_y >= FIELD_H as i32 || x < 0 || x >= FIELD_W as i32 {
            return None;
        }
        Some(self.beam_y as usize * FIELD_W + x as usize)
    }
}
