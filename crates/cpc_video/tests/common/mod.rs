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

    tests::common::mod.rs

    Test machine: a minimal 6845 driving the video core one character clock
    at a time, with a recording PSG and a counting interrupt line.

*/

#![allow(dead_code)]

use cpc_video::{CpcVideo, CrtcSignalSource, InterruptLine, PsgPort, RasterBus, VideoConfig};

/// CRTC registers as set by the firmware at boot.
pub const CPC_CRTC_REGS: [u8; 16] = [63, 40, 46, 0x8E, 38, 0, 25, 30, 0, 7, 0, 0, 0x30, 0x00, 0, 0];

/// Characters per frame with the default registers.
pub const CLOCKS_PER_FRAME: usize = 64 * 39 * 8;

pub struct MockCrtc {
    pub r: [u8; 16],
    pub hcc: u8,
    pub vcc: u8,
    pub ra: u8,
    pub ma: u16,
    row_start: u16,
    vsync_lines: u8,
    /// (vcc, ra, address) for each load_memory_address call.
    pub loads: Vec<(u8, u8, u16)>,
}

impl MockCrtc {
    pub fn new(r: [u8; 16]) -> Self {
        let start = (r[12] as u16) << 8 | r[13] as u16;
        Self {
            r,
            hcc: 0,
            vcc: 0,
            ra: 0,
            ma: start,
            row_start: start,
            vsync_lines: 0,
            loads: Vec::new(),
        }
    }

    fn start_address(&self) -> u16 {
        (self.r[12] as u16 & 0x3F) << 8 | self.r[13] as u16
    }

    pub fn display_enable(&self) -> bool {
        self.hcc < self.r[1] && self.vcc < self.r[6]
    }

    pub fn hsync(&self) -> bool {
        let width = self.r[3] & 0x0F;
        self.hcc >= self.r[2] && self.hcc < self.r[2].saturating_add(width)
    }

    pub fn vsync(&self) -> bool {
        self.vsync_lines > 0
    }

    pub fn tick(&mut self) {
        self.hcc += 1;
        self.ma = self.ma.wrapping_add(1);
        if self.hcc <= self.r[0] {
            return;
        }
        self.hcc = 0;
        if self.vsync_lines > 0 {
            self.vsync_lines -= 1;
        }
        if self.ra == self.r[9] {
            self.ra = 0;
            if self.vcc == self.r[4] {
                self.vcc = 0;
                self.row_start = self.start_address();
            }
            else {
                self.vcc += 1;
                self.row_start = self.row_start.wrapping_add(self.r[1] as u16);
            }
        }
        else {
            self.ra += 1;
        }
        self.ma = self.row_start;
        if self.vcc == self.r[7] && self.ra == 0 {
            self.vsync_lines = match self.r[3] >> 4 {
                0 => 16,
                n => n,
            };
        }
    }
}

impl CrtcSignalSource for MockCrtc {
    fn memory_address(&self) -> u16 {
        self.ma
    }
    fn row_address(&self) -> u8 {
        self.ra
    }
    fn vertical_character_count(&self) -> u8 {
        self.vcc
    }
    fn horizontal_displayed(&self) -> u8 {
        self.r[1]
    }
    fn vertical_displayed(&self) -> u8 {
        self.r[6]
    }
    fn maximum_scanline(&self) -> u8 {
        self.r[9]
    }
    fn load_memory_address(&mut self, addr: u16) {
        self.loads.push((self.vcc, self.ra, addr));
        self.ma = addr;
        self.row_start = addr;
    }
}

#[derive(Default)]
pub struct RecordingPsg {
    pub selected: u8,
    /// (register, value) in write order.
    pub writes: Vec<(u8, u8)>,
}

impl PsgPort for RecordingPsg {
    fn selected_register(&self) -> u8 {
        self.selected
    }
    fn select_register(&mut self, index: u8) {
        self.selected = index;
    }
    fn write_data(&mut self, value: u8) {
        self.writes.push((self.selected, value));
    }
}

#[derive(Default)]
pub struct CountingIrq {
    pub count: usize,
}

impl InterruptLine for CountingIrq {
    fn assert_irq(&mut self) {
        self.count += 1;
    }
}

pub struct Machine {
    pub video: CpcVideo,
    pub crtc: MockCrtc,
    pub mem: Vec<u8>,
    pub psg: RecordingPsg,
    pub irq: CountingIrq,
    last_de: bool,
}

impl Machine {
    pub fn new(config: VideoConfig) -> Self {
        Self {
            video: CpcVideo::new(config).unwrap(),
            crtc: MockCrtc::new(CPC_CRTC_REGS),
            mem: vec![0; 0x10000],
            psg: RecordingPsg::default(),
            irq: CountingIrq::default(),
            last_de: false,
        }
    }

    pub fn clock(&mut self) {
        let de = self.crtc.display_enable();
        let hs = self.crtc.hsync();
        let vs = self.crtc.vsync();

        let mut bus = RasterBus::new(&mut self.crtc, &self.mem, &mut self.psg, &mut self.irq);
        if de != self.last_de {
            self.video.display_enable_changed(de);
            self.last_de = de;
        }
        self.video.hsync_changed(hs, &mut bus);
        self.video.vsync_changed(vs, &mut bus);
        self.video.advance_one_clock(&mut bus);

        self.crtc.tick();
    }

    pub fn run_clocks(&mut self, n: usize) {
        for _ in 0..n {
            self.clock();
        }
    }

    /// Run until the current scanline ends (the CRTC wraps to character 0).
    pub fn run_line(&mut self) {
        loop {
            self.clock();
            if self.crtc.hcc == 0 {
                break;
            }
        }
    }

    /// Run until the next VSYNC completes a frame.
    pub fn run_frame(&mut self) {
        let start = self.video.frame_count();
        while self.video.frame_count() == start {
            self.clock();
        }
    }

    /// Run to the start of the first displayed line of a frame.
    pub fn run_to_display(&mut self) {
        self.run_frame();
        while !(self.crtc.vcc == 0 && self.crtc.ra == 0 && self.crtc.hcc == 0) {
            self.clock();
        }
    }

    pub fn write_asic(&mut self, offset: usize, data: u8) {
        self.video.asic_write(offset, data);
    }

    pub fn poke_words(&mut self, addr: usize, words: &[u16]) {
        for (i, w) in words.iter().enumerate() {
            self.mem[addr + i * 2] = (*w & 0xFF) as u8;
            self.mem[addr + i * 2 + 1] = (*w >> 8) as u8;
        }
    }
}
