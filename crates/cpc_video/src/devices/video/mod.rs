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

    devices::video::mod.rs

    The raster side of the Gate Array and ASIC.

    CpcVideo is driven by the host's CRTC: once per character clock through
    advance_one_clock(), and on every HSYNC, VSYNC and display enable edge.
    Each clock paints one 16 dot group at the beam position into the back
    buffer. HSYNC latches the video mode, clocks the interrupt counter and
    checks the PRI; the falling edge of HSYNC runs the sound DMA. VSYNC
    composites sprites over the finished field and swaps buffers.

*/

use std::collections::HashMap;

use crate::{
    config::{MachineVariant, VideoConfig},
    device_traits::{read_u8, InterruptLine, RasterBus},
    devices::{
        asic::{
            dma::{DmaChannelState, DMA_CHANNELS},
            scroll::GROUP_DOTS,
            sprites::{ClipRect, SPRITE_COUNT},
            Asic,
            InterruptCause,
        },
        gate_array::{
            palette::{ASIC_PALETTE_ENTRIES, PEN_COUNT},
            GateArray,
            GateArrayWrite,
            VideoMode,
        },
    },
    error::VideoError,
    tracelogger::TraceLogger,
};

macro_rules! trace {
    ($self:ident, $($t:tt)*) => {{
        if $self.trace_logger.is_some() {
            let prefix = format!(
                "[SL:{:03} X:{:04} Y:{:03} HC:{:02}] ",
                $self.raster.scanline, $self.raster.beam_x, $self.raster.beam_y, $self.raster.hsync_counter
            );
            $self.trace_logger.println(prefix + &format!($($t)*));
        }
    }};
}

pub mod draw;
pub mod raster;

pub use draw::DrawPath;
use raster::{RasterState, FIELD_H, FIELD_SIZE, FIELD_W};

/// Byte value on the data bus during an interrupt acknowledge when nothing
/// drives it.
pub const FLOATING_BUS: u8 = 0xFF;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayExtents {
    pub field_w: u32,
    pub field_h: u32,
    /// Number of u32 pixels to skip to reach the next row.
    pub row_stride: usize,
    /// Field position of the first displayed dot of the last frame.
    pub origin: (i32, i32),
    /// Size of the display enabled area of the last frame, in dots and lines.
    pub visible_w: u32,
    pub visible_h: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VideoCardStateEntry {
    String(String),
    Color(String, u8, u8, u8),
}

pub type VideoCardState = HashMap<String, Vec<(String, VideoCardStateEntry)>>;

macro_rules! push_reg_str {
    ($vec: expr, $reg: expr, $val: expr ) => {
        $vec.push(($reg.to_string(), VideoCardStateEntry::String(format!("{}", $val))))
    };
}

pub struct CpcVideo {
    config: VideoConfig,
    pub gate_array: GateArray,
    pub asic: Asic,
    raster: RasterState,

    buf: [Vec<u32>; 2],
    front_buf: usize,
    back_buf: usize,
    prev_group: [u32; GROUP_DOTS],
    extents: DisplayExtents,
    // Furthest display enabled position seen this frame.
    de_right: i32,
    de_bottom: i32,
    frame_count: u64,

    trace_logger: TraceLogger,
}

impl CpcVideo {
    pub fn new(config: VideoConfig) -> Result<Self, VideoError> {
        config.validate()?;
        let trace_logger = match &config.trace_file {
            Some(path) => TraceLogger::from_filename(path),
            None => TraceLogger::None,
        };
        log::debug!(
            "Creating {:?} video, mode latch {:?}, ASIC {}",
            config.variant,
            config.mode_latch,
            if config.asic_enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            gate_array: GateArray::new(config.variant),
            asic: Asic::new(config.asic_enabled, config.dma_prescalers),
            raster: RasterState::default(),
            buf: [vec![0; FIELD_SIZE], vec![0; FIELD_SIZE]],
            front_buf: 0,
            back_buf: 1,
            prev_group: [0; GROUP_DOTS],
            extents: DisplayExtents {
                field_w: FIELD_W as u32,
                field_h: FIELD_H as u32,
                row_stride: FIELD_W,
                ..Default::default()
            },
            de_right: 0,
            de_bottom: 0,
            frame_count: 0,
            trace_logger,
            config,
        })
    }

    pub fn with_trace_logger(mut self, trace_logger: TraceLogger) -> Self {
        self.trace_logger = trace_logger;
        self
    }

    pub fn trace_logger_mut(&mut self) -> &mut TraceLogger {
        &mut self.trace_logger
    }

    pub fn reset(&mut self) {
        log::debug!("Resetting video");
        self.gate_array.reset();
        self.asic.reset();
        self.raster = RasterState::default();
        self.prev_group = [0; GROUP_DOTS];
        for buf in self.buf.iter_mut() {
            buf.fill(0);
        }
        self.frame_count = 0;
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    pub fn raster(&self) -> &RasterState {
        &self.raster
    }

    /// ASIC features (split, scroll, PRI, sprites) are live.
    #[inline(always)]
    fn asic_active(&self) -> bool {
        self.config.variant == MachineVariant::Plus && self.asic.enabled()
    }

    /// One CRTC character clock.
    pub fn advance_one_clock(&mut self, bus: &mut RasterBus) {
        let mut ma = bus.crtc.memory_address();
        let ra = bus.crtc.row_address();

        if self.raster.display_enable && !self.raster.line_started {
            self.raster.line_started = true;
            if self.raster.frame_origin.is_none() {
                self.raster.frame_origin = Some((self.raster.beam_x, self.raster.beam_y));
            }
            if self.asic_active() {
                let row = bus.crtc.vertical_character_count();
                if let Some(ssa) = self.asic.split.check(row, ra) {
                    trace!(self, "Split screen at row {} RA {}: MA <- {:04X}", row, ra, ssa);
                    bus.crtc.load_memory_address(ssa);
                    ma = ssa;
                }
            }
            self.raster.border_extended = self.asic_active() && self.asic.scroll.border_extend();
        }

        let ra = if self.asic_active() {
            self.asic.scroll.row_address(ra)
        }
        else {
            ra & 0x07
        };

        let path = DrawPath::select(
            self.raster.hsync,
            self.raster.vsync,
            self.raster.display_enable,
            self.raster.border_extended,
            self.raster.latched_mode,
        );
        self.draw_group(path, ma, ra, bus.mem);

        if self.raster.display_enable {
            self.de_right = self.de_right.max(self.raster.beam_x + GROUP_DOTS as i32);
            self.de_bottom = self.de_bottom.max(self.raster.beam_y + 1);
        }
        self.raster.beam_x += GROUP_DOTS as i32;
    }

    pub fn hsync_changed(&mut self, asserted: bool, bus: &mut RasterBus) {
        if asserted == self.raster.hsync {
            return;
        }
        self.raster.hsync = asserted;
        if !asserted {
            if self.config.variant == MachineVariant::Plus {
                self.asic.dma.tick(bus.mem, &mut *bus.psg, &mut *bus.irq);
            }
            return;
        }

        self.raster.hsync_start(self.config.mode_latch);

        let pri_owns = self.asic_active() && self.asic.pri_owns_interrupts();
        if self.raster.count_hsync(pri_owns) {
            trace!(self, "HSYNC counter interrupt");
            self.raise_raster_interrupt(bus.irq);
        }

        if self.asic_active() {
            let row = bus.crtc.vertical_character_count();
            let ra = bus.crtc.row_address();
            if self.asic.pri.check_pri(row, ra, &mut self.raster.hsync_counter) {
                trace!(self, "PRI match at row {} RA {}", row, ra);
                self.raise_raster_interrupt(bus.irq);
            }
        }
    }

    fn raise_raster_interrupt(&mut self, irq: &mut dyn InterruptLine) {
        if self.config.variant == MachineVariant::Plus {
            self.asic.set_raster_pending();
        }
        irq.assert_irq();
    }

    pub fn vsync_changed(&mut self, asserted: bool, bus: &mut RasterBus) {
        if asserted == self.raster.vsync {
            return;
        }
        self.raster.vsync = asserted;
        if !asserted {
            return;
        }
        trace!(self, "VSYNC, frame {}", self.frame_count);

        if let Some(origin) = self.raster.frame_origin {
            if self.asic_active() {
                let clip = ClipRect {
                    x: origin.0,
                    y: origin.1,
                    w: bus.crtc.horizontal_displayed() as i32 * GROUP_DOTS as i32,
                    h: bus.crtc.vertical_displayed() as i32 * (bus.crtc.maximum_scanline() as i32 + 1),
                };
                self.asic.sprites.composite_frame(
                    &mut self.buf[self.back_buf],
                    FIELD_W,
                    FIELD_H,
                    origin,
                    clip,
                    &self.gate_array.palette,
                );
            }
            self.extents.origin = origin;
            self.extents.visible_w = (self.de_right - origin.0).max(0) as u32;
            self.extents.visible_h = (self.de_bottom - origin.1).max(0) as u32;
        }
        self.de_right = 0;
        self.de_bottom = 0;

        std::mem::swap(&mut self.front_buf, &mut self.back_buf);
        self.frame_count += 1;
        self.raster.vsync_start();
        self.asic.split.rearm();
        self.trace_logger.flush();
    }

    pub fn display_enable_changed(&mut self, enabled: bool) {
        self.raster.display_enable = enabled;
    }

    /// Write to the Gate Array port (0x7Fxx).
    pub fn gate_array_write(&mut self, byte: u8) {
        match self.gate_array.write(byte) {
            GateArrayWrite::ModeRom { mode, reset_counter } => {
                trace!(self, "Mode {} programmed, counter reset: {}", mode, reset_counter);
                self.raster.set_mode(mode, self.config.mode_latch);
                if reset_counter {
                    self.raster.reset_counter();
                }
            }
            GateArrayWrite::Ink { pen, color } => {
                trace!(self, "Pen {} <- colour {:02X}", pen, color);
            }
            GateArrayWrite::PenSelect(_) | GateArrayWrite::RamConfig(_) => {}
        }
    }

    pub fn asic_read(&self, offset: usize) -> u8 {
        self.asic.mmio_read(offset, &self.gate_array.palette)
    }

    pub fn asic_write(&mut self, offset: usize, data: u8) {
        self.asic.mmio_write(offset, data, &mut self.gate_array.palette);
    }

    /// Program the split screen: from ASIC line `line` onward, video fetch
    /// continues from `address`.
    pub fn set_split(&mut self, line: u8, address: u16) {
        self.asic.split.set_split(line, address);
    }

    pub fn set_scroll(&mut self, x_offset: u8, y_offset: u8, border_extend: bool) {
        self.asic.scroll.set_scroll(x_offset, y_offset, border_extend);
    }

    /// Z80 interrupt acknowledge. Returns the byte the CPU reads as the
    /// vector.
    pub fn acknowledge_interrupt(&mut self) -> u8 {
        if self.config.variant == MachineVariant::Cpc {
            self.raster.acknowledge();
            return FLOATING_BUS;
        }
        let (cause, vector) = self.asic.acknowledge();
        if cause == InterruptCause::Raster {
            self.raster.acknowledge();
        }
        trace!(self, "Interrupt acknowledge {:?}: vector {:02X}", cause, vector);
        vector
    }

    /// The last completed field.
    pub fn frame(&self) -> &[u32] {
        &self.buf[self.front_buf]
    }

    pub fn frame_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf[self.front_buf])
    }

    /// The field currently being drawn.
    pub fn back_buffer(&self) -> &[u32] {
        &self.buf[self.back_buf]
    }

    pub fn extents(&self) -> &DisplayExtents {
        &self.extents
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn get_videocard_string_state(&self) -> VideoCardState {
        let mut map = HashMap::new();

        let mut general_vec = Vec::new();
        push_reg_str!(general_vec, "Machine:", format!("{:?}", self.config.variant));
        push_reg_str!(general_vec, "Mode (programmed):", self.raster.programmed_mode);
        push_reg_str!(general_vec, "Mode (latched):", self.raster.latched_mode);
        push_reg_str!(general_vec, "Frame Count:", self.frame_count);
        push_reg_str!(general_vec, "Scanline:", self.raster.scanline);
        push_reg_str!(general_vec, "Beam:", format!("{},{}", self.raster.beam_x, self.raster.beam_y));
        push_reg_str!(general_vec, "HSYNC Counter:", self.raster.hsync_counter);
        map.insert("General".to_string(), general_vec);

        let mut ga_vec = Vec::new();
        push_reg_str!(ga_vec, "Selected Pen:", self.gate_array.selected_pen());
        push_reg_str!(ga_vec, "Lower ROM:", self.gate_array.lower_rom_enabled());
        push_reg_str!(ga_vec, "Upper ROM:", self.gate_array.upper_rom_enabled());
        push_reg_str!(ga_vec, "RAM Config:", format!("{:02X}", self.gate_array.ram_config()));
        map.insert("Gate Array".to_string(), ga_vec);

        let entries = if self.config.variant == MachineVariant::Plus {
            ASIC_PALETTE_ENTRIES
        }
        else {
            PEN_COUNT
        };
        let palette_vec = (0..entries)
            .map(|pen| {
                let c = self.gate_array.palette.resolve(pen);
                (
                    format!("Pen {:02}", pen),
                    VideoCardStateEntry::Color(
                        format!("{:06X}", c),
                        (c >> 16) as u8,
                        (c >> 8) as u8,
                        c as u8,
                    ),
                )
            })
            .collect();
        map.insert("Palette".to_string(), palette_vec);

        if self.config.variant == MachineVariant::Plus {
            let asic = &self.asic;
            let mut asic_vec = Vec::new();
            push_reg_str!(asic_vec, "Unlocked:", asic.enabled());
            push_reg_str!(asic_vec, "PRI:", asic.pri.target());
            push_reg_str!(asic_vec, "SPLT:", asic.split.line());
            push_reg_str!(asic_vec, "SSA:", format!("{:04X}", asic.split.address()));
            push_reg_str!(asic_vec, "SSCR:", format!("{:02X}", asic.scroll.read()));
            push_reg_str!(asic_vec, "IVR:", format!("{:02X}", asic.ivr()));
            push_reg_str!(asic_vec, "DCSR:", format!("{:08b}", asic.dcsr()));
            map.insert("ASIC".to_string(), asic_vec);

            let mut dma_vec = Vec::new();
            for ch in 0..DMA_CHANNELS {
                let channel = asic.dma.channel(ch);
                let state = match channel.state() {
                    DmaChannelState::Running => "Running".to_string(),
                    DmaChannelState::Paused(n) => format!("Paused ({})", n),
                    DmaChannelState::Stopped => "Stopped".to_string(),
                };
                push_reg_str!(dma_vec, format!("DMA{} Address:", ch), format!("{:04X}", channel.address()));
                push_reg_str!(dma_vec, format!("DMA{} Prescaler:", ch), channel.prescaler_cfg());
                push_reg_str!(dma_vec, format!("DMA{} State:", ch), state);
                push_reg_str!(
                    dma_vec,
                    format!("DMA{} Loop:", ch),
                    format!("{:04X} x{}", channel.loop_start(), channel.loop_count())
                );
            }
            map.insert("DMA".to_string(), dma_vec);

            let mut sprite_vec = Vec::new();
            for n in 0..SPRITE_COUNT {
                let s = asic.sprites.sprite(n);
                push_reg_str!(
                    sprite_vec,
                    format!("Sprite {:02}:", n),
                    format!("{},{} {:?}x{:?}", s.x(), s.y(), s.x_mag(), s.y_mag())
                );
            }
            map.insert("Sprites".to_string(), sprite_vec);
        }

        map
    }
}
