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

    devices::asic::dma.rs

    ASIC sound DMA.

    Three channels each run a small program from main memory, one instruction
    per HSYNC, feeding the AY without CPU involvement. Instructions are 16-bit
    little-endian words fetched from word-aligned addresses:

    0RDD  LOAD    write DD to PSG register R
    1nnn  PAUSE   wait n (prescaled) HSYNCs
    2nnn  REPEAT  mark the loop start, loop count n
    4xxx  control bit 0 LOOP, bit 4 INT, bit 5 STOP; combinable, 4000 is NOP

    Bit 15 is not decoded.

*/

use crate::device_traits::{psg::PSG_REGISTER_MASK, read_u16, InterruptLine, PsgPort};

pub const DMA_CHANNELS: usize = 3;

/// DCSR bit flagging a pending interrupt for a channel.
#[inline]
pub const fn dma_interrupt_bit(channel: usize) -> u8 {
    0x40 >> channel
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DmaInstruction {
    Load { register: u8, data: u8 },
    Pause(u16),
    Repeat(u16),
    Control { repeat_loop: bool, interrupt: bool, stop: bool },
    Unknown(u16),
}

impl DmaInstruction {
    pub fn decode(word: u16) -> Self {
        match word & 0x7000 {
            0x0000 => DmaInstruction::Load {
                register: ((word >> 8) as u8) & PSG_REGISTER_MASK,
                data: (word & 0xFF) as u8,
            },
            0x1000 => DmaInstruction::Pause(word & 0x0FFF),
            0x2000 => DmaInstruction::Repeat(word & 0x0FFF),
            0x4000 => DmaInstruction::Control {
                repeat_loop: word & 0x0001 != 0,
                interrupt: word & 0x0010 != 0,
                stop: word & 0x0020 != 0,
            },
            _ => DmaInstruction::Unknown(word),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DmaChannelState {
    Running,
    Paused(u16),
    Stopped,
}

#[derive(Clone, Debug, Default)]
pub struct DmaChannel {
    address: u16,
    prescaler_cfg: u8,
    prescaler: u16,
    pause: u16,
    pausing: bool,
    loop_start: u16,
    loop_count: u16,
    enabled: bool,
}

impl DmaChannel {
    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn prescaler_cfg(&self) -> u8 {
        self.prescaler_cfg
    }

    pub fn loop_count(&self) -> u16 {
        self.loop_count
    }

    pub fn loop_start(&self) -> u16 {
        self.loop_start
    }

    pub fn state(&self) -> DmaChannelState {
        if !self.enabled {
            DmaChannelState::Stopped
        }
        else if self.pausing {
            DmaChannelState::Paused(self.pause)
        }
        else {
            DmaChannelState::Running
        }
    }

    /// Point the channel at a new program and clear any pause or loop.
    pub fn restart(&mut self, address: u16) {
        self.address = address & 0xFFFE;
        self.prescaler = 0;
        self.pause = 0;
        self.pausing = false;
        self.loop_start = self.address;
        self.loop_count = 0;
        self.enabled = true;
    }

    /// Count down one HSYNC of an active pause. Returns false once the
    /// pause has expired and the channel may fetch again.
    fn count_pause(&mut self) -> bool {
        if self.prescaler > 0 {
            self.prescaler -= 1;
        }
        else if self.pause > 0 {
            self.pause -= 1;
            self.prescaler = self.prescaler_cfg as u16;
        }
        self.pausing = self.pause > 0 || self.prescaler > 0;
        self.pausing
    }
}

#[derive(Default)]
pub struct DmaEngine {
    channels: [DmaChannel; DMA_CHANNELS],
    pending: u8,
}

impl DmaEngine {
    pub fn new(prescalers: [u8; DMA_CHANNELS]) -> Self {
        let mut engine = Self::default();
        for (channel, prescaler) in engine.channels.iter_mut().zip(prescalers) {
            channel.prescaler_cfg = prescaler;
        }
        engine
    }

    pub fn reset(&mut self, prescalers: [u8; DMA_CHANNELS]) {
        *self = Self::new(prescalers);
    }

    pub fn channel(&self, channel: usize) -> &DmaChannel {
        &self.channels[channel % DMA_CHANNELS]
    }

    /// Run one HSYNC worth of DMA. Channels are serviced in order 0, 1, 2.
    pub fn tick(&mut self, mem: &[u8], psg: &mut dyn PsgPort, irq: &mut dyn InterruptLine) {
        for ch in 0..DMA_CHANNELS {
            self.tick_channel(ch, mem, psg, irq);
        }
    }

    fn tick_channel(&mut self, ch: usize, mem: &[u8], psg: &mut dyn PsgPort, irq: &mut dyn InterruptLine) {
        let channel = &mut self.channels[ch];
        if !channel.enabled {
            return;
        }
        if channel.pausing {
            channel.count_pause();
            return;
        }

        let word = read_u16(mem, (channel.address & 0xFFFE) as usize);
        let instr = DmaInstruction::decode(word);
        log::trace!("DMA{}: [{:04X}] {:04X} {:?}", ch, channel.address, word, instr);

        let mut advance = true;
        match instr {
            DmaInstruction::Load { register, data } => {
                let saved = psg.selected_register();
                psg.select_register(register);
                psg.write_data(data);
                psg.select_register(saved);
            }
            DmaInstruction::Pause(n) => {
                if n > 0 {
                    channel.pause = n - 1;
                    channel.prescaler = channel.prescaler_cfg as u16;
                    channel.pausing = channel.pause > 0 || channel.prescaler > 0;
                }
            }
            DmaInstruction::Repeat(n) => {
                channel.loop_start = channel.address.wrapping_add(2) & 0xFFFE;
                channel.loop_count = n;
            }
            DmaInstruction::Control {
                repeat_loop,
                interrupt,
                stop,
            } => {
                if repeat_loop && channel.loop_count > 0 {
                    channel.loop_count -= 1;
                    channel.address = channel.loop_start;
                    advance = false;
                }
                if interrupt {
                    self.pending |= dma_interrupt_bit(ch);
                    log::trace!("DMA{}: interrupt", ch);
                    irq.assert_irq();
                }
                if stop {
                    channel.enabled = false;
                    log::trace!("DMA{}: stopped", ch);
                }
            }
            DmaInstruction::Unknown(word) => {
                log::warn!("DMA{}: unknown instruction {:04X} at {:04X}", ch, word, channel.address);
            }
        }
        if advance {
            channel.address = channel.address.wrapping_add(2) & 0xFFFE;
        }
    }

    /// Write to the low (`high == false`) or high address byte. A high byte
    /// write restarts the channel at the new address.
    pub fn write_address(&mut self, ch: usize, high: bool, byte: u8) {
        let channel = &mut self.channels[ch % DMA_CHANNELS];
        if high {
            let address = (channel.address & 0x00FF) | (byte as u16) << 8;
            channel.restart(address);
            log::debug!("DMA{}: restarted at {:04X}", ch, channel.address);
        }
        else {
            channel.address = (channel.address & 0xFF00) | (byte & 0xFE) as u16;
        }
    }

    pub fn read_address(&self, ch: usize, high: bool) -> u8 {
        let address = self.channels[ch % DMA_CHANNELS].address;
        if high {
            (address >> 8) as u8
        }
        else {
            (address & 0xFF) as u8
        }
    }

    pub fn set_prescaler(&mut self, ch: usize, value: u8) {
        self.channels[ch % DMA_CHANNELS].prescaler_cfg = value;
    }

    /// DCSR bits 2-0.
    pub fn enable_bits(&self) -> u8 {
        self.channels
            .iter()
            .enumerate()
            .fold(0, |acc, (i, c)| if c.enabled { acc | (1 << i) } else { acc })
    }

    /// Enable or halt channels from DCSR bits 2-0. A re-enabled channel
    /// resumes from its current address.
    pub fn set_enable_bits(&mut self, bits: u8) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            channel.enabled = bits & (1 << i) != 0;
        }
    }

    /// DCSR bits 6-4.
    pub fn pending(&self) -> u8 {
        self.pending
    }

    pub fn clear_pending(&mut self, mask: u8) {
        self.pending &= !(mask & 0x70);
    }
}
