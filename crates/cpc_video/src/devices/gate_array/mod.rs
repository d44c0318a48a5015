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

    devices::gate_array::mod.rs

    Implementation of the Amstrad 40007/40010 Gate Array register port.

    A single write-only port. Bits 7-6 of the written byte select the
    function: pen select, ink, mode and ROM configuration, or RAM banking.
    The raster side of the Gate Array (mode latch, interrupt counter, pixel
    output) lives in devices::video.

*/

pub mod palette;
pub mod tablegen;

use modular_bitfield::{bitfield, prelude::*};

use crate::config::MachineVariant;
use palette::{PaletteState, BORDER_PEN};
pub use tablegen::VideoMode;

#[derive(Copy, Clone, Debug, PartialEq, Eq, BitfieldSpecifier)]
#[bits = 2]
pub enum GateArrayFunction {
    PenSelect,
    Ink,
    ModeRom,
    RamConfig,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct PenRegister {
    pub pen: B4,
    pub border: bool,
    #[skip]
    unused: B1,
    pub function: GateArrayFunction,
}

#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct ModeRomRegister {
    pub mode: VideoMode,
    pub lower_rom_disable: bool,
    pub upper_rom_disable: bool,
    pub reset_interrupt: bool,
    #[skip]
    unused: B1,
    pub function: GateArrayFunction,
}

/// What a port write changed, for the parts of the machine outside the
/// Gate Array's own registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GateArrayWrite {
    PenSelect(usize),
    Ink { pen: usize, color: u8 },
    ModeRom { mode: VideoMode, reset_counter: bool },
    RamConfig(u8),
}

pub struct GateArray {
    selected_pen: usize,
    mode_rom: ModeRomRegister,
    ram_config: u8,
    pub palette: PaletteState,
}

impl GateArray {
    pub fn new(variant: MachineVariant) -> Self {
        Self {
            selected_pen: 0,
            mode_rom: ModeRomRegister::new(),
            ram_config: 0,
            palette: PaletteState::new(variant),
        }
    }

    pub fn reset(&mut self) {
        self.selected_pen = 0;
        self.mode_rom = ModeRomRegister::new();
        self.ram_config = 0;
        self.palette.reset();
    }

    pub fn write(&mut self, byte: u8) -> GateArrayWrite {
        match GateArrayFunction::from_bits(byte >> 6) {
            GateArrayFunction::PenSelect => {
                let reg = PenRegister::from_bytes([byte]);
                self.selected_pen = if reg.border() { BORDER_PEN } else { reg.pen() as usize };
                GateArrayWrite::PenSelect(self.selected_pen)
            }
            GateArrayFunction::Ink => {
                let color = byte & 0x1F;
                self.palette.write_hardware(self.selected_pen, color);
                GateArrayWrite::Ink {
                    pen: self.selected_pen,
                    color,
                }
            }
            GateArrayFunction::ModeRom => {
                self.mode_rom = ModeRomRegister::from_bytes([byte]);
                GateArrayWrite::ModeRom {
                    mode: self.mode_rom.mode(),
                    reset_counter: self.mode_rom.reset_interrupt(),
                }
            }
            GateArrayFunction::RamConfig => {
                log::trace!("Gate Array: RAM configuration {:02X} ignored", byte);
                self.ram_config = byte;
                GateArrayWrite::RamConfig(byte)
            }
        }
    }

    pub fn selected_pen(&self) -> usize {
        self.selected_pen
    }

    pub fn mode(&self) -> VideoMode {
        self.mode_rom.mode()
    }

    pub fn lower_rom_enabled(&self) -> bool {
        !self.mode_rom.lower_rom_disable()
    }

    pub fn upper_rom_enabled(&self) -> bool {
        !self.mode_rom.upper_rom_disable()
    }

    pub fn ram_config(&self) -> u8 {
        self.ram_config
    }
}

impl GateArrayFunction {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => GateArrayFunction::PenSelect,
            1 => GateArrayFunction::Ink,
            2 => GateArrayFunction::ModeRom,
            _ => GateArrayFunction::RamConfig,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::HARDWARE_PALETTE;

    #[test]
    fn pen_then_ink() {
        let mut ga = GateArray::new(MachineVariant::Cpc);
        assert_eq!(ga.write(0x03), GateArrayWrite::PenSelect(3));
        assert_eq!(ga.write(0x4B), GateArrayWrite::Ink { pen: 3, color: 0x0B });
        assert_eq!(ga.palette.resolve(3), HARDWARE_PALETTE[0x0B]);
    }

    #[test]
    fn border_select() {
        let mut ga = GateArray::new(MachineVariant::Cpc);
        // Bit 4 wins over the pen number.
        assert_eq!(ga.write(0x1F), GateArrayWrite::PenSelect(BORDER_PEN));
        ga.write(0x40 | 0x0C);
        assert_eq!(ga.palette.border(), 0xFF0000);
    }

    #[test]
    fn mode_and_rom_bits() {
        let mut ga = GateArray::new(MachineVariant::Cpc);
        let w = ga.write(0b1001_0110);
        assert_eq!(
            w,
            GateArrayWrite::ModeRom {
                mode: VideoMode::Mode2,
                reset_counter: true
            }
        );
        assert_eq!(ga.mode(), VideoMode::Mode2);
        assert!(!ga.lower_rom_enabled());
        assert!(ga.upper_rom_enabled());
    }

    #[test]
    fn ram_config_is_stored_only() {
        let mut ga = GateArray::new(MachineVariant::Plus);
        assert_eq!(ga.write(0xC4), GateArrayWrite::RamConfig(0xC4));
        assert_eq!(ga.ram_config(), 0xC4);
        assert_eq!(ga.mode(), VideoMode::Mode0);
    }
}
