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

    config.rs

    Video core configuration. Can be built in code or deserialized from the
    [video] table of a machine configuration file.

*/

use std::{path::PathBuf, str::FromStr};

use anyhow::Context;
use serde_derive::Deserialize;

use crate::error::VideoError;

#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum MachineVariant {
    /// Base machine: Gate Array only, 27 colour hardware palette.
    Cpc,
    /// Enhanced machine with the ASIC.
    #[default]
    Plus,
}

impl FromStr for MachineVariant {
    type Err = VideoError;
    fn from_str(s: &str) -> Result<Self, VideoError> {
        match s {
            "Cpc" | "CPC" => Ok(MachineVariant::Cpc),
            "Plus" | "CPC+" => Ok(MachineVariant::Plus),
            _ => Err(VideoError::BadConfigValue("MachineVariant", s.to_string())),
        }
    }
}

/// When a write to the mode register becomes visible.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum ModeLatch {
    /// Take effect from the next HSYNC, as the Gate Array does.
    #[default]
    Hsync,
    /// Take effect on the next character clock.
    Immediate,
}

impl FromStr for ModeLatch {
    type Err = VideoError;
    fn from_str(s: &str) -> Result<Self, VideoError> {
        match s {
            "Hsync" => Ok(ModeLatch::Hsync),
            "Immediate" => Ok(ModeLatch::Immediate),
            _ => Err(VideoError::BadConfigValue("ModeLatch", s.to_string())),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(from = "VideoConfigToml")]
pub struct VideoConfig {
    pub variant: MachineVariant,
    pub mode_latch: ModeLatch,
    /// Start with the ASIC register page unlocked. The unlock sequence itself
    /// is handled by the host.
    pub asic_enabled: bool,
    /// Prescaler values loaded into the three DMA channels on reset.
    pub dma_prescalers: [u8; 3],
    /// Paint blanking periods in a visible colour instead of black.
    pub debug_blanking: bool,
    /// Write a video timing trace to this file.
    pub trace_file: Option<PathBuf>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            variant: MachineVariant::Plus,
            mode_latch: ModeLatch::Hsync,
            asic_enabled: true,
            dma_prescalers: [0; 3],
            debug_blanking: false,
            trace_file: None,
        }
    }
}

/// On-disk form of [VideoConfig]. Every key is optional; an absent
/// `asic_enabled` follows the machine variant.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoConfigToml {
    variant: MachineVariant,
    mode_latch: ModeLatch,
    asic_enabled: Option<bool>,
    dma_prescalers: [u8; 3],
    debug_blanking: bool,
    trace_file: Option<PathBuf>,
}

impl From<VideoConfigToml> for VideoConfig {
    fn from(t: VideoConfigToml) -> Self {
        Self {
            variant: t.variant,
            mode_latch: t.mode_latch,
            asic_enabled: t.asic_enabled.unwrap_or(t.variant == MachineVariant::Plus),
            dma_prescalers: t.dma_prescalers,
            debug_blanking: t.debug_blanking,
            trace_file: t.trace_file,
        }
    }
}

impl VideoConfig {
    pub fn cpc() -> Self {
        Self {
            variant: MachineVariant::Cpc,
            asic_enabled: false,
            ..Default::default()
        }
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, VideoError> {
        let config: VideoConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't read video configuration {}", path.display()))?;
        let config = Self::from_toml(&toml_str)
            .with_context(|| format!("Couldn't parse video configuration {}", path.display()))?;
        log::debug!("Loaded video configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VideoError> {
        if self.variant == MachineVariant::Cpc && self.asic_enabled {
            return Err(VideoError::AsicUnavailable);
        }
        Ok(())
    }

    pub fn has_asic(&self) -> bool {
        self.variant == MachineVariant::Plus
    }
}
