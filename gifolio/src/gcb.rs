// gcb.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Graphic control extension
use crate::block::{ExtensionBlock, ExtensionCode, Gif, SavedImage};
use crate::error::DecodeError;

/// Frame disposal method
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified
    #[default]
    NoAction,
    /// Leave the frame in place
    Keep,
    /// Restore the frame area to the background color
    Background,
    /// Restore the frame area to the previous contents
    Previous,
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            n => Reserved(n),
        }
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
            Reserved(n) => n & 0b0111,
        }
    }
}

/// Graphic control block: a structured view of a graphic control extension
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct GraphicsControl {
    disposal_method: DisposalMethod,
    user_input: bool,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color: Option<u8>,
}

impl GraphicsControl {
    /// Length of extension payload
    pub const LEN: usize = 4;
    #[cfg(test)]
    const RESERVED: u8 = 0b1110_0000;
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        self.disposal_method = method;
        self
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        self.disposal_method
    }
    pub fn with_user_input(mut self, user_input: bool) -> Self {
        self.user_input = user_input;
        self
    }
    pub fn user_input(&self) -> bool {
        self.user_input
    }
    pub fn with_delay_time_cs(mut self, delay_time_cs: u16) -> Self {
        self.delay_time_cs = delay_time_cs;
        self
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn with_transparent_color(mut self, clr: Option<u8>) -> Self {
        self.transparent_color = clr;
        self
    }
    pub fn transparent_color(&self) -> Option<u8> {
        self.transparent_color
    }

    /// Unpack a graphic control extension payload
    pub fn from_extension(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() != Self::LEN {
            return Err(DecodeError::MalformedGraphicControl);
        }
        let flags = buf[0];
        let disposal_method = ((flags & Self::DISPOSAL_METHOD) >> 2).into();
        let user_input = flags & Self::USER_INPUT != 0;
        let delay_time_cs = u16::from_le_bytes([buf[1], buf[2]]);
        let transparent_color = if flags & Self::TRANSPARENT_COLOR != 0 {
            Some(buf[3])
        } else {
            None
        };
        Ok(GraphicsControl {
            disposal_method,
            user_input,
            delay_time_cs,
            transparent_color,
        })
    }

    /// Pack into a graphic control extension payload
    pub fn to_extension(&self) -> [u8; Self::LEN] {
        let d: u8 = self.disposal_method.into();
        let mut flags = (d << 2) & Self::DISPOSAL_METHOD;
        if self.user_input {
            flags |= Self::USER_INPUT;
        }
        if self.transparent_color.is_some() {
            flags |= Self::TRANSPARENT_COLOR;
        }
        let [d0, d1] = self.delay_time_cs.to_le_bytes();
        [flags, d0, d1, self.transparent_color.unwrap_or(0)]
    }
}

impl SavedImage {
    /// Get the graphic control block for this image.
    ///
    /// If no graphic control extension exists, the default is returned.
    pub fn graphics_control(&self) -> Result<GraphicsControl, DecodeError> {
        match self
            .extensions()
            .iter()
            .find(|b| b.code() == ExtensionCode::GraphicControl)
        {
            Some(b) => GraphicsControl::from_extension(b.bytes()),
            None => Ok(GraphicsControl::default()),
        }
    }

    /// Count graphic control extensions before this image
    pub fn graphics_control_count(&self) -> usize {
        self.extensions()
            .iter()
            .filter(|b| b.code() == ExtensionCode::GraphicControl)
            .count()
    }

    /// Set the graphic control block for this image.
    ///
    /// An existing graphic control extension is overwritten; otherwise a new
    /// one is appended.
    pub fn set_graphics_control(&mut self, gcb: &GraphicsControl) {
        let bytes = gcb.to_extension().to_vec();
        let extensions = self.extensions_mut();
        match extensions
            .iter_mut()
            .find(|b| b.code() == ExtensionCode::GraphicControl)
        {
            Some(b) => *b.bytes_mut() = bytes,
            None => extensions
                .push(ExtensionBlock::new(ExtensionCode::GraphicControl, bytes)),
        }
    }
}

impl Gif {
    /// Get the graphic control block of one image
    pub fn graphics_control(
        &self,
        idx: usize,
    ) -> Option<Result<GraphicsControl, DecodeError>> {
        self.images().get(idx).map(|img| img.graphics_control())
    }
}
