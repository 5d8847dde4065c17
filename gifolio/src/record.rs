// record.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Record-type dispatch for decoding
use crate::error::DecodeError;

/// Type of the next record in a GIF file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecordType {
    /// Image descriptor, color map and image data
    ImageDesc,
    /// Extension block
    Extension,
    /// End of file
    Terminate,
}

impl RecordType {
    /// Get a record type from its separator byte
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::RecordType::*;
        match t {
            b',' => Some(ImageDesc), // (0x2C) Image separator
            b'!' => Some(Extension), // (0x21) Extension introducer
            b';' => Some(Terminate), // (0x3B) GIF trailer
            _ => None,
        }
    }

    /// Get the separator byte
    pub fn signature(self) -> u8 {
        use self::RecordType::*;
        match self {
            ImageDesc => b',',
            Extension => b'!',
            Terminate => b';',
        }
    }
}

/// Decoder state
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum State {
    /// Nothing read yet
    Start,
    /// Screen descriptor read; waiting for a record type
    Dispatch,
    /// Inside an image record
    Image,
    /// Inside an extension record
    Extension,
    /// Trailer read; no further reads allowed
    Terminated,
}

/// Record-type state machine
#[derive(Debug)]
pub(crate) struct Dispatcher {
    state: State,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            state: State::Start,
        }
    }
}

impl Dispatcher {
    /// Get the current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Check that the dispatcher is in a state
    pub fn expect(&self, state: State) -> Result<(), DecodeError> {
        if self.state == state {
            Ok(())
        } else {
            debug!("dispatch: expected {:?}, in {:?}", state, self.state);
            Err(match (state, self.state) {
                (_, State::Start) => DecodeError::NoScreenDesc,
                (State::Image, State::Dispatch) => DecodeError::NoImageDesc,
                _ => DecodeError::NotReadable,
            })
        }
    }

    /// Screen descriptor has been read
    pub fn screen_read(&mut self) -> Result<(), DecodeError> {
        match self.state {
            State::Start => {
                self.state = State::Dispatch;
                Ok(())
            }
            _ => Err(DecodeError::NotReadable),
        }
    }

    /// Dispatch on a separator byte (`None` at end of input)
    pub fn dispatch(&mut self, byte: Option<u8>) -> Result<RecordType, DecodeError> {
        self.expect(State::Dispatch)?;
        let byte = byte.ok_or(DecodeError::EofTooSoon)?;
        let rt = RecordType::from_u8(byte)
            .ok_or(DecodeError::WrongRecordType(byte))?;
        self.state = match rt {
            RecordType::ImageDesc => State::Image,
            RecordType::Extension => State::Extension,
            RecordType::Terminate => State::Terminated,
        };
        debug!("record: {:?}", rt);
        Ok(rt)
    }

    /// Current image or extension record is finished
    pub fn finish_record(&mut self) {
        debug_assert!(matches!(self.state, State::Image | State::Extension));
        self.state = State::Dispatch;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sequence() -> Result<(), DecodeError> {
        let mut d = Dispatcher::default();
        assert!(matches!(d.dispatch(Some(b',')), Err(DecodeError::NoScreenDesc)));
        d.screen_read()?;
        assert_eq!(d.dispatch(Some(0x21))?, RecordType::Extension);
        assert_eq!(d.state(), State::Extension);
        d.finish_record();
        assert_eq!(d.dispatch(Some(0x2C))?, RecordType::ImageDesc);
        assert_eq!(d.state(), State::Image);
        d.finish_record();
        assert_eq!(d.dispatch(Some(0x3B))?, RecordType::Terminate);
        assert_eq!(d.state(), State::Terminated);
        assert!(matches!(d.dispatch(Some(b',')), Err(DecodeError::NotReadable)));
        assert!(matches!(d.screen_read(), Err(DecodeError::NotReadable)));
        Ok(())
    }

    #[test]
    fn wrong_record() -> Result<(), DecodeError> {
        let mut d = Dispatcher::default();
        d.screen_read()?;
        assert!(matches!(
            d.dispatch(Some(0x00)),
            Err(DecodeError::WrongRecordType(0x00))
        ));
        assert!(matches!(d.dispatch(None), Err(DecodeError::EofTooSoon)));
        Ok(())
    }

    #[test]
    fn signature() {
        for rt in [RecordType::ImageDesc, RecordType::Extension, RecordType::Terminate] {
            assert_eq!(RecordType::from_u8(rt.signature()), Some(rt));
        }
    }
}
