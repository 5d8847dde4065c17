// packet.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Sub-block packetizing of extension payloads and LZW code streams
use crate::error::DecodeError;
use std::io::{self, ErrorKind, Read, Write};

/// Largest payload of one sub-block
pub const MAX_SUB_BLOCK: usize = 0xFF;

/// Writer which splits data into length-prefixed sub-blocks.
///
/// Every full 255-byte chunk is written as soon as it is complete; the final
/// partial chunk and the zero-length terminator are written by
/// [finish](#method.finish).
pub struct SubBlockWriter<'a, W: Write> {
    writer: &'a mut W,
    buf: Vec<u8>,
}

impl<'a, W: Write> SubBlockWriter<'a, W> {
    /// Create a new sub-block writer
    pub fn new(writer: &'a mut W) -> Self {
        let buf = Vec::with_capacity(MAX_SUB_BLOCK);
        SubBlockWriter { writer, buf }
    }

    /// Write any buffered bytes as one sub-block
    pub fn write_chunk(&mut self) -> io::Result<()> {
        let len = self.buf.len();
        if len > 0 {
            self.writer.write_all(&[len as u8])?;
            self.writer.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    /// Write the last partial chunk and the block terminator
    pub fn finish(mut self) -> io::Result<()> {
        self.write_chunk()?;
        self.writer.write_all(&[0])
    }
}

impl<W: Write> Write for SubBlockWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = MAX_SUB_BLOCK - self.buf.len();
        let consumed = remaining.min(buf.len());
        self.buf.extend_from_slice(&buf[..consumed]);
        if self.buf.len() == MAX_SUB_BLOCK {
            self.write_chunk()?;
        }
        Ok(consumed)
    }

    /// Flushing only passes through; chunk boundaries are not forced
    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write a complete payload as sub-blocks, followed by the terminator
pub fn write_sub_blocks<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    let mut bw = SubBlockWriter::new(w);
    bw.write_all(bytes)?;
    bw.finish()
}

/// Read exactly enough bytes to fill a buffer
pub(crate) fn read_bytes<R: Read>(
    r: &mut R,
    buf: &mut [u8],
) -> Result<(), DecodeError> {
    let mut len = 0;
    while len < buf.len() {
        match r.read(&mut buf[len..]) {
            Ok(0) => return Err(DecodeError::EofTooSoon),
            Ok(n) => len += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Read one byte, or `None` at end of input
pub(crate) fn read_byte<R: Read>(r: &mut R) -> Result<Option<u8>, DecodeError> {
    let mut buf = [0; 1];
    loop {
        match r.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read one sub-block.
///
/// Returns `None` for the zero-length terminator.
pub fn read_sub_block<R: Read>(
    r: &mut R,
) -> Result<Option<Vec<u8>>, DecodeError> {
    let sz = read_byte(r)?.ok_or(DecodeError::EofTooSoon)? as usize;
    if sz == 0 {
        return Ok(None);
    }
    let mut buf = vec![0; sz];
    read_bytes(r, &mut buf)?;
    Ok(Some(buf))
}

/// Lazy iterator over the sub-blocks of one packetized payload.
///
/// Iteration ends after the zero-length terminator, or after the first
/// error.
pub struct SubBlocks<'a, R: Read> {
    reader: &'a mut R,
    done: bool,
}

impl<'a, R: Read> SubBlocks<'a, R> {
    /// Create a sub-block iterator
    pub fn new(reader: &'a mut R) -> Self {
        SubBlocks {
            reader,
            done: false,
        }
    }

    /// Consume remaining sub-blocks, concatenating their payloads
    pub fn concat(self) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = vec![];
        for chunk in self {
            bytes.extend_from_slice(&chunk?);
        }
        Ok(bytes)
    }
}

impl<R: Read> Iterator for SubBlocks<'_, R> {
    type Item = Result<Vec<u8>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_sub_block(self.reader) {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
