// lzw.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use crate::error::DecodeError;
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> usize {
        1 << self.0
    }

    /// Get the bit mask
    fn mask(self) -> u32 {
        (1 << (self.0 as u32)) - 1
    }
}

/// Code type
type Code = u16;

/// Node for code dictionary
trait Node {
    /// Create a new node
    fn new(next: Option<Code>, byte: u8) -> Self;

    /// Get the byte value
    fn byte(&self) -> u8;
}

/// Node for Compressor.
///
/// `next` links to the first child; siblings form a binary search tree on
/// the byte value through `left` / `right`.
#[derive(Clone, Copy, Debug)]
struct CNode {
    /// Next node code
    next: Option<Code>,
    /// Left node code
    left: Option<Code>,
    /// Right node code
    right: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Node for Decompressor
#[derive(Clone, Copy, Debug)]
struct DNode {
    /// Prefix node code
    prefix: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Code dictionary trie
#[derive(Debug)]
struct Trie<N: Node> {
    /// Table of codes
    table: Vec<N>,
    /// Minimum code bits
    code_size: u8,
}

/// LZW Data Compressor
pub struct Compressor {
    /// Code dictionary
    trie: Trie<CNode>,
    /// Current code bits
    code_bits: Bits,
    /// Currently matched prefix code
    prefix: Option<Code>,
    /// Clear code emitted
    started: bool,
    /// Pending bits
    code: u32,
    /// Number of pending bits
    n_bits: u8,
}

/// LZW Data Decompressor
#[derive(Debug)]
pub struct Decompressor {
    /// Code dictionary
    trie: Trie<DNode>,
    /// Current code bits
    code_bits: Bits,
    /// Last code
    last: Option<Code>,
    /// End code received
    done: bool,
    /// Pending bits
    code: u32,
    /// Number of pending bits
    n_bits: u8,
}

impl Node for CNode {
    fn new(next: Option<Code>, byte: u8) -> Self {
        CNode {
            next,
            left: None,
            right: None,
            byte,
        }
    }

    fn byte(&self) -> u8 {
        self.byte
    }
}

impl Node for DNode {
    fn new(prefix: Option<Code>, byte: u8) -> Self {
        DNode { prefix, byte }
    }

    fn byte(&self) -> u8 {
        self.byte
    }
}

impl CNode {
    /// Get a link code
    fn link(&self, ordering: Ordering) -> Option<Code> {
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.next,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: Ordering, code: Code) {
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.next = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

impl<N: Node> Trie<N> {
    /// Create a new code dictionary
    fn new(code_size: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries() + 1),
            code_size,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.code_size
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> usize {
        self.table.len()
    }

    /// Check if every 12-bit code is assigned
    fn is_full(&self) -> bool {
        self.next_code() >= Bits::MAX.entries()
    }

    /// Reset the dictionary to literal codes only
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.push_node(None, byte as u8);
        }
        self.push_node(None, 0); // clear code
        self.push_node(None, 0); // end code
    }

    /// Push a node into the dictionary
    fn push_node(&mut self, next: Option<Code>, byte: u8) {
        self.table.push(N::new(next, byte))
    }
}

impl Trie<CNode> {
    /// Find the code for a prefix followed by a byte.
    ///
    /// On a miss, the new string is inserted as the next code and `None`
    /// is returned.
    fn find_or_insert(&mut self, code: Code, byte: u8) -> Option<Code> {
        let next_code = self.next_code() as Code;
        let mut node = &mut self.table[code as usize];
        let mut ordering = Ordering::Equal;
        while let Some(code) = node.link(ordering) {
            node = &mut self.table[code as usize];
            ordering = byte.cmp(&node.byte());
            if ordering == Ordering::Equal {
                return Some(code);
            }
        }
        node.set_link(ordering, next_code);
        self.push_node(None, byte);
        None
    }
}

impl Compressor {
    /// Create a new compressor
    pub fn new(code_size: u8) -> Self {
        Compressor {
            trie: Trie::new(code_size),
            code_bits: Bits::from(code_size + 1),
            prefix: None,
            started: false,
            code: 0,
            n_bits: 0,
        }
    }

    /// Reset dictionary and code bits after a clear code
    fn reset(&mut self) {
        self.trie.reset();
        self.code_bits = Bits::from(self.trie.code_size + 1);
    }

    /// Pack a code into a buffer
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= (code as u32) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Compress a byte buffer.
    ///
    /// May be called repeatedly; the matched prefix carries over between
    /// calls.
    pub fn compress(&mut self, bytes: &[u8], buffer: &mut Vec<u8>) {
        if !self.started {
            self.pack(self.trie.clear_code(), buffer);
            self.started = true;
        }
        for &byte in bytes {
            let prefix = match self.prefix {
                Some(prefix) => prefix,
                None => {
                    self.prefix = Some(byte as Code);
                    continue;
                }
            };
            if let Some(code) = self.trie.find_or_insert(prefix, byte) {
                self.prefix = Some(code);
                continue;
            }
            self.pack(prefix, buffer);
            self.prefix = Some(byte as Code);
            let next_code = self.trie.next_code();
            if next_code > self.code_bits.entries() {
                if next_code > Bits::MAX.entries() {
                    self.pack(self.trie.clear_code(), buffer);
                    self.reset();
                } else {
                    self.code_bits += 1;
                }
            }
        }
    }

    /// Finish compression: last prefix, end code and partial byte
    pub fn finish(&mut self, buffer: &mut Vec<u8>) {
        if !self.started {
            self.pack(self.trie.clear_code(), buffer);
            self.started = true;
        }
        if let Some(prefix) = self.prefix.take() {
            self.pack(prefix, buffer);
            // the decoder adds one more entry before reading the end code
            if self.trie.next_code() >= self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        self.pack(self.trie.end_code(), buffer);
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
            self.code = 0;
            self.n_bits = 0;
        }
    }
}

impl Trie<DNode> {
    /// Lookup the first byte of a code's string
    fn first_byte(&self, code: Code) -> u8 {
        let mut node = self.table[code as usize];
        while let Some(code) = node.prefix {
            node = self.table[code as usize];
        }
        node.byte()
    }

    /// Decompress a code into a buffer (reversed)
    fn decompress_reversed(&self, code: Code, buffer: &mut Vec<u8>) {
        let mut node = self.table[code as usize];
        while let Some(code) = node.prefix {
            buffer.push(node.byte());
            node = self.table[code as usize];
        }
        buffer.push(node.byte());
    }
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(code_size: u8) -> Self {
        Decompressor {
            trie: Trie::new(code_size),
            code_bits: Bits::from(code_size + 1),
            last: None,
            done: false,
            code: 0,
            n_bits: 0,
        }
    }

    /// Check if the end code has been received
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decompress a byte buffer.
    ///
    /// Bytes following the end code are ignored.
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), DecodeError> {
        for &byte in bytes {
            if self.done {
                break;
            }
            self.code |= (byte as u32) << self.n_bits;
            self.n_bits += 8;
            while !self.done && self.n_bits >= u8::from(self.code_bits) {
                let code = (self.code & self.code_bits.mask()) as Code;
                self.code >>= u8::from(self.code_bits);
                self.n_bits -= u8::from(self.code_bits);
                self.decompress_code(code, buffer)?;
            }
        }
        Ok(())
    }

    /// Decompress one code
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<(), DecodeError> {
        if code == self.trie.clear_code() {
            self.trie.reset();
            self.code_bits = Bits::from(self.trie.code_size + 1);
            self.last = None;
        } else if code == self.trie.end_code() {
            self.done = true;
        } else {
            let start = buffer.len();
            self.decompress_reversed(code, buffer)?;
            buffer[start..].reverse();
            self.last = Some(code);
        }
        Ok(())
    }

    /// Decompress one code (reversed)
    fn decompress_reversed(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<(), DecodeError> {
        let next_code = self.trie.next_code();
        let last = match self.last {
            Some(last) => last,
            None if code < self.trie.clear_code() => {
                buffer.push(code as u8);
                return Ok(());
            }
            None => return Err(DecodeError::ImageDefect),
        };
        match (code as usize).cmp(&next_code) {
            Ordering::Less => {
                self.trie.decompress_reversed(code, buffer);
                if !self.trie.is_full() {
                    let byte = buffer[buffer.len() - 1];
                    self.trie.push_node(Some(last), byte);
                }
            }
            // deferred entry: code is the one about to be assigned
            Ordering::Equal if !self.trie.is_full() => {
                let byte = self.trie.first_byte(last);
                self.trie.push_node(Some(last), byte);
                self.trie.decompress_reversed(code, buffer);
            }
            _ => return Err(DecodeError::ImageDefect),
        }
        if self.trie.next_code() >= self.code_bits.entries() {
            self.code_bits += 1;
        }
        Ok(())
    }
}
