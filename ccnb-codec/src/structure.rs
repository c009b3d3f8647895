//! Incremental structure decoder: finds the end of one Binary-XML element
//! across arbitrarily chunked input without interpreting its contents.

use crate::decoder::Decoder;
use crate::tags::{self, TypeTag};
use crate::Error;

/// Scratch space for a header that straddles a chunk boundary. Ten bytes
/// hold any header whose value fits 64 bits.
const HEADER_BUFFER_LENGTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// At an element boundary; the next byte is CLOSE or starts a header.
    ReadHeaderOrClose,
    /// Skipping a known-length payload.
    ReadBytes,
}

/// A byte-granular state machine that scans for the CLOSE octet matching
/// the first header of the input. State persists across calls, so the
/// input may arrive in any number of chunks; each byte is examined once.
#[derive(Debug)]
pub struct StructureDecoder {
    got_element_end: bool,
    offset: usize,
    level: i64,
    state: State,
    header_length: usize,
    use_header_buffer: bool,
    header_buffer: [u8; HEADER_BUFFER_LENGTH],
    n_bytes_to_read: usize,
}

impl Default for StructureDecoder {
    fn default() -> Self {
        StructureDecoder {
            got_element_end: false,
            offset: 0,
            level: 0,
            state: State::ReadHeaderOrClose,
            header_length: 0,
            use_header_buffer: false,
            header_buffer: [0; HEADER_BUFFER_LENGTH],
            n_bytes_to_read: 0,
        }
    }
}

impl StructureDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and get ready for a new element.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Offset into the current input chunk of the next byte to examine.
    /// Once the end is found this is one past the element's final CLOSE.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Move the read position within the current chunk; used by callers
    /// that feed successive chunks starting at offset zero.
    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn element_end(&self) -> bool {
        self.got_element_end
    }

    fn start_header(&mut self) {
        self.header_length = 0;
        self.use_header_buffer = false;
        self.state = State::ReadHeaderOrClose;
    }

    /// Continue scanning `input` from the current offset. Returns `true`
    /// once the end of the first element has been seen; `false` means the
    /// input ran out and more is needed, with all state preserved.
    pub fn find_element_end(&mut self, input: &[u8]) -> Result<bool, Error> {
        if self.got_element_end {
            return Ok(true);
        }

        loop {
            if self.offset >= input.len() {
                // Every case below needs at least one byte. Wait for more.
                return Ok(false);
            }

            match self.state {
                State::ReadHeaderOrClose => {
                    // First check for CLOSE.
                    if self.header_length == 0 && input[self.offset] == tags::CLOSE {
                        self.offset += 1;
                        self.level -= 1;
                        if self.level == 0 {
                            self.got_element_end = true;
                            return Ok(true);
                        }
                        if self.level < 0 {
                            return Err(Error::UnexpectedCloseTag);
                        }

                        self.start_header();
                        continue;
                    }

                    let starting_header_length = self.header_length;
                    let header_complete = loop {
                        if self.offset >= input.len() {
                            break false;
                        }
                        let header_byte = input[self.offset];
                        self.offset += 1;
                        self.header_length += 1;
                        if header_byte & tags::TT_FINAL != 0 {
                            break true;
                        }
                    };

                    if !header_complete {
                        // The rest of the header is in a later chunk; stash
                        // what we have.
                        self.buffer_header_bytes(input, starting_header_length)?;
                        return Ok(false);
                    }

                    let (tt, value) = if self.use_header_buffer {
                        self.buffer_header_bytes(input, starting_header_length)?;
                        let mut decoder = Decoder::new(&self.header_buffer[..self.header_length]);
                        decoder.decode_type_and_value()?
                    } else {
                        let mut decoder = Decoder::new(input);
                        decoder.seek(self.offset - self.header_length);
                        decoder.decode_type_and_value()?
                    };

                    match tt {
                        // A DATTR carries its value in the header itself;
                        // scanning has nothing more to consume.
                        TypeTag::Dattr => self.start_header(),
                        TypeTag::Dtag | TypeTag::Ext => {
                            self.level += 1;
                            self.start_header();
                        }
                        TypeTag::Tag => {
                            self.level += 1;
                            // Minimum tag name length is 1.
                            self.n_bytes_to_read = value as usize + 1;
                            self.state = State::ReadBytes;
                        }
                        TypeTag::Attr => {
                            self.n_bytes_to_read = value as usize + 1;
                            self.state = State::ReadBytes;
                        }
                        TypeTag::Blob | TypeTag::UData => {
                            self.n_bytes_to_read = value as usize;
                            self.state = State::ReadBytes;
                        }
                    }
                }
                State::ReadBytes => {
                    let n_remaining_bytes = input.len() - self.offset;
                    if n_remaining_bytes < self.n_bytes_to_read {
                        // Need more.
                        self.offset += n_remaining_bytes;
                        self.n_bytes_to_read -= n_remaining_bytes;
                        return Ok(false);
                    }

                    self.offset += self.n_bytes_to_read;
                    self.start_header();
                }
            }
        }
    }

    /// Copy the header bytes consumed from `input` in this call into the
    /// scratch buffer, appending after any bytes from earlier chunks.
    fn buffer_header_bytes(
        &mut self,
        input: &[u8],
        starting_header_length: usize,
    ) -> Result<(), Error> {
        if self.header_length > HEADER_BUFFER_LENGTH {
            return Err(Error::HeaderBufferExhausted);
        }

        let n_new_bytes = self.header_length - starting_header_length;
        self.header_buffer[starting_header_length..self.header_length]
            .copy_from_slice(&input[self.offset - n_new_bytes..self.offset]);
        self.use_header_buffer = true;

        Ok(())
    }
}
