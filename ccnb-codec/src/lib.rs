//! Binary-XML (ccnb) tag-length-value codec.
//!
//! The wire format is a self-describing TLV stream: every element opens
//! with a variable-length header carrying a 3-bit type and an unbounded
//! value, compound elements are terminated by a single zero CLOSE octet,
//! and payloads are carried as BLOB or UDATA items. This crate holds the
//! byte-level layers: the growable output buffer, the header codec, the
//! primitive element encoder/decoder, the incremental structure decoder
//! that finds element boundaries in arbitrarily chunked input, and the
//! element reader that reassembles fragmented elements for a listener.

use thiserror::Error;

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod structure;
pub mod tags;

/// Round-trip friendly byte-string helpers
pub mod utils;

pub use buffer::DynamicBuffer;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use reader::{ElementListener, ElementReader};
pub use structure::StructureDecoder;
pub use tags::TypeTag;
pub use utils::Blob;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("read past the end of the input")]
    ReadPastEnd,

    #[error("the first header octet may not be zero")]
    ZeroFirstHeaderOctet,

    #[error("unrecognized header type {0}")]
    UnrecognizedHeaderType(u8),

    #[error("header value overflows a 64-bit integer")]
    HeaderValueOverflow,

    #[error("header type is not a DTAG")]
    NotADTag,

    #[error("did not get the expected DTAG {expected}, found {found}")]
    UnexpectedDTag { expected: u64, found: u64 },

    #[error("did not get the expected element close")]
    MissingElementClose,

    #[error("item is not UDATA")]
    NotUData,

    #[error("element of value is not a decimal digit")]
    NotADecimalDigit,

    #[error("unexpected close tag")]
    UnexpectedCloseTag,

    #[error("cannot store more header bytes than the size of the header buffer")]
    HeaderBufferExhausted,

    #[error("miscalculated the number of header encoding bytes")]
    MiscalculatedHeaderBytes,

    #[error("{0}")]
    Message(&'static str),
}

impl Error {
    /// Build a schema-level error with a custom message. Message codecs in
    /// upper layers use this for failures the byte layer has no name for.
    pub fn message(msg: &'static str) -> Self {
        Error::Message(msg)
    }
}

pub trait Encode {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error>;
}

pub trait Decode<'b>: Sized {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error>;
}

pub trait Fragment<'b>: Encode + Decode<'b> {}

impl<'b, T> Fragment<'b> for T where T: Encode + Decode<'b> {}

/// Encode a value as a self-contained Binary-XML element.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: Encode,
{
    let mut e = Encoder::new();
    value.encode(&mut e)?;
    Ok(e.into_vec())
}

/// Decode one value from the start of the input, borrowing from it.
pub fn decode<'b, T>(input: &'b [u8]) -> Result<T, Error>
where
    T: Decode<'b>,
{
    let mut d = Decoder::new(input);
    T::decode(&mut d)
}
