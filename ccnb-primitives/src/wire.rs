//! One-shot packet encode/decode behind a wire-format seam.
//!
//! Higher layers hold a wire format value and never touch the encoder or
//! decoder directly, so an alternative format can slot in by implementing
//! the same surface. The codec is an explicit value everywhere; there is
//! no process-wide default.

use ccnb_codec::{Decoder, Encoder, Error};

use crate::data::{Data, SignedPortion};
use crate::forwarding::ForwardingEntry;
use crate::interest::Interest;

pub trait WireFormat {
    fn encode_interest(&self, interest: &Interest) -> Result<Vec<u8>, Error>;

    fn decode_interest<'b>(&self, input: &'b [u8]) -> Result<Interest<'b>, Error>;

    /// Encode a Data packet, also reporting the byte range a signer must
    /// cover.
    fn encode_data(&self, data: &Data) -> Result<(Vec<u8>, SignedPortion), Error>;

    /// Decode a Data packet, also reporting the byte range its signature
    /// covers within `input`.
    fn decode_data<'b>(&self, input: &'b [u8]) -> Result<(Data<'b>, SignedPortion), Error>;

    fn encode_forwarding_entry(&self, entry: &ForwardingEntry) -> Result<Vec<u8>, Error>;

    fn decode_forwarding_entry<'b>(&self, input: &'b [u8])
        -> Result<ForwardingEntry<'b>, Error>;
}

/// The Binary-XML wire format.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryXmlWireFormat;

impl WireFormat for BinaryXmlWireFormat {
    fn encode_interest(&self, interest: &Interest) -> Result<Vec<u8>, Error> {
        ccnb_codec::to_vec(interest)
    }

    fn decode_interest<'b>(&self, input: &'b [u8]) -> Result<Interest<'b>, Error> {
        ccnb_codec::decode(input)
    }

    fn encode_data(&self, data: &Data) -> Result<(Vec<u8>, SignedPortion), Error> {
        let mut e = Encoder::new();
        let signed_portion = data.encode_signed(&mut e)?;
        Ok((e.into_vec(), signed_portion))
    }

    fn decode_data<'b>(&self, input: &'b [u8]) -> Result<(Data<'b>, SignedPortion), Error> {
        Data::decode_signed(&mut Decoder::new(input))
    }

    fn encode_forwarding_entry(&self, entry: &ForwardingEntry) -> Result<Vec<u8>, Error> {
        ccnb_codec::to_vec(entry)
    }

    fn decode_forwarding_entry<'b>(
        &self,
        input: &'b [u8],
    ) -> Result<ForwardingEntry<'b>, Error> {
        ccnb_codec::decode(input)
    }
}
