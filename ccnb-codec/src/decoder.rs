//! Inbound side of the Binary-XML codec.

use crate::tags::{self, TypeTag};
use crate::Error;

/// The most recently peeked DTAG header, memoised so that a peek followed
/// by a read at the same offset decodes the header only once.
#[derive(Debug, Clone, Copy)]
struct PeekedDTag {
    start_offset: usize,
    end_offset: usize,
    value: u64,
}

/// Stateful Binary-XML element reader over a borrowed input buffer.
///
/// Every returned byte slice borrows from the input; the caller must keep
/// the buffer alive and unmodified while decoded values are in use.
#[derive(Debug)]
pub struct Decoder<'b> {
    input: &'b [u8],
    offset: usize,
    peeked_dtag: Option<PeekedDTag>,
}

impl<'b> Decoder<'b> {
    pub fn new(input: &'b [u8]) -> Self {
        Decoder {
            input,
            offset: 0,
            peeked_dtag: None,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Decode one `(type, value)` header, advancing past it.
    pub fn decode_type_and_value(&mut self) -> Result<(TypeTag, u64), Error> {
        let mut value: u64 = 0;
        let mut got_first_octet = false;

        loop {
            if self.offset >= self.input.len() {
                return Err(Error::ReadPastEnd);
            }

            let octet = self.input[self.offset];
            self.offset += 1;

            if !got_first_octet {
                if octet == 0 {
                    return Err(Error::ZeroFirstHeaderOctet);
                }
                got_first_octet = true;
            }

            if octet & tags::TT_FINAL != 0 {
                let tt = TypeTag::from_code(octet & tags::TT_MASK)
                    .ok_or(Error::UnrecognizedHeaderType(octet & tags::TT_MASK))?;
                if value > u64::MAX >> tags::TT_VALUE_BITS {
                    return Err(Error::HeaderValueOverflow);
                }
                value = (value << tags::TT_VALUE_BITS)
                    | u64::from((octet >> tags::TT_BITS) & tags::TT_VALUE_MASK);
                return Ok((tt, value));
            }

            if value > u64::MAX >> tags::REGULAR_VALUE_BITS {
                return Err(Error::HeaderValueOverflow);
            }
            value = (value << tags::REGULAR_VALUE_BITS)
                | u64::from(octet & tags::REGULAR_VALUE_MASK);
        }
    }

    /// Consume the opening DTAG header of an element, requiring `expected`.
    pub fn read_element_start_dtag(&mut self, expected: u64) -> Result<(), Error> {
        if let Some(peeked) = self.peeked_dtag {
            if peeked.start_offset == self.offset {
                // A peek just decoded this header; reuse it.
                if peeked.value != expected {
                    return Err(Error::UnexpectedDTag {
                        expected,
                        found: peeked.value,
                    });
                }
                self.offset = peeked.end_offset;
                return Ok(());
            }
        }

        let (tt, value) = self.decode_type_and_value()?;
        if tt != TypeTag::Dtag {
            return Err(Error::NotADTag);
        }
        if value != expected {
            return Err(Error::UnexpectedDTag {
                expected,
                found: value,
            });
        }

        Ok(())
    }

    /// Consume the CLOSE octet terminating a compound element.
    pub fn read_element_close(&mut self) -> Result<(), Error> {
        if self.offset >= self.input.len() {
            return Err(Error::ReadPastEnd);
        }

        let octet = self.input[self.offset];
        self.offset += 1;
        if octet != tags::CLOSE {
            return Err(Error::MissingElementClose);
        }

        Ok(())
    }

    /// Report whether the next header is the expected DTAG, without
    /// advancing. The decoded header is memoised for the following read.
    pub fn peek_dtag(&mut self, expected: u64) -> Result<bool, Error> {
        // An element close cannot be the expected tag.
        if self.offset >= self.input.len() {
            return Err(Error::ReadPastEnd);
        }
        if self.input[self.offset] == tags::CLOSE {
            return Ok(false);
        }

        if let Some(peeked) = self.peeked_dtag {
            if peeked.start_offset == self.offset {
                return Ok(peeked.value == expected);
            }
        }

        let save_offset = self.offset;
        let result = self.decode_type_and_value();
        let end_offset = self.offset;
        self.offset = save_offset;

        let (tt, value) = result?;
        if tt != TypeTag::Dtag {
            return Ok(false);
        }

        self.peeked_dtag = Some(PeekedDTag {
            start_offset: save_offset,
            end_offset,
            value,
        });
        Ok(value == expected)
    }

    fn read_item_payload(&mut self, length: u64) -> Result<&'b [u8], Error> {
        let length = usize::try_from(length).map_err(|_| Error::ReadPastEnd)?;
        let end = self
            .offset
            .checked_add(length)
            .filter(|end| *end <= self.input.len())
            .ok_or(Error::ReadPastEnd)?;

        let value = &self.input[self.offset..end];
        self.offset = end;
        Ok(value)
    }

    /// Read a DTAG element wrapping a byte item. With `allow_null`, an
    /// immediately-following CLOSE is decoded as an empty value.
    pub fn read_binary_dtag_element(
        &mut self,
        expected: u64,
        allow_null: bool,
    ) -> Result<&'b [u8], Error> {
        self.read_element_start_dtag(expected)?;

        if allow_null {
            if self.offset >= self.input.len() {
                return Err(Error::ReadPastEnd);
            }
            if self.input[self.offset] == tags::CLOSE {
                // The item is missing and that is allowed; consume the
                // close and return the empty value.
                self.offset += 1;
                return Ok(&self.input[self.offset..self.offset]);
            }
        }

        // The item type is not checked: historic encoders disagree on BLOB
        // vs UDATA for some binary fields.
        let (_item_type, length) = self.decode_type_and_value()?;
        let value = self.read_item_payload(length)?;

        self.read_element_close()?;
        Ok(value)
    }

    pub fn read_optional_binary_dtag_element(
        &mut self,
        expected: u64,
        allow_null: bool,
    ) -> Result<Option<&'b [u8]>, Error> {
        if self.peek_dtag(expected)? {
            Ok(Some(self.read_binary_dtag_element(expected, allow_null)?))
        } else {
            Ok(None)
        }
    }

    pub fn read_udata_dtag_element(&mut self, expected: u64) -> Result<&'b [u8], Error> {
        self.read_element_start_dtag(expected)?;

        let (item_type, length) = self.decode_type_and_value()?;
        if item_type != TypeTag::UData {
            return Err(Error::NotUData);
        }
        let value = self.read_item_payload(length)?;

        self.read_element_close()?;
        Ok(value)
    }

    pub fn read_optional_udata_dtag_element(
        &mut self,
        expected: u64,
    ) -> Result<Option<&'b [u8]>, Error> {
        if self.peek_dtag(expected)? {
            Ok(Some(self.read_udata_dtag_element(expected)?))
        } else {
            Ok(None)
        }
    }

    /// Read a UDATA element holding an ASCII decimal integer.
    pub fn read_unsigned_integer_dtag_element(&mut self, expected: u64) -> Result<u64, Error> {
        let value = self.read_udata_dtag_element(expected)?;
        parse_unsigned_decimal_int(value)
    }

    pub fn read_optional_unsigned_integer_dtag_element(
        &mut self,
        expected: u64,
    ) -> Result<Option<u64>, Error> {
        if self.peek_dtag(expected)? {
            Ok(Some(self.read_unsigned_integer_dtag_element(expected)?))
        } else {
            Ok(None)
        }
    }

    /// Read a time element: big-endian ticks at 4096 Hz to milliseconds.
    pub fn read_time_milliseconds_dtag_element(&mut self, expected: u64) -> Result<f64, Error> {
        let bytes = self.read_binary_dtag_element(expected, false)?;
        Ok(1000.0 * unsigned_big_endian_to_double(bytes) / 4096.0)
    }

    pub fn read_optional_time_milliseconds_dtag_element(
        &mut self,
        expected: u64,
    ) -> Result<Option<f64>, Error> {
        if self.peek_dtag(expected)? {
            Ok(Some(self.read_time_milliseconds_dtag_element(expected)?))
        } else {
            Ok(None)
        }
    }
}

/// Parse an ASCII decimal integer, with no tolerance for sign, whitespace
/// or non-digits. An empty value parses as zero.
fn parse_unsigned_decimal_int(value: &[u8]) -> Result<u64, Error> {
    let mut result: u64 = 0;

    for digit in value {
        if !digit.is_ascii_digit() {
            return Err(Error::NotADecimalDigit);
        }
        result = result
            .checked_mul(10)
            .and_then(|r| r.checked_add(u64::from(digit - b'0')))
            .ok_or(Error::message("unsigned decimal integer is too large"))?;
    }

    Ok(result)
}

/// Interpret the bytes as a big-endian unsigned integer, accumulated as a
/// double so oversized historic timestamps degrade instead of failing.
pub fn unsigned_big_endian_to_double(bytes: &[u8]) -> f64 {
    let mut result = 0.0;
    for byte in bytes {
        result *= 256.0;
        result += f64::from(*byte);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::dtag;
    use crate::Encoder;
    use test_case::test_case;

    // Quantified round-trip: boundary values for 1..5 header bytes and the
    // 32-bit limit, across every valid type.
    #[test_case(0)]
    #[test_case(1)]
    #[test_case(14)]
    #[test_case(15)]
    #[test_case(16)]
    #[test_case(2047)]
    #[test_case(2048)]
    #[test_case(262143)]
    #[test_case(262144)]
    #[test_case(33554431)]
    #[test_case(4294967295)]
    fn header_roundtrip(value: u64) {
        for tt in [
            TypeTag::Ext,
            TypeTag::Tag,
            TypeTag::Dtag,
            TypeTag::Attr,
            TypeTag::Dattr,
            TypeTag::Blob,
            TypeTag::UData,
        ] {
            let mut e = Encoder::new();
            e.write_type_and_value(tt, value).unwrap();
            let encoded = e.into_vec();

            let mut d = Decoder::new(&encoded);
            let (decoded_tt, decoded_value) = d.decode_type_and_value().unwrap();
            assert_eq!(decoded_tt, tt);
            assert_eq!(decoded_value, value);
            assert_eq!(d.offset(), encoded.len(), "consumed exactly what was produced");
        }
    }

    #[test]
    fn zero_first_octet_is_rejected() {
        let mut d = Decoder::new(&[0x00]);
        assert_eq!(d.decode_type_and_value(), Err(Error::ZeroFirstHeaderOctet));
    }

    #[test]
    fn truncated_header_is_rejected() {
        // First octet of a two-byte header, missing its terminal octet.
        let mut d = Decoder::new(&[0x01]);
        assert_eq!(d.decode_type_and_value(), Err(Error::ReadPastEnd));
    }

    #[test]
    fn peek_is_idempotent_and_read_consumes_once() {
        let mut e = Encoder::new();
        e.write_blob_dtag_element(dtag::NONCE, &[0xab]).unwrap();
        let encoded = e.into_vec();

        let mut d = Decoder::new(&encoded);
        assert!(d.peek_dtag(dtag::NONCE).unwrap());
        let offset_after_first_peek = d.offset();
        assert!(d.peek_dtag(dtag::NONCE).unwrap());
        assert_eq!(d.offset(), offset_after_first_peek);
        assert!(!d.peek_dtag(dtag::SCOPE).unwrap());
        assert_eq!(d.offset(), 0);

        let value = d.read_binary_dtag_element(dtag::NONCE, false).unwrap();
        assert_eq!(value, &[0xab]);
        assert_eq!(d.offset(), encoded.len());
    }

    #[test]
    fn peek_sees_close_as_no_match() {
        let mut d = Decoder::new(&[0x00]);
        assert!(!d.peek_dtag(dtag::COMPONENT).unwrap());
    }

    #[test]
    fn decimal_integer_rejects_non_digits() {
        let mut e = Encoder::new();
        e.write_udata_dtag_element(dtag::SCOPE, b"1a").unwrap();
        let encoded = e.into_vec();

        let mut d = Decoder::new(&encoded);
        assert_eq!(
            d.read_unsigned_integer_dtag_element(dtag::SCOPE),
            Err(Error::NotADecimalDigit)
        );
    }

    #[test]
    fn allow_null_reads_missing_item_as_empty() {
        // DTag Content wrapping nothing at all: header then CLOSE.
        let mut e = Encoder::new();
        e.write_element_start_dtag(dtag::CONTENT).unwrap();
        e.write_element_close().unwrap();
        let encoded = e.into_vec();

        let mut d = Decoder::new(&encoded);
        let value = d.read_binary_dtag_element(dtag::CONTENT, true).unwrap();
        assert!(value.is_empty());
        assert_eq!(d.offset(), encoded.len());

        let mut d = Decoder::new(&encoded);
        assert!(d.read_binary_dtag_element(dtag::CONTENT, false).is_err());
    }

    #[test]
    fn time_roundtrip_is_within_one_tick() {
        let milliseconds = 1_300_000_000_000.0;

        let mut e = Encoder::new();
        e.write_time_milliseconds_dtag_element(dtag::TIMESTAMP, milliseconds)
            .unwrap();
        let encoded = e.into_vec();

        let mut d = Decoder::new(&encoded);
        let decoded = d
            .read_time_milliseconds_dtag_element(dtag::TIMESTAMP)
            .unwrap();
        assert!((decoded - milliseconds).abs() <= 1000.0 / 4096.0);
    }

    #[test]
    fn truncated_item_payload_is_rejected() {
        // BLOB claims 4 bytes but only 2 follow.
        let mut d = Decoder::new(&[0xf2, 0xa5, 0x61, 0x62]);
        d.read_element_start_dtag(dtag::NAME).unwrap();
        let (tt, length) = d.decode_type_and_value().unwrap();
        assert_eq!(tt, TypeTag::Blob);
        assert_eq!(length, 4);
        assert_eq!(d.read_item_payload(length), Err(Error::ReadPastEnd));
    }
}
