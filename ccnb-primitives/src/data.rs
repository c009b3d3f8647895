//! Data packets: named, signed content objects, with the SignedInfo
//! metadata and key-locator structures that travel with them.

use ccnb_codec::tags::dtag;
use ccnb_codec::{Blob, Decode, Decoder, Encode, Encoder, Error};
use serde::{Deserialize, Serialize};

use crate::name::Name;

/// Payload type of a Data packet. `Data` is the wire default and is
/// encoded by omitting the Type element; the other types are fixed 3-byte
/// sentinels.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Data,
    Encr,
    Gone,
    Key,
    Link,
    Nack,
}

impl ContentType {
    /// The on-wire sentinel, or `None` for the implied default.
    fn wire_bytes(self) -> Option<&'static [u8; 3]> {
        match self {
            ContentType::Data => None,
            ContentType::Encr => Some(b"\x10\xd0\x91"),
            ContentType::Gone => Some(b"\x18\xe3\x44"),
            ContentType::Key => Some(b"\x28\x46\x3f"),
            ContentType::Link => Some(b"\x2c\x83\x4a"),
            ContentType::Nack => Some(b"\x34\x00\x8a"),
        }
    }

    /// All the recognized sentinels are exactly 3 bytes; anything else is
    /// malformed. Some historic encoders spell out DATA instead of
    /// omitting it, so its sentinel is accepted too.
    fn from_wire_bytes(bytes: &[u8]) -> Result<ContentType, Error> {
        match bytes {
            b"\x0c\x04\xc0" => Ok(ContentType::Data),
            b"\x10\xd0\x91" => Ok(ContentType::Encr),
            b"\x18\xe3\x44" => Ok(ContentType::Gone),
            b"\x28\x46\x3f" => Ok(ContentType::Key),
            b"\x2c\x83\x4a" => Ok(ContentType::Link),
            b"\x34\x00\x8a" => Ok(ContentType::Nack),
            _ => Err(Error::message("unrecognized content type")),
        }
    }
}

/// Which digest a KeyName carries to pin down the key it names.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNameKind {
    PublisherPublicKeyDigest,
    PublisherCertificateDigest,
    PublisherIssuerKeyDigest,
    PublisherIssuerCertificateDigest,
}

impl KeyNameKind {
    fn dtag(self) -> u64 {
        match self {
            KeyNameKind::PublisherPublicKeyDigest => dtag::PUBLISHER_PUBLIC_KEY_DIGEST,
            KeyNameKind::PublisherCertificateDigest => dtag::PUBLISHER_CERTIFICATE_DIGEST,
            KeyNameKind::PublisherIssuerKeyDigest => dtag::PUBLISHER_ISSUER_KEY_DIGEST,
            KeyNameKind::PublisherIssuerCertificateDigest => {
                dtag::PUBLISHER_ISSUER_CERTIFICATE_DIGEST
            }
        }
    }

    const ALL: [KeyNameKind; 4] = [
        KeyNameKind::PublisherPublicKeyDigest,
        KeyNameKind::PublisherCertificateDigest,
        KeyNameKind::PublisherIssuerKeyDigest,
        KeyNameKind::PublisherIssuerCertificateDigest,
    ];
}

/// Where to find the key that verifies a signature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum KeyLocator<'b> {
    /// The key itself, inline.
    Key(Blob<'b>),
    /// A certificate holding the key, inline.
    Certificate(Blob<'b>),
    /// The name the key lives under, plus a digest pinning it down.
    KeyName {
        name: Name<'b>,
        kind: KeyNameKind,
        digest: Blob<'b>,
    },
}

impl<'b> KeyLocator<'b> {
    pub fn into_owned(self) -> KeyLocator<'static> {
        match self {
            KeyLocator::Key(b) => KeyLocator::Key(b.into_owned()),
            KeyLocator::Certificate(b) => KeyLocator::Certificate(b.into_owned()),
            KeyLocator::KeyName { name, kind, digest } => KeyLocator::KeyName {
                name: name.into_owned(),
                kind,
                digest: digest.into_owned(),
            },
        }
    }
}

impl Encode for KeyLocator<'_> {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error> {
        e.write_element_start_dtag(dtag::KEY_LOCATOR)?;

        match self {
            KeyLocator::Key(value) => {
                e.write_blob_dtag_element(dtag::KEY, value)?;
            }
            KeyLocator::Certificate(value) => {
                e.write_blob_dtag_element(dtag::CERTIFICATE, value)?;
            }
            KeyLocator::KeyName { name, kind, digest } => {
                e.write_element_start_dtag(dtag::KEY_NAME)?;
                name.encode(e)?;
                e.write_blob_dtag_element(kind.dtag(), digest)?;
                e.write_element_close()?;
            }
        }

        e.write_element_close()
    }
}

impl<'b> Decode<'b> for KeyLocator<'b> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error> {
        d.read_element_start_dtag(dtag::KEY_LOCATOR)?;

        let locator = if d.peek_dtag(dtag::KEY)? {
            let value = d.read_binary_dtag_element(dtag::KEY, false)?;
            KeyLocator::Key(Blob::new(value))
        } else if d.peek_dtag(dtag::CERTIFICATE)? {
            let value = d.read_binary_dtag_element(dtag::CERTIFICATE, false)?;
            KeyLocator::Certificate(Blob::new(value))
        } else if d.peek_dtag(dtag::KEY_NAME)? {
            d.read_element_start_dtag(dtag::KEY_NAME)?;
            let name = Name::decode(d)?;
            let locator = decode_key_name_digest(name, d)?;
            d.read_element_close()?;
            locator
        } else {
            return Err(Error::message("unrecognized key locator type"));
        };

        d.read_element_close()?;
        Ok(locator)
    }
}

/// Exactly one of the four digest elements distinguishes the key-name
/// kind.
fn decode_key_name_digest<'b>(
    name: Name<'b>,
    d: &mut Decoder<'b>,
) -> Result<KeyLocator<'b>, Error> {
    for kind in KeyNameKind::ALL {
        if d.peek_dtag(kind.dtag())? {
            let digest = d.read_binary_dtag_element(kind.dtag(), false)?;
            return Ok(KeyLocator::KeyName {
                name,
                kind,
                digest: Blob::new(digest),
            });
        }
    }

    Err(Error::message("unrecognized key name type"))
}

/// The signature of a Data packet. An absent `digest_algorithm` means
/// SHA-256 with RSA. The publisher digest and key locator ride inside the
/// SignedInfo element on the wire but belong to the signature logically.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature<'b> {
    pub digest_algorithm: Option<Blob<'b>>,
    pub witness: Option<Blob<'b>>,
    pub signature_bits: Blob<'b>,
    pub publisher_public_key_digest: Option<Blob<'b>>,
    pub key_locator: Option<KeyLocator<'b>>,
}

impl<'b> Signature<'b> {
    pub fn into_owned(self) -> Signature<'static> {
        Signature {
            digest_algorithm: self.digest_algorithm.map(Blob::into_owned),
            witness: self.witness.map(Blob::into_owned),
            signature_bits: self.signature_bits.into_owned(),
            publisher_public_key_digest: self.publisher_public_key_digest.map(Blob::into_owned),
            key_locator: self.key_locator.map(KeyLocator::into_owned),
        }
    }
}

fn encode_signature(signature: &Signature, e: &mut Encoder) -> Result<(), Error> {
    e.write_element_start_dtag(dtag::SIGNATURE)?;

    e.write_optional_udata_dtag_element(
        dtag::DIGEST_ALGORITHM,
        signature.digest_algorithm.as_deref(),
    )?;
    e.write_optional_blob_dtag_element(dtag::WITNESS, signature.witness.as_deref())?;
    // The signature bits are required, even if empty.
    e.write_blob_dtag_element(dtag::SIGNATURE_BITS, &signature.signature_bits)?;

    e.write_element_close()
}

fn decode_signature<'b>(d: &mut Decoder<'b>) -> Result<Signature<'b>, Error> {
    d.read_element_start_dtag(dtag::SIGNATURE)?;

    let digest_algorithm = d
        .read_optional_udata_dtag_element(dtag::DIGEST_ALGORITHM)?
        .map(Blob::new);
    let witness = d
        .read_optional_binary_dtag_element(dtag::WITNESS, false)?
        .map(Blob::new);
    let signature_bits = Blob::new(d.read_binary_dtag_element(dtag::SIGNATURE_BITS, false)?);

    d.read_element_close()?;
    Ok(Signature {
        digest_algorithm,
        witness,
        signature_bits,
        publisher_public_key_digest: None,
        key_locator: None,
    })
}

/// Metadata carried in the SignedInfo element alongside the key fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MetaInfo<'b> {
    pub timestamp_milliseconds: Option<f64>,
    pub content_type: ContentType,
    pub freshness_seconds: Option<u64>,
    pub final_block_id: Option<Blob<'b>>,
}

impl<'b> MetaInfo<'b> {
    pub fn into_owned(self) -> MetaInfo<'static> {
        MetaInfo {
            timestamp_milliseconds: self.timestamp_milliseconds,
            content_type: self.content_type,
            freshness_seconds: self.freshness_seconds,
            final_block_id: self.final_block_id.map(Blob::into_owned),
        }
    }
}

fn encode_signed_info(
    signature: &Signature,
    meta_info: &MetaInfo,
    e: &mut Encoder,
) -> Result<(), Error> {
    e.write_element_start_dtag(dtag::SIGNED_INFO)?;

    e.write_optional_blob_dtag_element(
        dtag::PUBLISHER_PUBLIC_KEY_DIGEST,
        signature.publisher_public_key_digest.as_deref(),
    )?;
    e.write_optional_time_milliseconds_dtag_element(
        dtag::TIMESTAMP,
        meta_info.timestamp_milliseconds,
    )?;
    if let Some(type_bytes) = meta_info.content_type.wire_bytes() {
        e.write_blob_dtag_element(dtag::TYPE, type_bytes)?;
    }
    e.write_optional_unsigned_decimal_int_dtag_element(
        dtag::FRESHNESS_SECONDS,
        meta_info.freshness_seconds,
    )?;
    e.write_optional_blob_dtag_element(
        dtag::FINAL_BLOCK_ID,
        meta_info.final_block_id.as_deref(),
    )?;
    if let Some(key_locator) = &signature.key_locator {
        key_locator.encode(e)?;
    }

    e.write_element_close()
}

fn decode_signed_info<'b>(
    signature: &mut Signature<'b>,
    d: &mut Decoder<'b>,
) -> Result<MetaInfo<'b>, Error> {
    d.read_element_start_dtag(dtag::SIGNED_INFO)?;

    signature.publisher_public_key_digest = d
        .read_optional_binary_dtag_element(dtag::PUBLISHER_PUBLIC_KEY_DIGEST, false)?
        .map(Blob::new);
    let timestamp_milliseconds =
        d.read_optional_time_milliseconds_dtag_element(dtag::TIMESTAMP)?;
    let content_type = match d.read_optional_binary_dtag_element(dtag::TYPE, false)? {
        None => ContentType::Data,
        Some(bytes) => ContentType::from_wire_bytes(bytes)?,
    };
    let freshness_seconds =
        d.read_optional_unsigned_integer_dtag_element(dtag::FRESHNESS_SECONDS)?;
    let final_block_id = d
        .read_optional_binary_dtag_element(dtag::FINAL_BLOCK_ID, false)?
        .map(Blob::new);
    signature.key_locator = if d.peek_dtag(dtag::KEY_LOCATOR)? {
        Some(KeyLocator::decode(d)?)
    } else {
        None
    };

    d.read_element_close()?;
    Ok(MetaInfo {
        timestamp_milliseconds,
        content_type,
        freshness_seconds,
        final_block_id,
    })
}

/// Byte range of an encoded Data packet covered by the signature: from
/// the first byte of the Name element through the CLOSE of the Content
/// element.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedPortion {
    pub begin: usize,
    pub end: usize,
}

/// A named, signed content object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Data<'b> {
    pub signature: Signature<'b>,
    pub name: Name<'b>,
    pub meta_info: MetaInfo<'b>,
    pub content: Blob<'b>,
}

impl<'b> Data<'b> {
    pub fn new(name: Name<'b>, content: impl Into<Blob<'b>>) -> Self {
        Data {
            name,
            content: content.into(),
            ..Data::default()
        }
    }

    /// Encode, reporting the byte range a signer must cover.
    pub fn encode_signed(&self, e: &mut Encoder) -> Result<SignedPortion, Error> {
        e.write_element_start_dtag(dtag::CONTENT_OBJECT)?;

        encode_signature(&self.signature, e)?;
        let begin = e.offset();

        self.name.encode(e)?;
        encode_signed_info(&self.signature, &self.meta_info, e)?;
        e.write_blob_dtag_element(dtag::CONTENT, &self.content)?;
        let end = e.offset();

        e.write_element_close()?;
        Ok(SignedPortion { begin, end })
    }

    /// Decode, reporting the byte range the signature covers. A missing
    /// Signature or SignedInfo is tolerated and yields defaults; Content
    /// is required but may be empty.
    pub fn decode_signed(d: &mut Decoder<'b>) -> Result<(Data<'b>, SignedPortion), Error> {
        d.read_element_start_dtag(dtag::CONTENT_OBJECT)?;

        let mut signature = if d.peek_dtag(dtag::SIGNATURE)? {
            decode_signature(d)?
        } else {
            Signature::default()
        };
        let begin = d.offset();

        let name = Name::decode(d)?;
        let meta_info = if d.peek_dtag(dtag::SIGNED_INFO)? {
            decode_signed_info(&mut signature, d)?
        } else {
            MetaInfo::default()
        };
        let content = Blob::new(d.read_binary_dtag_element(dtag::CONTENT, true)?);
        let end = d.offset();

        d.read_element_close()?;
        Ok((
            Data {
                signature,
                name,
                meta_info,
                content,
            },
            SignedPortion { begin, end },
        ))
    }

    pub fn into_owned(self) -> Data<'static> {
        Data {
            signature: self.signature.into_owned(),
            name: self.name.into_owned(),
            meta_info: self.meta_info.into_owned(),
            content: self.content.into_owned(),
        }
    }
}

impl Encode for Data<'_> {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error> {
        self.encode_signed(e).map(|_| ())
    }
}

impl<'b> Decode<'b> for Data<'b> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error> {
        Data::decode_signed(d).map(|(data, _)| data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccnb_codec::Encoder;

    #[test]
    fn content_type_sentinels() {
        assert_eq!(
            ContentType::from_wire_bytes(b"\x28\x46\x3f").unwrap(),
            ContentType::Key
        );
        // Legacy explicit DATA sentinel.
        assert_eq!(
            ContentType::from_wire_bytes(b"\x0c\x04\xc0").unwrap(),
            ContentType::Data
        );
        assert!(ContentType::from_wire_bytes(b"\x00\x00\x00").is_err());
        assert!(ContentType::from_wire_bytes(b"\x28\x46").is_err());
    }

    #[test]
    fn non_default_content_type_roundtrips() {
        let mut data = Data::new(Name::from_uri("/k"), b"key-bytes".as_slice());
        data.meta_info.content_type = ContentType::Key;

        let mut e = Encoder::new();
        data.encode_signed(&mut e).unwrap();
        let encoded = e.into_vec();

        let (decoded, _) = Data::decode_signed(&mut Decoder::new(&encoded)).unwrap();
        assert_eq!(decoded.meta_info.content_type, ContentType::Key);
    }

    #[test]
    fn key_locator_variants_roundtrip() {
        for locator in [
            KeyLocator::Key(Blob::from(vec![1, 2, 3])),
            KeyLocator::Certificate(Blob::from(vec![4, 5])),
            KeyLocator::KeyName {
                name: Name::from_uri("/keys/alice"),
                kind: KeyNameKind::PublisherIssuerCertificateDigest,
                digest: Blob::from(vec![9; 32]),
            },
        ] {
            let encoded = ccnb_codec::to_vec(&locator).unwrap();
            let decoded: KeyLocator = ccnb_codec::decode(&encoded).unwrap();
            assert_eq!(decoded, locator);
        }
    }

    #[test]
    fn signed_info_carries_the_key_fields() {
        let mut data = Data::new(Name::from_uri("/d"), b"x".as_slice());
        data.signature.publisher_public_key_digest = Some(Blob::from(vec![7; 32]));
        data.signature.key_locator = Some(KeyLocator::Key(Blob::from(vec![1])));
        data.meta_info.freshness_seconds = Some(10);
        data.meta_info.final_block_id = Some(Blob::from(vec![0x00]));
        data.meta_info.timestamp_milliseconds = Some(1_300_000_000_000.0);

        let mut e = Encoder::new();
        data.encode_signed(&mut e).unwrap();
        let encoded = e.into_vec();

        let (decoded, _) = Data::decode_signed(&mut Decoder::new(&encoded)).unwrap();
        assert_eq!(
            decoded.signature.publisher_public_key_digest,
            data.signature.publisher_public_key_digest
        );
        assert_eq!(decoded.signature.key_locator, data.signature.key_locator);
        assert_eq!(decoded.meta_info.freshness_seconds, Some(10));
        assert_eq!(decoded.meta_info.final_block_id, data.meta_info.final_block_id);
        let timestamp = decoded.meta_info.timestamp_milliseconds.unwrap();
        assert!((timestamp - 1_300_000_000_000.0).abs() <= 1000.0 / 4096.0);
    }

    #[test]
    fn missing_signature_and_signed_info_yield_defaults() {
        // ContentObject holding only a Name and an empty Content.
        let mut e = Encoder::new();
        e.write_element_start_dtag(dtag::CONTENT_OBJECT).unwrap();
        Name::from_uri("/bare").encode(&mut e).unwrap();
        e.write_blob_dtag_element(dtag::CONTENT, &[]).unwrap();
        e.write_element_close().unwrap();
        let encoded = e.into_vec();

        let (decoded, _) = Data::decode_signed(&mut Decoder::new(&encoded)).unwrap();
        assert_eq!(decoded.signature, Signature::default());
        assert_eq!(decoded.meta_info, MetaInfo::default());
        assert_eq!(decoded.name.to_uri(), "/bare");
        assert!(decoded.content.is_empty());
    }
}
