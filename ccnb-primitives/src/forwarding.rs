//! Prefix-registration entries exchanged with a forwarder.

use ccnb_codec::tags::dtag;
use ccnb_codec::{Blob, Decode, Decoder, Encode, Encoder, Error};
use serde::{Deserialize, Serialize};

use crate::name::Name;

/// Per-entry forwarding behavior bits.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForwardingFlags(pub u64);

impl ForwardingFlags {
    pub const ACTIVE: ForwardingFlags = ForwardingFlags(1);
    pub const CHILD_INHERIT: ForwardingFlags = ForwardingFlags(2);
    pub const ADVERTISE: ForwardingFlags = ForwardingFlags(4);
    pub const LAST: ForwardingFlags = ForwardingFlags(8);
    pub const CAPTURE: ForwardingFlags = ForwardingFlags(16);
    pub const LOCAL: ForwardingFlags = ForwardingFlags(32);
    pub const TAP: ForwardingFlags = ForwardingFlags(64);
    pub const CAPTURE_OK: ForwardingFlags = ForwardingFlags(128);

    const ALL_BITS: u64 = 0xff;

    pub fn contains(self, other: ForwardingFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// `ACTIVE | CHILD_INHERIT`.
impl Default for ForwardingFlags {
    fn default() -> Self {
        ForwardingFlags(Self::ACTIVE.0 | Self::CHILD_INHERIT.0)
    }
}

/// A request to register (or deregister) a prefix with a forwarder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ForwardingEntry<'b> {
    /// Textual action such as `selfreg`, `prefixreg` or `unreg`.
    pub action: Option<Blob<'b>>,
    pub prefix: Name<'b>,
    pub publisher_public_key_digest: Option<Blob<'b>>,
    pub face_id: Option<u64>,
    pub forwarding_flags: Option<ForwardingFlags>,
    pub freshness_seconds: Option<u64>,
}

impl<'b> ForwardingEntry<'b> {
    pub fn into_owned(self) -> ForwardingEntry<'static> {
        ForwardingEntry {
            action: self.action.map(Blob::into_owned),
            prefix: self.prefix.into_owned(),
            publisher_public_key_digest: self.publisher_public_key_digest.map(Blob::into_owned),
            face_id: self.face_id,
            forwarding_flags: self.forwarding_flags,
            freshness_seconds: self.freshness_seconds,
        }
    }
}

impl Encode for ForwardingEntry<'_> {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error> {
        e.write_element_start_dtag(dtag::FORWARDING_ENTRY)?;

        e.write_optional_udata_dtag_element(dtag::ACTION, self.action.as_deref())?;
        self.prefix.encode(e)?;
        e.write_optional_blob_dtag_element(
            dtag::PUBLISHER_PUBLIC_KEY_DIGEST,
            self.publisher_public_key_digest.as_deref(),
        )?;
        e.write_optional_unsigned_decimal_int_dtag_element(dtag::FACE_ID, self.face_id)?;
        e.write_optional_unsigned_decimal_int_dtag_element(
            dtag::FORWARDING_FLAGS,
            self.forwarding_flags.map(|flags| flags.0),
        )?;
        e.write_optional_unsigned_decimal_int_dtag_element(
            dtag::FRESHNESS_SECONDS,
            self.freshness_seconds,
        )?;

        e.write_element_close()
    }
}

impl<'b> Decode<'b> for ForwardingEntry<'b> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error> {
        d.read_element_start_dtag(dtag::FORWARDING_ENTRY)?;

        let action = d
            .read_optional_udata_dtag_element(dtag::ACTION)?
            .map(Blob::new);
        let prefix = Name::decode(d)?;
        let publisher_public_key_digest = d
            .read_optional_binary_dtag_element(dtag::PUBLISHER_PUBLIC_KEY_DIGEST, false)?
            .map(Blob::new);
        let face_id = d.read_optional_unsigned_integer_dtag_element(dtag::FACE_ID)?;
        let forwarding_flags = d
            .read_optional_unsigned_integer_dtag_element(dtag::FORWARDING_FLAGS)?
            .map(|bits| {
                if bits & !ForwardingFlags::ALL_BITS != 0 {
                    Err(Error::message("unrecognized forwarding flags"))
                } else {
                    Ok(ForwardingFlags(bits))
                }
            })
            .transpose()?;
        let freshness_seconds =
            d.read_optional_unsigned_integer_dtag_element(dtag::FRESHNESS_SECONDS)?;

        d.read_element_close()?;
        Ok(ForwardingEntry {
            action,
            prefix,
            publisher_public_key_digest,
            face_id,
            forwarding_flags,
            freshness_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags_are_active_and_child_inherit() {
        let flags = ForwardingFlags::default();
        assert!(flags.contains(ForwardingFlags::ACTIVE));
        assert!(flags.contains(ForwardingFlags::CHILD_INHERIT));
        assert!(!flags.contains(ForwardingFlags::CAPTURE));
        assert_eq!(flags.0, 3);
    }

    #[test]
    fn full_entry_roundtrips() {
        let entry = ForwardingEntry {
            action: Some(Blob::from(b"selfreg".to_vec())),
            prefix: Name::from_uri("/local/service"),
            publisher_public_key_digest: Some(Blob::from(vec![0xab; 32])),
            face_id: Some(12),
            forwarding_flags: Some(ForwardingFlags::default()),
            freshness_seconds: Some(3600),
        };

        let encoded = ccnb_codec::to_vec(&entry).unwrap();
        let decoded: ForwardingEntry = ccnb_codec::decode(&encoded).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn minimal_entry_roundtrips() {
        let entry = ForwardingEntry {
            prefix: Name::from_uri("/p"),
            ..ForwardingEntry::default()
        };

        let encoded = ccnb_codec::to_vec(&entry).unwrap();
        let decoded: ForwardingEntry = ccnb_codec::decode(&encoded).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn out_of_range_flags_are_rejected() {
        let entry = ForwardingEntry {
            prefix: Name::from_uri("/p"),
            forwarding_flags: Some(ForwardingFlags(256)),
            ..ForwardingEntry::default()
        };

        let encoded = ccnb_codec::to_vec(&entry).unwrap();
        assert_eq!(
            ccnb_codec::decode::<ForwardingEntry>(&encoded),
            Err(Error::message("unrecognized forwarding flags"))
        );
    }
}
