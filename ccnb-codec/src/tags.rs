//! Bit-level constants of the Binary-XML header scheme and the DTag
//! dictionary used by the message codecs.

/// The single octet that terminates a compound element.
pub const CLOSE: u8 = 0x00;

pub const TT_BITS: u32 = 3;
pub const TT_MASK: u8 = 0x07;
pub const TT_VALUE_BITS: u32 = 4;
pub const TT_VALUE_MASK: u8 = 0x0f;
pub const REGULAR_VALUE_BITS: u32 = 7;
pub const REGULAR_VALUE_MASK: u8 = 0x7f;

/// Top bit marking the last octet of a header.
pub const TT_FINAL: u8 = 0x80;

/// The 3-bit header type carried in the terminal octet of every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Ext = 0x00,
    Tag = 0x01,
    Dtag = 0x02,
    Attr = 0x03,
    Dattr = 0x04,
    Blob = 0x05,
    UData = 0x06,
}

impl TypeTag {
    /// Map a 3-bit code to its type. Code 7 is unassigned.
    pub fn from_code(code: u8) -> Option<TypeTag> {
        match code {
            0x00 => Some(TypeTag::Ext),
            0x01 => Some(TypeTag::Tag),
            0x02 => Some(TypeTag::Dtag),
            0x03 => Some(TypeTag::Attr),
            0x04 => Some(TypeTag::Dattr),
            0x05 => Some(TypeTag::Blob),
            0x06 => Some(TypeTag::UData),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// DTag assignments for the core messages. Readers ignore unknown optional
/// tags where the schema tolerates them, so the dictionary is a superset of
/// what any single message uses.
pub mod dtag {
    pub const ANY: u64 = 13;
    pub const NAME: u64 = 14;
    pub const COMPONENT: u64 = 15;
    pub const CERTIFICATE: u64 = 16;
    pub const CONTENT: u64 = 19;
    pub const SIGNED_INFO: u64 = 20;
    pub const INTEREST: u64 = 26;
    pub const KEY: u64 = 27;
    pub const KEY_LOCATOR: u64 = 28;
    pub const KEY_NAME: u64 = 29;
    pub const SIGNATURE: u64 = 37;
    pub const TIMESTAMP: u64 = 39;
    pub const TYPE: u64 = 40;
    pub const NONCE: u64 = 41;
    pub const SCOPE: u64 = 42;
    pub const EXCLUDE: u64 = 43;
    pub const BLOOM: u64 = 44;
    pub const ANSWER_ORIGIN_KIND: u64 = 47;
    pub const INTEREST_LIFETIME: u64 = 48;
    pub const WITNESS: u64 = 53;
    pub const SIGNATURE_BITS: u64 = 54;
    pub const DIGEST_ALGORITHM: u64 = 55;
    pub const FRESHNESS_SECONDS: u64 = 58;
    pub const FINAL_BLOCK_ID: u64 = 59;
    pub const PUBLISHER_PUBLIC_KEY_DIGEST: u64 = 60;
    pub const PUBLISHER_CERTIFICATE_DIGEST: u64 = 61;
    pub const PUBLISHER_ISSUER_KEY_DIGEST: u64 = 62;
    pub const PUBLISHER_ISSUER_CERTIFICATE_DIGEST: u64 = 63;
    pub const CONTENT_OBJECT: u64 = 64;
    pub const ACTION: u64 = 73;
    pub const FACE_ID: u64 = 74;
    pub const FORWARDING_FLAGS: u64 = 79;
    pub const FORWARDING_ENTRY: u64 = 81;
    pub const MIN_SUFFIX_COMPONENTS: u64 = 83;
    pub const MAX_SUFFIX_COMPONENTS: u64 = 84;
    pub const CHILD_SELECTOR: u64 = 85;
}
