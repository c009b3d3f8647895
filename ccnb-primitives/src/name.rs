//! NDN names: ordered sequences of opaque byte components, with the NDN
//! URI text form.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use ccnb_codec::tags::dtag;
use ccnb_codec::{Blob, Decode, Decoder, Encode, Encoder, Error};
use serde::{Deserialize, Serialize};

/// The wire format puts no bound on the component count; decoding caps it
/// so a hostile packet cannot balloon a name without limit.
pub const MAX_NAME_COMPONENTS: usize = 100;

/// One level of a name: an opaque byte string, possibly empty.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Component<'b>(pub Blob<'b>);

impl<'b> Component<'b> {
    pub fn new(value: impl Into<Blob<'b>>) -> Self {
        Component(value.into())
    }

    pub fn into_owned(self) -> Component<'static> {
        Component(self.0.into_owned())
    }

    /// Parse one URI path segment, unescaping `%XX` and applying the
    /// dot-component rules. Returns `None` for a segment with no legal
    /// component in it (empty, or one-or-two dots).
    pub fn from_escaped_string(segment: &str) -> Option<Component<'static>> {
        let trimmed = trim(segment);
        let unescaped = unescape(trimmed);

        if unescaped.iter().all(|b| *b == b'.') {
            // A component of only periods is encoded with three extra
            // periods; fewer than three is not a component at all.
            if unescaped.len() <= 2 {
                None
            } else {
                Some(Component(Blob::from(unescaped[3..].to_vec())))
            }
        } else {
            Some(Component(Blob::from(unescaped)))
        }
    }

    /// Escape for the NDN URI scheme: unreserved characters pass through,
    /// everything else becomes uppercase `%XX`, and an all-periods value
    /// (including empty) gains three leading periods.
    pub fn to_escaped_string(&self) -> String {
        let value = self.as_slice();

        if value.iter().all(|b| *b == b'.') {
            let mut result = String::with_capacity(3 + value.len());
            result.push_str("...");
            for _ in value {
                result.push('.');
            }
            return result;
        }

        let mut result = String::with_capacity(value.len());
        for &x in value {
            if x.is_ascii_alphanumeric() || matches!(x, b'+' | b'-' | b'.' | b'_') {
                result.push(x as char);
            } else {
                result.push_str(&format!("%{x:02X}"));
            }
        }
        result
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl<'b> Deref for Component<'b> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'b> From<&'b [u8]> for Component<'b> {
    fn from(value: &'b [u8]) -> Self {
        Component(Blob::from(value))
    }
}

impl From<Vec<u8>> for Component<'static> {
    fn from(value: Vec<u8>) -> Self {
        Component(Blob::from(value))
    }
}

/// Canonical NDN component order: shorter is less; equal lengths compare
/// bytewise.
impl Ord for Component<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.as_slice().cmp(other.as_slice()))
    }
}

impl PartialOrd for Component<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_escaped_string())
    }
}

/// A hierarchical NDN name. Names carry no terminator of their own; the
/// codec wraps them in a Name DTAG element.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Name<'b> {
    pub components: Vec<Component<'b>>,
}

impl<'b> Name<'b> {
    pub fn new(components: Vec<Component<'b>>) -> Self {
        Name { components }
    }

    /// Parse an NDN URI such as `"/ndn/abc"` or `"ndn:/ndn/abc"`. A
    /// leading scheme and `//authority` are stripped; illegal components
    /// are skipped, so parsing cannot fail.
    pub fn from_uri(uri: &str) -> Name<'static> {
        let mut uri = trim(uri);
        if uri.is_empty() {
            return Name::default();
        }

        // Omit a leading protocol such as "ndn:", but only when the colon
        // comes before any slash.
        if let Some(i_colon) = uri.find(':') {
            if uri.find('/').map_or(true, |i_slash| i_colon < i_slash) {
                uri = trim(&uri[i_colon + 1..]);
            }
        }

        if uri.starts_with('/') {
            if uri[1..].starts_with('/') {
                // Strip the authority following "//".
                match uri[2..].find('/') {
                    Some(i_after_authority) => uri = trim(&uri[2 + i_after_authority + 1..]),
                    None => return Name::default(),
                }
            } else {
                uri = trim(&uri[1..]);
            }
        }

        let mut name = Name::default();
        for segment in uri.split('/') {
            if let Some(component) = Component::from_escaped_string(segment) {
                name.components.push(component);
            }
        }
        name
    }

    pub fn to_uri(&self) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }

        let mut result = String::new();
        for component in &self.components {
            result.push('/');
            result.push_str(&component.to_escaped_string());
        }
        result
    }

    pub fn push(&mut self, component: impl Into<Component<'b>>) {
        self.components.push(component.into());
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Component<'b>> {
        self.components.get(i)
    }

    /// True when every component of `self` equals the corresponding
    /// leading component of `name`.
    pub fn is_prefix_of(&self, name: &Name) -> bool {
        self.components.len() <= name.components.len()
            && self
                .components
                .iter()
                .zip(&name.components)
                .all(|(a, b)| a.as_slice() == b.as_slice())
    }

    pub fn into_owned(self) -> Name<'static> {
        Name {
            components: self
                .components
                .into_iter()
                .map(Component::into_owned)
                .collect(),
        }
    }
}

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

impl Encode for Name<'_> {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error> {
        e.write_element_start_dtag(dtag::NAME)?;
        for component in &self.components {
            e.write_blob_dtag_element(dtag::COMPONENT, component)?;
        }
        e.write_element_close()
    }
}

impl<'b> Decode<'b> for Name<'b> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error> {
        d.read_element_start_dtag(dtag::NAME)?;

        let mut components = Vec::new();
        while d.peek_dtag(dtag::COMPONENT)? {
            if components.len() >= MAX_NAME_COMPONENTS {
                return Err(Error::message(
                    "read a component past the maximum number of components allowed in the name",
                ));
            }
            let value = d.read_binary_dtag_element(dtag::COMPONENT, false)?;
            components.push(Component(Blob::new(value)));
        }

        d.read_element_close()?;
        Ok(Name { components })
    }
}

fn trim(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\n' | '\r' | '\t'))
}

/// Undo `%XX` escapes. Malformed escapes are kept literally.
fn unescape(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = from_hex_char(bytes[i + 1]);
            let lo = from_hex_char(bytes[i + 2]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => result.push(16 * hi + lo),
                _ => result.extend_from_slice(&bytes[i..i + 3]),
            }
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    result
}

fn from_hex_char(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_roundtrip() {
        let name = Name::from_uri("/ndn/abc");
        assert_eq!(name.len(), 2);
        assert_eq!(name.get(0).unwrap().as_slice(), b"ndn");
        assert_eq!(name.get(1).unwrap().as_slice(), b"abc");
        assert_eq!(name.to_uri(), "/ndn/abc");
    }

    #[test]
    fn scheme_and_authority_are_stripped() {
        assert_eq!(Name::from_uri("ndn:/ndn/abc").to_uri(), "/ndn/abc");
        assert_eq!(Name::from_uri("ccnx://example.com/a/b").to_uri(), "/a/b");
        assert_eq!(Name::from_uri("  /trimmed  ").to_uri(), "/trimmed");
    }

    #[test]
    fn dot_components() {
        // Three dots is the empty component.
        let name = Name::from_uri("/...");
        assert_eq!(name.len(), 1);
        assert!(name.get(0).unwrap().is_empty());
        assert_eq!(name.to_uri(), "/...");

        // One or two dots is not a component at all.
        assert_eq!(Name::from_uri("/./a/../b").to_uri(), "/a/b");

        // Five dots is the two-dot component.
        let name = Name::from_uri("/.....");
        assert_eq!(name.get(0).unwrap().as_slice(), b"..");
        assert_eq!(name.to_uri(), "/.....");
    }

    #[test]
    fn escaping() {
        let mut name = Name::default();
        name.push(Component::from(b"a b".to_vec()));
        name.push(Component::from(vec![0x00, 0xff]));
        assert_eq!(name.to_uri(), "/a%20b/%00%FF");

        let parsed = Name::from_uri("/a%20b/%00%FF");
        assert_eq!(parsed, name.clone().into_owned());

        // A malformed escape stays literal.
        assert_eq!(
            Name::from_uri("/a%zz").get(0).unwrap().as_slice(),
            b"a%zz"
        );
    }

    #[test]
    fn empty_and_root() {
        assert_eq!(Name::default().to_uri(), "/");
        assert!(Name::from_uri("/").is_empty());
        assert!(Name::from_uri("").is_empty());
        assert!(Name::from_uri("ccnx://only-authority").is_empty());
    }

    #[test]
    fn component_ordering_is_length_first() {
        let a = Component::from(b"b".to_vec());
        let b = Component::from(b"aa".to_vec());
        let c = Component::from(b"ab".to_vec());
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.cmp(&a), Ordering::Equal);
    }

    #[test]
    fn prefix_matching() {
        let prefix = Name::from_uri("/a/b");
        assert!(prefix.is_prefix_of(&Name::from_uri("/a/b/c")));
        assert!(prefix.is_prefix_of(&Name::from_uri("/a/b")));
        assert!(!prefix.is_prefix_of(&Name::from_uri("/a")));
        assert!(!prefix.is_prefix_of(&Name::from_uri("/a/x/c")));
        assert!(Name::default().is_prefix_of(&Name::from_uri("/a")));
    }

    #[test]
    fn wire_roundtrip() {
        let name = Name::from_uri("/ndn/abc");
        let encoded = ccnb_codec::to_vec(&name).unwrap();
        assert_eq!(
            encoded,
            hex::decode("f2fa9d6e646e00fa9d6162630000").unwrap()
        );

        let decoded: Name = ccnb_codec::decode(&encoded).unwrap();
        assert_eq!(decoded, name);
    }

    #[test]
    fn empty_component_survives_the_wire() {
        let mut name = Name::default();
        name.push(Component::default());
        let encoded = ccnb_codec::to_vec(&name).unwrap();
        let decoded: Name = ccnb_codec::decode(&encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert!(decoded.get(0).unwrap().is_empty());
    }

    proptest::proptest! {
        #[test]
        fn any_name_survives_uri_and_wire_roundtrips(
            components in proptest::collection::vec(
                proptest::collection::vec(proptest::prelude::any::<u8>(), 0..12),
                0..8,
            )
        ) {
            let name = Name::new(components.into_iter().map(Component::from).collect());

            let reparsed = Name::from_uri(&name.to_uri());
            proptest::prop_assert_eq!(&reparsed, &name);

            let encoded = ccnb_codec::to_vec(&name).unwrap();
            let decoded: Name = ccnb_codec::decode(&encoded).unwrap();
            proptest::prop_assert_eq!(&decoded, &name);
        }
    }
}
