use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

/// An opaque byte string, borrowed from a decode input or owned by the
/// value that carries it.
///
/// Decoders hand out borrowed blobs pointing into the caller's buffer, so
/// a decoded message is only valid while that buffer lives. Messages built
/// by hand own their bytes. [`Blob::into_owned`] clones a borrowed blob
/// into the `'static` form when a message must outlive its source buffer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Blob<'b>(Cow<'b, [u8]>);

impl<'b> Blob<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Blob(Cow::Borrowed(bytes))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn into_owned(self) -> Blob<'static> {
        Blob(Cow::Owned(self.0.into_owned()))
    }
}

impl<'b> From<&'b [u8]> for Blob<'b> {
    fn from(bytes: &'b [u8]) -> Self {
        Blob(Cow::Borrowed(bytes))
    }
}

impl<'b, const N: usize> From<&'b [u8; N]> for Blob<'b> {
    fn from(bytes: &'b [u8; N]) -> Self {
        Blob(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for Blob<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(Cow::Owned(bytes))
    }
}

impl<'b> From<Blob<'b>> for Vec<u8> {
    fn from(blob: Blob<'b>) -> Self {
        blob.0.into_owned()
    }
}

impl<'b> Deref for Blob<'b> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<String> for Blob<'static> {
    type Error = hex::FromHexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = hex::decode(value)?;
        Ok(Blob(Cow::Owned(v)))
    }
}

impl<'b> From<Blob<'b>> for String {
    fn from(blob: Blob<'b>) -> Self {
        hex::encode(blob.deref())
    }
}

impl fmt::Display for Blob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.deref()))
    }
}

impl fmt::Debug for Blob<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blob({})", hex::encode(self.deref()))
    }
}

impl serde::Serialize for Blob<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.deref()))
    }
}

impl<'de, 'b> serde::Deserialize<'de> for Blob<'b> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        let v = hex::decode(s).map_err(serde::de::Error::custom)?;
        Ok(Blob(Cow::Owned(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_display_and_roundtrip() {
        let blob = Blob::new(&[0x61, 0x62, 0x63]);
        assert_eq!(blob.to_string(), "616263");

        let back = Blob::try_from(String::from("616263")).unwrap();
        assert_eq!(back, blob);
    }

    #[test]
    fn into_owned_detaches_from_source() {
        let source = vec![1u8, 2, 3];
        let owned = Blob::new(&source).into_owned();
        drop(source);
        assert_eq!(owned.as_slice(), &[1, 2, 3]);
    }
}
