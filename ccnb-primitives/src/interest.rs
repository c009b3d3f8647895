//! Interest packets: a name plus the selectors that narrow which Data may
//! answer it.

use std::cmp::Ordering;
use std::fmt;

use ccnb_codec::tags::dtag;
use ccnb_codec::{Blob, Decode, Decoder, Encode, Encoder, Error};
use serde::{Deserialize, Serialize};

use crate::name::{Component, Name};

/// Decoding cap on exclude entries, mirroring the name component cap.
pub const MAX_EXCLUDE_ENTRIES: usize = 100;

/// Bit set describing where an answer may come from. The wire default is
/// `CONTENT_STORE | GENERATED`, encoded by omitting the element.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnswerOriginKind(pub u64);

impl AnswerOriginKind {
    pub const NO_CONTENT_STORE: AnswerOriginKind = AnswerOriginKind(0);
    pub const CONTENT_STORE: AnswerOriginKind = AnswerOriginKind(1);
    pub const GENERATED: AnswerOriginKind = AnswerOriginKind(2);
    pub const STALE: AnswerOriginKind = AnswerOriginKind(4);
    /// Requires scope 0.
    pub const MARK_STALE: AnswerOriginKind = AnswerOriginKind(16);

    pub const DEFAULT: AnswerOriginKind =
        AnswerOriginKind(Self::CONTENT_STORE.0 | Self::GENERATED.0);

    pub fn contains(self, other: AnswerOriginKind) -> bool {
        self.0 & other.0 == other.0
    }
}

/// One entry of an exclude filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ExcludeEntry<'b> {
    /// Exclude exactly this component.
    Component(Component<'b>),
    /// Wildcard: excludes everything between its concrete neighbors, or
    /// everything on an open side.
    Any,
    /// A legacy bloom-filter entry. The filter bytes are preserved so
    /// nothing is lost across a round-trip, but matching treats the entry
    /// as a wildcard, which can only over-exclude.
    Bloom(Blob<'b>),
}

impl<'b> ExcludeEntry<'b> {
    fn is_wildcard(&self) -> bool {
        !matches!(self, ExcludeEntry::Component(_))
    }

    pub fn into_owned(self) -> ExcludeEntry<'static> {
        match self {
            ExcludeEntry::Component(c) => ExcludeEntry::Component(c.into_owned()),
            ExcludeEntry::Any => ExcludeEntry::Any,
            ExcludeEntry::Bloom(b) => ExcludeEntry::Bloom(b.into_owned()),
        }
    }
}

/// A per-Interest predicate filtering which name components a content
/// store may return. An empty exclude filters nothing and is omitted from
/// the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Exclude<'b> {
    pub entries: Vec<ExcludeEntry<'b>>,
}

impl<'b> Exclude<'b> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_component(&mut self, component: impl Into<Component<'b>>) {
        self.entries.push(ExcludeEntry::Component(component.into()));
    }

    pub fn push_any(&mut self) {
        self.entries.push(ExcludeEntry::Any);
    }

    /// Check whether `component` is excluded: it equals a concrete entry,
    /// or falls strictly between the concrete entries bracketing a
    /// wildcard. A leading or trailing wildcard matches everything on its
    /// open side; an exclude of only wildcards matches everything.
    pub fn matches(&self, component: &Component) -> bool {
        let entries = &self.entries;

        let mut i = 0;
        while i < entries.len() {
            match &entries[i] {
                ExcludeEntry::Component(concrete) => {
                    if component.cmp(concrete) == Ordering::Equal {
                        return true;
                    }
                    i += 1;
                }
                _ => {
                    // A component entry just before the wildcard is the
                    // lower bound; equality with it was checked on the
                    // previous pass.
                    let lower_bound = match i.checked_sub(1).map(|j| &entries[j]) {
                        Some(ExcludeEntry::Component(c)) => Some(c),
                        _ => None,
                    };

                    // Find the upper bound, skipping consecutive wildcards.
                    let upper_bound = entries[i + 1..].iter().enumerate().find_map(
                        |(offset, entry)| match entry {
                            ExcludeEntry::Component(c) => Some((i + 1 + offset, c)),
                            _ => None,
                        },
                    );

                    match (lower_bound, upper_bound) {
                        (Some(lower), Some((i_upper, upper))) => {
                            if component.cmp(lower) == Ordering::Greater
                                && component.cmp(upper) == Ordering::Less
                            {
                                return true;
                            }
                            // Equality with the upper bound is checked on
                            // the next pass.
                            i = i_upper;
                        }
                        (None, Some((i_upper, upper))) => {
                            if component.cmp(upper) == Ordering::Less {
                                return true;
                            }
                            i = i_upper;
                        }
                        (Some(lower), None) => {
                            if component.cmp(lower) == Ordering::Greater {
                                return true;
                            }
                            i += 1;
                        }
                        (None, None) => return true,
                    }
                }
            }
        }

        false
    }

    pub fn into_owned(self) -> Exclude<'static> {
        Exclude {
            entries: self
                .entries
                .into_iter()
                .map(ExcludeEntry::into_owned)
                .collect(),
        }
    }
}

impl fmt::Display for Exclude<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            match entry {
                ExcludeEntry::Component(c) => f.write_str(&c.to_escaped_string())?,
                _ => f.write_str("*")?,
            }
        }
        Ok(())
    }
}

fn encode_exclude(exclude: &Exclude, e: &mut Encoder) -> Result<(), Error> {
    if exclude.is_empty() {
        return Ok(());
    }

    e.write_element_start_dtag(dtag::EXCLUDE)?;
    for entry in &exclude.entries {
        match entry {
            ExcludeEntry::Component(component) => {
                e.write_blob_dtag_element(dtag::COMPONENT, component)?;
            }
            ExcludeEntry::Any => {
                e.write_element_start_dtag(dtag::ANY)?;
                e.write_element_close()?;
            }
            ExcludeEntry::Bloom(value) => {
                e.write_blob_dtag_element(dtag::BLOOM, value)?;
            }
        }
    }
    e.write_element_close()
}

fn decode_exclude<'b>(d: &mut Decoder<'b>) -> Result<Exclude<'b>, Error> {
    d.read_element_start_dtag(dtag::EXCLUDE)?;

    let mut entries = Vec::new();
    loop {
        let entry = if d.peek_dtag(dtag::COMPONENT)? {
            let value = d.read_binary_dtag_element(dtag::COMPONENT, false)?;
            ExcludeEntry::Component(Component(Blob::new(value)))
        } else if d.peek_dtag(dtag::ANY)? {
            d.read_element_start_dtag(dtag::ANY)?;
            d.read_element_close()?;
            ExcludeEntry::Any
        } else if d.peek_dtag(dtag::BLOOM)? {
            let value = d.read_binary_dtag_element(dtag::BLOOM, false)?;
            ExcludeEntry::Bloom(Blob::new(value))
        } else {
            break;
        };

        if entries.len() >= MAX_EXCLUDE_ENTRIES {
            return Err(Error::message(
                "read an entry past the maximum number of entries allowed in the exclude",
            ));
        }
        entries.push(entry);
    }

    d.read_element_close()?;
    Ok(Exclude { entries })
}

/// A request for Data whose name extends `name` and passes the selectors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Interest<'b> {
    pub name: Name<'b>,
    pub min_suffix_components: Option<u64>,
    pub max_suffix_components: Option<u64>,
    pub publisher_public_key_digest: Option<Blob<'b>>,
    pub exclude: Exclude<'b>,
    pub child_selector: Option<u64>,
    pub answer_origin_kind: Option<AnswerOriginKind>,
    pub scope: Option<u64>,
    pub interest_lifetime_milliseconds: Option<f64>,
    pub nonce: Option<Blob<'b>>,
}

impl<'b> Interest<'b> {
    pub fn new(name: Name<'b>) -> Self {
        Interest {
            name,
            ..Interest::default()
        }
    }

    /// Check whether `name` could be carried by a Data packet answering
    /// this interest: the interest name must be a prefix, the suffix count
    /// must fit the min/max selectors (counting the implicit digest
    /// component), and the first suffix component must not be excluded.
    pub fn matches_name(&self, name: &Name) -> bool {
        if !self.name.is_prefix_of(name) {
            return false;
        }

        let n_suffix = (name.len() + 1 - self.name.len()) as u64;
        if let Some(min) = self.min_suffix_components {
            if n_suffix < min {
                return false;
            }
        }
        if let Some(max) = self.max_suffix_components {
            if n_suffix > max {
                return false;
            }
        }

        if !self.exclude.is_empty()
            && name.len() > self.name.len()
            && self.exclude.matches(&name.components[self.name.len()])
        {
            return false;
        }

        true
    }

    pub fn into_owned(self) -> Interest<'static> {
        Interest {
            name: self.name.into_owned(),
            min_suffix_components: self.min_suffix_components,
            max_suffix_components: self.max_suffix_components,
            publisher_public_key_digest: self.publisher_public_key_digest.map(Blob::into_owned),
            exclude: self.exclude.into_owned(),
            child_selector: self.child_selector,
            answer_origin_kind: self.answer_origin_kind,
            scope: self.scope,
            interest_lifetime_milliseconds: self.interest_lifetime_milliseconds,
            nonce: self.nonce.map(Blob::into_owned),
        }
    }
}

impl Encode for Interest<'_> {
    fn encode(&self, e: &mut Encoder) -> Result<(), Error> {
        e.write_element_start_dtag(dtag::INTEREST)?;

        self.name.encode(e)?;
        e.write_optional_unsigned_decimal_int_dtag_element(
            dtag::MIN_SUFFIX_COMPONENTS,
            self.min_suffix_components,
        )?;
        e.write_optional_unsigned_decimal_int_dtag_element(
            dtag::MAX_SUFFIX_COMPONENTS,
            self.max_suffix_components,
        )?;
        e.write_optional_blob_dtag_element(
            dtag::PUBLISHER_PUBLIC_KEY_DIGEST,
            self.publisher_public_key_digest.as_deref(),
        )?;
        encode_exclude(&self.exclude, e)?;
        e.write_optional_unsigned_decimal_int_dtag_element(
            dtag::CHILD_SELECTOR,
            self.child_selector,
        )?;
        match self.answer_origin_kind {
            // The default is implied by omission.
            Some(kind) if kind != AnswerOriginKind::DEFAULT => {
                e.write_unsigned_decimal_int_dtag_element(dtag::ANSWER_ORIGIN_KIND, kind.0)?;
            }
            _ => {}
        }
        e.write_optional_unsigned_decimal_int_dtag_element(dtag::SCOPE, self.scope)?;
        e.write_optional_time_milliseconds_dtag_element(
            dtag::INTEREST_LIFETIME,
            self.interest_lifetime_milliseconds,
        )?;
        e.write_optional_blob_dtag_element(dtag::NONCE, self.nonce.as_deref())?;

        e.write_element_close()
    }
}

impl<'b> Decode<'b> for Interest<'b> {
    fn decode(d: &mut Decoder<'b>) -> Result<Self, Error> {
        d.read_element_start_dtag(dtag::INTEREST)?;

        let name = Name::decode(d)?;
        let min_suffix_components =
            d.read_optional_unsigned_integer_dtag_element(dtag::MIN_SUFFIX_COMPONENTS)?;
        let max_suffix_components =
            d.read_optional_unsigned_integer_dtag_element(dtag::MAX_SUFFIX_COMPONENTS)?;
        let publisher_public_key_digest = d
            .read_optional_binary_dtag_element(dtag::PUBLISHER_PUBLIC_KEY_DIGEST, false)?
            .map(Blob::new);

        let exclude = if d.peek_dtag(dtag::EXCLUDE)? {
            decode_exclude(d)?
        } else {
            Exclude::default()
        };

        let child_selector =
            d.read_optional_unsigned_integer_dtag_element(dtag::CHILD_SELECTOR)?;
        let answer_origin_kind = d
            .read_optional_unsigned_integer_dtag_element(dtag::ANSWER_ORIGIN_KIND)?
            .map(AnswerOriginKind);
        let scope = d.read_optional_unsigned_integer_dtag_element(dtag::SCOPE)?;
        let interest_lifetime_milliseconds =
            d.read_optional_time_milliseconds_dtag_element(dtag::INTEREST_LIFETIME)?;
        let nonce = d
            .read_optional_binary_dtag_element(dtag::NONCE, false)?
            .map(Blob::new);

        d.read_element_close()?;

        Ok(Interest {
            name,
            min_suffix_components,
            max_suffix_components,
            publisher_public_key_digest,
            exclude,
            child_selector,
            answer_origin_kind,
            scope,
            interest_lifetime_milliseconds,
            nonce,
        })
    }
}
