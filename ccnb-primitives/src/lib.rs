//! CCN/NDN message primitives and their Binary-XML codecs.
//!
//! The types in this crate model the core packet schemas — [`Name`],
//! [`Interest`], [`Data`] and [`ForwardingEntry`] — and know how to read
//! and write themselves through the byte-level codec in `ccnb-codec`.
//! Decoded values borrow from the input buffer; every type offers an
//! `into_owned` conversion for values that must outlive it.

pub mod data;
pub mod forwarding;
pub mod interest;
pub mod name;
pub mod wire;

pub use ccnb_codec::{Blob, Decode, Encode, Error, Fragment};

pub use data::{ContentType, Data, KeyLocator, KeyNameKind, MetaInfo, Signature, SignedPortion};
pub use forwarding::{ForwardingEntry, ForwardingFlags};
pub use interest::{AnswerOriginKind, Exclude, ExcludeEntry, Interest};
pub use name::{Component, Name};
pub use wire::{BinaryXmlWireFormat, WireFormat};
