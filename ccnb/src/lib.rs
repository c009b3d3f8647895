//! Rust-native building blocks for content-centric networking
//!
//! An expanding collection of modules that implements the CCN/NDN
//! Binary-XML wire protocol in native Rust. This crate doesn't provide
//! any particular application, it is meant to be used as a base layer for
//! higher-level use-cases such as transports, caches and forwarders.

#![warn(missing_docs)]

#[doc(inline)]
pub use ccnb_codec as codec;

#[doc(inline)]
pub use ccnb_primitives as primitives;
