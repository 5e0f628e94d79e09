//! `mctools` is a semi-modular toolkit for converting and inspecting Maya
//! geometry caches
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[cfg(feature = "description")]
#[cfg_attr(docsrs, doc(cfg(feature = "description")))]
#[doc(inline)]
pub use mctools_description as description;

#[cfg(feature = "mcc")]
#[cfg_attr(docsrs, doc(cfg(feature = "mcc")))]
#[doc(inline)]
pub use mctools_mcc as mcc;
