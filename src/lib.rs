//! Glucose Service
//!
//! This is the server side of the Bluetooth Glucose Service. A glucose sensor stores its
//! measurements as records, and a client retrieves or deletes them through the
//! [Record Access Control Point](racp). This crate re-exports the crates of the service, it can be
//! used in environments where only [`core`](https://doc.rust-lang.org/core/) and
//! [`alloc`](https://doc.rust-lang.org/alloc/) are available.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(not(test), no_std)]

#[doc(inline)]
pub use racp;

#[doc(inline)]
pub use racp_util as util;

pub use racp::assigned;
