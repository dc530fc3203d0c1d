//! QR code symbol generation: mode-optimal data encoding, block-interleaved
//! Reed-Solomon error correction, and symbol layout with penalty-scored
//! masking, for versions 1 through 40.
//!
//! ```
//! use qrgen::{ECLevel, QrBuilder};
//!
//! let symbol = QrBuilder::new(b"HELLO WORLD").ec_level(ECLevel::M).build().unwrap();
//! let bitmap = symbol.bitmap();
//! assert_eq!(symbol.version().number(), 1);
//! assert!(bitmap[4][4]); // top-left finder corner, inside the quiet zone
//! ```
#![allow(clippy::items_after_test_module)]

pub mod builder;
mod common;

pub use builder::{QrBuilder, Symbol};
pub use common::error::{QrError, QrResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Version};
