//! Price normalization and the concurrent fetch → normalize → evaluate scan.

pub mod monitor;
pub mod normalizer;
pub mod scanner;

pub use monitor::{PairScan, SpreadMonitor};
pub use normalizer::{decode_sqrt_price_x96, encode_sqrt_price_x96, normalize};
pub use scanner::{ScanReport, SpreadScanner};
