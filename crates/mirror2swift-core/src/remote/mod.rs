pub mod client;
pub mod container;
pub mod source;
pub mod tempurl;

pub use client::HttpClient;
pub use container::SwiftContainer;
pub use source::{open_source, FileSource, HttpFile, LocalFile};
pub use tempurl::{Clock, FixedClock, SystemClock, TempUrl, TempUrlSigner};
