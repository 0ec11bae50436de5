// [libs/domain/feeds/src/lib.rs]
//! Contrato Feed y sus adaptadores concretos: el feed sintetico IPv4
//! (mandatado por la especificacion) y un feed de archivo local.

mod errors;
mod feed;
mod ipv4;
mod local_file;

pub use errors::FeedError;
pub use feed::{Feed, FeedKind, UrlBatch};
pub use ipv4::SyntheticIpv4Feed;
pub use local_file::LocalFileFeed;
