/*!
Reconstructs fine-grained BGP RIB snapshots from archived RouteViews and
RIPE RIS data.

Two public-archive projects publish periodic full RIB dumps and incremental
update streams collected from many route collectors, each peering with many
operator routers. This crate warm-starts an in-memory RIB from a dump close
to a requested start time, replays subsequent updates forward to a requested
end time, and periodically asks a set of pluggable observers to summarize the
evolving routing state. When the end time lands on a RIB-publication instant,
the reconstructed RIB is compared against the ground-truth dump to quantify
reconstruction error.

Downloading, external MRT decoding, and the CLI are all in this crate, but
the reconstruction engine itself — [`rib::RibStore`], [`sanitize`], and the
[`observer`] framework — is the part worth reading first.
*/
pub mod collector;
pub mod config;
pub mod decoder;
pub mod download;
pub mod driver;
pub mod error;
pub mod observer;
pub mod record;
pub mod rib;
pub mod sanitize;
pub mod time;

pub use error::{Error, Result};
