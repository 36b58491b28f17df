pub mod driver;
pub mod error;
pub mod filter;
pub mod record;
pub mod source;
pub mod timing;
pub mod transport;

pub use driver::{PlaybackReport, PlaybackSession};
pub use error::ReplayError;
pub use filter::{ChannelFilter, MATCH_ALL};
pub use record::EventRecord;
pub use source::EventLog;
pub use timing::{ReplayClock, Speed};
pub use transport::{Provider, Publisher, UdpPublisher, DEFAULT_PROVIDER};
