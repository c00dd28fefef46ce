pub mod offline;
pub mod parse;
pub mod remote;
pub mod types;

pub use offline::OfflineProvider;
pub use parse::{parse_directions, DirectionsOutcome};
pub use remote::RemoteOsrmProvider;
