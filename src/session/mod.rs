//! Active conversation discovery and timing analysis.

mod recency;
mod segment;

pub use recency::{
    find_most_recent, select_most_recent, NameFilter, Recency, RecencyQuery, SessionPointer,
    AGENT_PREFIX, GROUP_TOPIC_PREFIX, HISTORY_STEM,
};
pub use segment::{
    message_timestamps, segment, segment_messages, segment_with_gap, Burst, TimedMessage,
    BURST_GAP_MS,
};
