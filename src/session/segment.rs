//! Conversation burst segmentation.
//!
//! A burst is a contiguous run of messages where no two neighbours are more
//! than the gap threshold apart.

use chrono::DateTime;
use serde_json::Value;

/// Gap that closes a burst: 30 minutes, in milliseconds.
pub const BURST_GAP_MS: i64 = 30 * 60 * 1000;

/// A history message with a usable timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    /// Position in the history file.
    pub index: usize,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// One contiguous run of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    /// History index of the first message, inclusive.
    pub start_index: usize,
    /// History index of the last message, inclusive.
    pub end_index: usize,
    /// Epoch milliseconds of the first message.
    pub start_time: i64,
    /// Epoch milliseconds of the latest message.
    pub end_time: i64,
    pub message_count: usize,
    /// `end_time - start_time`.
    pub duration: i64,
}

impl Burst {
    fn open(index: usize, timestamp: i64) -> Self {
        Self {
            start_index: index,
            end_index: index,
            start_time: timestamp,
            end_time: timestamp,
            message_count: 1,
            duration: 0,
        }
    }

    fn extend(&mut self, index: usize, timestamp: i64) {
        self.end_index = index;
        self.end_time = self.end_time.max(timestamp);
        self.message_count += 1;
        self.duration = self.end_time.saturating_sub(self.start_time);
    }
}

/// Segment with the default 30 minute threshold.
#[must_use]
pub fn segment(timestamps: &[i64]) -> Vec<Burst> {
    segment_with_gap(timestamps, BURST_GAP_MS)
}

/// Segment a plain timestamp sequence; burst indices are sequence positions.
#[must_use]
pub fn segment_with_gap(timestamps: &[i64], gap_ms: i64) -> Vec<Burst> {
    let messages: Vec<TimedMessage> = timestamps
        .iter()
        .enumerate()
        .map(|(index, &timestamp)| TimedMessage { index, timestamp })
        .collect();
    segment_messages(&messages, gap_ms)
}

/// Partition timed messages into bursts in one linear pass.
///
/// A new burst starts when the distance from the running burst's latest
/// timestamp exceeds `gap_ms`. Burst indices are the messages' own indices.
#[must_use]
pub fn segment_messages(messages: &[TimedMessage], gap_ms: i64) -> Vec<Burst> {
    let mut bursts = Vec::new();
    let mut current: Option<Burst> = None;

    for &TimedMessage { index, timestamp } in messages {
        match current.as_mut() {
            Some(burst) if timestamp.saturating_sub(burst.end_time) <= gap_ms => {
                burst.extend(index, timestamp);
            }
            _ => {
                if let Some(done) = current.replace(Burst::open(index, timestamp)) {
                    bursts.push(done);
                }
            }
        }
    }

    if let Some(last) = current {
        bursts.push(last);
    }
    bursts
}

/// Extract numeric `timestamp` fields from history messages, keeping each
/// message's position in the history.
///
/// Messages without a numeric timestamp, or with one outside the
/// representable date range, are skipped.
#[must_use]
pub fn message_timestamps(messages: &[Value]) -> Vec<TimedMessage> {
    messages
        .iter()
        .enumerate()
        .filter_map(|(index, message)| {
            let ts = message.get("timestamp")?;
            let timestamp = ts
                .as_i64()
                .or_else(|| ts.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
            DateTime::from_timestamp_millis(timestamp)?;
            Some(TimedMessage { index, timestamp })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINUTE: i64 = 60 * 1000;

    #[test]
    fn test_empty_input() {
        assert!(segment(&[]).is_empty());
    }

    #[test]
    fn test_single_message_is_zero_duration_burst() {
        let bursts = segment(&[42]);
        assert_eq!(
            bursts,
            vec![Burst {
                start_index: 0,
                end_index: 0,
                start_time: 42,
                end_time: 42,
                message_count: 1,
                duration: 0,
            }]
        );
    }

    #[test]
    fn test_gap_splits_into_two_bursts() {
        let bursts = segment(&[0, 10 * MINUTE, 50 * MINUTE]);
        assert_eq!(bursts.len(), 2);

        assert_eq!(bursts[0].start_time, 0);
        assert_eq!(bursts[0].end_time, 10 * MINUTE);
        assert_eq!(bursts[0].message_count, 2);
        assert_eq!(bursts[0].duration, 10 * MINUTE);

        assert_eq!(bursts[1].start_index, 2);
        assert_eq!(bursts[1].start_time, 50 * MINUTE);
        assert_eq!(bursts[1].message_count, 1);
    }

    #[test]
    fn test_gap_exactly_threshold_extends() {
        let bursts = segment(&[0, 30 * MINUTE]);
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].duration, 30 * MINUTE);
    }

    #[test]
    fn test_gap_just_over_threshold_splits() {
        let bursts = segment(&[0, 30 * MINUTE + 1]);
        assert_eq!(bursts.len(), 2);
    }

    #[test]
    fn test_gap_measured_from_latest_message() {
        // Each step is 20 minutes, so the run never breaks even though it
        // spans an hour.
        let bursts = segment(&[0, 20 * MINUTE, 40 * MINUTE, 60 * MINUTE]);
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].end_index, 3);
    }

    #[test]
    fn test_increasing_sequences_respect_invariants() {
        // Deterministic LCG so the sweep is reproducible.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            seed >> 33
        };

        for _ in 0..200 {
            let len = usize::try_from(next() % 40).unwrap();
            let mut ts = Vec::with_capacity(len);
            let mut t = 0_i64;
            for _ in 0..len {
                t += 1 + i64::try_from(next() % (60 * MINUTE as u64)).unwrap();
                ts.push(t);
            }

            let bursts = segment(&ts);
            let total: usize = bursts.iter().map(|b| b.message_count).sum();
            assert_eq!(total, ts.len());

            for burst in &bursts {
                let slice = &ts[burst.start_index..=burst.end_index];
                assert!(slice.windows(2).all(|w| w[1] - w[0] <= BURST_GAP_MS));
                assert_eq!(burst.duration, burst.end_time - burst.start_time);
            }
            for pair in bursts.windows(2) {
                assert!(pair[1].start_time - pair[0].end_time > BURST_GAP_MS);
                assert_eq!(pair[1].start_index, pair[0].end_index + 1);
            }
        }
    }

    #[test]
    fn test_message_timestamps_skips_missing() {
        let messages = vec![
            json!({"role": "user", "timestamp": 1000}),
            json!({"role": "assistant"}),
            json!({"role": "assistant", "timestamp": "soon"}),
            json!({"role": "user", "timestamp": 2500.7}),
        ];
        let timed = message_timestamps(&messages);
        assert_eq!(
            timed,
            vec![
                TimedMessage { index: 0, timestamp: 1000 },
                TimedMessage { index: 3, timestamp: 2500 },
            ]
        );
    }

    #[test]
    fn test_burst_indices_follow_history_positions() {
        let messages = vec![
            json!({"role": "system"}),
            json!({"role": "system"}),
            json!({"role": "user", "timestamp": 1000}),
        ];
        let bursts = segment_messages(&message_timestamps(&messages), BURST_GAP_MS);
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].start_index, 2);
        assert_eq!(bursts[0].end_index, 2);
    }

    #[test]
    fn test_out_of_range_timestamps_are_skipped() {
        let messages = vec![
            json!({"timestamp": 1e19}),
            json!({"timestamp": -1e19}),
            json!({"timestamp": i64::MIN}),
            json!({"timestamp": i64::MAX}),
            json!({"timestamp": 5000}),
        ];
        let timed = message_timestamps(&messages);
        assert_eq!(timed, vec![TimedMessage { index: 4, timestamp: 5000 }]);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let backwards = segment(&[i64::MAX, i64::MIN]);
        assert_eq!(backwards.len(), 1);
        assert_eq!(backwards[0].end_index, 1);
        assert_eq!(backwards[0].duration, 0);

        let forwards = segment(&[i64::MIN, i64::MAX]);
        assert_eq!(forwards.len(), 2);
        assert_eq!(forwards[1].start_index, 1);
    }
}
