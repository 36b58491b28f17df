use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ReplayError;
use crate::filter::ChannelFilter;
use crate::source::EventLog;
use crate::timing::{ReplayClock, Speed};
use crate::transport::Publisher;

/// Counters for a run that ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackReport {
    /// Records published to the bus.
    pub published: u64,
    /// Records consumed but rejected by the channel filter.
    pub skipped: u64,
    /// True when an external abort stopped the loop before end of log.
    pub cancelled: bool,
}

/// One replay run. Owns the log cursor, the compiled filter, the timing
/// state, and the publisher for the session's lifetime; dropping it
/// releases the file handle and the publisher.
pub struct PlaybackSession<P> {
    log: EventLog,
    filter: ChannelFilter,
    speed: Speed,
    verbose: bool,
    publisher: P,
}

impl<P: Publisher> PlaybackSession<P> {
    pub fn new(
        log: EventLog,
        filter: ChannelFilter,
        speed: Speed,
        verbose: bool,
        publisher: P,
    ) -> Self {
        Self {
            log,
            filter,
            speed,
            verbose,
            publisher,
        }
    }

    /// Replay until the log is exhausted.
    ///
    /// The loop pulls one record at a time: the first record anchors the
    /// clock, filtered records are consumed without waiting, eligible
    /// records wait until their scaled deadline and are then published in
    /// capture order, one in flight at a time. The deadline wait is the
    /// only suspension point; cancellation there stops the loop without
    /// publishing the in-flight record. Any decode or publish failure
    /// aborts the run; records already published stay published.
    pub async fn run(mut self, token: CancellationToken) -> Result<PlaybackReport, ReplayError> {
        let mut clock: Option<ReplayClock> = None;
        let mut published = 0u64;
        let mut skipped = 0u64;

        while let Some(record) = self.log.next_record()? {
            let clock = *clock.get_or_insert_with(|| {
                ReplayClock::anchored_at(Instant::now(), record.timestamp_us, self.speed)
            });

            if !self.filter.matches(&record.channel) {
                skipped += 1;
                continue;
            }

            let deadline = clock.deadline_for(record.timestamp_us);
            tokio::select! {
                _ = sleep_until(deadline) => {}
                _ = token.cancelled() => {
                    tracing::info!(published, skipped, "playback cancelled");
                    return Ok(PlaybackReport {
                        published,
                        skipped,
                        cancelled: true,
                    });
                }
            }

            self.publisher
                .publish(&record.channel, &record.payload)?;
            published += 1;

            if self.verbose {
                println!(
                    "{:.3} Channel {:<20} size {}",
                    clock.scaled_elapsed_secs(record.timestamp_us),
                    record.channel,
                    record.payload.len()
                );
            }
        }

        tracing::info!(published, skipped, "playback finished");
        Ok(PlaybackReport {
            published,
            skipped,
            cancelled: false,
        })
    }
}
