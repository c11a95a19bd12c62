//! Sync-progress derivation from daemon logs.
//!
//! Light-client channel daemons do not answer info queries until their
//! headers are synced, so progress is scraped from the container's own log
//! history instead. The patterns are specific to one daemon family and are
//! therefore supplied per adapter through [`SyncLogParser`].

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::SyncProgress;

/// Derives sync progress from log lines ordered oldest first.
pub trait SyncLogParser: Send + Sync {
    /// Progress implied by the log history; unresolved heights count as 0.
    fn progress(&self, lines: &[String]) -> SyncProgress;

    /// Height of the newest block the daemon reported, if any.
    fn latest_block(&self, lines: &[String]) -> Option<u64>;
}

static CAUGHT_UP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fully caught up (?:with cfheaders )?at height[= ](\d+)")
        .expect("valid regex")
});

static SYNCING_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)syncing to block height (\d+) from peer").expect("valid regex")
});

static CHECKPOINTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fetching (?:set of )?checkpointed (?:cf)?headers (?:filters )?from height=(\d+)")
        .expect("valid regex")
});

static NEW_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)new block: height=(\d+)").expect("valid regex"));

fn height(pattern: &Regex, line: &str) -> Option<u64> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parser for neutrino-style light clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutrinoSyncParser;

impl SyncLogParser for NeutrinoSyncParser {
    fn progress(&self, lines: &[String]) -> SyncProgress {
        let mut current = 0;
        let mut target = 0;

        for line in lines.iter().rev() {
            if let Some(h) = height(&CAUGHT_UP, line) {
                return SyncProgress::new(h, h);
            }
            if current == 0 {
                if let Some(h) =
                    height(&CHECKPOINTED, line).or_else(|| height(&NEW_BLOCK, line))
                {
                    current = h;
                }
            }
            if target == 0 {
                if let Some(h) = height(&SYNCING_TO, line) {
                    target = h;
                }
            }
            if current != 0 && target != 0 {
                break;
            }
        }

        SyncProgress::new(current, target)
    }

    fn latest_block(&self, lines: &[String]) -> Option<u64> {
        lines.iter().rev().find_map(|line| height(&NEW_BLOCK, line))
    }
}
