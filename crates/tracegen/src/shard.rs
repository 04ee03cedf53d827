//! Output sharding.
//!
//! Covering paths are split into contiguous chunks, one generated file each.
//! Chunk sizes differ by at most one, larger chunks first, so test numbering
//! stays monotonic across files.

use crate::error::{TracegenError, TracegenResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One shard out of a fixed total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Current shard index (1-based)
    pub current: usize,
    /// Total number of shards
    pub total: usize,
}

impl ShardConfig {
    /// Create a shard configuration.
    pub fn new(current: usize, total: usize) -> TracegenResult<Self> {
        if total == 0 {
            return Err(TracegenError::config("shard total must be greater than 0"));
        }
        if current == 0 || current > total {
            return Err(TracegenError::config(format!(
                "shard {current} is outside 1..={total}"
            )));
        }
        Ok(Self { current, total })
    }

    /// Parse the CLI form `N/M`.
    pub fn parse(s: &str) -> TracegenResult<Self> {
        let (current, total) = s
            .split_once('/')
            .ok_or_else(|| TracegenError::config(format!("invalid shard '{s}', expected N/M")))?;
        let number = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| TracegenError::config(format!("invalid shard number '{part}'")))
        };
        Self::new(number(current)?, number(total)?)
    }

    /// Item range of this shard in a list of `len` items.
    #[must_use]
    pub fn range(&self, len: usize) -> Range<usize> {
        let base = len / self.total;
        let remainder = len % self.total;
        let i = self.current - 1;
        let start = i * base + i.min(remainder);
        let end = start + self.estimated_count(len);
        start..end
    }

    /// Items this shard receives out of `len`.
    #[must_use]
    pub fn estimated_count(&self, len: usize) -> usize {
        let base = len / self.total;
        let remainder = len % self.total;
        if self.current <= remainder {
            base + 1
        } else {
            base
        }
    }
}

/// Split `items` into `shards` contiguous chunks, larger chunks first.
pub fn split_even<T>(items: &[T], shards: usize) -> TracegenResult<Vec<&[T]>> {
    if shards == 0 {
        return Err(TracegenError::config("shard count must be greater than 0"));
    }
    let len = items.len();
    Ok((1..=shards)
        .map(|current| &items[ShardConfig { current, total: shards }.range(len)])
        .collect())
}
