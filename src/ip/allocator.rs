//! Lazy host address iteration.
//!
//! `HostSequence` walks the usable range of a CIDR block in ascending order,
//! skipping reserved addresses. It is a single forward cursor: it never
//! restarts and only materializes an address when asked for the next one.

use super::cidr::CidrBlock;
use std::collections::HashSet;

/// Options for `host_sequence`
#[derive(Debug, Clone, Default)]
pub struct HostSequenceOptions {
    /// Addresses that must never be handed out
    pub skip: HashSet<u32>,
    /// Lowest address to consider; clamped to the first usable address
    pub start_from: Option<u32>,
}

/// Forward-only iterator over free usable addresses of a block
#[derive(Debug, Clone)]
pub struct HostSequence {
    // u64 so the cursor can step past 255.255.255.255 without wrapping
    cursor: u64,
    last: u64,
    skip: HashSet<u32>,
}

/// Start iterating the usable addresses of `block`.
///
/// # Examples
/// ```
/// use range42::ip::{host_sequence, integer_to_ip, ip_to_integer, parse_cidr, HostSequenceOptions};
///
/// let block = parse_cidr("10.0.0.0/29").unwrap();
/// let options = HostSequenceOptions {
///     skip: [ip_to_integer("10.0.0.2")].into_iter().collect(),
///     start_from: None,
/// };
/// let hosts: Vec<String> = host_sequence(&block, options).map(integer_to_ip).collect();
/// assert_eq!(hosts, ["10.0.0.1", "10.0.0.3", "10.0.0.4", "10.0.0.5", "10.0.0.6"]);
/// ```
pub fn host_sequence(block: &CidrBlock, options: HostSequenceOptions) -> HostSequence {
    let first = match options.start_from {
        Some(start) => start.max(block.first_usable_address),
        None => block.first_usable_address,
    };

    HostSequence {
        cursor: u64::from(first),
        last: u64::from(block.last_usable_address),
        skip: options.skip,
    }
}

impl HostSequence {
    /// Whether every address has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.cursor > self.last
    }
}

impl Iterator for HostSequence {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.cursor <= self.last {
            let candidate = self.cursor as u32;
            self.cursor += 1;
            if !self.skip.contains(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.last + 1).saturating_sub(self.cursor);
        (0, usize::try_from(remaining).ok())
    }
}

impl std::iter::FusedIterator for HostSequence {}
