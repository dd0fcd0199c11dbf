//! IPv4 and CIDR arithmetic.
//!
//! Addresses are handled as `u32` so range membership and exclusion checks
//! are plain integer comparisons.

use serde::Serialize;
use std::fmt;

/// Convert a dotted-quad string to an integer.
///
/// Octets are folded as `acc * 256 + octet` with unsigned wraparound. An octet
/// that is not a number in `0..=255` counts as zero; this never fails.
///
/// # Examples
/// ```
/// use range42::ip::ip_to_integer;
///
/// assert_eq!(ip_to_integer("192.168.1.10"), 0xC0A8_010A);
/// assert_eq!(ip_to_integer("10.x.0.1"), 0x0A00_0001);
/// ```
pub fn ip_to_integer(dotted: &str) -> u32 {
    dotted.split('.').fold(0u32, |acc, octet| {
        let value = octet.trim().parse::<u8>().unwrap_or(0);
        acc.wrapping_mul(256).wrapping_add(u32::from(value))
    })
}

/// Convert an integer back to dotted-quad notation.
pub fn integer_to_ip(value: u32) -> String {
    [24, 16, 8, 0]
        .iter()
        .map(|shift| ((value >> shift) & 0xFF).to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// A parsed CIDR block with its derived boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CidrBlock {
    /// Address part exactly as written, e.g. `192.168.1.7` in `192.168.1.7/24`
    pub base_address: String,
    pub mask_bits: u8,
    pub network_address: u32,
    pub broadcast_address: u32,
    pub first_usable_address: u32,
    pub last_usable_address: u32,
}

impl CidrBlock {
    /// Netmask as an integer
    pub fn mask(&self) -> u32 {
        mask_for(self.mask_bits)
    }

    /// Whether `address` lies within the usable host range
    pub fn contains_usable(&self, address: u32) -> bool {
        address >= self.first_usable_address && address <= self.last_usable_address
    }

    /// Number of usable host addresses
    pub fn usable_count(&self) -> u64 {
        u64::from(self.last_usable_address) - u64::from(self.first_usable_address) + 1
    }

    pub fn network(&self) -> String {
        integer_to_ip(self.network_address)
    }

    pub fn netmask(&self) -> String {
        integer_to_ip(self.mask())
    }

    pub fn broadcast(&self) -> String {
        integer_to_ip(self.broadcast_address)
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", integer_to_ip(self.network_address), self.mask_bits)
    }
}

fn mask_for(bits: u8) -> u32 {
    if bits == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(bits))
    }
}

/// Parse a `a.b.c.d/n` string.
///
/// Returns `None` when there is no `/` or the mask is not an integer in
/// `0..=32`. For /31 and /32 blocks both usable bounds are the network address.
///
/// # Examples
/// ```
/// use range42::ip::{integer_to_ip, parse_cidr};
///
/// let block = parse_cidr("192.168.1.0/24").unwrap();
/// assert_eq!(integer_to_ip(block.first_usable_address), "192.168.1.1");
/// assert!(parse_cidr("192.168.1.0").is_none());
/// ```
pub fn parse_cidr(cidr: &str) -> Option<CidrBlock> {
    let (base, mask) = cidr.trim().split_once('/')?;
    let mask_bits = mask.trim().parse::<u8>().ok().filter(|bits| *bits <= 32)?;

    let mask = mask_for(mask_bits);
    let network = ip_to_integer(base) & mask;
    let broadcast = network | !mask;
    let (first_usable, last_usable) = if mask_bits >= 31 {
        (network, network)
    } else {
        (network + 1, broadcast - 1)
    };

    Some(CidrBlock {
        base_address: base.trim().to_string(),
        mask_bits,
        network_address: network,
        broadcast_address: broadcast,
        first_usable_address: first_usable,
        last_usable_address: last_usable,
    })
}
