//! IP address planning primitives.
//!
//! This module provides CIDR arithmetic on integer addresses and the lazy
//! host address sequence the rule engine allocates static addresses from.

pub mod allocator;
pub mod cidr;

// Re-export commonly used types
pub use allocator::{host_sequence, HostSequence, HostSequenceOptions};
pub use cidr::{integer_to_ip, ip_to_integer, parse_cidr, CidrBlock};
