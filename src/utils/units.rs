//! Size unit parsing utilities.
//!
//! This module converts human formatted memory sizes from VM configuration
//! (e.g. "4GB") into the megabyte values Proxmox expects.

/// Memory assigned to a VM when its configured size is missing or unreadable
pub const DEFAULT_MEMORY_MB: u64 = 2048;

/// Parse a memory size into megabytes
///
/// Every non-digit character is stripped and the remaining number is read as
/// gigabytes, so "4GB", "4 GiB" and "4" all mean 4096 MB.
///
/// # Arguments
/// * `memory` - The configured memory string
///
/// # Returns
/// * `Some(u64)` - Megabytes if a positive number was found
/// * `None` - If no digits remain or the value is zero
///
/// # Examples
/// ```
/// use range42::utils::units::parse_memory_mb;
///
/// assert_eq!(parse_memory_mb("4GB"), Some(4096));
/// assert_eq!(parse_memory_mb("lots"), None);
/// ```
pub fn parse_memory_mb(memory: &str) -> Option<u64> {
    let digits: String = memory.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .ok()
        .filter(|gigabytes| *gigabytes > 0)
        .and_then(|gigabytes| gigabytes.checked_mul(1024))
}

/// Memory in megabytes for an optional configured size, with the default applied
pub fn memory_mb_or_default(memory: Option<&str>) -> u64 {
    memory.and_then(parse_memory_mb).unwrap_or(DEFAULT_MEMORY_MB)
}
