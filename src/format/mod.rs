//! Tar format constants, block arithmetic, and layout inspection.
//!
//! A tar archive is a sequence of 512-byte blocks: each entry is one header
//! block followed by its body rounded up to a whole number of blocks, and the
//! archive ends with two all-zero blocks.

mod exact;
mod layout;

pub(crate) use exact::ExactReader;
pub use layout::{ArchiveLayout, EntrySummary, inspect_layout, inspect_path, list_entries};

/// Size of one tar block in bytes.
pub const BLOCK_SIZE: u64 = 512;

/// Size of the end-of-archive trailer: two zero-filled blocks.
///
/// The merger strips exactly this many bytes from every fragment but the last.
pub const TRAILER_SIZE: u64 = 2 * BLOCK_SIZE;

/// Rounds `size` up to a whole number of blocks, saturating at `u64::MAX`.
pub fn padded_size(size: u64) -> u64 {
    size.div_ceil(BLOCK_SIZE).saturating_mul(BLOCK_SIZE)
}

/// On-disk footprint of an entry with a body of `size` bytes: header block
/// plus padded body.
pub fn entry_footprint(size: u64) -> u64 {
    BLOCK_SIZE.saturating_add(padded_size(size))
}

/// Returns true for header types that describe the entry that follows them
/// rather than an entry of their own (GNU long names, PAX records).
pub fn is_extension_header(entry_type: tar::EntryType) -> bool {
    matches!(
        entry_type,
        tar::EntryType::GNULongName
            | tar::EntryType::GNULongLink
            | tar::EntryType::XHeader
            | tar::EntryType::XGlobalHeader
    )
}
