//! Codec limits and tuning parameters.
//!
//! These values bound decoder recursion and the buffer pool that backs
//! encode output and decode scratch space.

// ============================================================================
// Decoding limits
// ============================================================================

/// Default maximum nesting depth of lists and dictionaries accepted by the decoder.
pub const MAX_DEPTH: usize = 64;

/// Upper bound on the up-front allocation made for a declared string length.
///
/// Longer strings still decode; their buffer grows as bytes actually arrive,
/// so a forged length prefix cannot force a huge allocation.
pub const STRING_PREALLOC_LIMIT: usize = 64 * 1024;

// ============================================================================
// Buffer pool
// ============================================================================

/// Number of idle buffers the shared pool keeps.
pub const BUFFER_POOL_SLOTS: usize = 64;

/// Initial capacity of a freshly allocated pool buffer.
pub const BUFFER_INITIAL_CAPACITY: usize = 1024;

/// Buffers that grew past this capacity are dropped instead of pooled.
pub const BUFFER_MAX_POOLED_CAPACITY: usize = 1024 * 1024;
