//! Worker count selection.

pub const MIB: u64 = 1024 * 1024;
pub const GIB: u64 = 1024 * MIB;

/// Step function of the object size: below ~5 MiB the cost of extra
/// connections outweighs the gain.
pub fn heuristic_worker_count(total_size: u64) -> usize {
    match total_size {
        s if s < 5 * MIB => 1,
        s if s < 100 * MIB => 4,
        s if s < GIB => 8,
        _ => 16,
    }
}

/// Resolves the number of chunks for a transfer.
///
/// A non-zero `requested` always wins over the heuristic. The result is then
/// clamped to `total_size` so that no chunk is empty, and is never below 1.
pub fn resolve_worker_count(total_size: u64, requested: usize) -> usize {
    let workers = if requested > 0 {
        requested
    } else {
        heuristic_worker_count(total_size)
    };
    let cap = usize::try_from(total_size).unwrap_or(usize::MAX);
    workers.min(cap).max(1)
}
