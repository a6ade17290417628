use crate::ports::storage::TimeSource;

/// Default time source, stamping records with wall-clock seconds.
///
/// Mirrors the teacher's `SystemTimeSource`
/// (`qc-02-block-storage/src/adapters/infra/time.rs`).
#[derive(Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
