// nn_support - Cancellation, timing, and cache infrastructure
pub mod cancel;
pub mod expiring;
pub mod timing;

pub use cancel::{CancellationToken, Cancelled};
pub use expiring::{CacheTimeout, ExpiringCache};
pub use timing::{TimingEntry, TimingReport, TimingSet};
