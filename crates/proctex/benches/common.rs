use std::time::Duration;

use criterion::{Criterion, Throughput};

pub const SAMPLE_SIZE: usize = 15;
pub const WARM_UP: Duration = Duration::from_millis(500);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(3);

/// Criterion tuned for whole-pass benchmarks, which are slow per iteration.
pub fn pass_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

/// Throughput in pixels per node buffer at `resolution`.
pub fn pixel_throughput(resolution: u32) -> Throughput {
    let side = u64::from(resolution.max(1));
    Throughput::Elements(side * side)
}
