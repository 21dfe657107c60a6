use time::OffsetDateTime;

/// Source of creation and completion stamps.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Clock;
    use std::cell::Cell;
    use time::{Duration, OffsetDateTime};

    /// Advances by a fixed step on every read.
    pub struct SteppingClock {
        next: Cell<OffsetDateTime>,
        step: Duration,
    }

    impl SteppingClock {
        pub fn new(start: OffsetDateTime, step: Duration) -> Self {
            Self {
                next: Cell::new(start),
                step,
            }
        }

        pub fn starting_2025() -> Self {
            Self::new(
                OffsetDateTime::UNIX_EPOCH + Duration::days(20_089),
                Duration::seconds(1),
            )
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> OffsetDateTime {
            let current = self.next.get();
            self.next.set(current + self.step);
            current
        }
    }
}
