// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Monotonic sequence numbers stamped on outbound requests so completions
/// can be matched against the latest request of their kind.
macro_rules! sequence_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }

            pub const fn next(self) -> Self {
                let next = self.0.saturating_add(1);
                if next == 0 { Self(1) } else { Self(next) }
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

sequence_id!(SearchTicket);
sequence_id!(PredictTicket);
sequence_id!(DescribeTicket);
sequence_id!(StreetViewTicket);
sequence_id!(HealthTicket);
sequence_id!(LocationEpoch);

#[cfg(test)]
mod tests {
    use super::{LocationEpoch, PredictTicket};

    #[test]
    fn next_advances_and_saturates() {
        assert_eq!(PredictTicket::default().next(), PredictTicket::new(1));
        assert_eq!(
            LocationEpoch::new(u64::MAX).next(),
            LocationEpoch::new(u64::MAX)
        );
    }
}
