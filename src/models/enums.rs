use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(UserRole {
    Patient => "patient",
    Caregiver => "caregiver",
    Doctor => "doctor",
});

// Non-patient side of a care link.
str_enum!(CareRole {
    Caregiver => "caregiver",
    Doctor => "doctor",
});

str_enum!(DoseStatus {
    Pending => "pending",
    Taken => "taken",
    Missed => "missed",
    Skipped => "skipped",
});

impl DoseStatus {
    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

str_enum!(AlertType {
    MissedThreeTimes => "missed_3_times",
    LowStock => "low_stock",
    LowAdherence => "low_adherence",
});

str_enum!(AlertSeverity {
    Warning => "warning",
    Critical => "critical",
});

impl AlertSeverity {
    /// Sort rank: lower sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Warning => 1,
        }
    }
}

str_enum!(TrendDirection {
    Improving => "improving",
    Declining => "declining",
    Stable => "stable",
});

str_enum!(TimePeriod {
    Morning => "Morning",
    Afternoon => "Afternoon",
    Evening => "Evening",
    Night => "Night",
    NoMisses => "None",
});

impl TimePeriod {
    /// Buckets in tie-break priority order.
    pub const BUCKETS: [TimePeriod; 4] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
        TimePeriod::Night,
    ];

    /// Bucket for an hour of day: Morning [6,12), Afternoon [12,18),
    /// Evening [18,24), Night [0,6).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=23 => Self::Evening,
            _ => Self::Night,
        }
    }
}
