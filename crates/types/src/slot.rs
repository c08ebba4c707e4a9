/// The fixed set of bookable slot labels, in clinic-day order.
///
/// Morning surgery runs 10:00–12:00, evening surgery 16:00–20:30, both in
/// half-hour steps. The labels are the wire and storage representation;
/// the ordering of this array is the canonical display order.
const SLOT_LABELS: [&str; 14] = [
    "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM", "12:00 PM", "04:00 PM", "04:30 PM",
    "05:00 PM", "05:30 PM", "06:00 PM", "06:30 PM", "07:00 PM", "07:30 PM", "08:00 PM",
];

/// Error returned when a string does not name one of the fixed slots.
#[derive(Debug, thiserror::Error)]
#[error("unknown time slot: {0}")]
pub struct SlotParseError(pub String);

/// One of the fixed labelled time intervals a doctor can be booked into
/// on a given date.
///
/// Internally an index into the canonical slot list, so ordering and
/// equality are cheap and a `TimeSlot` can never hold an unknown label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(u8);

impl TimeSlot {
    /// Number of bookable slots per doctor per day.
    pub const COUNT: usize = SLOT_LABELS.len();

    /// All slots in canonical order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        (0..Self::COUNT as u8).map(TimeSlot)
    }

    /// The display label, e.g. `"10:00 AM"`.
    pub fn label(self) -> &'static str {
        SLOT_LABELS[self.0 as usize]
    }

    /// Parses a label into a slot, rejecting anything outside the fixed set.
    pub fn parse(label: &str) -> Result<Self, SlotParseError> {
        SLOT_LABELS
            .iter()
            .position(|&l| l == label)
            .map(|i| TimeSlot(i as u8))
            .ok_or_else(|| SlotParseError(label.to_owned()))
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TimeSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeSlot::parse(s)
    }
}

impl serde::Serialize for TimeSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for TimeSlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TimeSlot::parse(&s).map_err(serde::de::Error::custom)
    }
}
