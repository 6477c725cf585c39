/// Handle to a registered state-change callback.
///
/// Returned when subscribing, and used to unsubscribe again.
/// Handles are never reused within one handler table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct SubscriptionId(u32);

impl SubscriptionId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw number, as handed to JavaScript.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The next handle after this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
