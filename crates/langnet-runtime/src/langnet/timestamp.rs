use chrono::{DateTime, Utc};
use langnet_core::{MessageValue, RuntimeError};

use crate::fields::FieldReader;
use crate::message::Message;

/// Seconds and nanoseconds since the Unix epoch, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    pub seconds: i64,
    /// Always in `0..1_000_000_000` for timestamps built from a `DateTime`.
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    /// `None` when `nanos` is out of range or the instant is not
    /// representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::from_timestamp(self.seconds, nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            // Below one billion, so it always fits.
            nanos: dt.timestamp_subsec_nanos() as i32,
        }
    }
}

impl Message for Timestamp {
    const NAME: &'static str = "Timestamp";

    fn to_value(&self) -> MessageValue {
        MessageValue::new(Self::NAME)
            .with("seconds", self.seconds)
            .with("nanos", self.nanos)
    }

    fn from_value(value: &MessageValue) -> Result<Self, RuntimeError> {
        let f = FieldReader::new::<Self>(value)?;
        Ok(Self {
            seconds: f.int64("seconds")?,
            nanos: f.int32("nanos")?,
        })
    }
}
