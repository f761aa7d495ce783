use crate::dates::parse_timestamp;
use chrono::{DateTime, FixedOffset, Local, Utc};
use std::{env, io};

/// Source of "now" for the service. Calendar dates are evaluated in the
/// offset of the instant it returns.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Wall clock, in the given offset or the host's local one.
    System { offset: Option<FixedOffset> },
    Fixed(DateTime<FixedOffset>),
}

impl Clock {
    pub fn now(&self) -> DateTime<FixedOffset> {
        match self {
            Clock::System { offset: Some(offset) } => Utc::now().with_timezone(offset),
            Clock::System { offset: None } => Local::now().fixed_offset(),
            Clock::Fixed(instant) => *instant,
        }
    }

    /// Reads `APP_NOW` and `APP_UTC_OFFSET`. A frozen `APP_NOW` wins, and
    /// is shifted into `APP_UTC_OFFSET` when both are set.
    pub fn from_env() -> Result<Self, io::Error> {
        let offset = match env::var("APP_UTC_OFFSET") {
            Ok(raw) => Some(raw.trim().parse::<FixedOffset>().map_err(|err| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid APP_UTC_OFFSET {raw:?}: {err}"),
                )
            })?),
            Err(_) => None,
        };

        match env::var("APP_NOW") {
            Ok(raw) => {
                let instant = parse_timestamp(&raw).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid APP_NOW {raw:?}"))
                })?;
                let instant = match offset {
                    Some(offset) => instant.with_timezone(&offset),
                    None => instant,
                };
                Ok(Clock::Fixed(instant))
            }
            Err(_) => Ok(Clock::System { offset }),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::System { offset: None }
    }
}
