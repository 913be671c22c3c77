//! Resolving the configured timezone into offsets and local dates.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Today's date in `canonical_timezone`, used as the default for new records.
pub fn local_today(canonical_timezone: &str) -> Result<Date, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(canonical_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{get_local_offset, local_today};

    #[test]
    fn utc_has_zero_offset() {
        let offset = get_local_offset("Etc/UTC").expect("Could not get UTC offset");

        assert!(offset.is_utc());
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            local_today("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }
}
