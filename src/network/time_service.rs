use alloc::string::{String, ToString};
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::{Error, Result};

const TIME_SERVICE: &str = "https://io.adafruit.com/api/v2/";
// %Y-%m-%d %H:%M:%S.%L %j %u %z %Z, already URL-encoded.
const TIME_SERVICE_STRFTIME: &str =
    "&fmt=%25Y-%25m-%25d+%25H%3A%25M%3A%25S.%25L+%25j+%25u+%25z+%25Z";

/// Local time as reported by the Adafruit IO time service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalTime {
    /// Wall-clock date and time in the requested zone.
    pub datetime: PrimitiveDateTime,
    /// Day of the year, 1 to 366.
    pub year_day: u16,
    /// ISO day of the week, Monday = 1.
    pub week_day: u8,
}

/// URL of the time service for an Adafruit IO account.
///
/// ```rust
/// use matrix_portal::network::time_service_url;
///
/// let url = time_service_url("me", "k3y", Some("America/New_York"));
/// assert!(url.starts_with("https://io.adafruit.com/api/v2/me/integrations/time/strftime?x-aio-key=k3y&tz=America%2FNew_York&fmt="));
/// ```
#[must_use]
pub fn time_service_url(username: &str, key: &str, location: Option<&str>) -> String {
    let mut url = String::from(TIME_SERVICE);
    push_encoded(&mut url, username);
    url.push_str("/integrations/time/strftime?x-aio-key=");
    push_encoded(&mut url, key);
    if let Some(location) = location {
        url.push_str("&tz=");
        push_encoded(&mut url, location);
    }
    url.push_str(TIME_SERVICE_STRFTIME);
    url
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn push_encoded(url: &mut String, component: &str) {
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            url.push(char::from(byte));
        } else {
            url.push('%');
            url.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
            url.push(char::from(HEX_DIGITS[usize::from(byte & 0x0F)]));
        }
    }
}

/// Parse a reply such as `2024-03-09 14:05:33.120 069 6 -0500 EST`.
///
/// # Errors
///
/// Returns [`Error::TimeReply`] if a field is missing or out of range.
pub fn parse_time_reply(reply: &str) -> Result<LocalTime> {
    let bad_reply = || Error::TimeReply {
        reply: reply.to_string(),
    };
    let mut fields = reply.split_whitespace();
    let (Some(date), Some(clock), Some(year_day), Some(week_day)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(bad_reply());
    };

    let mut date_parts = date.splitn(3, '-');
    let year: i32 = parse_field(date_parts.next()).ok_or_else(bad_reply)?;
    let month: u8 = parse_field(date_parts.next()).ok_or_else(bad_reply)?;
    let day: u8 = parse_field(date_parts.next()).ok_or_else(bad_reply)?;

    let (clock, millis) = clock.split_once('.').unwrap_or((clock, "0"));
    let mut clock_parts = clock.splitn(3, ':');
    let hour: u8 = parse_field(clock_parts.next()).ok_or_else(bad_reply)?;
    let minute: u8 = parse_field(clock_parts.next()).ok_or_else(bad_reply)?;
    let second: u8 = parse_field(clock_parts.next()).ok_or_else(bad_reply)?;
    let millisecond: u16 = parse_field(Some(millis)).ok_or_else(bad_reply)?;

    let month = Month::try_from(month).map_err(|_| bad_reply())?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| bad_reply())?;
    let time = Time::from_hms_milli(hour, minute, second, millisecond).map_err(|_| bad_reply())?;

    Ok(LocalTime {
        datetime: PrimitiveDateTime::new(date, time),
        year_day: parse_field(Some(year_day)).ok_or_else(bad_reply)?,
        week_day: parse_field(Some(week_day)).ok_or_else(bad_reply)?,
    })
}

fn parse_field<T: core::str::FromStr>(field: Option<&str>) -> Option<T> {
    field.and_then(|field| field.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_without_location_lets_the_service_guess() {
        assert_eq!(
            time_service_url("user", "key", None),
            "https://io.adafruit.com/api/v2/user/integrations/time/strftime?x-aio-key=key\
             &fmt=%25Y-%25m-%25d+%25H%3A%25M%3A%25S.%25L+%25j+%25u+%25z+%25Z"
        );
    }

    #[test]
    fn location_is_percent_encoded() {
        let url = time_service_url("user", "key", Some("New York, US"));
        assert!(url.contains("&tz=New%20York%2C%20US&fmt="));
    }

    #[test]
    fn multibyte_location_is_encoded_per_byte() {
        let url = time_service_url("user", "key", Some("Europe/Zürich"));
        assert!(url.contains("&tz=Europe%2FZ%C3%BCrich&fmt="));
    }

    #[test]
    fn parses_strftime_reply() {
        let local = parse_time_reply("2024-03-09 14:05:33.120 069 6 -0500 EST\n")
            .expect("well-formed reply");
        assert_eq!(local.datetime.year(), 2024);
        assert_eq!(local.datetime.month(), Month::March);
        assert_eq!(local.datetime.day(), 9);
        assert_eq!(local.datetime.hour(), 14);
        assert_eq!(local.datetime.minute(), 5);
        assert_eq!(local.datetime.second(), 33);
        assert_eq!(local.datetime.millisecond(), 120);
        assert_eq!(local.year_day, 69);
        assert_eq!(local.week_day, 6);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_time_reply("nope"), Err(Error::TimeReply { .. })));
        assert!(matches!(
            parse_time_reply("2024-13-01 00:00:00.000 001 1"),
            Err(Error::TimeReply { .. })
        ));
        assert!(matches!(
            parse_time_reply("2024-01-01 25:00:00.000 001 1"),
            Err(Error::TimeReply { .. })
        ));
    }
}
