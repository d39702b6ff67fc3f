// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP-date formatting and parsing

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const IMF_FIXDATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC_850: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME: &str = "%a %b %e %H:%M:%S %Y";

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format(time: DateTime<Utc>) -> String {
    time.format(IMF_FIXDATE).to_string()
}

/// Parse any of the three HTTP-date forms
///
/// Returns `None` for values that are not valid dates; callers treat such
/// headers as absent.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    [RFC_850, ASCTIME]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}
