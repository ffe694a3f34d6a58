//-
// Copyright (c) 2026, the Msgtrawl authors
//
// This file is part of Msgtrawl.
//
// Msgtrawl is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Msgtrawl is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Msgtrawl. If not, see <http://www.gnu.org/licenses/>.

//! Conversions from the Windows time representations found in MAPI data.

use std::convert::TryFrom;

use chrono::prelude::*;

/// 100ns ticks between 1601-01-01 and the UNIX epoch.
const FILETIME_UNIX_EPOCH: i128 = 116_444_736_000_000_000;

/// Convert a `FILETIME` split into its two 32-bit halves.
///
/// Sub-millisecond precision is truncated. Returns `None` if the value is
/// outside what `chrono` can represent.
pub fn filetime_to_datetime(low: u32, high: u32) -> Option<DateTime<Utc>> {
    let ticks = (i128::from(high) << 32) + i128::from(low);
    let millis = i64::try_from((ticks - FILETIME_UNIX_EPOCH) / 10_000).ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// The inverse of `filetime_to_datetime`, at millisecond precision.
pub fn datetime_to_filetime(dt: DateTime<Utc>) -> u64 {
    let ticks =
        i128::from(dt.timestamp_millis()) * 10_000 + FILETIME_UNIX_EPOCH;
    u64::try_from(ticks).unwrap_or(0)
}

/// Convert a count of minutes since 1601-01-01 (as used by recurrence
/// patterns) to a date and time.
pub fn minutes_to_datetime(minutes: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1601, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(chrono::Duration::minutes(i64::from(minutes)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filetime_epoch_and_back() {
        let epoch = FILETIME_UNIX_EPOCH as u64;
        assert_eq!(
            0,
            filetime_to_datetime(epoch as u32, (epoch >> 32) as u32)
                .unwrap()
                .timestamp_millis()
        );

        let dt = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();
        let ft = datetime_to_filetime(dt);
        assert_eq!(
            Some(dt),
            filetime_to_datetime(ft as u32, (ft >> 32) as u32)
        );
    }

    #[test]
    fn recurrence_minutes() {
        assert_eq!(
            NaiveDate::from_ymd_opt(1601, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0),
            minutes_to_datetime(24 * 60)
        );
        // 0x5AE980E0 is a typical "no end date" marker, 4500-08-31
        assert_eq!(
            4500,
            minutes_to_datetime(0x5AE9_80DF).unwrap().year()
        );
    }
}
