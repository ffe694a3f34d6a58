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

//! Time zone descriptions attached to calendar items.
//!
//! Two layouts exist: the full definition with a list of rules
//! (`PidLidAppointmentTimeZoneDefinitionStartDisplay` and friends), and the
//! single registry-style rule (`PidLidTimeZoneStruct`).

use bitflags::bitflags;
use byteorder::LittleEndian;
use chrono::{NaiveDate, NaiveDateTime};

use crate::support::cursor::ByteCursor;
use crate::support::error::Error;

const DEFINITION_MAJOR_VERSION: u8 = 2;
const RULE_MAJOR_VERSION: u8 = 2;
/// Size of the fixed part of a rule following its `reserved` field.
const RULE_BODY_SIZE: usize = 62;

bitflags! {
    pub struct DefinitionFlags: u16 {
        const VALID_GUID = 0x0001;
        const VALID_KEYNAME = 0x0002;
    }
}

bitflags! {
    pub struct RuleFlags: u16 {
        /// The rule recurs for the current registry definition.
        const RECUR_CURRENT_TZREG = 0x0001;
        /// The rule is the one currently in effect.
        const EFFECTIVE_TZREG = 0x0002;
    }
}

/// When a switch between standard and daylight time happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionTime {
    /// The zone does not observe this transition.
    None,
    /// Happens every year on the `occurrence`th `day_of_week` of `month`,
    /// with 5 meaning the last one.
    Floating {
        month: u16,
        day_of_week: u16,
        occurrence: u16,
        hour: u16,
        minute: u16,
        second: u16,
    },
    /// Happens exactly once.
    Absolute(NaiveDateTime),
}

impl TransitionTime {
    /// Read a `SYSTEMTIME` structure.
    fn read(c: &mut ByteCursor<'_>) -> Result<Self, Error> {
        let mut fields = [0u16; 8];
        for field in &mut fields {
            *field = c.read_u16::<LittleEndian>()?;
        }
        let [year, month, day_of_week, day, hour, minute, second, millis] =
            fields;

        if 0 == month {
            return Ok(TransitionTime::None);
        }

        if 0 == year {
            return Ok(TransitionTime::Floating {
                month,
                day_of_week,
                occurrence: day,
                hour,
                minute,
                second,
            });
        }

        let date = NaiveDate::from_ymd_opt(
            i32::from(year),
            u32::from(month),
            u32::from(day),
        );
        date.and_then(|date| {
            date.and_hms_milli_opt(
                u32::from(hour),
                u32::from(minute),
                u32::from(second),
                u32::from(millis),
            )
        })
        .map(TransitionTime::Absolute)
        .ok_or(Error::UnknownValue {
            what: "transition date",
            value: (u32::from(year) << 16)
                | (u32::from(month) << 8)
                | u32::from(day),
        })
    }
}

/// One period of a time zone's history.
///
/// Biases are in minutes and follow the Windows convention of
/// `UTC = local + bias`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeZoneRule {
    pub flags: RuleFlags,
    /// The first year this rule applies to.
    pub year: u16,
    pub bias: i32,
    pub standard_bias: i32,
    pub daylight_bias: i32,
    pub standard_date: TransitionTime,
    pub daylight_date: TransitionTime,
}

impl TimeZoneRule {
    /// Parse a registry-style rule (`TZREG`), as found in
    /// `PidLidTimeZoneStruct`.
    ///
    /// This layout has no flags and carries the year twice; the standard
    /// year is used.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut c = ByteCursor::new(data);
        let bias = c.read_i32::<LittleEndian>()?;
        let standard_bias = c.read_i32::<LittleEndian>()?;
        let daylight_bias = c.read_i32::<LittleEndian>()?;
        let year = c.read_u16::<LittleEndian>()?;
        let standard_date = TransitionTime::read(&mut c)?;
        // Daylight year
        c.skip(2)?;
        let daylight_date = TransitionTime::read(&mut c)?;

        Ok(TimeZoneRule {
            flags: RuleFlags::empty(),
            year,
            bias,
            standard_bias,
            daylight_bias,
            standard_date,
            daylight_date,
        })
    }

    /// Read one `TZRULE` of a time zone definition.
    fn read(c: &mut ByteCursor<'_>) -> Result<Self, Error> {
        let major = c.read_u8()?;
        if RULE_MAJOR_VERSION != major {
            return Err(Error::UnsupportedVersion {
                what: "time zone rule",
                version: u32::from(major),
            });
        }
        // Minor version
        c.skip(1)?;
        let size = usize::from(c.read_u16::<LittleEndian>()?);
        if size < RULE_BODY_SIZE {
            return Err(Error::LengthMismatch("time zone rule"));
        }
        let body_start = c.position();

        let flags =
            RuleFlags::from_bits_truncate(c.read_u16::<LittleEndian>()?);
        let year = c.read_u16::<LittleEndian>()?;
        c.skip(14)?;
        let bias = c.read_i32::<LittleEndian>()?;
        let standard_bias = c.read_i32::<LittleEndian>()?;
        let daylight_bias = c.read_i32::<LittleEndian>()?;
        let standard_date = TransitionTime::read(c)?;
        let daylight_date = TransitionTime::read(c)?;

        // Anything a later minor version appended
        c.skip(body_start + size - c.position())?;

        Ok(TimeZoneRule {
            flags,
            year,
            bias,
            standard_bias,
            daylight_bias,
            standard_date,
            daylight_date,
        })
    }

    /// Whether this rule observes daylight saving time at all.
    pub fn has_daylight_time(&self) -> bool {
        TransitionTime::None != self.daylight_date
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeZoneDefinition {
    pub flags: DefinitionFlags,
    pub guid: Option<[u8; 16]>,
    /// The Windows registry name of the zone, e.g. "Pacific Standard Time".
    pub key_name: Option<String>,
    pub rules: Vec<TimeZoneRule>,
}

impl TimeZoneDefinition {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut c = ByteCursor::new(data);
        let major = c.read_u8()?;
        if DEFINITION_MAJOR_VERSION != major {
            return Err(Error::UnsupportedVersion {
                what: "time zone definition",
                version: u32::from(major),
            });
        }
        // Minor version
        c.skip(1)?;
        let header_size = usize::from(c.read_u16::<LittleEndian>()?);
        let header_start = c.position();

        let flags =
            DefinitionFlags::from_bits_truncate(c.read_u16::<LittleEndian>()?);
        let guid = if flags.contains(DefinitionFlags::VALID_GUID) {
            let mut guid = [0u8; 16];
            guid.copy_from_slice(c.read_bytes(16)?);
            Some(guid)
        } else {
            None
        };
        let key_name = if flags.contains(DefinitionFlags::VALID_KEYNAME) {
            let len = c.read_u16::<LittleEndian>()?;
            Some(c.read_utf16_string(usize::from(len))?)
        } else {
            None
        };
        let rule_count = c.read_u16::<LittleEndian>()?;

        let header_end = header_start + header_size;
        if c.position() > header_end {
            return Err(Error::LengthMismatch("time zone definition header"));
        }
        c.seek(header_end);

        let rules = (0..rule_count)
            .map(|_| TimeZoneRule::read(&mut c))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(TimeZoneDefinition {
            flags,
            guid,
            key_name,
            rules,
        })
    }

    /// The rule currently in effect, if any is marked as such.
    pub fn effective_rule(&self) -> Option<&TimeZoneRule> {
        self.rules
            .iter()
            .find(|r| r.flags.contains(RuleFlags::EFFECTIVE_TZREG))
    }
}
