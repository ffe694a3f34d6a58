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

//! Recurrence patterns (`PidLidAppointmentRecur` and friends).
//!
//! All dates are minutes since 1601-01-01 on the wire and are converted to
//! naive local date-times; the time zone is described separately.

use bitflags::bitflags;
use byteorder::LittleEndian;
use chrono::NaiveDateTime;

use crate::support::codepage::DEFAULT_ANSI;
use crate::support::cursor::ByteCursor;
use crate::support::error::Error;
use crate::support::wintime::minutes_to_datetime;

const PATTERN_VERSION: u16 = 0x3004;
const APPOINTMENT_VERSION: u32 = 0x3006;
/// Writer version from which extended exceptions carry a change highlight.
const CHANGE_HIGHLIGHT_VERSION: u32 = 0x3009;

bitflags! {
    pub struct DaysOfWeek: u32 {
        const SUNDAY = 0x01;
        const MONDAY = 0x02;
        const TUESDAY = 0x04;
        const WEDNESDAY = 0x08;
        const THURSDAY = 0x10;
        const FRIDAY = 0x20;
        const SATURDAY = 0x40;
    }
}

bitflags! {
    /// Which fields of an exception differ from the series.
    pub struct OverrideFlags: u16 {
        const SUBJECT = 0x0001;
        const MEETINGTYPE = 0x0002;
        const REMINDERDELTA = 0x0004;
        const REMINDER = 0x0008;
        const LOCATION = 0x0010;
        const BUSYSTATUS = 0x0020;
        const ATTACHMENT = 0x0040;
        const SUBTYPE = 0x0080;
        const APPTCOLOR = 0x0100;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn from_raw(raw: u16) -> Result<Self, Error> {
        match raw {
            0x200A => Ok(Frequency::Daily),
            0x200B => Ok(Frequency::Weekly),
            0x200C => Ok(Frequency::Monthly),
            0x200D => Ok(Frequency::Yearly),
            _ => Err(Error::UnknownValue {
                what: "recurrence frequency",
                value: u32::from(raw),
            }),
        }
    }
}

/// The pattern type together with its type-specific data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternType {
    Day,
    Week(DaysOfWeek),
    /// Day of month.
    Month(u32),
    /// The `nth` (1..=4, 5 meaning last) of the given days.
    MonthNth { days: DaysOfWeek, nth: u32 },
    MonthEnd(u32),
    HjMonth(u32),
    HjMonthNth { days: DaysOfWeek, nth: u32 },
    HjMonthEnd(u32),
}

impl PatternType {
    fn read(c: &mut ByteCursor<'_>, raw: u16) -> Result<Self, Error> {
        Ok(match raw {
            0x0000 => PatternType::Day,
            0x0001 => PatternType::Week(read_days(c)?),
            0x0002 => PatternType::Month(c.read_u32::<LittleEndian>()?),
            0x0003 => PatternType::MonthNth {
                days: read_days(c)?,
                nth: c.read_u32::<LittleEndian>()?,
            },
            0x0004 => PatternType::MonthEnd(c.read_u32::<LittleEndian>()?),
            0x000A => PatternType::HjMonth(c.read_u32::<LittleEndian>()?),
            0x000B => PatternType::HjMonthNth {
                days: read_days(c)?,
                nth: c.read_u32::<LittleEndian>()?,
            },
            0x000C => PatternType::HjMonthEnd(c.read_u32::<LittleEndian>()?),
            _ => {
                return Err(Error::UnknownValue {
                    what: "recurrence pattern type",
                    value: u32::from(raw),
                })
            }
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndType {
    AfterDate,
    AfterOccurrences,
    Never,
}

impl EndType {
    fn from_raw(raw: u32) -> Result<Self, Error> {
        match raw {
            0x0000_2021 => Ok(EndType::AfterDate),
            0x0000_2022 => Ok(EndType::AfterOccurrences),
            0x0000_2023 | 0xFFFF_FFFF => Ok(EndType::Never),
            _ => Err(Error::UnknownValue {
                what: "recurrence end type",
                value: raw,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub pattern_type: PatternType,
    pub calendar_type: u16,
    /// Offset of the first occurrence within the period, in minutes (or in
    /// days or months depending on the frequency).
    pub first_date_time: u32,
    pub period: u32,
    pub sliding: bool,
    pub end_type: EndType,
    pub occurrence_count: u32,
    pub first_day_of_week: u32,
    pub deleted_instances: Vec<NaiveDateTime>,
    pub modified_instances: Vec<NaiveDateTime>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

impl RecurrencePattern {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        Self::read(&mut ByteCursor::new(data))
    }

    fn read(c: &mut ByteCursor<'_>) -> Result<Self, Error> {
        for &what in &["recurrence reader", "recurrence writer"] {
            let version = c.read_u16::<LittleEndian>()?;
            if PATTERN_VERSION != version {
                return Err(Error::UnsupportedVersion {
                    what,
                    version: u32::from(version),
                });
            }
        }

        let frequency = Frequency::from_raw(c.read_u16::<LittleEndian>()?)?;
        let raw_pattern_type = c.read_u16::<LittleEndian>()?;
        let calendar_type = c.read_u16::<LittleEndian>()?;
        let first_date_time = c.read_u32::<LittleEndian>()?;
        let period = c.read_u32::<LittleEndian>()?;
        let sliding = 0 != c.read_u32::<LittleEndian>()?;
        let pattern_type = PatternType::read(c, raw_pattern_type)?;
        let end_type = EndType::from_raw(c.read_u32::<LittleEndian>()?)?;
        let occurrence_count = c.read_u32::<LittleEndian>()?;
        let first_day_of_week = c.read_u32::<LittleEndian>()?;
        let deleted_instances = read_date_array(c)?;
        let modified_instances = read_date_array(c)?;
        let start_date = read_date(c)?;
        let end_date = read_date(c)?;

        Ok(RecurrencePattern {
            frequency,
            pattern_type,
            calendar_type,
            first_date_time,
            period,
            sliding,
            end_type,
            occurrence_count,
            first_day_of_week,
            deleted_instances,
            modified_instances,
            start_date,
            end_date,
        })
    }
}

/// One modified occurrence of an appointment series.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exception {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub original_start: Option<NaiveDateTime>,
    pub overrides: OverrideFlags,
    pub subject: Option<String>,
    pub meeting_type: Option<u32>,
    pub reminder_delta: Option<u32>,
    pub reminder_set: Option<bool>,
    pub location: Option<String>,
    pub busy_status: Option<u32>,
    pub attachment: Option<bool>,
    pub sub_type: Option<u32>,
    pub appointment_color: Option<u32>,
    pub change_highlight: Option<u32>,
}

impl Default for OverrideFlags {
    fn default() -> Self {
        OverrideFlags::empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppointmentRecurrence {
    pub pattern: RecurrencePattern,
    pub writer_version: u32,
    /// Minutes after midnight of each occurrence's start and end.
    pub start_time_offset: u32,
    pub end_time_offset: u32,
    pub exceptions: Vec<Exception>,
}

impl AppointmentRecurrence {
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut c = ByteCursor::new(data);
        let pattern = RecurrencePattern::read(&mut c)?;

        let reader_version = c.read_u32::<LittleEndian>()?;
        if APPOINTMENT_VERSION != reader_version {
            return Err(Error::UnsupportedVersion {
                what: "appointment recurrence reader",
                version: reader_version,
            });
        }
        let writer_version = c.read_u32::<LittleEndian>()?;
        if writer_version < APPOINTMENT_VERSION {
            return Err(Error::UnsupportedVersion {
                what: "appointment recurrence writer",
                version: writer_version,
            });
        }

        let start_time_offset = c.read_u32::<LittleEndian>()?;
        let end_time_offset = c.read_u32::<LittleEndian>()?;
        let exception_count = c.read_u16::<LittleEndian>()?;
        let mut exceptions = (0..exception_count)
            .map(|_| read_exception(&mut c))
            .collect::<Result<Vec<_>, Error>>()?;

        skip_reserved(&mut c, "appointment reserved block 1")?;

        for exception in &mut exceptions {
            read_extended_exception(&mut c, exception, writer_version)?;
        }

        skip_reserved(&mut c, "appointment reserved block 2")?;

        Ok(AppointmentRecurrence {
            pattern,
            writer_version,
            start_time_offset,
            end_time_offset,
            exceptions,
        })
    }
}

fn read_days(c: &mut ByteCursor<'_>) -> Result<DaysOfWeek, Error> {
    Ok(DaysOfWeek::from_bits_truncate(c.read_u32::<LittleEndian>()?))
}

fn read_date(c: &mut ByteCursor<'_>) -> Result<NaiveDateTime, Error> {
    let minutes = c.read_u32::<LittleEndian>()?;
    minutes_to_datetime(minutes).ok_or(Error::UnknownValue {
        what: "recurrence date",
        value: minutes,
    })
}

fn read_date_array(c: &mut ByteCursor<'_>) -> Result<Vec<NaiveDateTime>, Error> {
    let count = c.read_u32::<LittleEndian>()? as usize;
    // Each date is 4 bytes; refuse counts the buffer can't possibly hold
    // before allocating for them.
    if count > c.remaining() / 4 {
        return Err(Error::UnexpectedEnd);
    }
    (0..count).map(|_| read_date(c)).collect()
}

/// Read a size-prefixed reserved block which must be empty.
fn skip_reserved(c: &mut ByteCursor<'_>, what: &'static str) -> Result<(), Error> {
    if 0 != c.read_u32::<LittleEndian>()? {
        return Err(Error::ReservedNotZero(what));
    }
    Ok(())
}

/// Read an 8-bit string stored as `len`, `len - 1`, then `len - 1` bytes.
fn read_paired_string(
    c: &mut ByteCursor<'_>,
    what: &'static str,
) -> Result<String, Error> {
    let len = c.read_u16::<LittleEndian>()?;
    let len2 = c.read_u16::<LittleEndian>()?;
    if u32::from(len2) + 1 != u32::from(len) {
        return Err(Error::LengthMismatch(what));
    }
    c.read_fixed_string(usize::from(len2), DEFAULT_ANSI)
}

fn read_exception(c: &mut ByteCursor<'_>) -> Result<Exception, Error> {
    let mut ex = Exception {
        start: Some(read_date(c)?),
        end: Some(read_date(c)?),
        original_start: Some(read_date(c)?),
        overrides: OverrideFlags::from_bits_truncate(
            c.read_u16::<LittleEndian>()?,
        ),
        ..Exception::default()
    };

    let flags = ex.overrides;
    if flags.contains(OverrideFlags::SUBJECT) {
        ex.subject = Some(read_paired_string(c, "exception subject")?);
    }
    if flags.contains(OverrideFlags::MEETINGTYPE) {
        ex.meeting_type = Some(c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::REMINDERDELTA) {
        ex.reminder_delta = Some(c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::REMINDER) {
        ex.reminder_set = Some(0 != c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::LOCATION) {
        ex.location = Some(read_paired_string(c, "exception location")?);
    }
    if flags.contains(OverrideFlags::BUSYSTATUS) {
        ex.busy_status = Some(c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::ATTACHMENT) {
        ex.attachment = Some(0 != c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::SUBTYPE) {
        ex.sub_type = Some(c.read_u32::<LittleEndian>()?);
    }
    if flags.contains(OverrideFlags::APPTCOLOR) {
        ex.appointment_color = Some(c.read_u32::<LittleEndian>()?);
    }

    Ok(ex)
}

/// Read the extended part of `ex`, which replaces the 8-bit subject and
/// location with their UTF-16 forms.
fn read_extended_exception(
    c: &mut ByteCursor<'_>,
    ex: &mut Exception,
    writer_version: u32,
) -> Result<(), Error> {
    if writer_version >= CHANGE_HIGHLIGHT_VERSION {
        let size = c.read_u32::<LittleEndian>()? as usize;
        if size < 4 {
            return Err(Error::LengthMismatch("change highlight"));
        }
        ex.change_highlight = Some(c.read_u32::<LittleEndian>()?);
        c.skip(size - 4)?;
    }

    skip_reserved(c, "extended exception reserved block 1")?;

    let wide = ex
        .overrides
        .intersects(OverrideFlags::SUBJECT | OverrideFlags::LOCATION);
    if wide {
        // Repeats of the dates in the plain exception
        c.skip(12)?;
    }
    if ex.overrides.contains(OverrideFlags::SUBJECT) {
        let len = c.read_u16::<LittleEndian>()?;
        ex.subject = Some(c.read_utf16_string(usize::from(len))?);
    }
    if ex.overrides.contains(OverrideFlags::LOCATION) {
        let len = c.read_u16::<LittleEndian>()?;
        ex.location = Some(c.read_utf16_string(usize::from(len))?);
    }
    if wide {
        skip_reserved(c, "extended exception reserved block 2")?;
    }

    Ok(())
}
