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

//! Decoders for structured binary property values.
//!
//! These operate on the bytes of a single property (usually a named
//! property stored as `PT_BINARY`) and know nothing about the container.

pub mod recurrence;
pub mod timezone;
pub mod verb_stream;

pub use self::recurrence::{AppointmentRecurrence, RecurrencePattern};
pub use self::timezone::{TimeZoneDefinition, TimeZoneRule, TransitionTime};
pub use self::verb_stream::parse_verb_stream;
