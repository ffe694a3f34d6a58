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

use std::str::FromStr;

use encoding_rs::Encoding;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use super::codepage;
use super::error::Error;

/// Configuration for the `msgtrawl` command-line tool.
///
/// This is read from the TOML file passed with `--config`. Every field is
/// optional; an empty file is the same as no file at all.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Options controlling how messages are decoded.
    #[serde(default)]
    pub decode: DecodeOptions,

    /// The log level to use when `--verbose` is not given, e.g. "info".
    ///
    /// Defaults to "warn".
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn parse(text: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(text)?;
        // Fail early rather than at first use
        config.decode.ansi_encoding()?;
        config.log_level_filter()?;
        Ok(config)
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, Error> {
        match self.log_level {
            None => Ok(LevelFilter::Warn),
            Some(ref level) => LevelFilter::from_str(level)
                .map_err(|_| Error::BadLogLevel(level.clone())),
        }
    }
}

/// Options for decoding a message into field records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DecodeOptions {
    /// If set, the encoding label (e.g. "windows-1251") to use for all 8-bit
    /// string properties, regardless of the code page the message declares.
    ///
    /// When unset, the message's own code page properties are used, falling
    /// back to windows-1252.
    #[serde(default)]
    pub ansi_encoding: Option<String>,
}

impl DecodeOptions {
    /// Resolve the forced 8-bit encoding, if any.
    pub fn ansi_encoding(&self) -> Result<Option<&'static Encoding>, Error> {
        self.ansi_encoding
            .as_deref()
            .map(codepage::for_label)
            .transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config = Config::parse("").unwrap();
        assert_eq!(DecodeOptions::default(), config.decode);
        assert_eq!(LevelFilter::Warn, config.log_level_filter().unwrap());
        assert_eq!(None, config.decode.ansi_encoding().unwrap());
    }

    #[test]
    fn full_config() {
        let config = Config::parse(
            "log_level = \"debug\"\n\
             \n\
             [decode]\n\
             ansi_encoding = \"windows-1251\"\n",
        )
        .unwrap();
        assert_eq!(LevelFilter::Debug, config.log_level_filter().unwrap());
        assert_eq!(
            Some(encoding_rs::WINDOWS_1251),
            config.decode.ansi_encoding().unwrap()
        );
    }

    #[test]
    fn bad_values_rejected() {
        assert_matches!(
            Err(Error::UnknownEncoding(_)),
            Config::parse("[decode]\nansi_encoding = \"nope\"\n")
        );
        assert_matches!(
            Err(Error::BadLogLevel(_)),
            Config::parse("log_level = \"loud\"\n")
        );
        assert_matches!(Err(Error::Config(_)), Config::parse("log_level = 3"));
    }
}
