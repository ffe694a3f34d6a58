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

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use log::LevelFilter;
use structopt::StructOpt;

use msgtrawl::die;
use msgtrawl::support::config::Config;
use msgtrawl::support::sysexits::*;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
pub(super) struct Options {
    /// Read configuration from this TOML file.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Log debugging information to standard error.
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Print the decoded fields of a message, its recipients and its
    /// attachments.
    Show(InputOptions),
    /// Print the storage and stream tree of the underlying compound file.
    List(InputOptions),
    /// Print every raw property in the message.
    ///
    /// Each line holds the kind of object the property belongs to, the
    /// property tag, the length of the value, and the value in base64.
    Dump(InputOptions),
    /// Save all attachments of a message to a directory.
    ///
    /// Attached messages are saved as stand-alone .msg files named after
    /// their subject. Names are made safe for the file system and made
    /// unique by adding a number if needed.
    Extract(ExtractSubcommand),
    /// Decode one stream of the message as a structured property value.
    Record(RecordSubcommand),
}

#[derive(StructOpt)]
pub(super) struct InputOptions {
    /// The .msg file to read. "-" reads from standard input.
    #[structopt(parse(from_os_str))]
    pub(super) input: PathBuf,
}

#[derive(StructOpt)]
pub(super) struct ExtractSubcommand {
    #[structopt(flatten)]
    pub(super) input: InputOptions,

    /// The directory to write the attachments into. It is created if it
    /// does not exist.
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    pub(super) output: PathBuf,
}

#[derive(StructOpt)]
pub(super) struct RecordSubcommand {
    /// What the stream holds: recurrence, appointment, timezone, tzrule,
    /// or verbs.
    #[structopt(parse(try_from_str))]
    pub(super) kind: super::inspect::RecordKind,

    #[structopt(flatten)]
    pub(super) input: InputOptions,

    /// The path of the stream within the file, with storages separated by
    /// "/", e.g. "__substg1.0_80010102".
    pub(super) stream: String,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let config = match options.config {
        None => Config::default(),
        Some(ref path) => load_config(path),
    };

    let level = if options.verbose {
        LevelFilter::Debug
    } else {
        match config.log_level_filter() {
            Ok(level) => level,
            Err(e) => die!(EX_CONFIG, "{}", e),
        }
    };
    if let Err(e) = msgtrawl::init_console_log(level) {
        die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
    }

    match options.command {
        Command::Show(cmd) => super::inspect::show(&config, &cmd),
        Command::List(cmd) => super::inspect::list(&cmd),
        Command::Dump(cmd) => super::inspect::dump(&config, &cmd),
        Command::Extract(cmd) => super::extract::main(&config, &cmd),
        Command::Record(cmd) => super::inspect::record(&cmd),
    }
}

fn load_config(path: &Path) -> Config {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => die!(EX_CONFIG, "Error reading '{}': {}", path.display(), e),
    };

    match Config::parse(&text) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "Error in config file at '{}': {}",
            path.display(),
            e
        ),
    }
}

/// Read the whole input file, or standard input for "-".
pub(super) fn read_input(options: &InputOptions) -> Vec<u8> {
    let mut data = Vec::new();
    let result = if Path::new("-") == options.input {
        io::stdin().read_to_end(&mut data).map(|_| ())
    } else {
        fs::File::open(&options.input)
            .and_then(|mut f| f.read_to_end(&mut data))
            .map(|_| ())
    };

    match result {
        Ok(()) => data,
        Err(e) if io::ErrorKind::NotFound == e.kind() => die!(
            EX_NOINPUT,
            "{}: {}",
            options.input.display(),
            e
        ),
        Err(e) => die!(EX_IOERR, "{}: {}", options.input.display(), e),
    }
}
