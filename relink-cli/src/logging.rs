//! Log output: `LEVEL  repository  message`, one line per record.
//!
//! Library crates tag records with a `repository` key-value; the column is
//! padded to the widest configured repository name so messages line up.

use std::io::Write;

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use env_logger::{Env, Target};
use log::kv::{Key, Source};
use log::{Level, LevelFilter, Record};
use relink_core::RepositoryDescriptor;

/// Key-value name carrying the repository a record belongs to.
pub const REPOSITORY_KEY: &str = "repository";

const LEVEL_WIDTH: usize = 7;

/// `--log-level` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Only errors; there is no separate fatal level.
    Fatal,
    Silent,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Fatal => LevelFilter::Error,
            LogLevel::Silent => LevelFilter::Off,
        }
    }
}

/// Formatter configuration, fixed before the logger is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFormat {
    /// Width of the repository column, separator included.
    pub name_width: usize,
}

impl LogFormat {
    pub fn for_repositories(repositories: &[RepositoryDescriptor]) -> Self {
        let widest = repositories
            .iter()
            .map(|r| r.name.width())
            .max()
            .unwrap_or(0);
        Self {
            name_width: widest + 1,
        }
    }

    pub fn render(&self, record: &Record<'_>) -> String {
        let level = paint(
            record.level(),
            &format!("{:<LEVEL_WIDTH$}", record.level().as_str()),
        );
        let repository = match record.key_values().get(Key::from_str(REPOSITORY_KEY)) {
            Some(name) => format!("{:<width$}", name.to_string(), width = self.name_width)
                .yellow()
                .to_string(),
            None => String::new(),
        };
        let message = record.args().to_string().cyan();
        format!("{level}{repository}{message}")
    }
}

fn paint(level: Level, text: &str) -> ColoredString {
    match level {
        Level::Error => text.red(),
        Level::Warn => text.yellow(),
        Level::Info => text.green(),
        Level::Debug => text.blue(),
        Level::Trace => text.bright_black(),
    }
}

/// Install the global logger.
///
/// `level` wins over `RUST_LOG`; without either, `info`.
pub fn init(level: Option<LogLevel>, format: LogFormat, target: Target) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level.into());
    }
    // A logger installed earlier (tests) stays in place.
    let _ = builder
        .target(target)
        .format(move |buf, record| writeln!(buf, "{}", format.render(record)))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> RepositoryDescriptor {
        let mut d = RepositoryDescriptor::new(format!("/work/{name}"));
        d.name = name.into();
        d
    }

    #[test]
    fn width_is_widest_name_plus_separator() {
        let format = LogFormat::for_repositories(&[descriptor("api"), descriptor("frontend")]);
        assert_eq!(format.name_width, 9);
        assert_eq!(LogFormat::for_repositories(&[]).name_width, 1);
    }

    #[test]
    fn renders_padded_columns() {
        colored::control::set_override(false);
        let format = LogFormat { name_width: 6 };
        let kvs: &[(&str, &str)] = &[(REPOSITORY_KEY, "api")];
        let line = format.render(
            &Record::builder()
                .args(format_args!("checked out master"))
                .level(Level::Info)
                .key_values(&kvs)
                .build(),
        );
        assert_eq!(line, "INFO   api   checked out master");
    }

    #[test]
    fn untagged_records_have_no_repository_column() {
        colored::control::set_override(false);
        let format = LogFormat { name_width: 6 };
        let line = format.render(
            &Record::builder()
                .args(format_args!("started"))
                .level(Level::Debug)
                .build(),
        );
        assert_eq!(line, "DEBUG  started");
    }

    #[test]
    fn fatal_and_silent_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Fatal), LevelFilter::Error);
        assert_eq!(LevelFilter::from(LogLevel::Silent), LevelFilter::Off);
    }
}
