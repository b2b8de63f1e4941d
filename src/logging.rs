use crate::error::{AnalyzerError, Result};
use chrono::Local;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;
use yansi::Paint;

/// Initializes logging for the CLI with the specified default level
///
/// `RUST_LOG` overrides the level; valid values are error, warn, info,
/// debug, trace. The server binary uses its own tracing subscriber instead.
pub fn init(log_level: &str) -> Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", log_level)
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            let timestamp = Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "{} {} {}",
                timestamp,
                level_tag(record.level()),
                record.args()
            )
        })
        .try_init()
        .map_err(|e| AnalyzerError::Config(format!("failed to initialize logging: {}", e)))
}

fn level_tag(level: Level) -> String {
    match level {
        Level::Error => Paint::red("ERROR").bold().to_string(),
        Level::Warn => Paint::yellow(" WARN").bold().to_string(),
        Level::Info => Paint::cyan(" INFO").to_string(),
        Level::Debug => Paint::blue("DEBUG").to_string(),
        Level::Trace => Paint::new("TRACE").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_tags_are_fixed_width() {
        for level in [
            Level::Error,
            Level::Warn,
            Level::Info,
            Level::Debug,
            Level::Trace,
        ] {
            let stripped = strip_ansi(&level_tag(level));
            assert_eq!(stripped.len(), 5, "tag for {:?} misaligns output", level);
        }
    }

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in s.chars() {
            match c {
                '\x1b' => in_escape = true,
                'm' if in_escape => in_escape = false,
                _ if !in_escape => out.push(c),
                _ => {}
            }
        }
        out
    }
}
