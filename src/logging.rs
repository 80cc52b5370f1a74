//! Log sink setup for the `magonote` binary (spec.md §6.2 `MAGONOTE_LOG`/
//! `MAGONOTE_DEBUG`).
//!
//! Grounded on skim's `src/bin/main.rs`: build an `env_logger` with an
//! explicit timestamped/leveled format and either a stdout or file target,
//! then call `.init()` once before anything else logs. The only departure
//! is the env var it reads: `MAGONOTE_LOG` in place of skim's `RUST_LOG`
//! convention, plus `MAGONOTE_DEBUG` to force `trace` regardless of
//! `MAGONOTE_LOG`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use log::LevelFilter;

/// Initializes the global logger.
///
/// `log_file` mirrors skim's `opts.log_file`: when set, records go to that
/// file instead of stdout. Level comes from `MAGONOTE_LOG` (parsed as an
/// `env_logger` filter string, e.g. `debug` or `magonote::engine=trace`),
/// or `trace` everywhere when `MAGONOTE_DEBUG` is set, or `warn` by default.
pub fn init(log_file: Option<&Path>) {
    let target = match log_file {
        Some(path) => match File::create(path) {
            Ok(file) => env_logger::Target::Pipe(Box::new(file)),
            Err(_) => env_logger::Target::Stderr,
        },
        None => env_logger::Target::Stderr,
    };

    let mut builder = env_logger::Builder::new();
    builder.target(target);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{} {} {} ({}:{})] {}",
            buf.timestamp_nanos(),
            record.level(),
            record.module_path().unwrap_or("magonote"),
            record.file().unwrap_or_default(),
            record.line().unwrap_or_default(),
            record.args()
        )
    });

    if std::env::var("MAGONOTE_DEBUG").is_ok() {
        builder.filter_level(LevelFilter::Trace);
    } else if let Ok(spec) = std::env::var("MAGONOTE_LOG") {
        builder.parse_filters(&spec);
    } else {
        builder.filter_level(LevelFilter::Warn);
    }

    // env_logger only allows a single global logger; a second `init()` call
    // in the same process (as in tests) would panic, so ignore that here.
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_without_env_vars() {
        std::env::remove_var("MAGONOTE_LOG");
        std::env::remove_var("MAGONOTE_DEBUG");
        init(None);
    }
}
