use std::io::{self, Write};
use std::sync::OnceLock;

use log::error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::{EnvFilter, Registry};

use crate::commands::Verbosity;
use crate::utils::TERMINAL_STDERR;

/// Log targets of the pawmatch crates.
const OWN_TARGETS: [&str; 3] = ["pawmatch", "pawmatch_sdk", "pawmatch_client"];

/// Writes log lines through [TERMINAL_STDERR],
/// so they never interleave with user facing messages.
struct SharedStderr;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedStderr {
    type Writer = SharedStderr;

    fn make_writer(&'a self) -> Self::Writer {
        SharedStderr
    }
}

impl Write for SharedStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut stderr) = TERMINAL_STDERR.lock() {
            stderr.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match TERMINAL_STDERR.lock() {
            Ok(mut stderr) => stderr.flush(),
            Err(_) => Ok(()),
        }
    }
}

static FILTER_HANDLE: OnceLock<Handle<EnvFilter, Registry>> = OnceLock::new();

/// Install the subscriber on first use and (re)apply the filter for `verbosity`.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub(crate) fn init_logger(verbosity: Option<Verbosity>) {
    let handle = FILTER_HANDLE.get_or_init(|| {
        // `log` records are capped at the level of the first filter installed,
        // start wide open and narrow down below.
        let (filter, handle) = tracing_subscriber::reload::Layer::new(EnvFilter::new("trace"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(SharedStderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(fmt_layer).init();
        handle
    });

    let filter = log_filter(verbosity.unwrap_or_default());
    let result = handle.modify(|current| {
        match EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&filter)) {
            Ok(next) => *current = next,
            Err(err) => error!("invalid log filter '{filter}': {err}"),
        }
    });
    if let Err(err) = result {
        error!("could not update log filter: {err}");
    }
}

/// | verbosity | pawmatch crates | dependencies |
/// |-----------|-----------------|--------------|
/// | `-q`      | error (CLI only)| off          |
/// | default   | warn (CLI only) | off          |
/// | `-v`      | info (CLI only) | off          |
/// | `-vv`     | debug           | off          |
/// | `-vvv`    | trace           | off          |
/// | `-vvvv`   | trace           | debug        |
/// | more      | trace           | trace        |
fn log_filter(verbosity: Verbosity) -> String {
    let own = |level: &str| {
        OWN_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    };
    match verbosity {
        Verbosity::Quiet => "off,pawmatch=error".to_string(),
        Verbosity::Verbose(0) => "off,pawmatch=warn".to_string(),
        Verbosity::Verbose(1) => "off,pawmatch=info".to_string(),
        Verbosity::Verbose(2) => format!("off,{}", own("debug")),
        Verbosity::Verbose(3) => format!("off,{}", own("trace")),
        Verbosity::Verbose(4) => format!("debug,{}", own("trace")),
        Verbosity::Verbose(_) => "trace".to_string(),
    }
}
