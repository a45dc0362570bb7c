//! CLI Tracing
//!
//! Hook runs are short-lived and non-interactive, so logging is a single fmt
//! layer on stdout. The default filter keeps our own events at `info`
//! (`debug` with `-v`) and everything else at `error`; `OPENWITH_LOG` takes
//! precedence over both when set.

use crate::Cli;
use std::env;
use tracing_subscriber::{prelude::*, EnvFilter};

const LOG_ENV: &str = "OPENWITH_LOG";

pub(crate) struct TraceController;

impl TraceController {
    /// Build tracing infrastructure.
    pub fn initialize(args: &Cli) {
        let mut filter = EnvFilter::new(match args.verbose {
            true => "error,openwith=debug,openwith_cli=debug",
            false => "error,openwith=info,openwith_cli=info",
        });

        if env::var(LOG_ENV).is_ok() {
            filter = EnvFilter::from_env(LOG_ENV);
        }

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(args.verbose)
            .without_time();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}
