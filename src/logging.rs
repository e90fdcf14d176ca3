/// Tracing setup.
///
/// The terminal belongs to the renderer, so logs go to `koalio.log` in the
/// working directory. Logging stays off unless `KOALIO_LOG` is set, e.g.
/// `KOALIO_LOG=koalio=debug`.

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "KOALIO_LOG";
pub const LOG_FILE: &str = "koalio.log";

pub fn init() {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else { return };
    let file = match File::create(LOG_FILE) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not create {LOG_FILE}: {e}");
            return;
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
