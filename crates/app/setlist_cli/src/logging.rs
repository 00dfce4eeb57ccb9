pub mod formats;

use flexi_logger::Logger;

use crate::Error;

/// Default filter when `RUST_LOG` is unset. HTTP and SQL internals are noisy at info.
const DEFAULT_SPEC: &str = "info, sqlx=warn, reqwest=warn, hyper_util=warn, html5ever=warn";
const VERBOSE_SPEC: &str = "debug, sqlx=info, hyper_util=info, html5ever=warn";

pub fn init(verbose: bool) -> Result<(), Error> {
    let spec = if verbose { VERBOSE_SPEC } else { DEFAULT_SPEC };
    Logger::try_with_env_or_str(spec)?
        .format(formats::cli_format)
        .log_to_stdout()
        .start()?;

    Ok(())
}
