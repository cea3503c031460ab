// ABOUTME: Command module aggregator for the cohort CLI.
// ABOUTME: One handler per subcommand; each walks the configured hosts in order.

mod connect;
mod deploy;
mod maintenance;
mod session;

pub use deploy::deploy;
pub use maintenance::{cleanup, pull, restart, status};
pub use session::{console, enter, logs};

use cohort::diagnostics::Diagnostics;
use cohort::output::Output;

/// Repeats collected warnings once the command is done.
fn emit_warnings(diag: &Diagnostics, output: &Output) {
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }
}
