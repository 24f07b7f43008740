//! `heirvault version` — display version information.

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!("heirvault {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
