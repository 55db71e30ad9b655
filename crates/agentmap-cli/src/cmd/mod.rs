/// Command modules for the `agentmap` CLI.
///
/// Each submodule implements one subcommand. Its `run` function takes the
/// decoded input and parsed arguments and returns `Ok(())` on success or a
/// [`crate::error::CliError`] on failure. Report construction is separated
/// from printing so it can be unit tested without capturing stdout.
pub mod classify;
pub mod fingerprint;
pub mod inspect;
pub mod path;
pub mod sankey;
pub mod tree;
pub mod visible;
