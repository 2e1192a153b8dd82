//! Default values and well-known names used across gitfleet.
//!
//! Keeping them in one place keeps the CLI, the library and the generated
//! script consistent with each other.

/// Default search depth: repositories given directly or immediate children.
pub const DEFAULT_DEPTH: i32 = 1;

/// Executable used for the built-in git queries and actions.
pub const GIT_PROGRAM: &str = "git";

/// Name of the metadata directory that marks a normal working tree.
pub const METADATA_DIR: &str = ".git";

/// Directory-name suffix that marks a bare repository.
pub const BARE_SUFFIX: &str = ".git";

/// Remote preferred when rendering reproduction statements.
pub const PREFERRED_REMOTE: &str = "origin";

/// Environment variable exposing the resolved branch to the user command.
pub const BRANCH_ENV_VAR: &str = "GITFLEET_BRANCH";

/// Environment variable naming the executable implied by the `-` separator.
pub const GIT_TOOL_ENV_VAR: &str = "GITFLEET_GIT_TOOL";

/// Environment variable for the optional per-command timeout in seconds.
pub const TIMEOUT_ENV_VAR: &str = "GITFLEET_TIMEOUT";
