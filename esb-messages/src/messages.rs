//! Central registry for all user-facing message templates.
//!
//! Naming Convention:
//! - `common_*` - Shared across commands
//! - `{command}_{component}` - Command-specific messages (e.g., env_*, project_*)
//!
//! Templates use `{variable}` syntax for runtime values, which are
//! substituted by the `MessageBuilder`.

pub struct Messages {
    // ============================================================================
    // Common Messages
    // ============================================================================
    pub common_available_label: &'static str,
    pub common_not_a_project: &'static str,
    pub common_not_a_project_hint: &'static str,
    pub common_stale_discarded: &'static str,

    // ============================================================================
    // Environment Commands
    // ============================================================================
    pub env_added: &'static str,
    pub env_already_exists: &'static str,
    pub env_list_header: &'static str,
    pub env_no_active: &'static str,
    pub env_no_active_hint: &'static str,
    pub env_none_declared: &'static str,
    pub env_remove_last: &'static str,
    pub env_removed: &'static str,
    pub env_select_prompt: &'static str,
    pub env_switched: &'static str,
    pub env_unset_prompt: &'static str,

    // ============================================================================
    // Project Commands
    // ============================================================================
    pub project_added: &'static str,
    pub project_list_header: &'static str,
    pub project_none_registered: &'static str,
    pub project_none_registered_hint: &'static str,
    pub project_recent: &'static str,
    pub project_removed: &'static str,
    pub project_switched: &'static str,
    pub project_unset_prompt: &'static str,

    // ============================================================================
    // Status / Info
    // ============================================================================
    pub info_header: &'static str,
    pub status_built_next: &'static str,
    pub status_header: &'static str,
    pub status_not_initialized_next: &'static str,
    pub status_running_next: &'static str,
    pub status_stopped_next: &'static str,
    pub status_unknown_next: &'static str,

    // ============================================================================
    // Compose Commands
    // ============================================================================
    pub compose_down_done: &'static str,
    pub compose_file_missing: &'static str,
    pub compose_ports_header: &'static str,
    pub compose_starting: &'static str,
    pub compose_stopped: &'static str,
    pub compose_up_done: &'static str,
    pub docker_not_installed: &'static str,

    // ============================================================================
    // Prune Command
    // ============================================================================
    pub prune_aborted: &'static str,
    pub prune_confirm: &'static str,
    pub prune_done: &'static str,
    pub prune_needs_yes: &'static str,
    pub prune_needs_yes_hint: &'static str,
    pub prune_warning_header: &'static str,
}

pub const MESSAGES: Messages = Messages {
    common_available_label: "Available:",
    common_not_a_project: "{dir} is not an esb project (no generator.yml found)",
    common_not_a_project_hint: "Register one with: esb project add <dir>",
    common_stale_discarded: "Discarded stale {what} '{name}'",

    env_added: "Added environment '{env}' ({mode})",
    env_already_exists: "environment '{env}' already exists",
    env_list_header: "Environments for {project}:",
    env_no_active: "no active environment",
    env_no_active_hint: "esb env use <name>",
    env_none_declared: "no environments declared in {path}",
    env_remove_last: "cannot remove the last environment",
    env_removed: "Removed environment '{env}'",
    env_select_prompt: "Select environment",
    env_switched: "Switched to environment '{env}' ({mode})",
    env_unset_prompt: "ESB_ENV '{name}' is not declared. Ignore it for this run?",

    project_added: "Registered project '{name}' at {path}",
    project_list_header: "Registered projects:",
    project_none_registered: "No projects registered.",
    project_none_registered_hint: "esb project add <dir>",
    project_recent: "{name}\t{path}",
    project_removed: "Removed project '{name}'",
    project_switched: "Switched to project '{name}'",
    project_unset_prompt: "ESB_PROJECT '{name}' is not registered. Ignore it for this run?",

    info_header: "Project {project} / environment {env}",
    status_built_next: "esb up",
    status_header: "{project}: {state}",
    status_not_initialized_next: "esb up --build",
    status_running_next: "esb logs --follow",
    status_stopped_next: "esb up",
    status_unknown_next: "docker ps",

    compose_down_done: "Environment '{env}' removed",
    compose_file_missing: "compose file not found: {path}",
    compose_ports_header: "Discovered ports:",
    compose_starting: "Starting {project} ({mode})",
    compose_stopped: "Environment '{env}' stopped",
    compose_up_done: "Environment '{env}' is up",
    docker_not_installed: "docker was not found in PATH",

    prune_aborted: "Aborted.",
    prune_confirm: "Are you sure you want to continue?",
    prune_done: "Pruned {project}",
    prune_needs_yes: "prune requires --yes in non-interactive mode",
    prune_needs_yes_hint: "esb prune --yes",
    prune_warning_header: "This will remove:",
};
