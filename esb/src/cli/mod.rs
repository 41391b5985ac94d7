// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "esb")]
#[command(about = "Local serverless environments on Docker, containerd or Firecracker")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Environment to target (must be declared in generator.yml)
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Template to use; its directory becomes the project
    #[arg(short, long, global = true)]
    pub template: Option<PathBuf>,

    /// Registered project to target
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Discard stale persisted or ambient selections without asking
    #[arg(long, global = true)]
    pub force: bool,

    /// Never prompt; also enabled by ESB_NONINTERACTIVE
    #[arg(long, global = true)]
    pub no_interactive: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show the resolved project, environment, networks and state
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the lifecycle state and containers of the environment
    Status,
    /// Manage environments of the current project
    Env {
        #[command(subcommand)]
        command: EnvSubcommand,
    },
    /// Manage registered projects
    Project {
        #[command(subcommand)]
        command: ProjectSubcommand,
    },
    /// Start the environment
    Up {
        /// Build images before starting
        #[arg(long)]
        build: bool,
    },
    /// Stop the environment's containers
    Stop,
    /// Remove the environment's containers and networks
    Down {
        /// Also remove named volumes
        #[arg(long)]
        volumes: bool,
    },
    /// Remove the environment's stopped containers, unused networks, images and
    /// generated artifacts
    Prune {
        /// Also remove volumes
        #[arg(long)]
        volumes: bool,
        /// Remove all unused images of the project, not only dangling ones
        #[arg(short, long)]
        all: bool,
        /// Also delete generator.yml
        #[arg(long)]
        hard: bool,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show container logs
    Logs {
        /// Service to show (all when omitted)
        service: Option<String>,
        /// Follow log output
        #[arg(short, long)]
        follow: bool,
        /// Number of lines from the end
        #[arg(long)]
        tail: Option<usize>,
        /// Show timestamps
        #[arg(long)]
        timestamps: bool,
    },
    /// Print the runtime environment variables for the environment
    #[command(name = "env-vars")]
    EnvVars {
        /// Print KEY=value lines instead of shell exports
        #[arg(long)]
        dotenv: bool,
    },
    /// Generate shell completion script
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum EnvSubcommand {
    /// List declared environments
    List,
    /// Declare a new environment (`name` or `name:mode`)
    Add {
        spec: String,
        /// Runtime mode: docker, containerd or firecracker
        #[arg(long)]
        mode: Option<String>,
    },
    /// Make an environment the active one
    Use { name: String },
    /// Remove a declared environment
    Remove { name: String },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectSubcommand {
    /// List registered projects, most recent first
    List,
    /// Register a project directory
    Add {
        /// Directory containing generator.yml (defaults to the current directory)
        dir: Option<PathBuf>,
        /// Name to register under (defaults to app.name, then the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Make a registered project the active one
    Use { name: String },
    /// Unregister a project
    Remove { name: String },
    /// Print the most recently used project
    Recent,
}
