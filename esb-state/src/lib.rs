//! Project/environment selection, context derivation, lifecycle detection and runtime
//! environment materialization for the esb CLI.
//!
//! Every command runs the same pipeline: [`resolve_selection`] picks a project,
//! [`resolve_environment`] picks an environment in it, [`derive_context`] computes the
//! [`Context`], and then either the [`Detector`] classifies the environment or
//! [`materialize`] produces the variables for the container runtime.

pub mod ambient;
pub mod artifacts;
pub mod context;
pub mod detector;
pub mod environment;
pub mod prompt;
pub mod runtime_env;
pub mod selection;
pub mod staging;
pub mod state;

pub use ambient::AmbientEnv;
pub use context::{brand_name, derive_context, Context, ContextRequest};
pub use detector::{classify, Detection, Detector, LifecycleProbes};
pub use environment::{
    resolve_environment, EnvironmentOptions, EnvironmentSource, NO_ACTIVE_ENVIRONMENT,
};
pub use prompt::{NonInteractive, Prompter};
pub use runtime_env::{materialize, EnvOverlay};
pub use selection::{resolve_selection, Resolved, Selection, SelectionOptions, SelectionSource};
pub use state::{ContainerInfo, State};
