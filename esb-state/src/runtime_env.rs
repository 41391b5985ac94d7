//! Runtime environment materialization.
//!
//! Turns a [`Context`] and the project parameters into the variables the compose files
//! and build tooling read. Nothing is written to the process environment here; the
//! resulting [`EnvOverlay`] is handed to the subprocess runner. Any variable the
//! ambient environment already defines (non-empty) is left alone.

use esb_config::{ProjectConfig, RuntimeMode};
use esb_core::file_system::absolutize;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml_ng::Value;
use std::path::Path;
use tracing::debug;

use crate::context::Context;
use crate::AmbientEnv;

const NO_PROXY_EXTRA_VAR: &str = "ESB_NO_PROXY_EXTRA";

/// In-cluster service names and networks that must bypass any configured proxy.
const NO_PROXY_TARGETS: &[&str] = &[
    "agent",
    "database",
    "gateway",
    "local-proxy",
    "localhost",
    "registry",
    "runtime-node",
    "s3-storage",
    "victorialogs",
    "::1",
    "10.88.0.0/16",
    "10.99.0.1",
    "127.0.0.1",
    "172.20.0.0/16",
];

const PROXY_PAIRS: &[(&str, &str)] = &[("HTTP_PROXY", "http_proxy"), ("HTTPS_PROXY", "https_proxy")];

static ENV_NAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env name regex is a static pattern")
});

/// `key` can be exported to a POSIX shell as-is.
pub fn is_valid_env_name(key: &str) -> bool {
    ENV_NAME_REGEX.is_match(key)
}

/// Ordered variables to add to a subprocess environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: IndexMap<String, String>,
}

impl EnvOverlay {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// `export KEY='value'` lines suitable for `eval`. Keys that are not valid shell
    /// names are left out.
    pub fn to_shell_exports(&self) -> String {
        self.vars
            .iter()
            .filter(|(k, _)| is_valid_env_name(k))
            .map(|(k, v)| format!("export {}='{}'\n", k, v.replace('\'', r"'\''")))
            .collect()
    }

    fn insert(&mut self, key: &str, value: String) {
        self.vars.insert(key.to_string(), value);
    }
}

/// Collects derived defaults, skipping keys the operator already set.
struct Builder<'a> {
    ambient: &'a AmbientEnv,
    overlay: EnvOverlay,
}

impl<'a> Builder<'a> {
    fn set_default(&mut self, key: &str, value: impl Into<String>) {
        if key.is_empty() || self.overlay.vars.contains_key(key) {
            return;
        }
        if self.ambient.is_set(key) {
            debug!("Keeping ambient {}", key);
            return;
        }
        self.overlay.insert(key, value.into());
    }

    /// Current value as the subprocess will see it: overlay first, then ambient.
    fn effective(&self, key: &str) -> Option<String> {
        self.overlay
            .get(key)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .or_else(|| self.ambient.non_empty(key))
            .map(str::to_string)
    }
}

fn registry_host(mode: RuntimeMode) -> &'static str {
    match mode {
        RuntimeMode::Docker => "127.0.0.1:5010",
        RuntimeMode::Containerd | RuntimeMode::Firecracker => "registry:5010",
    }
}

/// Ensure a registry prefix ends with exactly one `/`.
fn registry_prefix(host: &str) -> String {
    format!("{}/", host.trim().trim_end_matches('/'))
}

/// Canonical string for a scalar parameter; `None` for values with no flat form.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Merge no-proxy lists: existing entries, then the in-cluster targets, then extras.
/// Entries split on `,` or `;`; duplicates keep their first position.
pub fn merge_no_proxy<'a>(existing: impl IntoIterator<Item = &'a str>, extras: &'a str) -> String {
    let mut merged: Vec<&str> = Vec::new();
    let sources = existing
        .into_iter()
        .chain(NO_PROXY_TARGETS.iter().copied())
        .chain(std::iter::once(extras));
    for source in sources {
        for item in source.split(&[',', ';'][..]).map(str::trim) {
            if !item.is_empty() && !merged.contains(&item) {
                merged.push(item);
            }
        }
    }
    merged.join(",")
}

fn apply_proxy_rules(builder: &mut Builder<'_>) {
    let ambient = builder.ambient;
    let triggered = PROXY_PAIRS
        .iter()
        .flat_map(|(upper, lower)| [*upper, *lower])
        .chain(["NO_PROXY", "no_proxy", NO_PROXY_EXTRA_VAR])
        .any(|key| ambient.is_set(key));
    if !triggered {
        return;
    }

    for (upper, lower) in PROXY_PAIRS {
        match (ambient.non_empty(upper), ambient.non_empty(lower)) {
            (Some(value), None) => builder.set_default(lower, value),
            (None, Some(value)) => builder.set_default(upper, value),
            _ => {}
        }
    }

    // The one rule that augments rather than skips an existing value.
    let existing = [ambient.get("NO_PROXY"), ambient.get("no_proxy")];
    let merged = merge_no_proxy(
        existing.iter().flatten().copied(),
        ambient.get(NO_PROXY_EXTRA_VAR).unwrap_or_default(),
    );
    builder.overlay.insert("NO_PROXY", merged.clone());
    builder.overlay.insert("no_proxy", merged);
}

/// Build the overlay for `ctx`.
pub fn materialize(ctx: &Context, config: &ProjectConfig, ambient: &AmbientEnv) -> EnvOverlay {
    let mut b = Builder {
        ambient,
        overlay: EnvOverlay::default(),
    };

    b.set_default("ESB_ENV", ctx.env.as_str());
    b.set_default("ESB_MODE", ctx.mode.as_str());
    b.set_default("ESB_PROJECT_NAME", ctx.compose_project.as_str());
    b.set_default("ESB_IMAGE_TAG", ctx.env.as_str());

    for (port, value) in ctx.ports.iter() {
        b.set_default(port.env_key(), value.to_string());
    }

    let project = b
        .effective("ESB_PROJECT_NAME")
        .unwrap_or_else(|| ctx.compose_project.clone());
    b.set_default("ESB_SUBNET_EXTERNAL", ctx.network.external_subnet.to_string());
    b.set_default("ESB_NETWORK_EXTERNAL", format!("{}-external", project));
    b.set_default("RUNTIME_NET_SUBNET", ctx.network.runtime_subnet.to_string());
    b.set_default("RUNTIME_NODE_IP", ctx.network.runtime_node_ip.to_string());
    b.set_default("LAMBDA_NETWORK", ctx.network.lambda_network.as_str());

    b.set_default("CONTAINER_REGISTRY", registry_host(ctx.mode));
    let registry = b
        .effective("CONTAINER_REGISTRY")
        .unwrap_or_else(|| registry_host(ctx.mode).to_string());
    b.set_default("ESB_REGISTRY", registry_prefix(&registry));
    // An operator-set registry still gets its trailing slash normalised.
    if let Some(existing) = ambient.non_empty("ESB_REGISTRY") {
        let normalized = registry_prefix(existing);
        if normalized != existing {
            b.overlay.insert("ESB_REGISTRY", normalized);
        }
    }

    b.set_default("ESB_CONFIG_DIR", ctx.config_dir.display().to_string());
    let manifests = [
        ("GATEWAY_FUNCTIONS_YML", config.paths.functions_yml.trim()),
        ("GATEWAY_ROUTING_YML", config.paths.routing_yml.trim()),
    ];
    for (key, path) in manifests {
        if !path.is_empty() {
            let resolved = absolutize(&ctx.project_dir, Path::new(path));
            b.set_default(key, resolved.display().to_string());
        }
    }

    b.set_default("DOCKER_BUILDKIT", "1");
    b.set_default("BUILDX_BUILDER", format!("{}-buildx", ctx.brand));

    for (key, value) in &config.parameters {
        let key = key.trim();
        if !is_valid_env_name(key) {
            debug!("Skipping parameter {:?}: not a valid variable name", key);
            continue;
        }
        match scalar_to_string(value) {
            Some(rendered) => b.set_default(key, rendered),
            None => debug!("Skipping non-scalar parameter {}", key),
        }
    }

    apply_proxy_rules(&mut b);
    b.overlay
}

#[cfg(test)]
mod tests {
    use super::*;
    use esb_ports::{NetworkPlan, PortTable};
    use std::path::PathBuf;

    fn ctx(mode: RuntimeMode) -> Context {
        Context {
            project_dir: PathBuf::from("/work/demo"),
            generator_path: PathBuf::from("/work/demo/generator.yml"),
            template_path: PathBuf::from("/work/demo/template.yaml"),
            output_dir: PathBuf::from("/work/demo/.esb"),
            output_env_dir: PathBuf::from("/work/demo/.esb/staging"),
            config_dir: PathBuf::from("/stage/demo-staging/staging/config"),
            env: "staging".into(),
            mode,
            brand: "demo".into(),
            compose_project: "demo-staging".into(),
            network: NetworkPlan::derive("demo", "staging", "demo-staging"),
            ports: PortTable::default(),
        }
    }

    fn config_with_parameters(yaml: &str) -> ProjectConfig {
        ProjectConfig {
            parameters: serde_yaml_ng::from_str(yaml).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_derived_values() {
        let overlay = materialize(
            &ctx(RuntimeMode::Containerd),
            &ProjectConfig::default(),
            &AmbientEnv::default(),
        );
        assert_eq!(overlay.get("ESB_ENV"), Some("staging"));
        assert_eq!(overlay.get("ESB_MODE"), Some("containerd"));
        assert_eq!(overlay.get("ESB_PROJECT_NAME"), Some("demo-staging"));
        assert_eq!(overlay.get("ESB_IMAGE_TAG"), Some("staging"));
        assert_eq!(overlay.get("ESB_SUBNET_EXTERNAL"), Some("172.88.0.0/16"));
        assert_eq!(overlay.get("RUNTIME_NET_SUBNET"), Some("172.128.0.0/16"));
        assert_eq!(overlay.get("RUNTIME_NODE_IP"), Some("172.128.0.10"));
        assert_eq!(overlay.get("ESB_NETWORK_EXTERNAL"), Some("demo-staging-external"));
        assert_eq!(overlay.get("LAMBDA_NETWORK"), Some("demo_int_staging"));
        assert_eq!(overlay.get("CONTAINER_REGISTRY"), Some("registry:5010"));
        assert_eq!(overlay.get("ESB_REGISTRY"), Some("registry:5010/"));
        assert_eq!(overlay.get("ESB_PORT_REGISTRY"), Some("5010"));
        assert_eq!(overlay.get("ESB_PORT_GATEWAY_HTTPS"), Some("0"));
        assert_eq!(overlay.get("BUILDX_BUILDER"), Some("demo-buildx"));
        assert_eq!(overlay.get("DOCKER_BUILDKIT"), Some("1"));
        assert_eq!(overlay.get("NO_PROXY"), None);
    }

    #[test]
    fn test_docker_uses_loopback_registry() {
        let overlay = materialize(
            &ctx(RuntimeMode::Docker),
            &ProjectConfig::default(),
            &AmbientEnv::default(),
        );
        assert_eq!(overlay.get("CONTAINER_REGISTRY"), Some("127.0.0.1:5010"));
        assert_eq!(overlay.get("ESB_REGISTRY"), Some("127.0.0.1:5010/"));
    }

    #[test]
    fn test_ambient_values_are_never_overwritten() {
        let ctx = ctx(RuntimeMode::Docker);
        let config = config_with_parameters("LOG_LEVEL: debug\n");
        let baseline = materialize(&ctx, &config, &AmbientEnv::default());
        assert!(!baseline.is_empty());

        for (key, _) in baseline.iter() {
            // Registry prefixes are only normalised, so give it an already canonical value.
            let value = if key == "ESB_REGISTRY" {
                "mirror.local:5000/"
            } else {
                "operator-value"
            };
            let ambient: AmbientEnv = [(key, value)].into_iter().collect();
            let overlay = materialize(&ctx, &config, &ambient);
            assert_eq!(overlay.get(key), None, "{} was overwritten", key);
        }
    }

    #[test]
    fn test_derived_values_follow_overrides() {
        let ambient: AmbientEnv = [
            ("ESB_PROJECT_NAME", "ci-run-7"),
            ("CONTAINER_REGISTRY", "mirror.local:5000/"),
        ]
        .into_iter()
        .collect();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &ProjectConfig::default(), &ambient);
        assert_eq!(overlay.get("ESB_NETWORK_EXTERNAL"), Some("ci-run-7-external"));
        assert_eq!(overlay.get("ESB_REGISTRY"), Some("mirror.local:5000/"));
    }

    #[test]
    fn test_operator_registry_gets_trailing_slash() {
        let ambient: AmbientEnv = [("ESB_REGISTRY", "mirror.local:5000")].into_iter().collect();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &ProjectConfig::default(), &ambient);
        assert_eq!(overlay.get("ESB_REGISTRY"), Some("mirror.local:5000/"));

        let doubled: AmbientEnv = [("ESB_REGISTRY", "mirror.local:5000//")].into_iter().collect();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &ProjectConfig::default(), &doubled);
        assert_eq!(overlay.get("ESB_REGISTRY"), Some("mirror.local:5000/"));

        let canonical: AmbientEnv = [("ESB_REGISTRY", "mirror.local:5000/")].into_iter().collect();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &ProjectConfig::default(), &canonical);
        assert_eq!(overlay.get("ESB_REGISTRY"), None);
    }

    #[test]
    fn test_parameters_with_invalid_names_are_skipped() {
        let config = config_with_parameters(
            "\"X=1; touch /tmp/owned; Y\": v\nmy-param: z\n9LIVES: cat\n_OK: yes\n",
        );
        let overlay = materialize(&ctx(RuntimeMode::Docker), &config, &AmbientEnv::default());
        assert_eq!(overlay.get("_OK"), Some("yes"));
        assert_eq!(overlay.get("my-param"), None);
        assert_eq!(overlay.get("9LIVES"), None);
        assert!(overlay.iter().all(|(key, _)| is_valid_env_name(key)));

        let exports = overlay.to_shell_exports();
        assert!(!exports.contains("touch"));
        assert!(!exports.contains("my-param"));
    }

    #[test]
    fn test_shell_exports_drop_unsafe_keys() {
        let mut overlay = EnvOverlay::default();
        overlay.insert("SAFE_KEY", "1".into());
        overlay.insert("BAD KEY", "2".into());
        assert_eq!(overlay.to_shell_exports(), "export SAFE_KEY='1'\n");
    }

    #[test]
    fn test_parameters_are_coerced_to_strings() {
        let config = config_with_parameters(
            "NAME: demo\nDEBUG: true\nRETRIES: 3\nRATIO: 0.5\nEMPTY: null\nLIST: [1, 2]\nNESTED:\n  a: b\n",
        );
        let overlay = materialize(&ctx(RuntimeMode::Docker), &config, &AmbientEnv::default());
        assert_eq!(overlay.get("NAME"), Some("demo"));
        assert_eq!(overlay.get("DEBUG"), Some("true"));
        assert_eq!(overlay.get("RETRIES"), Some("3"));
        assert_eq!(overlay.get("RATIO"), Some("0.5"));
        assert_eq!(overlay.get("EMPTY"), None);
        assert_eq!(overlay.get("LIST"), None);
        assert_eq!(overlay.get("NESTED"), None);
    }

    #[test]
    fn test_manifest_paths_resolve_against_project() {
        let mut config = ProjectConfig::default();
        config.paths.functions_yml = "config/functions.yml".into();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &config, &AmbientEnv::default());
        assert_eq!(
            overlay.get("GATEWAY_FUNCTIONS_YML"),
            Some("/work/demo/config/functions.yml")
        );
        assert_eq!(overlay.get("GATEWAY_ROUTING_YML"), None);
    }

    #[test]
    fn test_no_proxy_is_merged_and_synced() {
        let ambient: AmbientEnv = [
            ("https_proxy", "http://proxy:3128"),
            ("NO_PROXY", "corp.internal;localhost"),
            (NO_PROXY_EXTRA_VAR, "extra.host, corp.internal"),
        ]
        .into_iter()
        .collect();
        let overlay = materialize(&ctx(RuntimeMode::Docker), &ProjectConfig::default(), &ambient);

        assert_eq!(overlay.get("HTTPS_PROXY"), Some("http://proxy:3128"));
        assert_eq!(overlay.get("https_proxy"), None);
        assert_eq!(overlay.get("HTTP_PROXY"), None);

        let merged = overlay.get("NO_PROXY").unwrap();
        assert_eq!(overlay.get("no_proxy"), Some(merged));
        let items: Vec<&str> = merged.split(',').collect();
        assert_eq!(items[0], "corp.internal");
        assert_eq!(items[1], "localhost");
        assert_eq!(items.last(), Some(&"extra.host"));
        assert!(items.contains(&"registry"));
        assert_eq!(items.iter().filter(|i| **i == "localhost").count(), 1);
    }

    #[test]
    fn test_merge_no_proxy_is_idempotent() {
        let once = merge_no_proxy(["a.example"], "b.example");
        let twice = merge_no_proxy([once.as_str()], "b.example");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_shell_exports_quote_values() {
        let config = config_with_parameters("GREETING: \"it's\"\n");
        let overlay = materialize(&ctx(RuntimeMode::Docker), &config, &AmbientEnv::default());
        assert!(overlay
            .to_shell_exports()
            .contains("export GREETING='it'\\''s'\n"));
    }
}
