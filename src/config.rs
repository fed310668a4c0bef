use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::checks::Check;
use crate::findings::ExclusionPolicy;
use crate::parsing::parse_list;
use crate::types::{Config, OutputOptions, ServerConfig};

pub const DEFAULT_DB_PATH: &str = "audit.db";
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:50051";

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

fn env_bool<E: EnvironmentProvider>(env: &E, key: &str) -> bool {
    env.get_var(key)
        .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}

fn parse_checks(value: &str) -> Result<Vec<Check>> {
    parse_list(value)
        .iter()
        .map(|name| {
            name.parse::<Check>()
                .map_err(|e| anyhow!("Invalid AUDIT_CHECKS: {}", e))
        })
        .collect()
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let namespace = env
        .get_var("AUDIT_NAMESPACE")
        .map(|ns| ns.trim().to_string())
        .unwrap_or_default();

    // an unset or blank selection runs everything
    let checks = match env.get_var("AUDIT_CHECKS") {
        Some(v) if !v.trim().is_empty() => parse_checks(&v)?,
        _ => Check::ALL.to_vec(),
    };

    // either list, when set, replaces the built-in one
    let mut exclusions = ExclusionPolicy::builtin();
    if let Some(v) = env.get_var("EXCLUDED_NAMESPACES") {
        exclusions = exclusions.with_namespaces(parse_list(&v));
    }
    if let Some(v) = env.get_var("EXCLUDED_RESOURCES") {
        exclusions = exclusions.with_resources(parse_list(&v));
    }

    let output = OutputOptions {
        json: env_bool(env, "AUDIT_OUTPUT_JSON"),
        yaml: env_bool(env, "AUDIT_OUTPUT_YAML"),
        file: env
            .get_var("AUDIT_OUTPUT_FILE")
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty()),
    };
    if output.json && output.yaml && output.file.is_some() {
        return Err(anyhow!(
            "AUDIT_OUTPUT_FILE cannot be used when both JSON and YAML output are enabled"
        ));
    }

    let db_path = match env.get_var("AUDIT_DB_PATH") {
        Some(p) if p.trim().is_empty() => None,
        Some(p) => Some(PathBuf::from(p.trim())),
        None => Some(PathBuf::from(DEFAULT_DB_PATH)),
    };

    Ok(Config {
        namespace,
        checks,
        exclusions,
        output,
        db_path,
    })
}

pub fn load_server_config() -> Result<ServerConfig> {
    load_server_config_with_env(&SystemEnvironment)
}

pub fn load_server_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<ServerConfig> {
    let bind_addr = env
        .get_var("SERVER_ADDR")
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string());
    if bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(anyhow!("Invalid SERVER_ADDR: {}", bind_addr));
    }

    let db_path = env
        .get_var("AUDIT_DB_PATH")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

    Ok(ServerConfig {
        bind_addr,
        db_path: PathBuf::from(db_path),
    })
}
