//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::VaxflowConfig;
use crate::domain::errors::VaxflowError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into VaxflowConfig
/// 4. Applies environment variable overrides (VAXFLOW_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use vaxflow::config::loader::load_config;
///
/// let config = load_config("vaxflow.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VaxflowConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VaxflowError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VaxflowError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: VaxflowConfig = toml::from_str(&contents)
        .map_err(|e| VaxflowError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config.validate().map_err(|e| {
        VaxflowError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line to skip comments
    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VaxflowError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the VAXFLOW_* prefix
///
/// Environment variables follow the pattern: VAXFLOW_<SECTION>_<KEY>
/// For example: VAXFLOW_REGISTRY_BASE_URL, VAXFLOW_AUTH_CLIENT_ID
fn apply_env_overrides(config: &mut VaxflowConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("VAXFLOW_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("VAXFLOW_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Registry overrides
    if let Ok(val) = std::env::var("VAXFLOW_REGISTRY_BASE_URL") {
        config.registry.base_url = val;
    }
    if let Ok(val) = std::env::var("VAXFLOW_REGISTRY_TLS_VERIFY") {
        config.registry.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("VAXFLOW_REGISTRY_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.registry.timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("VAXFLOW_REGISTRY_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.registry.retry.max_attempts = attempts;
        }
    }

    // Auth overrides
    if let Ok(val) = std::env::var("VAXFLOW_AUTH_TOKEN_URL") {
        config.auth.token_url = Some(val);
    }
    if let Ok(val) = std::env::var("VAXFLOW_AUTH_CLIENT_ID") {
        config.auth.client_id = val;
    }
    if let Ok(val) = std::env::var("VAXFLOW_AUTH_CLIENT_SECRET") {
        config.auth.client_secret = crate::config::secret_string(val);
    }

    // Submission overrides
    if let Ok(val) = std::env::var("VAXFLOW_SUBMISSION_POLL_FAILURE_TOLERANCE") {
        if let Ok(tolerance) = val.parse() {
            config.submission.poll_failure_tolerance = tolerance;
        }
    }
    if let Ok(val) = std::env::var("VAXFLOW_SUBMISSION_TRANSPORT_FAILURE_THRESHOLD") {
        if let Ok(threshold) = val.parse() {
            config.submission.transport_failure_threshold = threshold;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("VAXFLOW_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("VAXFLOW_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("VAXFLOW_TEST_VAR", "test_value");
        let input = "client_secret = \"${VAXFLOW_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "client_secret = \"test_value\"\n");
        std::env::remove_var("VAXFLOW_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("VAXFLOW_MISSING_VAR");
        let input = "client_secret = \"${VAXFLOW_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        let input = "# client_secret = \"${VAXFLOW_NOT_SET_EITHER}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${VAXFLOW_NOT_SET_EITHER}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "info"

[registry]
base_url = "https://registry.example.com/api"

[auth]
client_id = "portal-client"
client_secret = "s3cret"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.registry.base_url, "https://registry.example.com/api");
        assert_eq!(config.auth.client_id, "portal-client");
        assert_eq!(config.registry.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_config_invalid_values() {
        let toml_content = r#"
[application]
log_level = "shouting"

[registry]
base_url = "https://registry.example.com/api"

[auth]
client_id = "portal-client"
client_secret = "s3cret"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }
}
