//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::{Settings, ACCESS_KEY_VAR, SECRET_KEY_VAR};
use console::style;
use std::path::Path;
use url::Url;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Jimeng MCP Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let credential_check = check_credentials(settings);
    credential_check.print();
    checks.push(credential_check);

    println!();

    println!("{}", style("Backend").bold());
    let backend_checks = vec![check_endpoint(settings), check_poll_budget(settings)];
    for check in &backend_checks {
        check.print();
    }
    checks.extend(backend_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Tools will fail until they are fixed.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! The MCP server is ready to use.");
    }

    Ok(())
}

fn check_credentials(settings: &Settings) -> CheckResult {
    let hint = format!(
        "Set {} and {} in the environment, a .env file or {}",
        ACCESS_KEY_VAR,
        SECRET_KEY_VAR,
        settings.env_file().display()
    );

    match settings.credentials() {
        Some(creds) => CheckResult::ok(
            "Access key",
            &format!("configured ({})", creds.masked_access_key()),
        ),
        None => CheckResult::error("Access key", "not configured", &hint),
    }
}

fn check_endpoint(settings: &Settings) -> CheckResult {
    match Url::parse(&settings.api.endpoint) {
        Ok(url) if url.scheme() == "https" => CheckResult::ok("Endpoint", url.as_str()),
        Ok(url) => CheckResult::warning(
            "Endpoint",
            &format!("{} is not https", url),
            "Requests are signed but travel unencrypted",
        ),
        Err(e) => CheckResult::error(
            "Endpoint",
            &format!("invalid URL: {}", e),
            "Fix api.endpoint in the config file",
        ),
    }
}

fn check_poll_budget(settings: &Settings) -> CheckResult {
    let video = &settings.video;
    let message = format!(
        "poll every {}s, wait up to {}s",
        video.poll_interval().as_secs(),
        video.max_wait().as_secs()
    );

    if video.max_wait() < video.poll_interval() {
        CheckResult::warning(
            "Sync video wait",
            &message,
            "max_wait_secs is shorter than one poll interval; sync calls will time out",
        )
    } else {
        CheckResult::ok("Sync video wait", &message)
    }
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::ok(
            "Config file",
            &format!("using defaults (no file at {})", config_path.display()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_from_config_file() {
        let mut settings = Settings::default();
        settings.credentials.access_key = Some("AKLTabcdefgh1234".to_string());
        settings.credentials.secret_key = Some("secret".to_string());

        let check = check_credentials(&settings);
        assert_eq!(check.status, CheckStatus::Ok);
        assert!(!check.message.contains("abcdefgh"));
    }

    #[test]
    fn test_invalid_endpoint_is_error() {
        let mut settings = Settings::default();
        settings.api.endpoint = "not a url".to_string();
        assert_eq!(check_endpoint(&settings).status, CheckStatus::Error);

        settings.api.endpoint = "http://localhost:9000".to_string();
        assert_eq!(check_endpoint(&settings).status, CheckStatus::Warning);
    }

    #[test]
    fn test_short_wait_budget_warns() {
        let mut settings = Settings::default();
        assert_eq!(check_poll_budget(&settings).status, CheckStatus::Ok);

        settings.video.poll_interval_secs = 10;
        settings.video.max_wait_secs = 3;
        assert_eq!(check_poll_budget(&settings).status, CheckStatus::Warning);
    }
}
