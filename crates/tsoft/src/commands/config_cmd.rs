//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const MASK: &str = "****";

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(MASK.into());
        }
    }
    cfg
}

/// Format config for display. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "debug = {}", cfg.defaults.debug);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "base_url = \"{}\"", p.base_url);
        if let Some(ref token) = p.token {
            let _ = writeln!(out, "token = \"{token}\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(debug) = p.debug {
            let _ = writeln!(out, "debug = {debug}");
        }
        if let Some(n) = p.image_concurrency {
            let _ = writeln!(out, "image_concurrency = {n}");
        }
        if let Some(n) = p.detail_concurrency {
            let _ = writeln!(out, "detail_concurrency = {n}");
        }
    }

    out.trim_end().to_owned()
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let available: Vec<_> = cfg.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("API token: ").map_err(prompt_err)?;
    let token = token.trim().to_owned();
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("T-Soft CLI configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let base_url: String = Input::new()
                .with_prompt("Shop API root")
                .default("https://shop.example.com/rest1".into())
                .validate_with(|input: &String| {
                    tsoft_config::parse_base_url(input)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let token = prompt_token()?;
            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the token?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(base_url.trim());
            if selection == 0 {
                tsoft_config::store_token(&profile_name, &token)?;
                output::status("Token stored in system keyring", true, color, global.quiet);
            } else {
                profile.token = Some(token);
            }

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            let written = config::save_config(&cfg)?;

            output::status(
                &format!("Configuration written to {}", written.display()),
                true,
                color,
                global.quiet,
            );
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: tsoft reference order-statuses");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, format_config, |_| "config".into())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: tsoft config init");
                return Ok(());
            }
            let default = cfg.active_profile_name(None);
            for name in cfg.profiles.keys() {
                let marker = if *name == default { " *" } else { "" };
                println!("{name}{marker}");
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(name, &cfg));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::status(&format!("Default profile set to '{name}'"), true, color, global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(profile_not_found(profile_name, &cfg));
            }

            let token = prompt_token()?;
            tsoft_config::store_token(&profile_name, &token)?;
            output::status(
                &format!("Token for '{profile_name}' stored in system keyring"),
                true,
                color,
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_tokens() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("https://shop.example.com/rest1");
        profile.token = Some("s3cret".into());
        cfg.profiles.insert("shop".into(), profile);

        let text = format_config(&redacted(&cfg));
        assert!(text.contains("[profiles.shop]"));
        assert!(text.contains("token = \"****\""));
        assert!(!text.contains("s3cret"));
    }
}
