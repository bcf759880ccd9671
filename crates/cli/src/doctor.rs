// `outreach doctor` and `outreach key`: inspect and set up configuration.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use outreach_config::{keychain, mask_secret, Overrides, Setting, Settings};

use crate::exit_codes::EXIT_CONFIG_KEYCHAIN;
use crate::CliError;

fn describe(setting: &Setting, secret: bool) -> String {
    if setting.value.is_empty() {
        return format!("(not set)  [{}]", setting.source.as_str());
    }
    let shown = if secret {
        mask_secret(&setting.value)
    } else {
        setting.value.clone()
    };
    format!("{}  [{}]", shown, setting.source.as_str())
}

/// Render the doctor report. Returns whether the configuration is usable.
pub fn write_doctor<W: Write>(out: &mut W, settings: &Settings) -> io::Result<bool> {
    let problems = settings.problems();

    writeln!(out, "config file:       {}", settings.path.display())?;
    writeln!(
        out,
        "                   {}",
        if settings.file_found { "found" } else { "not found" }
    )?;
    writeln!(out, "api_key:           {}", describe(&settings.api_key, true))?;
    writeln!(
        out,
        "email_account_id:  {}",
        describe(&settings.email_account_id, false)
    )?;
    writeln!(out, "api_url:           {}", describe(&settings.api_url, false))?;
    writeln!(
        out,
        "delay_ms:          {}  [{}]",
        settings.delay.as_millis(),
        settings.delay_source.as_str()
    )?;
    writeln!(out, "timeout_secs:      {}", settings.timeout.as_secs())?;
    writeln!(out)?;

    if problems.is_empty() {
        writeln!(out, "status:            ok")?;
    } else {
        writeln!(out, "status:            {} problem(s)", problems.len())?;
        for p in &problems {
            writeln!(out, "  - {}", p)?;
        }
    }

    Ok(problems.is_empty())
}

pub fn cmd_doctor(config: Option<PathBuf>, init: bool) -> Result<(), CliError> {
    if init {
        let path = config.clone().unwrap_or_else(Settings::default_path);
        init_config(&path)?;
    }

    let settings = Settings::load(config.as_deref(), &Overrides::default()).map_err(CliError::config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let ok = write_doctor(&mut out, &settings).map_err(|e| CliError::io(e.to_string()))?;
    out.flush().map_err(|e| CliError::io(e.to_string()))?;

    if ok {
        return Ok(());
    }

    // Problems are already listed on stdout; exit with the first one's code.
    match settings.validate() {
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::config(e)),
    }
}

fn init_config(path: &Path) -> Result<(), CliError> {
    let written = Settings::write_template(path).map_err(CliError::config)?;
    if written {
        eprintln!("Wrote config template to {}", path.display());
        eprintln!("Edit it and replace the placeholder values.");
    } else {
        eprintln!("Config already exists at {}, leaving it unchanged", path.display());
    }
    Ok(())
}

pub fn cmd_key_set(key: String) -> Result<(), CliError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args("API key is empty"));
    }
    keychain::set_api_key(key).map_err(|e| CliError {
        code: EXIT_CONFIG_KEYCHAIN,
        message: e,
        hint: None,
    })?;
    eprintln!("API key stored in keychain ({})", mask_secret(key));
    Ok(())
}

pub fn cmd_key_delete() -> Result<(), CliError> {
    keychain::delete_api_key().map_err(|e| CliError {
        code: EXIT_CONFIG_KEYCHAIN,
        message: e,
        hint: None,
    })?;
    eprintln!("API key removed from keychain");
    Ok(())
}
