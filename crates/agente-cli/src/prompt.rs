use std::io::{self, Write};

use agente_core::Config;
use anyhow::{bail, Result};

/// Email from AGENTE_EMAIL, or asked for with the last used one as default
pub fn email(config: &Config) -> Result<String> {
    if let Ok(email) = std::env::var("AGENTE_EMAIL") {
        return Ok(email);
    }

    match config.last_email {
        Some(ref last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match (input.is_empty(), &config.last_email) {
        (false, _) => Ok(input.to_string()),
        (true, Some(last)) => Ok(last.clone()),
        (true, None) => bail!("Email required"),
    }
}

/// Password from AGENTE_PASSWORD, or read without echo
pub fn password() -> Result<String> {
    if let Ok(password) = std::env::var("AGENTE_PASSWORD") {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        bail!("Password required");
    }
    Ok(password)
}
