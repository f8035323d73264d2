use std::{env, fs, path::Path, time::Duration};

use crate::{
    dispatch::DEFAULT_SEND_PACING, errors::Error, group_cache::DEFAULT_GROUP_CACHE_TTL,
    groups::DEFAULT_SUGGESTION_LIMIT, phone::DEFAULT_COUNTRY_CODE, Result,
};

/// Typed configuration for the gateway, loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // HTTP
    pub bind_host: String,
    pub port: u16,
    pub api_key: String,
    pub max_body_bytes: usize,

    // Messaging bridge
    pub bridge_url: String,
    pub bridge_timeout: Duration,
    pub client_id: String,

    // Resolution / dispatch
    pub default_country_code: String,
    pub group_cache_ttl: Duration,
    pub send_pacing: Duration,
    pub group_suggestion_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let api_key = get("API_KEY").ok_or_else(|| {
            Error::Config("API_KEY environment variable is required".to_string())
        })?;

        let bind_host = get("BIND_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(get("PORT"), "PORT", 3001u16)?;
        let max_body_bytes = parse_or(get("MAX_BODY_BYTES"), "MAX_BODY_BYTES", 4 * 1024 * 1024)?;

        let bridge_url = get("BRIDGE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:3002".to_string())
            .trim_end_matches('/')
            .to_string();
        let bridge_timeout =
            Duration::from_millis(parse_or(get("BRIDGE_TIMEOUT_MS"), "BRIDGE_TIMEOUT_MS", 30_000)?);
        let client_id = get("CLIENT_ID").unwrap_or_else(|| "kirim-wa".to_string());

        let default_country_code = get("DEFAULT_COUNTRY_CODE")
            .map(|s| s.trim().trim_start_matches('+').to_string())
            .unwrap_or_else(|| DEFAULT_COUNTRY_CODE.to_string());
        validate_country_code(&default_country_code)?;

        let group_cache_ttl = get("GROUP_CACHE_TTL_SECS")
            .map(|v| parse_u64(&v, "GROUP_CACHE_TTL_SECS").map(Duration::from_secs))
            .transpose()?
            .unwrap_or(DEFAULT_GROUP_CACHE_TTL);
        let send_pacing = get("SEND_PACING_MS")
            .map(|v| parse_u64(&v, "SEND_PACING_MS").map(Duration::from_millis))
            .transpose()?
            .unwrap_or(DEFAULT_SEND_PACING);
        let group_suggestion_limit = parse_or(
            get("GROUP_SUGGESTION_LIMIT"),
            "GROUP_SUGGESTION_LIMIT",
            DEFAULT_SUGGESTION_LIMIT,
        )?;

        Ok(Self {
            bind_host,
            port,
            api_key,
            max_body_bytes,
            bridge_url,
            bridge_timeout,
            client_id,
            default_country_code,
            group_cache_ttl,
            send_pacing,
            group_suggestion_limit,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn validate_country_code(code: &str) -> Result<()> {
    let all_digits = !code.is_empty() && code.chars().all(|c| c.is_ascii_digit());
    if !all_digits || code.starts_with('0') || code.len() > 3 {
        return Err(Error::Config(format!(
            "DEFAULT_COUNTRY_CODE must be 1-3 digits without a leading zero, got {code:?}"
        )));
    }
    Ok(())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_or<T: std::str::FromStr>(v: Option<String>, key: &str, default: T) -> Result<T> {
    match v {
        Some(s) => s
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{key} is not a valid number: {s:?}"))),
        None => Ok(default),
    }
}

fn parse_u64(v: &str, key: &str) -> Result<u64> {
    parse_or(Some(v.to_string()), key, 0)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
