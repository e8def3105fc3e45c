use crate::orchestrator::DEFAULT_RESULT_COUNT;
use anyhow::{anyhow, Context, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "web_search_assistant=debug,tower_http=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub exa_api_key: String,
    pub model: String,
    pub rewrite_model: String,
    pub result_count: usize,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("OpenAI API key not configured"))?;
        let exa_api_key = lookup("EXA_API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow!("EXA_API_KEY not set"))?;

        let model = lookup("ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let rewrite_model = lookup("ASSISTANT_REWRITE_MODEL").unwrap_or_else(|| model.clone());

        let result_count = match lookup("ASSISTANT_RESULT_COUNT") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("ASSISTANT_RESULT_COUNT is not a number: {:?}", raw))?,
            None => DEFAULT_RESULT_COUNT,
        };
        if result_count == 0 {
            return Err(anyhow!("ASSISTANT_RESULT_COUNT must be at least 1"));
        }

        let bind_addr = lookup("ASSISTANT_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(Self {
            openai_api_key,
            exa_api_key,
            model,
            rewrite_model,
            result_count,
            bind_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_keys_are_set() {
        let config =
            AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk"), ("EXA_API_KEY", "exa")])).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.rewrite_model, "gpt-4o");
        assert_eq!(config.result_count, 5);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn rewrite_model_follows_model_unless_set() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("EXA_API_KEY", "exa"),
            ("ASSISTANT_MODEL", "gpt-4o-mini"),
            ("ASSISTANT_RESULT_COUNT", "8"),
        ]))
        .unwrap();
        assert_eq!(config.rewrite_model, "gpt-4o-mini");
        assert_eq!(config.result_count, 8);
    }

    #[test]
    fn missing_keys_and_bad_counts_are_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[("EXA_API_KEY", "exa")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("EXA_API_KEY", "exa"),
            ("ASSISTANT_RESULT_COUNT", "five"),
        ]))
        .is_err());
        assert!(AppConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk"),
            ("EXA_API_KEY", "exa"),
            ("ASSISTANT_RESULT_COUNT", "0"),
        ]))
        .is_err());
    }
}
