// ============================================================================
// Configuration
// ============================================================================
// Arguments de ligne de commande + variables d'environnement
//
// CONCEPTS RUST :
// 1. clap derive : la struct décrit la CLI, clap génère le parser
// 2. #[arg(env = "...")] : fallback sur une variable d'environnement
//    (le fichier .env est chargé par dotenv avant le parsing)
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::api::{
    ApiKeyKind, Backoff, ClientSettings, RetryPolicy, DEFAULT_BASE_URL, PRO_BASE_URL,
};
use crate::models::{DEFAULT_PER_PAGE, PER_PAGE_CHOICES};

/// Plafond des délais de retry
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Stratégie de backoff choisie en CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffArg {
    Linear,
    Exponential,
}

impl From<BackoffArg> for Backoff {
    fn from(arg: BackoffArg) -> Self {
        match arg {
            BackoffArg::Linear => Backoff::Linear,
            BackoffArg::Exponential => Backoff::Exponential,
        }
    }
}

/// CoinVista : prix, market cap et historique des cryptomonnaies dans le terminal
#[derive(Debug, Clone, Parser)]
#[command(name = "coinvista", version)]
pub struct Config {
    /// Clé API CoinGecko (sans clé : accès public, quota réduit)
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// La clé est une clé "pro" (en-tête x-cg-pro-api-key)
    #[arg(long, env = "COINGECKO_PRO", default_value_t = false)]
    pub pro: bool,

    /// URL de base de l'API (défaut : hôte public, ou hôte pro avec --pro)
    #[arg(long, env = "COINGECKO_BASE_URL")]
    pub base_url: Option<String>,

    /// Devise de cotation
    #[arg(long, env = "COINVISTA_CURRENCY", default_value = "usd")]
    pub currency: String,

    /// Coins par page (50, 100 ou 150)
    #[arg(long, default_value_t = DEFAULT_PER_PAGE, value_parser = parse_per_page)]
    pub per_page: u32,

    /// Nombre total de tentatives par requête
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Délai de base entre deux tentatives (ms)
    #[arg(long, default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Croissance du délai entre tentatives
    #[arg(long, value_enum, default_value_t = BackoffArg::Exponential)]
    pub backoff: BackoffArg,

    /// Timeout d'une requête HTTP (secondes)
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Répertoire des fichiers de logs
    #[arg(long, env = "COINVISTA_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Politique de retry dérivée des options
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_millis(self.retry_delay_ms),
            max_delay: MAX_RETRY_DELAY,
            backoff: self.backoff.into(),
        }
    }

    /// URL de base effective
    ///
    /// Une clé pro n'est acceptée que par pro-api.coingecko.com :
    /// sans --base-url explicite, --pro bascule sur cet hôte.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ if self.pro => PRO_BASE_URL.to_string(),
            _ => DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Paramètres du client CoinGecko
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            key_kind: if self.pro { ApiKeyKind::Pro } else { ApiKeyKind::Demo },
            currency: self.currency.to_lowercase(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            retry: self.retry_policy(),
        }
    }

    /// Répertoire de logs effectif
    ///
    /// - --log-dir / COINVISTA_LOG_DIR si fourni
    /// - sinon ~/.local/share/coinvista/logs (Linux), équivalent macOS/Windows
    /// - sinon ./logs
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("coinvista").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"))
    }
}

fn parse_per_page(value: &str) -> Result<u32, String> {
    let n: u32 = value
        .parse()
        .map_err(|_| format!("'{}' n'est pas un nombre", value))?;
    if PER_PAGE_CHOICES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("valeurs acceptées : {:?}", PER_PAGE_CHOICES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["coinvista", "--base-url", DEFAULT_BASE_URL]).unwrap();
        assert_eq!(config.per_page, 50);
        assert_eq!(config.max_attempts, 3);

        let policy = config.retry_policy();
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
        assert_eq!(policy.backoff, Backoff::Exponential);
    }

    #[test]
    fn test_per_page_restricted() {
        assert!(Config::try_parse_from(["coinvista", "--per-page", "100"]).is_ok());
        assert!(Config::try_parse_from(["coinvista", "--per-page", "75"]).is_err());
        assert!(Config::try_parse_from(["coinvista", "--per-page", "abc"]).is_err());
    }

    #[test]
    fn test_client_settings() {
        let config = Config::try_parse_from([
            "coinvista",
            "--api-key",
            "CG-abc",
            "--pro",
            "--currency",
            "EUR",
            "--backoff",
            "linear",
            "--max-attempts",
            "0",
        ])
        .unwrap();

        let settings = config.client_settings();
        assert_eq!(settings.api_key.as_deref(), Some("CG-abc"));
        assert_eq!(settings.key_kind, ApiKeyKind::Pro);
        assert_eq!(settings.currency, "eur");
        assert_eq!(settings.retry.backoff, Backoff::Linear);
        assert_eq!(settings.retry.max_attempts, 1);
    }

    #[test]
    fn test_base_url_follows_key_kind() {
        let public = Config::try_parse_from(["coinvista", "--base-url", ""]).unwrap();
        assert_eq!(public.client_settings().base_url, DEFAULT_BASE_URL);

        let pro = Config::try_parse_from(["coinvista", "--pro", "--base-url", ""]).unwrap();
        assert_eq!(pro.client_settings().base_url, PRO_BASE_URL);

        let custom = Config::try_parse_from([
            "coinvista",
            "--pro",
            "--base-url",
            "http://127.0.0.1:8080/api/v3",
        ])
        .unwrap();
        assert_eq!(custom.base_url(), "http://127.0.0.1:8080/api/v3");
    }

    #[test]
    fn test_pro_without_base_url_uses_pro_host() {
        let config = Config {
            base_url: None,
            ..Config::try_parse_from(["coinvista", "--pro"]).unwrap()
        };
        assert_eq!(config.base_url(), PRO_BASE_URL);
    }

    #[test]
    fn test_explicit_log_dir() {
        let config = Config::try_parse_from(["coinvista", "--log-dir", "/tmp/cv-logs"]).unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/cv-logs"));
    }
}
