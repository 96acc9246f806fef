// ============================================================================
// API Client : CoinGecko
// ============================================================================
// Récupère les données de marché depuis l'API publique CoinGecko v3
//
// Endpoints utilisés :
// - /coins/markets           : tableau des coins (paginé, avec sparkline)
// - /search                  : recherche par nom / symbole
// - /coins/{id}              : fiche détaillée
// - /global                  : statistiques globales (nombre de coins)
// - /coins/{id}/market_chart : historique de prix
//
// Chaque requête passe par with_retry (erreurs transitoires) puis par un
// cache court terme (TtlCache) pour ne pas épuiser le quota de l'API.
// ============================================================================

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::api::cache::{
    TtlCache, CHART_TTL, DETAILS_TTL, GLOBAL_TTL, MARKETS_TTL, SEARCH_TTL,
};
use crate::api::error::ApiError;
use crate::api::retry::{with_retry, RetryPolicy};
use crate::models::global::GlobalResponse;
use crate::models::market_chart::MarketChartResponse;
use crate::models::{
    Coin, CoinDetails, GlobalData, MarketChart, SearchResult, SortState, Timespan,
};

/// URL de base de l'API publique
pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// URL de base de l'API payante (clés "pro")
pub const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

/// Maximum accepté par CoinGecko pour per_page
const MAX_PER_PAGE: u32 = 250;

/// Type de clé API : chaque offre CoinGecko a son propre en-tête
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyKind {
    Demo,
    Pro,
}

impl ApiKeyKind {
    pub fn header_name(&self) -> &'static str {
        match self {
            ApiKeyKind::Demo => "x-cg-demo-api-key",
            ApiKeyKind::Pro => "x-cg-pro-api-key",
        }
    }
}

/// Paramètres du client (construits depuis la configuration)
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub key_kind: ApiKeyKind,

    /// Devise de cotation (ex: "usd")
    pub currency: String,

    /// Timeout de chaque requête HTTP
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            key_kind: ApiKeyKind::Demo,
            currency: "usd".to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Clé du cache des marchés : (page, per_page, order, devise)
type MarketsKey = (u32, u32, String, String);

/// Caches par type de réponse
struct Caches {
    markets: TtlCache<MarketsKey, Vec<Coin>>,
    details: TtlCache<String, CoinDetails>,
    search: TtlCache<String, SearchResult>,
    global: TtlCache<(), GlobalData>,
    chart: TtlCache<(String, Timespan, String), MarketChart>,
}

impl Caches {
    fn new() -> Self {
        Self {
            markets: TtlCache::new(MARKETS_TTL),
            details: TtlCache::new(DETAILS_TTL),
            search: TtlCache::new(SEARCH_TTL),
            global: TtlCache::new(GLOBAL_TTL),
            chart: TtlCache::new(CHART_TTL),
        }
    }
}

/// Client CoinGecko
///
/// CONCEPT RUST : Mutex pour la mutabilité intérieure
/// - Les méthodes prennent &self mais doivent écrire dans le cache
/// - Le lock n'est jamais gardé pendant un .await
pub struct CoinGeckoClient {
    http: reqwest::Client,
    settings: ClientSettings,
    caches: Mutex<Caches>,
}

impl CoinGeckoClient {
    /// Crée le client HTTP avec les en-têtes par défaut (accept + clé API)
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(key) = settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            let value = HeaderValue::from_str(key)
                .map_err(|e| ApiError::InvalidInput(format!("clé API invalide : {}", e)))?;
            headers.insert(settings.key_kind.header_name(), value);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("coinvista/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        debug!(base_url = %settings.base_url, has_key = settings.api_key.is_some(), "CoinGecko client created");

        Ok(Self {
            http,
            settings,
            caches: Mutex::new(Caches::new()),
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn currency(&self) -> &str {
        &self.settings.currency
    }

    /// Vide tous les caches (rechargement demandé par l'utilisateur)
    pub fn invalidate(&self) {
        let mut caches = self.caches.lock().unwrap();
        *caches = Caches::new();
        debug!("Response caches cleared");
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    /// Page du tableau des marchés
    ///
    /// # Arguments
    /// * `page` - numéro de page (1-based)
    /// * `per_page` - nombre de coins par page (1 à 250)
    /// * `sort` - critère de tri (seul le paramètre "order" est envoyé)
    #[instrument(skip(self, sort), fields(order = %sort.api_order()))]
    pub async fn fetch_coins(
        &self,
        page: u32,
        per_page: u32,
        sort: &SortState,
    ) -> Result<Vec<Coin>, ApiError> {
        if page == 0 {
            return Err(ApiError::InvalidInput("la page commence à 1".to_string()));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(ApiError::InvalidInput(format!(
                "per_page doit être entre 1 et {}",
                MAX_PER_PAGE
            )));
        }

        let order = sort.api_order();
        let key: MarketsKey = (page, per_page, order.clone(), self.settings.currency.clone());
        if let Some(coins) = self.caches.lock().unwrap().markets.get_fresh(&key) {
            debug!(coins = coins.len(), "Markets served from cache");
            return Ok(coins);
        }

        let query = [
            ("vs_currency", self.settings.currency.clone()),
            ("order", order),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "true".to_string()),
            ("price_change_percentage", "1h,24h,7d,30d".to_string()),
        ];
        let coins: Vec<Coin> = self.get_json("coins/markets", "/coins/markets", &query).await?;

        info!(coins = coins.len(), "Fetched market page");
        self.caches.lock().unwrap().markets.insert(key, coins.clone());
        Ok(coins)
    }

    /// Recherche de coins par nom ou symbole
    ///
    /// Une requête vide (ou seulement des espaces) ne fait aucun appel réseau
    #[instrument(skip(self))]
    pub async fn search_coins(&self, query: &str) -> Result<SearchResult, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResult::empty());
        }

        let key = query.to_lowercase();
        if let Some(result) = self.caches.lock().unwrap().search.get_fresh(&key) {
            debug!("Search served from cache");
            return Ok(result);
        }

        let params = [("query", query.to_string())];
        let result: SearchResult = self.get_json("search", "/search", &params).await?;

        info!(results = result.coins.len(), "Search completed");
        self.caches.lock().unwrap().search.insert(key, result.clone());
        Ok(result)
    }

    /// Fiche détaillée d'un coin
    #[instrument(skip(self))]
    pub async fn fetch_coin_details(&self, coin_id: &str) -> Result<CoinDetails, ApiError> {
        validate_coin_id(coin_id)?;

        if let Some(details) = self.caches.lock().unwrap().details.get_fresh(&coin_id.to_string()) {
            debug!("Coin details served from cache");
            return Ok(details);
        }

        let path = format!("/coins/{}", coin_id);
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
            ("sparkline", "true".to_string()),
        ];
        let details: CoinDetails = self.get_json("coins/{id}", &path, &query).await?;

        info!(name = %details.name, "Fetched coin details");
        self.caches
            .lock()
            .unwrap()
            .details
            .insert(coin_id.to_string(), details.clone());
        Ok(details)
    }

    /// Statistiques globales du marché
    #[instrument(skip(self))]
    pub async fn fetch_global(&self) -> Result<GlobalData, ApiError> {
        if let Some(global) = self.caches.lock().unwrap().global.get_fresh(&()) {
            debug!("Global data served from cache");
            return Ok(global);
        }

        let response: GlobalResponse = self.get_json("global", "/global", &[]).await?;
        let global = response.data;

        info!(active = global.active_cryptocurrencies, "Fetched global data");
        self.caches.lock().unwrap().global.insert((), global.clone());
        Ok(global)
    }

    /// Historique de prix d'un coin sur une période
    #[instrument(skip(self), fields(days = timespan.to_days()))]
    pub async fn fetch_market_chart(
        &self,
        coin_id: &str,
        timespan: Timespan,
    ) -> Result<MarketChart, ApiError> {
        validate_coin_id(coin_id)?;

        let key = (coin_id.to_string(), timespan, self.settings.currency.clone());
        if let Some(chart) = self.caches.lock().unwrap().chart.get_fresh(&key) {
            debug!("Market chart served from cache");
            return Ok(chart);
        }

        let path = format!("/coins/{}/market_chart", coin_id);
        let query = [
            ("vs_currency", self.settings.currency.clone()),
            ("days", timespan.to_days().to_string()),
        ];
        let response: MarketChartResponse =
            self.get_json("coins/{id}/market_chart", &path, &query).await?;
        let chart = MarketChart::from_response(coin_id.to_string(), timespan, response);

        info!(points = chart.len(), "Fetched market chart");
        self.caches.lock().unwrap().chart.insert(key, chart.clone());
        Ok(chart)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// GET + retry + parsing JSON
    async fn get_json<T: DeserializeOwned>(
        &self,
        label: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.settings.base_url.trim_end_matches('/'), path);
        with_retry(&self.settings.retry, label, || self.send_once(&url, query)).await
    }

    /// Une seule tentative : statut non-2xx → ApiError typée
    async fn send_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        debug!(status = %status, url, "Received HTTP response");

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, body, retry_after));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Les ids CoinGecko sont en minuscules avec tirets (ex: "wrapped-bitcoin")
///
/// Refuse tout ce qui pourrait sortir du chemin de l'URL
fn validate_coin_id(coin_id: &str) -> Result<(), ApiError> {
    if coin_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("identifiant de coin vide".to_string()));
    }
    let valid = coin_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(ApiError::InvalidInput(format!(
            "identifiant de coin invalide : {}",
            coin_id
        )));
    }
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Les tests tournent contre un petit serveur HTTP local (tokio TcpListener)
// qui renvoie des réponses préparées : pas besoin de réseau
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::retry::Backoff;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Requêtes reçues par le serveur de test (ligne de requête + en-têtes)
    type Recorded = Arc<std::sync::Mutex<Vec<String>>>;

    fn http_response(status: &str, body: &str, extra_headers: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
            status,
            body.len(),
            extra_headers,
            body
        )
    }

    /// Lance un serveur qui sert les réponses dans l'ordre, une par connexion
    async fn spawn_server(responses: Vec<String>) -> (String, Recorded) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let recorded: Recorded = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = recorded.clone();

        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    let n = socket.read(&mut chunk).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                log.lock().unwrap().push(String::from_utf8_lossy(&buf).to_string());
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), recorded)
    }

    fn test_client(base_url: String, api_key: Option<&str>) -> CoinGeckoClient {
        CoinGeckoClient::new(ClientSettings {
            base_url,
            api_key: api_key.map(str::to_string),
            key_kind: ApiKeyKind::Demo,
            currency: "usd".to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(20),
                backoff: Backoff::Exponential,
            },
        })
        .unwrap()
    }

    const MARKETS_BODY: &str = r#"[
        {"id":"bitcoin","symbol":"btc","name":"Bitcoin","current_price":67000.0,
         "market_cap":1320000000000,"market_cap_rank":1,"total_volume":3.5e10,
         "price_change_percentage_7d_in_currency":2.0,
         "sparkline_in_7d":{"price":[1.0,2.0]}},
        {"id":"ethereum","symbol":"eth","name":"Ethereum","current_price":3500.0,
         "market_cap":420000000000,"market_cap_rank":2,"total_volume":1.5e10}
    ]"#;

    #[tokio::test]
    async fn test_fetch_coins_sends_params_and_key() {
        let (base_url, recorded) =
            spawn_server(vec![http_response("200 OK", MARKETS_BODY, "")]).await;
        let client = test_client(base_url, Some("CG-test-key"));

        let coins = client
            .fetch_coins(2, 50, &SortState::default())
            .await
            .unwrap();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].id, "bitcoin");

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = requests[0].to_lowercase();
        assert!(request.starts_with("get /coins/markets?"));
        assert!(request.contains("vs_currency=usd"));
        assert!(request.contains("order=market_cap_desc"));
        assert!(request.contains("per_page=50"));
        assert!(request.contains("page=2"));
        assert!(request.contains("sparkline=true"));
        assert!(request.contains("x-cg-demo-api-key: cg-test-key"));
        assert!(request.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_rate_limited_response_is_retried() {
        let (base_url, recorded) = spawn_server(vec![
            http_response("429 Too Many Requests", "{}", "Retry-After: 0\r\n"),
            http_response("200 OK", r#"{"data":{"active_cryptocurrencies":14000}}"#, ""),
        ])
        .await;
        let client = test_client(base_url, None);

        let global = client.fetch_global().await.unwrap();
        assert_eq!(global.active_cryptocurrencies, 14000);
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let (base_url, recorded) = spawn_server(vec![
            http_response("503 Service Unavailable", "down", ""),
            http_response("503 Service Unavailable", "down", ""),
            http_response("503 Service Unavailable", "down", ""),
        ])
        .await;
        let client = test_client(base_url, None);

        let result = client.fetch_global().await;
        assert!(matches!(result, Err(ApiError::Server { status: 503, .. })));
        assert_eq!(recorded.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_coin_is_not_retried() {
        let (base_url, recorded) = spawn_server(vec![http_response(
            "404 Not Found",
            r#"{"error":"coin not found"}"#,
            "",
        )])
        .await;
        let client = test_client(base_url, None);

        let result = client.fetch_coin_details("does-not-exist").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_makes_no_request() {
        let (base_url, recorded) = spawn_server(Vec::new()).await;
        let client = test_client(base_url, None);

        let result = client.search_coins("   ").await.unwrap();
        assert!(result.suggestions().is_empty());
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_url_encoded_and_cached() {
        let body = r#"{"coins":[{"id":"shiba-inu","name":"Shiba Inu","symbol":"SHIB","market_cap_rank":15}]}"#;
        let (base_url, recorded) = spawn_server(vec![http_response("200 OK", body, "")]).await;
        let client = test_client(base_url, None);

        let first = client.search_coins("shiba inu").await.unwrap();
        let second = client.search_coins("Shiba Inu ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.coins[0].id, "shiba-inu");

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /search?query=shiba+inu "));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let body = r#"{"data":{"active_cryptocurrencies":1}}"#;
        let (base_url, recorded) = spawn_server(vec![
            http_response("200 OK", body, ""),
            http_response("200 OK", body, ""),
        ])
        .await;
        let client = test_client(base_url, None);

        client.fetch_global().await.unwrap();
        client.fetch_global().await.unwrap();
        assert_eq!(recorded.lock().unwrap().len(), 1);

        client.invalidate();
        client.fetch_global().await.unwrap();
        assert_eq!(recorded.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_market_chart_request() {
        let body = r#"{"prices":[[1729036800000,100.0],[1729123200000,105.0]]}"#;
        let (base_url, recorded) = spawn_server(vec![http_response("200 OK", body, "")]).await;
        let client = test_client(base_url, None);

        let chart = client
            .fetch_market_chart("bitcoin", Timespan::Month)
            .await
            .unwrap();
        assert_eq!(chart.len(), 2);
        assert!((chart.change_percent() - 5.0).abs() < 1e-9);

        let requests = recorded.lock().unwrap();
        assert!(requests[0].starts_with("GET /coins/bitcoin/market_chart?"));
        assert!(requests[0].contains("days=30"));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_locally() {
        let client = test_client("http://127.0.0.1:9".to_string(), None);

        assert!(matches!(
            client.fetch_coin_details("").await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            client.fetch_coin_details("../global").await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            client.fetch_coins(0, 50, &SortState::default()).await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            client.fetch_coins(1, 500, &SortState::default()).await,
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let (base_url, recorded) =
            spawn_server(vec![http_response("200 OK", "{not json", "")]).await;
        let client = test_client(base_url, None);

        let result = client.fetch_global().await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
        assert_eq!(recorded.lock().unwrap().len(), 1);
    }
}
