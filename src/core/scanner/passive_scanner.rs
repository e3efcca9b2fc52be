// src/core/scanner/passive_scanner.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::cancel::CancelToken;
use crate::core::error::ReconError;
use crate::core::models::EnumOptions;
use crate::core::runner;

const USER_AGENT: &str = "VanguardRecon/0.1";
const API_TIMEOUT: Duration = Duration::from_secs(30);

const SHODAN_ENDPOINT: &str = "https://api.shodan.io/dns/domain/";
const VIRUSTOTAL_ENDPOINT: &str = "https://www.virustotal.com/vtapi/v2/domain/report";

/// A hostname made of LDH labels, each 1 to 63 characters.
static RE_HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9_](?:[a-z0-9_-]{0,61}[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$")
        .expect("hostname regex is valid")
});

/// A third-party service that knows subdomains it has observed before.
#[async_trait]
pub trait PassiveSource: Send + Sync {
    /// Display name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Returns the raw subdomain entries the service reports for `domain`.
    async fn search_domain(&self, domain: &str) -> Result<Vec<String>, ReconError>;
}

/// Response shape shared by both services: `{"subdomains": [...]}`.
#[derive(Debug, Deserialize)]
struct SubdomainListing {
    #[serde(default)]
    subdomains: Vec<String>,
}

fn http_client() -> Result<reqwest::Client, ReconError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(API_TIMEOUT)
        .build()
        .map_err(|e| ReconError::api("failed to build HTTP client", e))
}

/// Sends a GET to `url` and parses the `subdomains` listing out of the body.
async fn fetch_listing(
    client: &reqwest::Client,
    source: &str,
    url: Url,
) -> Result<Vec<String>, ReconError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ReconError::api(format!("{source} request failed"), e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ReconError::api(format!("{source} response could not be read"), e))?;

    if !status.is_success() {
        return Err(ReconError::api(
            format!("{source} API error"),
            format!("HTTP status {status}"),
        ));
    }
    parse_listing(source, &body)
}

/// Parses a `{"subdomains": [...]}` body.
pub fn parse_listing(source: &str, body: &str) -> Result<Vec<String>, ReconError> {
    let listing: SubdomainListing = serde_json::from_str(body)
        .map_err(|e| ReconError::api(format!("{source} returned malformed JSON"), e))?;
    Ok(listing.subdomains)
}

/// Shodan DNS domain endpoint.
pub struct ShodanSource {
    client: reqwest::Client,
    api_key: String,
}

impl ShodanSource {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReconError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, domain: &str) -> Result<Url, ReconError> {
        let mut url = Url::parse(SHODAN_ENDPOINT)
            .and_then(|base| base.join(domain))
            .map_err(|e| ReconError::api("invalid Shodan URL", e))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl PassiveSource for ShodanSource {
    fn name(&self) -> &'static str {
        "Shodan"
    }

    async fn search_domain(&self, domain: &str) -> Result<Vec<String>, ReconError> {
        debug!(domain, "Querying Shodan.");
        fetch_listing(&self.client, self.name(), self.endpoint(domain)?).await
    }
}

/// VirusTotal v2 domain report endpoint.
pub struct VirusTotalSource {
    client: reqwest::Client,
    api_key: String,
}

impl VirusTotalSource {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReconError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, domain: &str) -> Result<Url, ReconError> {
        Url::parse_with_params(
            VIRUSTOTAL_ENDPOINT,
            &[("apikey", self.api_key.as_str()), ("domain", domain)],
        )
        .map_err(|e| ReconError::api("invalid VirusTotal URL", e))
    }
}

#[async_trait]
impl PassiveSource for VirusTotalSource {
    fn name(&self) -> &'static str {
        "VirusTotal"
    }

    async fn search_domain(&self, domain: &str) -> Result<Vec<String>, ReconError> {
        debug!(domain, "Querying VirusTotal.");
        fetch_listing(&self.client, self.name(), self.endpoint(domain)?).await
    }
}

/// Builds the sources enabled by `options`: only when `use_apis` is set, and
/// only those with a non-empty key. A source that cannot be constructed is
/// reported as an error instead.
pub fn configured_sources(
    options: &EnumOptions,
) -> (Vec<Arc<dyn PassiveSource>>, Vec<ReconError>) {
    let mut sources: Vec<Arc<dyn PassiveSource>> = Vec::new();
    let mut errors = Vec::new();
    if !options.use_apis {
        return (sources, errors);
    }

    let key = |k: &Option<String>| k.as_deref().map(str::trim).filter(|k| !k.is_empty()).map(String::from);

    if let Some(api_key) = key(&options.shodan_key) {
        match ShodanSource::new(api_key) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => errors.push(e),
        }
    }
    if let Some(api_key) = key(&options.virustotal_key) {
        match VirusTotalSource::new(api_key) {
            Ok(source) => sources.push(Arc::new(source)),
            Err(e) => errors.push(e),
        }
    }

    if sources.is_empty() && errors.is_empty() {
        warn!("External sources requested but no API key was provided.");
    }
    (sources, errors)
}

/// Queries every source concurrently in the background.
///
/// Each source's names are normalized and sent on the returned channel as
/// soon as that source answers, so callers can start resolving them while
/// slower sources are still pending. The channel is `None` when there is no
/// source to query.
///
/// Every failing source contributes one `Api` error to the joined task's
/// output. A query still pending when `cancel` fires is abandoned and
/// reported the same way.
pub fn spawn_harvest(
    sources: &[Arc<dyn PassiveSource>],
    domain: &str,
    cancel: &CancelToken,
) -> (Option<mpsc::Receiver<Vec<String>>>, JoinHandle<Vec<ReconError>>) {
    if sources.is_empty() {
        return (None, tokio::spawn(async { Vec::new() }));
    }
    info!(domain, sources = sources.len(), "Querying passive sources.");

    let owned_domain = domain.to_string();
    let query_cancel = cancel.clone();
    let rx = runner::run(sources.to_vec(), sources.len(), cancel.clone(), move |source| {
        let domain = owned_domain.clone();
        let cancel = query_cancel.clone();
        async move {
            let name = source.name();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ReconError::api(
                    format!("{name} query cancelled"),
                    "run cancelled before the source answered",
                )),
                reply = source.search_domain(&domain) => {
                    reply.map_err(|e| ReconError::api(format!("{name} query failed"), e))
                }
            };
            Some((name, outcome))
        }
    });

    let (names_tx, names_rx) = mpsc::channel(sources.len());
    let domain = domain.to_string();
    let errors = tokio::spawn(async move {
        let mut rx = rx;
        let mut errors = Vec::new();
        while let Some((name, outcome)) = rx.recv().await {
            match outcome {
                Ok(entries) => {
                    info!(source = name, count = entries.len(), "Passive source answered.");
                    // Nobody listening any more just means the names are not needed.
                    let _ = names_tx.send(normalize_names(entries, &domain)).await;
                }
                Err(e) => {
                    warn!(source = name, error = %e.detail(), "Passive source failed.");
                    errors.push(e);
                }
            }
        }
        errors
    });

    (Some(names_rx), errors)
}

/// Queries every source and waits for all of them.
///
/// The names from healthy sources are returned normalized and deduplicated
/// next to one `Api` error per failing source.
pub async fn harvest(
    sources: &[Arc<dyn PassiveSource>],
    domain: &str,
    cancel: &CancelToken,
) -> (Vec<String>, Vec<ReconError>) {
    let (batches, errors) = spawn_harvest(sources, domain, cancel);

    let mut raw = Vec::new();
    if let Some(mut batches) = batches {
        while let Some(batch) = batches.recv().await {
            raw.extend(batch);
        }
    }

    (normalize_names(raw, domain), join_errors(errors).await)
}

/// Waits for a harvest task. A task that died is logged and yields no errors.
pub async fn join_errors(errors: JoinHandle<Vec<ReconError>>) -> Vec<ReconError> {
    match errors.await {
        Ok(errors) => errors,
        Err(e) => {
            warn!(error = %e, "Passive source task failed to complete.");
            Vec::new()
        }
    }
}

/// Cleans raw source entries: lower-cases, trims a trailing dot and wildcard
/// prefix, qualifies bare labels with `domain`, drops anything outside
/// `domain` or not a valid hostname, and removes duplicates keeping first-seen
/// order.
pub fn normalize_names<I, S>(entries: I, domain: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    let suffix = format!(".{domain}");
    let mut seen = HashSet::new();

    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();
            let entry = entry.trim_start_matches("*.");
            if entry.is_empty() {
                return None;
            }
            let name = if entry == domain || entry.ends_with(&suffix) {
                entry.to_string()
            } else if !entry.contains('.') {
                format!("{entry}{suffix}")
            } else {
                return None;
            };
            (name != domain && RE_HOSTNAME.is_match(&name)).then_some(name)
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    struct FixedSource {
        name: &'static str,
        reply: Result<Vec<&'static str>, &'static str>,
    }

    #[async_trait]
    impl PassiveSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search_domain(&self, _domain: &str) -> Result<Vec<String>, ReconError> {
            match &self.reply {
                Ok(names) => Ok(names.iter().map(|n| n.to_string()).collect()),
                Err(msg) => Err(ReconError::api("request failed", *msg)),
            }
        }
    }

    #[test]
    fn parses_subdomain_listing() {
        let body = r#"{"domain": "example.com", "subdomains": ["www", "mail"], "tags": []}"#;
        assert_eq!(parse_listing("Shodan", body).unwrap(), vec!["www", "mail"]);
    }

    #[test]
    fn missing_listing_is_empty() {
        assert!(parse_listing("VirusTotal", r#"{"response_code": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_api_error() {
        let err = parse_listing("Shodan", "<html>rate limited</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[test]
    fn normalizes_labels_and_fqdns() {
        let names = normalize_names(
            [
                "www",
                "API.example.com.",
                "*.cdn.example.com",
                "mail.example.com",
                "www.example.com",
                "evil.com",
                "example.com",
                "bad_label!.example.com",
                "",
            ],
            "example.com",
        );
        assert_eq!(
            names,
            vec!["www.example.com", "api.example.com", "cdn.example.com", "mail.example.com"]
        );
    }

    #[test]
    fn endpoints_carry_domain_and_key() {
        let shodan = ShodanSource::new("s3cret").unwrap();
        let url = shodan.endpoint("example.com").unwrap();
        assert_eq!(url.as_str(), "https://api.shodan.io/dns/domain/example.com?key=s3cret");

        let vt = VirusTotalSource::new("k&y").unwrap();
        let url = vt.endpoint("example.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.virustotal.com/vtapi/v2/domain/report?apikey=k%26y&domain=example.com"
        );
    }

    #[test]
    fn sources_require_flag_and_key() {
        let mut options = EnumOptions::new("example.com");
        options.shodan_key = Some("abc".into());
        assert!(configured_sources(&options).0.is_empty());

        options.use_apis = true;
        options.virustotal_key = Some("   ".into());
        let (sources, errors) = configured_sources(&options);
        assert!(errors.is_empty());
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Shodan"]);
    }

    #[tokio::test]
    async fn failing_source_does_not_hide_the_others() {
        let sources: Vec<Arc<dyn PassiveSource>> = vec![
            Arc::new(FixedSource { name: "up", reply: Ok(vec!["www", "dev.example.com"]) }),
            Arc::new(FixedSource { name: "down", reply: Err("503") }),
        ];

        let (mut names, errors) = harvest(&sources, "example.com", &CancelToken::new()).await;
        names.sort();

        assert_eq!(names, vec!["dev.example.com", "www.example.com"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Api);
        assert!(errors[0].detail().contains("down query failed"));
    }

    /// A source that never answers within the lifetime of a test.
    struct HungSource;

    #[async_trait]
    impl PassiveSource for HungSource {
        fn name(&self) -> &'static str {
            "hung"
        }

        async fn search_domain(&self, _domain: &str) -> Result<Vec<String>, ReconError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn cancellation_abandons_a_hung_source() {
        let sources: Vec<Arc<dyn PassiveSource>> = vec![
            Arc::new(HungSource),
            Arc::new(FixedSource { name: "up", reply: Ok(vec!["www"]) }),
        ];
        let cancel = CancelToken::new();
        let _deadline = cancel.cancel_after(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let (names, errors) = harvest(&sources, "example.com", &cancel).await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(names, vec!["www.example.com"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Api);
        assert!(errors[0].detail().contains("hung query cancelled"));
    }

    #[tokio::test]
    async fn names_stream_before_slow_sources_answer() {
        let sources: Vec<Arc<dyn PassiveSource>> = vec![
            Arc::new(HungSource),
            Arc::new(FixedSource { name: "up", reply: Ok(vec!["dev"]) }),
        ];
        let cancel = CancelToken::new();
        let (batches, errors) = spawn_harvest(&sources, "example.com", &cancel);
        let mut batches = batches.unwrap();

        let first = tokio::time::timeout(Duration::from_secs(1), batches.recv())
            .await
            .expect("the healthy source should not wait for the hung one");
        assert_eq!(first, Some(vec!["dev.example.com".to_string()]));

        cancel.cancel();
        assert!(batches.recv().await.is_none());
        assert_eq!(join_errors(errors).await.len(), 1);
    }

    #[tokio::test]
    async fn no_sources_means_no_work() {
        let (names, errors) = harvest(&[], "example.com", &CancelToken::new()).await;
        assert!(names.is_empty() && errors.is_empty());
    }
}
