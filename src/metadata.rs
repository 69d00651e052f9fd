use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::MetadataConfig;
use crate::error::ProviderError;
use crate::models::Metadata;

/// Best match from a free-text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchMatch {
    pub author: Option<String>,
    pub cover_id: Option<String>,
    pub first_sentence: Option<String>,
    pub detail_key: Option<String>,
}

/// Remote lookup service: search by term, then fetch detail by key.
pub trait MetadataProvider {
    fn search(&self, term: &str) -> Result<Option<SearchMatch>, ProviderError>;
    fn fetch_detail(&self, key: &str) -> Result<Option<String>, ProviderError>;
}

pub struct OpenLibraryProvider {
    client: Client,
    base_url: String,
    user_agent: String,
    debug: bool,
}

impl OpenLibraryProvider {
    pub fn new(config: &MetadataConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(OpenLibraryProvider {
            client,
            base_url: config.openlibrary_url.clone(),
            user_agent: config.user_agent.clone(),
            debug: config.debug,
        })
    }

    fn fetch_json(&self, url: &str) -> Result<Value, ProviderError> {
        if self.debug {
            log::info!("[metadata-debug] http start url={}", url);
        }
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if self.debug {
                log::warn!("[metadata-debug] http status url={} status={}", url, status);
            }
            return Err(ProviderError::Status(status.as_u16()));
        }
        if self.debug {
            log::info!("[metadata-debug] http success url={} status={}", url, status);
        }
        response
            .json::<Value>()
            .map_err(|err| ProviderError::Decode(err.to_string()))
    }
}

impl MetadataProvider for OpenLibraryProvider {
    fn search(&self, term: &str) -> Result<Option<SearchMatch>, ProviderError> {
        let url = format!(
            "{}/search.json?limit=1&q={}",
            self.base_url,
            urlencoding::encode(term)
        );
        let data = self.fetch_json(&url)?;
        Ok(data
            .get("docs")
            .and_then(|value| value.as_array())
            .and_then(|docs| docs.first())
            .map(parse_search_doc))
    }

    fn fetch_detail(&self, key: &str) -> Result<Option<String>, ProviderError> {
        let url = format!("{}/{}.json", self.base_url, key.trim_start_matches('/'));
        let detail = self.fetch_json(&url)?;
        Ok(parse_detail_description(&detail))
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &P {
    fn search(&self, term: &str) -> Result<Option<SearchMatch>, ProviderError> {
        (**self).search(term)
    }

    fn fetch_detail(&self, key: &str) -> Result<Option<String>, ProviderError> {
        (**self).fetch_detail(key)
    }
}

/// Answers every lookup with "no match".
pub struct OfflineProvider;

impl MetadataProvider for OfflineProvider {
    fn search(&self, _term: &str) -> Result<Option<SearchMatch>, ProviderError> {
        Ok(None)
    }

    fn fetch_detail(&self, _key: &str) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }
}

pub(crate) fn parse_search_doc(doc: &Value) -> SearchMatch {
    let author = doc
        .get("author_name")
        .and_then(|value| value.as_array())
        .and_then(|names| names.first())
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .and_then(non_empty);

    let cover_id = doc.get("cover_i").and_then(|value| match value {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => non_empty(text.to_string()),
        _ => None,
    });

    let first_sentence = match doc.get("first_sentence") {
        Some(Value::String(text)) => non_empty(text.to_string()),
        Some(Value::Array(lines)) => lines
            .first()
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .and_then(non_empty),
        _ => None,
    };

    let detail_key = doc
        .get("key")
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .and_then(non_empty);

    SearchMatch {
        author,
        cover_id,
        first_sentence,
        detail_key,
    }
}

pub(crate) fn parse_detail_description(detail: &Value) -> Option<String> {
    match detail.get("description")? {
        Value::String(text) => non_empty(text.to_string()),
        Value::Object(map) => map
            .get("value")
            .and_then(|entry| entry.as_str())
            .map(|text| text.to_string())
            .and_then(non_empty),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Links {
    covers_url: String,
    goodreads_url: String,
}

impl Links {
    fn cover(&self, cover_id: &str) -> String {
        format!("{}/b/id/{}-L.jpg", self.covers_url, cover_id)
    }

    fn goodreads_search(&self, title: &str, author: &str) -> String {
        let query = join_non_empty(&[title, author]);
        if query.is_empty() {
            return String::new();
        }
        format!(
            "{}/search?q={}",
            self.goodreads_url,
            urlencoding::encode(&query)
        )
    }
}

/// Fields gathered so far while one record is enriched.
#[derive(Debug)]
pub(crate) struct EnrichmentContext<'a> {
    title: &'a str,
    local_author: &'a str,
    query: String,
    gathered: Metadata,
    detail_key: Option<String>,
}

impl<'a> EnrichmentContext<'a> {
    fn new(title: &'a str, local_author: &'a str) -> Self {
        EnrichmentContext {
            title,
            local_author,
            query: join_non_empty(&[title, local_author]),
            gathered: Metadata::default(),
            detail_key: None,
        }
    }

    fn finish(self, links: &Links) -> Metadata {
        let mut metadata = self.gathered;
        let author = metadata
            .author
            .as_deref()
            .unwrap_or(self.local_author)
            .to_string();
        metadata.goodreads_url = links.goodreads_search(self.title, &author);
        metadata
    }
}

pub(crate) enum StageOutcome {
    Continue,
    Done,
}

/// One step of the lookup pipeline. A stage may only add fields; an error
/// stops the pipeline but keeps what earlier stages gathered.
pub(crate) trait EnrichmentStage {
    fn name(&self) -> &'static str;
    fn run(
        &self,
        provider: &dyn MetadataProvider,
        links: &Links,
        ctx: &mut EnrichmentContext<'_>,
    ) -> Result<StageOutcome, ProviderError>;
}

struct SearchStage;

impl EnrichmentStage for SearchStage {
    fn name(&self) -> &'static str {
        "search"
    }

    fn run(
        &self,
        provider: &dyn MetadataProvider,
        links: &Links,
        ctx: &mut EnrichmentContext<'_>,
    ) -> Result<StageOutcome, ProviderError> {
        let Some(found) = provider.search(&ctx.query)? else {
            return Ok(StageOutcome::Done);
        };
        ctx.gathered.author = found
            .author
            .or_else(|| non_empty(ctx.local_author.to_string()));
        ctx.gathered.cover_url = found.cover_id.as_deref().map(|id| links.cover(id));
        ctx.gathered.description = found.first_sentence;
        ctx.detail_key = found.detail_key;
        Ok(StageOutcome::Continue)
    }
}

struct DetailStage;

impl EnrichmentStage for DetailStage {
    fn name(&self) -> &'static str {
        "detail"
    }

    fn run(
        &self,
        provider: &dyn MetadataProvider,
        _links: &Links,
        ctx: &mut EnrichmentContext<'_>,
    ) -> Result<StageOutcome, ProviderError> {
        let Some(key) = ctx.detail_key.clone() else {
            return Ok(StageOutcome::Done);
        };
        if let Some(description) = provider.fetch_detail(&key)? {
            ctx.gathered.description = Some(description);
        }
        Ok(StageOutcome::Continue)
    }
}

pub struct Enricher<P> {
    provider: P,
    links: Links,
    stages: Vec<Box<dyn EnrichmentStage>>,
    debug: bool,
}

impl<P: MetadataProvider> Enricher<P> {
    pub fn new(provider: P, config: &MetadataConfig) -> Self {
        Enricher {
            provider,
            links: Links {
                covers_url: config.covers_url.clone(),
                goodreads_url: config.goodreads_url.clone(),
            },
            stages: vec![Box::new(SearchStage), Box::new(DetailStage)],
            debug: config.debug,
        }
    }

    /// Never fails: any stage error degrades to whatever was gathered before it.
    pub fn enrich(&self, title: &str, author: &str) -> Metadata {
        let mut ctx = EnrichmentContext::new(title.trim(), author.trim());
        if ctx.query.is_empty() {
            return ctx.finish(&self.links);
        }

        if self.debug {
            log::info!("[metadata-debug] enrich start query=\"{}\"", ctx.query);
        }

        for stage in &self.stages {
            match stage.run(&self.provider, &self.links, &mut ctx) {
                Ok(StageOutcome::Continue) => {}
                Ok(StageOutcome::Done) => {
                    if self.debug {
                        log::info!("[metadata-debug] enrich stop after stage={}", stage.name());
                    }
                    break;
                }
                Err(err) => {
                    log::warn!(
                        "metadata stage {} failed for \"{}\": {}",
                        stage.name(),
                        ctx.query,
                        err
                    );
                    break;
                }
            }
        }

        let metadata = ctx.finish(&self.links);
        if self.debug {
            log::info!(
                "[metadata-debug] enrich merged author={} cover={} description={}",
                metadata.author.as_deref().unwrap_or("-"),
                metadata.cover_url.is_some(),
                metadata.description.as_ref().map(|text| text.len()).unwrap_or(0)
            );
        }
        metadata
    }
}

fn join_non_empty(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}


#[cfg(test)]
mod tests {
    use super::stub::{Reply, StubProvider};
    use super::{parse_detail_description, parse_search_doc, Enricher, OpenLibraryProvider};
    use crate::config::MetadataConfig;
    use serde_json::json;

    fn enricher(provider: StubProvider) -> Enricher<StubProvider> {
        Enricher::new(provider, &MetadataConfig::default())
    }

    #[test]
    fn merges_search_and_detail() {
        let enricher = enricher(StubProvider::hits());
        let metadata = enricher.enrich("Metadata Book", "Manual Author");

        assert_eq!(metadata.author.as_deref(), Some("Fetched Author"));
        assert_eq!(
            metadata.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/123-L.jpg")
        );
        assert_eq!(metadata.description.as_deref(), Some("Detailed description"));
        assert_eq!(
            metadata.goodreads_url,
            "https://www.goodreads.com/search?q=Metadata%20Book%20Fetched%20Author"
        );
        assert_eq!(
            enricher.provider.searches.borrow().as_slice(),
            ["Metadata Book Manual Author".to_string()]
        );
    }

    #[test]
    fn search_failure_degrades_to_search_url() {
        let enricher = enricher(StubProvider::failing());
        let metadata = enricher.enrich("Dune", "");

        assert_eq!(metadata.author, None);
        assert_eq!(metadata.cover_url, None);
        assert_eq!(metadata.description, None);
        assert_eq!(metadata.goodreads_url, "https://www.goodreads.com/search?q=Dune");
        assert_eq!(enricher.provider.detail_calls.get(), 0);
    }

    #[test]
    fn no_match_keeps_local_author_in_search_url() {
        let enricher = enricher(StubProvider::new(Reply::Miss, Reply::Hit));
        let metadata = enricher.enrich("Sample Book", "Author Name");

        assert_eq!(metadata.author, None);
        assert!(metadata.goodreads_url.contains("Sample%20Book"));
        assert!(metadata.goodreads_url.contains("Author%20Name"));
        assert_eq!(enricher.provider.detail_calls.get(), 0);
    }

    #[test]
    fn detail_failure_keeps_opening_line() {
        let enricher = enricher(StubProvider::new(Reply::Hit, Reply::Fail));
        let metadata = enricher.enrich("Metadata Book", "");

        assert_eq!(metadata.description.as_deref(), Some("Opening line"));
        assert!(metadata.cover_url.is_some());
        assert_eq!(enricher.provider.detail_calls.get(), 1);
    }

    #[test]
    fn match_without_author_falls_back_to_local_author() {
        let mut provider = StubProvider::new(Reply::Hit, Reply::Miss);
        provider.found.author = None;
        provider.found.detail_key = None;
        let enricher = enricher(provider);
        let metadata = enricher.enrich("Book", "Local Writer");

        assert_eq!(metadata.author.as_deref(), Some("Local Writer"));
        assert_eq!(metadata.description.as_deref(), Some("Opening line"));
        assert_eq!(enricher.provider.detail_calls.get(), 0);
    }

    #[test]
    fn empty_query_skips_lookup() {
        let enricher = enricher(StubProvider::hits());
        let metadata = enricher.enrich("  ", "");

        assert_eq!(metadata.goodreads_url, "");
        assert_eq!(enricher.provider.search_count(), 0);
    }

    #[test]
    fn parses_search_doc_variants() {
        let found = parse_search_doc(&json!({
            "author_name": ["Frank Herbert", "Other"],
            "cover_i": 42,
            "key": "/works/OL893415W",
            "first_sentence": ["In the week before their departure to Arrakis"]
        }));
        assert_eq!(found.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(found.cover_id.as_deref(), Some("42"));
        assert_eq!(found.detail_key.as_deref(), Some("/works/OL893415W"));
        assert!(found
            .first_sentence
            .unwrap_or_default()
            .starts_with("In the week"));

        let sparse = parse_search_doc(&json!({ "first_sentence": "Opening line" }));
        assert_eq!(sparse.author, None);
        assert_eq!(sparse.cover_id, None);
        assert_eq!(sparse.first_sentence.as_deref(), Some("Opening line"));
    }

    #[test]
    fn parses_detail_description_variants() {
        assert_eq!(
            parse_detail_description(&json!({ "description": "Plain" })).as_deref(),
            Some("Plain")
        );
        assert_eq!(
            parse_detail_description(&json!({ "description": { "type": "/type/text", "value": "Rich" } }))
                .as_deref(),
            Some("Rich")
        );
        assert_eq!(parse_detail_description(&json!({ "description": { "type": "x" } })), None);
        assert_eq!(parse_detail_description(&json!({ "title": "No description" })), None);
    }

    #[test]
    #[ignore = "network probe for manual debugging"]
    fn live_openlibrary_probe() {
        let config = MetadataConfig::default();
        let provider = OpenLibraryProvider::new(&config).expect("expected http client");
        let enricher = Enricher::new(provider, &config);
        let title = std::env::var("TBR_PROBE_TITLE").unwrap_or_else(|_| "Dune".to_string());
        let metadata = enricher.enrich(&title, "");
        println!(
            "probe title=\"{}\" author={} cover={} description={} goodreads={}",
            title,
            metadata.author.as_deref().unwrap_or("-"),
            metadata.cover_url.as_deref().unwrap_or("-"),
            metadata.description.as_ref().map(|text| text.len()).unwrap_or(0),
            metadata.goodreads_url
        );
    }
}
