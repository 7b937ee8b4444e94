// src/ingest/registry.rs
//! Static source registry.
//!
//! A descriptor either names one URL or a URL template with a `{query}`
//! placeholder and a list of queries; each query becomes its own fetch under
//! the same source name. `{nitter}` and `{rsshub}` resolve to the configured
//! mirror bases.

use crate::config::Mirrors;
use crate::ingest::types::SourceMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// RSS 2.0 or Atom document.
    Feed,
    /// HTML page whose anchors are candidate postings.
    HtmlList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub region: String,
    pub kind: FetchKind,
    pub url_template: String,
    pub queries: Vec<String>,
    pub social: bool,
}

/// One concrete fetch: descriptor metadata plus a fully resolved URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub meta: SourceMeta,
    pub kind: FetchKind,
    pub url: String,
}

impl SourceDescriptor {
    pub fn feed(name: &str, region: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            kind: FetchKind::Feed,
            url_template: url.to_string(),
            queries: Vec::new(),
            social: false,
        }
    }

    pub fn html_list(name: &str, region: &str, url: &str) -> Self {
        Self {
            kind: FetchKind::HtmlList,
            ..Self::feed(name, region, url)
        }
    }

    pub fn with_queries(mut self, queries: &[&str]) -> Self {
        self.queries = queries.iter().map(|q| q.to_string()).collect();
        self
    }

    pub fn social(mut self) -> Self {
        self.social = true;
        self
    }

    pub fn meta(&self) -> SourceMeta {
        SourceMeta::new(&self.name, &self.region, self.social)
    }

    /// Expand into concrete fetches. K queries give K fetches; no queries give one.
    pub fn resolve(&self, mirrors: &Mirrors) -> Vec<ResolvedSource> {
        let base = self
            .url_template
            .replace("{nitter}", &mirrors.nitter_base)
            .replace("{rsshub}", &mirrors.rsshub_base);

        let urls: Vec<String> = if self.queries.is_empty() {
            vec![base]
        } else {
            self.queries
                .iter()
                .map(|q| base.replace("{query}", &urlencoding::encode(q)))
                .collect()
        };

        urls.into_iter()
            .map(|url| ResolvedSource {
                meta: self.meta(),
                kind: self.kind,
                url,
            })
            .collect()
    }
}

/// Built-in academic portals and social mirrors.
pub fn default_registry() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::feed("ETH CDHI", "Switzerland", "https://www.c4dhi.org/feed/"),
        SourceDescriptor::feed(
            "FindAPhD",
            "UK/Europe",
            "https://www.findaphd.com/phds/rss/?Keywords={query}",
        )
        .with_queries(&[
            "health HCI",
            "digital health UX",
            "assistive technology HCI",
            "human-centred AI health",
            "medical UX",
        ]),
        SourceDescriptor::feed(
            "EURAXESS",
            "Europe",
            "https://euraxess.ec.europa.eu/rss/calls?keywords={query}",
        )
        .with_queries(&[
            "digital health PhD",
            "human-computer interaction health",
            "assistive technology PhD",
        ]),
        SourceDescriptor::feed(
            "jobs.ac.uk",
            "UK",
            "https://www.jobs.ac.uk/search/?keywords=phd+health+HCI&sort=relevance&format=rss",
        ),
        SourceDescriptor::feed(
            "Academic Positions",
            "Europe",
            "https://academicpositions.com/find-jobs/rss?positions=phd&keywords=health%20HCI%20digital%20health%20UX",
        ),
        SourceDescriptor::feed(
            "Academic Transfer",
            "Netherlands",
            "https://www.academictransfer.com/en/search-rss/?keywords=phd%20digital%20health%20hci",
        ),
        SourceDescriptor::feed(
            "PhDpositions.dk",
            "Denmark",
            "https://www.phd-positions.dk/rss/?s=health%20HCI",
        ),
        SourceDescriptor::feed(
            "Jobbnorge",
            "Norway",
            "https://www.jobbnorge.no/en/search?SearchText=PhD%20health%20HCI&format=rss",
        ),
        SourceDescriptor::feed("OeAD Jobs", "Austria", "https://oead.at/en/rss"),
        SourceDescriptor::html_list(
            "Scholarship Cafe",
            "Global",
            "https://www.scholarshipscafe.com/search/label/PhD",
        ),
        SourceDescriptor::feed("SIGCHI", "Global", "{nitter}/SIGCHI/rss"),
        SourceDescriptor::feed("Twitter", "Global", "{nitter}/search/rss?f=tweets&q={query}")
            .with_queries(&[
                r#"("phd position" OR "phd studentship") (health OR HCI OR "digital health" OR UX OR "human-centered AI")"#,
                r#"("phd" AND "human-computer interaction") (health OR medical OR clinical)"#,
            ])
            .social(),
        SourceDescriptor::feed("LinkedIn", "Global", "{rsshub}/linkedin/jobs/search/{query}")
            .with_queries(&["PhD health HCI digital health"])
            .social(),
    ]
}

/// Resolve every descriptor, preserving registry order.
pub fn resolve_all(descriptors: &[SourceDescriptor], mirrors: &Mirrors) -> Vec<ResolvedSource> {
    descriptors.iter().flat_map(|d| d.resolve(mirrors)).collect()
}
