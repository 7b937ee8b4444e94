// src/ingest/providers/rss.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;

use crate::error::FetchError;
use crate::ingest::normalize_text;
use crate::ingest::types::{RawRecord, SourceMeta, SourceProvider};

/* ----------------------------
RSS 2.0
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<TextNode>,
    description: Option<String>,
}

/* ----------------------------
Atom
---------------------------- */

#[derive(Debug, Deserialize)]
struct AtomFeed {
    // Required so that arbitrary XML/HTML does not parse as an empty feed.
    #[allow(dead_code)]
    title: TextNode,
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

impl Entry {
    /// `rel="alternate"` (or no rel) is the human-facing link.
    fn alternate_link(&self) -> Option<&str> {
        self.link
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.link.first())
            .map(|l| l.href.as_str())
    }
}

/// Parse an RSS 2.0 or Atom document into records stamped with `source`.
pub fn parse_feed(source: &str, xml: &str) -> Result<Vec<RawRecord>, FetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => rss
            .channel
            .item
            .into_iter()
            .filter_map(|it| {
                let link = it
                    .link
                    .filter(|l| !l.trim().is_empty())
                    .or_else(|| it.guid.map(|g| g.value))
                    .unwrap_or_default();
                record(
                    source,
                    it.title.as_deref().unwrap_or_default(),
                    it.description.as_deref().unwrap_or_default(),
                    &link,
                )
            })
            .collect::<Vec<_>>(),
        Err(rss_err) => {
            let atom: AtomFeed = from_str(&xml_clean).map_err(|atom_err| {
                FetchError::Parse(format!("not rss ({rss_err}) nor atom ({atom_err})"))
            })?;
            atom.entry
                .iter()
                .filter_map(|e| {
                    let body = e
                        .summary
                        .as_ref()
                        .or(e.content.as_ref())
                        .map(|t| t.value.as_str())
                        .unwrap_or_default();
                    record(
                        source,
                        e.title.as_ref().map(|t| t.value.as_str()).unwrap_or_default(),
                        body,
                        e.alternate_link().unwrap_or_default(),
                    )
                })
                .collect::<Vec<_>>()
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("radar_parse_ms").record(ms);
    counter!("radar_records_total").increment(out.len() as u64);
    Ok(out)
}

fn record(source: &str, title: &str, description: &str, link: &str) -> Option<RawRecord> {
    let title = normalize_text(title);
    let link = link.trim().to_string();
    if title.is_empty() && link.is_empty() {
        return None;
    }
    Some(RawRecord {
        source: source.to_string(),
        title,
        description: normalize_text(description),
        link,
    })
}

pub struct RssProvider {
    meta: SourceMeta,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssProvider {
    pub fn from_fixture(meta: SourceMeta, xml: &str) -> Self {
        Self {
            meta,
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    /// `client` carries the per-request timeout.
    pub fn from_url(meta: SourceMeta, url: &str, client: reqwest::Client) -> Self {
        Self {
            meta,
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawRecord>, FetchError> {
        match &self.mode {
            Mode::Fixture(s) => parse_feed(&self.meta.name, s),
            Mode::Http { url, client } => {
                let body = super::get_text(client, url).await?;
                parse_feed(&self.meta.name, &body)
            }
        }
    }

    fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    fn url(&self) -> &str {
        match &self.mode {
            Mode::Fixture(_) => "fixture",
            Mode::Http { url, .. } => url,
        }
    }
}

/// Portals embed HTML named entities (`&pound;`, `&eacute;`, ...) that XML
/// does not know. Decode them up front, leaving the five XML ones alone;
/// names HTML does not know either become literal text.
fn scrub_html_entities_for_xml(s: &str) -> String {
    static RE_ENTITY: OnceCell<Regex> = OnceCell::new();
    let re = RE_ENTITY
        .get_or_init(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").expect("entity regex"));

    re.replace_all(s, |caps: &Captures| {
        let name = &caps[1];
        match name {
            "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
            "nbsp" => " ".to_string(),
            "ndash" | "mdash" => "-".to_string(),
            "hellip" => "...".to_string(),
            _ => {
                let decoded = html_escape::decode_html_entities(&caps[0]);
                if decoded == &caps[0] {
                    format!("&amp;{name};")
                } else {
                    decoded.into_owned()
                }
            }
        }
    })
    .into_owned()
}
