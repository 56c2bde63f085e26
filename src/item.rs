pub(crate) type ItemId = i64;

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub(crate) struct RawItem {
    pub(crate) id: ItemId,

    #[serde(rename = "type", default)]
    pub(crate) kind: String,

    #[serde(default)]
    pub(crate) title: String,

    pub(crate) url: Option<String>,

    #[serde(default)]
    pub(crate) score: i64,

    pub(crate) by: Option<String>,
    pub(crate) descendants: Option<i64>,
}

/// A story item plus the host its link points at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Story {
    pub(crate) item: RawItem,
    pub(crate) host: String,
}

impl From<RawItem> for Story {
    fn from(item: RawItem) -> Self {
        let host = item.url.as_deref().map(parse_host).unwrap_or_default();
        Self { item, host }
    }
}

pub(crate) fn is_story_link(item: &RawItem) -> bool {
    item.kind == "story" && item.url.as_deref().is_some_and(|url| !url.is_empty())
}

/// Hostname of `link` without a leading "www.", or an empty string if it does not parse.
pub(crate) fn parse_host(link: &str) -> String {
    let Ok(url) = url::Url::parse(link) else {
        return String::new();
    };

    match url.host() {
        Some(url::Host::Domain(host)) => host.strip_prefix("www.").unwrap_or(host).to_string(),
        Some(url::Host::Ipv4(addr)) => addr.to_string(),
        // Without the brackets `host_str` keeps.
        Some(url::Host::Ipv6(addr)) => addr.to_string(),
        None => String::new(),
    }
}
