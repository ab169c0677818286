use serde::{Deserialize, Serialize};

// ==============================
// Wire types: GET 1.1/search/tweets.json
// ==============================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub statuses: Vec<Tweet>,
    #[serde(default)]
    pub search_metadata: SearchMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchMetadata {
    /// Largest id in the page, `0` when the page is empty.
    #[serde(default)]
    pub max_id: u64,
    #[serde(default)]
    pub since_id: u64,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub next_results: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tweet {
    pub id_str: String,
    /// Present with `tweet_mode=extended`.
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user: User,

    /// Repost marker; only its presence matters.
    #[serde(default)]
    pub retweeted_status: Option<serde_json::Value>,

    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(default)]
    pub extended_entities: Option<ExtendedEntities>,
}

impl Tweet {
    pub fn id(&self) -> Option<u64> {
        self.id_str.parse().ok()
    }

    pub fn body(&self) -> &str {
        self.full_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or_default()
    }

    pub fn is_repost(&self) -> bool {
        self.retweeted_status.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub profile_image_url_https: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<UrlEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoVariant {
    pub content_type: String,
    /// Missing for HLS playlists.
    #[serde(default)]
    pub bitrate: Option<u64>,
    pub url: String,
}

// ==============================
// Domain types
// ==============================

/// Pagination bound as sent upstream. The two parameters differ: `since_id` is
/// exclusive and `max_id` is inclusive, so callers step `max_id` down by one to
/// exclude an id they have already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Only results with an id greater than this.
    SinceId(u64),
    /// Only results with an id less than or equal to this.
    MaxId(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub cursor: Option<Cursor>,
    /// `count` hint for the page size.
    pub count: u32,
}

/// One upstream page plus the cursors needed to continue in either direction.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub items: Vec<Tweet>,
    /// Oldest id seen in the page.
    pub next_older: Option<u64>,
    /// Newest id seen in the page.
    pub next_newer: Option<u64>,
}

impl From<SearchResponse> for SearchPage {
    fn from(resp: SearchResponse) -> Self {
        let ids = || resp.statuses.iter().filter_map(Tweet::id);
        let next_older = ids().min();
        let next_newer = ids()
            .max()
            .or((resp.search_metadata.max_id > 0).then_some(resp.search_metadata.max_id));
        Self {
            items: resp.statuses,
            next_older,
            next_newer,
        }
    }
}

/// Where the selected media URL came from. Serialized with the tags the
/// browser player switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "video")]
    NativeVideo,
    #[serde(rename = "soundcloud")]
    AudioLink,
    #[serde(rename = "youtube")]
    VideoLink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    pub url: String,
    pub kind: MediaKind,
}

/// A non-repost tweet with exactly one playable media URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub id: String,
    pub text: String,
    pub author: String,
    pub author_screen_name: String,
    pub author_thumbnail: String,
    #[serde(rename = "video_url")]
    pub media_url: String,
    #[serde(rename = "video_type")]
    pub media_kind: MediaKind,
}
