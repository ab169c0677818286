//! Selects one playable media URL per tweet.
//!
//! Priority is fixed: native video, then an audio-hosting link, then a
//! video-sharing link. Reposts never qualify.
use crate::twitter::types::{MediaCandidate, MediaKind, QualifyingResult, Tweet, VideoVariant};
use regex::Regex;
use std::sync::LazyLock;

const NATIVE_VIDEO_TYPE: &str = "video";
const NATIVE_VIDEO_CONTAINER: &str = "video/mp4";
const AUDIO_HOST_MARKER: &str = "soundcloud.com";
const VIDEO_WATCH_MARKER: &str = "youtube.com/watch";
const VIDEO_SHORT_MARKER: &str = "youtu.be";
const VIDEO_WATCH_PREFIX: &str = "https://www.youtube.com/watch?v=";

static SHORT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtu\.be/([^/?#&\s]+)").expect("short link pattern compiles")
});

/// Qualifying results for a page, in page order.
pub fn qualifying_results(items: &[Tweet]) -> Vec<QualifyingResult> {
    items.iter().filter_map(qualify).collect()
}

pub fn qualify(tweet: &Tweet) -> Option<QualifyingResult> {
    if tweet.is_repost() {
        return None;
    }
    let MediaCandidate { url, kind } = select_media(tweet)?;
    Some(QualifyingResult {
        id: tweet.id_str.clone(),
        text: tweet.body().to_string(),
        author: tweet.user.name.clone(),
        author_screen_name: tweet.user.screen_name.clone(),
        author_thumbnail: tweet.user.profile_image_url_https.clone(),
        media_url: url,
        media_kind: kind,
    })
}

pub fn select_media(tweet: &Tweet) -> Option<MediaCandidate> {
    native_video(tweet)
        .map(|url| MediaCandidate {
            url,
            kind: MediaKind::NativeVideo,
        })
        .or_else(|| {
            audio_link(tweet).map(|url| MediaCandidate {
                url,
                kind: MediaKind::AudioLink,
            })
        })
        .or_else(|| {
            video_link(tweet).map(|url| MediaCandidate {
                url,
                kind: MediaKind::VideoLink,
            })
        })
}

/// Highest-bitrate mp4 rendition of the first attached video.
fn native_video(tweet: &Tweet) -> Option<String> {
    let video = tweet
        .extended_entities
        .as_ref()?
        .media
        .iter()
        .find(|m| m.kind == NATIVE_VIDEO_TYPE)?;

    // First variant wins among equal bitrates.
    video
        .video_info
        .as_ref()?
        .variants
        .iter()
        .filter(|v| v.content_type == NATIVE_VIDEO_CONTAINER)
        .fold(None::<&VideoVariant>, |best, v| match best {
            Some(b) if b.bitrate >= v.bitrate => Some(b),
            _ => Some(v),
        })
        .map(|v| v.url.clone())
}

fn expanded_urls(tweet: &Tweet) -> impl Iterator<Item = &str> {
    tweet
        .entities
        .iter()
        .flat_map(|e| e.urls.iter())
        .filter_map(|u| u.expanded_url.as_deref())
}

fn audio_link(tweet: &Tweet) -> Option<String> {
    expanded_urls(tweet)
        .find(|u| u.contains(AUDIO_HOST_MARKER))
        .map(str::to_string)
}

fn video_link(tweet: &Tweet) -> Option<String> {
    if let Some(full) = expanded_urls(tweet).find(|u| u.contains(VIDEO_WATCH_MARKER)) {
        return Some(full.to_string());
    }
    expanded_urls(tweet)
        .find(|u| u.contains(VIDEO_SHORT_MARKER))
        .and_then(expand_short_link)
}

/// Rewrite `https://youtu.be/<id>` into the canonical watch URL. Links without
/// an id segment yield `None`.
pub fn expand_short_link(url: &str) -> Option<String> {
    let id = SHORT_LINK.captures(url)?.get(1)?.as_str();
    Some(format!("{VIDEO_WATCH_PREFIX}{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn tweet(v: Value) -> Tweet {
        let mut base = json!({
            "id_str": "1001",
            "full_text": "now playing",
            "user": {
                "name": "Alice",
                "screen_name": "alice",
                "profile_image_url_https": "https://pbs.twimg.com/alice.jpg"
            }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), v.as_object()) {
            for (k, val) in extra {
                base.insert(k.clone(), val.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    fn video_media() -> Value {
        json!({ "media": [{
            "type": "video",
            "video_info": { "variants": [
                { "content_type": "video/mp4", "bitrate": 500, "url": "https://video.twimg.com/500.mp4" },
                { "content_type": "video/mp4", "bitrate": 1200, "url": "https://video.twimg.com/1200.mp4" },
                { "content_type": "video/webm", "bitrate": 2000, "url": "https://video.twimg.com/2000.webm" },
                { "content_type": "application/x-mpegURL", "url": "https://video.twimg.com/pl.m3u8" }
            ]}
        }]})
    }

    fn links(urls: &[&str]) -> Value {
        json!({ "urls": urls.iter().map(|u| json!({ "expanded_url": u })).collect::<Vec<_>>() })
    }

    #[test]
    fn picks_highest_bitrate_mp4() {
        let tw = tweet(json!({ "extended_entities": video_media() }));
        let got = select_media(&tw).unwrap();
        assert_eq!(got.url, "https://video.twimg.com/1200.mp4");
        assert_eq!(got.kind, MediaKind::NativeVideo);
    }

    #[test]
    fn audio_link_selected_without_media() {
        let tw = tweet(json!({ "entities": links(&["https://soundcloud.com/artist/track"]) }));
        let got = select_media(&tw).unwrap();
        assert_eq!(got.url, "https://soundcloud.com/artist/track");
        assert_eq!(got.kind, MediaKind::AudioLink);
    }

    #[test]
    fn short_link_is_rewritten() {
        let tw = tweet(json!({ "entities": links(&["https://youtu.be/abc123"]) }));
        let got = select_media(&tw).unwrap();
        assert_eq!(got.url, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(got.kind, MediaKind::VideoLink);
    }

    #[test]
    fn full_watch_link_beats_short_link() {
        let tw = tweet(json!({ "entities": links(&[
            "https://youtu.be/short1",
            "https://www.youtube.com/watch?v=full1",
        ]) }));
        assert_eq!(
            select_media(&tw).unwrap().url,
            "https://www.youtube.com/watch?v=full1"
        );
    }

    #[test]
    fn native_video_beats_links() {
        let tw = tweet(json!({
            "extended_entities": video_media(),
            "entities": links(&["https://www.youtube.com/watch?v=xyz", "https://soundcloud.com/a/b"])
        }));
        assert_eq!(select_media(&tw).unwrap().kind, MediaKind::NativeVideo);
    }

    #[test]
    fn audio_link_beats_video_link() {
        let tw = tweet(json!({ "entities": links(&[
            "https://youtu.be/abc123",
            "https://soundcloud.com/artist/track",
        ]) }));
        assert_eq!(select_media(&tw).unwrap().kind, MediaKind::AudioLink);
    }

    #[test]
    fn images_only_do_not_match_native_video() {
        let tw = tweet(json!({ "extended_entities": { "media": [
            { "type": "photo" }, { "type": "animated_gif", "video_info": { "variants": [
                { "content_type": "video/mp4", "bitrate": 0, "url": "https://video.twimg.com/gif.mp4" }
            ]}}
        ]}}));
        assert!(select_media(&tw).is_none());
        assert!(qualify(&tw).is_none());
    }

    #[test]
    fn video_without_mp4_falls_through_to_links() {
        let tw = tweet(json!({
            "extended_entities": { "media": [{
                "type": "video",
                "video_info": { "variants": [
                    { "content_type": "application/x-mpegURL", "url": "https://video.twimg.com/pl.m3u8" }
                ]}
            }]},
            "entities": links(&["https://soundcloud.com/artist/track"])
        }));
        assert_eq!(select_media(&tw).unwrap().kind, MediaKind::AudioLink);
    }

    #[test]
    fn equal_bitrates_keep_first_variant() {
        let tw = tweet(json!({ "extended_entities": { "media": [{
            "type": "video",
            "video_info": { "variants": [
                { "content_type": "video/mp4", "bitrate": 800, "url": "https://video.twimg.com/first.mp4" },
                { "content_type": "video/mp4", "bitrate": 800, "url": "https://video.twimg.com/second.mp4" }
            ]}
        }]}}));
        assert_eq!(
            select_media(&tw).unwrap().url,
            "https://video.twimg.com/first.mp4"
        );
    }

    #[test]
    fn missing_entities_yield_no_link_match() {
        let tw = tweet(json!({}));
        assert!(select_media(&tw).is_none());
    }

    #[test]
    fn reposts_never_qualify() {
        let tw = tweet(json!({
            "retweeted_status": { "id_str": "9" },
            "extended_entities": video_media()
        }));
        assert!(qualify(&tw).is_none());
    }

    #[test]
    fn qualifying_result_carries_author_fields() {
        let tw = tweet(json!({ "entities": links(&["https://youtu.be/abc123"]) }));
        let r = qualify(&tw).unwrap();
        assert_eq!(r.id, "1001");
        assert_eq!(r.text, "now playing");
        assert_eq!(r.author, "Alice");
        assert_eq!(r.author_screen_name, "alice");
        assert_eq!(r.author_thumbnail, "https://pbs.twimg.com/alice.jpg");
        assert_eq!(r.media_kind, MediaKind::VideoLink);
    }

    #[test]
    fn short_link_edge_cases() {
        assert_eq!(
            expand_short_link("https://youtu.be/abc123?t=42").as_deref(),
            Some("https://www.youtube.com/watch?v=abc123")
        );
        assert_eq!(
            expand_short_link("http://youtu.be/a-b_C/extra").as_deref(),
            Some("https://www.youtube.com/watch?v=a-b_C")
        );
        assert_eq!(expand_short_link("https://youtu.be/"), None);
        assert_eq!(expand_short_link("https://youtu.be"), None);
    }

    #[test]
    fn malformed_short_link_does_not_qualify() {
        let tw = tweet(json!({ "entities": links(&["https://youtu.be/"]) }));
        assert!(qualify(&tw).is_none());
    }

    #[test]
    fn page_order_is_preserved() {
        let mut a = tweet(json!({ "entities": links(&["https://soundcloud.com/a/1"]) }));
        a.id_str = "3".into();
        let mut skip = tweet(json!({}));
        skip.id_str = "2".into();
        let mut b = tweet(json!({ "entities": links(&["https://youtu.be/b"]) }));
        b.id_str = "1".into();

        let ids: Vec<_> = qualifying_results(&[a, skip, b])
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
