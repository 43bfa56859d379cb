//! Video hotspot embeds.
//!
//! A video hotspot stores the URL the user pasted plus the platform it
//! comes from. At export time the URL is reduced to a platform video id and
//! turned into the platform's embed iframe:
//!
//! | Type | Accepted URLs | Embed |
//! |---|---|---|
//! | youtube | `youtu.be/ID`, `watch?v=ID`, `embed/ID`, `v/ID`, `&v=ID` | `youtube.com/embed/ID` |
//! | vimeo | `vimeo.com/ID`, channels, groups, albums | `player.vimeo.com/video/ID` |
//! | podeduc | `podeduc.apps.education.fr/video/ID-slug/` | `.../video/ID/?is_iframe=true` |
//! | direct | any URL to an MP4 file | `<video>` element |
//!
//! Podeduc is special: the platform hands out a ready-made `<iframe>`
//! snippet, and when the hotspot carries one it is embedded as-is.

use crate::project::VideoType;
use maud::{Markup, PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

static YOUTUBE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").unwrap()
});

static VIMEO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"vimeo\.com/(?:channels/(?:\w+/)?|groups/([^/]*)/videos/|album/(\d+)/video/|)(\d+)(?:$|/|\?)",
    )
    .unwrap()
});

static PODEDUC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"podeduc\.apps\.education\.fr/video/(\d+)(?:-[^/]*)?(?:/|\?|$)").unwrap()
});

/// Length of every YouTube video id.
const YOUTUBE_ID_LEN: usize = 11;

pub fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE
        .captures(url)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
        .filter(|id| id.len() == YOUTUBE_ID_LEN)
}

pub fn vimeo_id(url: &str) -> Option<&str> {
    VIMEO.captures(url).and_then(|c| c.get(3)).map(|m| m.as_str())
}

pub fn podeduc_id(url: &str) -> Option<&str> {
    PODEDUC.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn iframe(src: &str) -> Markup {
    html! {
        iframe width="100%" height="400" src=(src) frameborder="0" allowfullscreen {}
    }
}

fn invalid(label: &str) -> Markup {
    html! {
        p.video-invalid { "Invalid " (label) " URL" }
    }
}

/// Embed markup for a video hotspot.
///
/// A non-empty `podeduc_iframe` wins over URL parsing for podeduc videos
/// and is emitted verbatim.
pub fn embed(video_type: VideoType, url: &str, podeduc_iframe: Option<&str>) -> Markup {
    match video_type {
        VideoType::Youtube => match youtube_id(url) {
            Some(id) => iframe(&format!("https://www.youtube.com/embed/{id}")),
            None => invalid("YouTube"),
        },
        VideoType::Vimeo => match vimeo_id(url) {
            Some(id) => iframe(&format!("https://player.vimeo.com/video/{id}")),
            None => invalid("Vimeo"),
        },
        VideoType::Podeduc => {
            if let Some(markup) = podeduc_iframe.filter(|m| !m.trim().is_empty()) {
                return PreEscaped(markup.to_string());
            }
            match podeduc_id(url) {
                Some(id) => iframe(&format!(
                    "https://podeduc.apps.education.fr/video/{id}/?is_iframe=true"
                )),
                None => invalid("Podeduc"),
            }
        }
        VideoType::Direct => html! {
            video width="100%" height="400" controls {
                source src=(url) type="video/mp4";
                "Your browser does not support video playback."
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_watch_and_short_urls() {
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ?start=3"),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn youtube_requires_eleven_characters() {
        assert_eq!(youtube_id("https://youtu.be/short"), None);
        assert_eq!(youtube_id("https://example.com/video"), None);
    }

    #[test]
    fn vimeo_numeric_id() {
        assert_eq!(vimeo_id("https://vimeo.com/76979871"), Some("76979871"));
        assert_eq!(
            vimeo_id("https://vimeo.com/channels/staffpicks/76979871"),
            Some("76979871")
        );
        assert_eq!(
            vimeo_id("https://vimeo.com/groups/shortfilms/videos/76979871"),
            Some("76979871")
        );
        assert_eq!(vimeo_id("https://vimeo.com/about"), None);
    }

    #[test]
    fn podeduc_id_ignores_slug() {
        assert_eq!(
            podeduc_id("https://podeduc.apps.education.fr/video/12345-ma-video/"),
            Some("12345")
        );
        assert_eq!(
            podeduc_id("https://podeduc.apps.education.fr/video/678"),
            Some("678")
        );
        assert_eq!(podeduc_id("https://podeduc.apps.education.fr/"), None);
    }

    #[test]
    fn youtube_embed_uses_embed_url() {
        let html = embed(VideoType::Youtube, "https://youtu.be/dQw4w9WgXcQ", None).into_string();
        assert!(html.contains(r#"src="https://www.youtube.com/embed/dQw4w9WgXcQ""#));
    }

    #[test]
    fn invalid_url_renders_message() {
        let html = embed(VideoType::Vimeo, "https://example.com", None).into_string();
        assert!(html.contains("Invalid Vimeo URL"));
        assert!(!html.contains("<iframe"));
    }

    #[test]
    fn podeduc_iframe_is_verbatim() {
        let snippet = r#"<iframe src="https://podeduc.apps.education.fr/video/42-x/?is_iframe=true" width="640" height="360"></iframe>"#;
        let html = embed(
            VideoType::Podeduc,
            "https://podeduc.apps.education.fr/video/99/",
            Some(snippet),
        )
        .into_string();
        assert_eq!(html, snippet);
    }

    #[test]
    fn blank_podeduc_iframe_falls_back_to_url() {
        let html = embed(
            VideoType::Podeduc,
            "https://podeduc.apps.education.fr/video/99-demo/",
            Some("  "),
        )
        .into_string();
        assert!(html.contains("https://podeduc.apps.education.fr/video/99/?is_iframe=true"));
    }

    #[test]
    fn podeduc_iframe_ignored_for_other_types() {
        let html = embed(
            VideoType::Direct,
            "https://example.com/clip.mp4",
            Some("<iframe></iframe>"),
        )
        .into_string();
        assert!(html.contains("<video"));
        assert!(html.contains(r#"<source src="https://example.com/clip.mp4" type="video/mp4">"#));
    }
}
