use url::Url;

/// Where a play's reference video can be watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    /// Hosted on YouTube, playable through the embed URL
    YouTube { id: String, embed_url: String },
    /// Any other URL or file path, used as-is
    Direct(String),
}

impl VideoSource {
    /// Classify a video reference from play data
    pub fn parse(src: &str) -> Self {
        let src = src.trim();
        match Url::parse(src).ok().and_then(|url| youtube_id(&url)) {
            Some(id) => VideoSource::YouTube {
                embed_url: format!("https://www.youtube.com/embed/{}", id),
                id,
            },
            None => VideoSource::Direct(src.to_string()),
        }
    }

    /// URL to open for this video
    pub fn url(&self) -> &str {
        match self {
            VideoSource::YouTube { embed_url, .. } => embed_url,
            VideoSource::Direct(src) => src,
        }
    }
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be"
}

/// Video id from the `v` query parameter, else the last path segment
fn youtube_id(url: &Url) -> Option<String> {
    if !url.host_str().is_some_and(is_youtube_host) {
        return None;
    }

    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
        .or_else(|| {
            url.path_segments()?
                .filter(|segment| !segment.is_empty())
                .last()
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_watch_url() {
        let video = VideoSource::parse("https://www.youtube.com/watch?v=abc123&t=42");
        assert_eq!(
            video,
            VideoSource::YouTube {
                id: "abc123".to_string(),
                embed_url: "https://www.youtube.com/embed/abc123".to_string(),
            }
        );
    }

    #[test]
    fn test_youtube_short_url() {
        let video = VideoSource::parse("https://youtu.be/xyz789?si=share");
        assert_eq!(video.url(), "https://www.youtube.com/embed/xyz789");
    }

    #[test]
    fn test_youtube_id_is_decoded() {
        let video = VideoSource::parse("https://www.youtube.com/watch?v=ab%2Dc");
        assert_eq!(video.url(), "https://www.youtube.com/embed/ab-c");

        let video = VideoSource::parse("https://m.youtube.com/embed/q1w2e3/");
        assert_eq!(video.url(), "https://www.youtube.com/embed/q1w2e3");
    }

    #[test]
    fn test_lookalike_hosts_are_direct() {
        for src in [
            "https://notyoutube.com/watch?v=abc",
            "https://example.com/?next=youtube.com",
            "youtube.com/watch?v=abc",
        ] {
            assert_eq!(VideoSource::parse(src), VideoSource::Direct(src.to_string()));
        }

        // A YouTube host without any id stays a plain link
        assert_eq!(
            VideoSource::parse("https://www.youtube.com/"),
            VideoSource::Direct("https://www.youtube.com/".to_string())
        );
    }

    #[test]
    fn test_direct_video() {
        let video = VideoSource::parse(" clips/horns.mp4 ");
        assert_eq!(video, VideoSource::Direct("clips/horns.mp4".to_string()));
        assert_eq!(video.url(), "clips/horns.mp4");
    }
}
