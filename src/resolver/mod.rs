use std::fmt;
use url::{ParseError, Url};

use crate::{ArchiverError, Result};

/// Minimum length of a YouTube video token
pub const MIN_VIDEO_ID_LEN: usize = 11;

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Path prefixes that carry the video token as their next segment
const PATH_PREFIXES: [&str; 3] = ["/embed/", "/v/", "/shorts/"];

/// Stable identity of a source video
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoIdentity {
    video_id: String,
}

impl VideoIdentity {
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Canonical watch URL, rebuilt from the id alone
    pub fn canonical_url(&self) -> String {
        format!("{}{}", WATCH_URL_PREFIX, self.video_id)
    }
}

impl fmt::Display for VideoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.video_id)
    }
}

/// Extract the video identity from any supported YouTube URL shape
pub fn resolve(input: &str) -> Result<VideoIdentity> {
    let parsed = parse_lenient(input.trim())
        .map_err(|_| ArchiverError::InvalidUrl(format!("not a URL: {}", input)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ArchiverError::InvalidUrl(format!(
            "URL must use HTTP or HTTPS protocol: {}",
            input
        )));
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or_else(|| ArchiverError::InvalidUrl(format!("URL has no host: {}", input)))?;

    let raw = if is_short_host(&host) {
        parsed.path().trim_start_matches('/').to_string()
    } else if is_youtube_host(&host) {
        token_from_youtube(&parsed)
            .ok_or_else(|| ArchiverError::InvalidUrl(format!("no video id in URL: {}", input)))?
    } else {
        return Err(ArchiverError::InvalidUrl(format!(
            "unsupported host '{}': {}",
            host, input
        )));
    };

    let video_id = sanitize_token(&raw);
    if !is_valid_token(&video_id) {
        return Err(ArchiverError::InvalidUrl(format!(
            "malformed video id '{}' in URL: {}",
            video_id, input
        )));
    }

    tracing::debug!("Resolved {} to video id {}", input, video_id);
    Ok(VideoIdentity { video_id })
}

/// Parse, assuming `https://` for links pasted without a scheme
fn parse_lenient(input: &str) -> std::result::Result<Url, ParseError> {
    match Url::parse(input) {
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{}", input)),
        other => other,
    }
}

fn is_short_host(host: &str) -> bool {
    host == "youtu.be" || host == "www.youtu.be"
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
        || host.ends_with(".youtube-nocookie.com")
}

fn token_from_youtube(parsed: &Url) -> Option<String> {
    let from_query = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|value| value.len() >= MIN_VIDEO_ID_LEN);
    if from_query.is_some() {
        return from_query;
    }

    let path = parsed.path();
    PATH_PREFIXES.iter().find_map(|prefix| {
        path.strip_prefix(prefix)
            .map(|rest| rest.split('/').next().unwrap_or_default().to_string())
    })
}

/// Drop anything glued onto the id by a sloppy copy/paste
fn sanitize_token(raw: &str) -> String {
    raw.split(['&', '?', '#', '/'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn is_valid_token(token: &str) -> bool {
    token.len() >= MIN_VIDEO_ID_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "ABCDEFGHIJK";

    #[test]
    fn test_all_shapes_yield_same_identity() {
        let urls = [
            format!("https://www.youtube.com/watch?v={ID}"),
            format!("https://youtube.com/watch?feature=share&v={ID}"),
            format!("https://m.youtube.com/watch?v={ID}"),
            format!("https://youtu.be/{ID}"),
            format!("https://youtu.be/{ID}?si=abc123"),
            format!("https://www.youtube.com/embed/{ID}"),
            format!("https://www.youtube.com/v/{ID}"),
            format!("https://www.youtube.com/shorts/{ID}"),
            format!("http://www.youtube.com/shorts/{ID}/"),
            format!("www.youtube.com/watch?v={ID}"),
            format!("youtube.com/watch?v={ID}&list=XYZ"),
            format!("youtu.be/{ID}"),
        ];

        for url in &urls {
            let identity = resolve(url).unwrap_or_else(|e| panic!("{url}: {e}"));
            assert_eq!(identity.video_id(), ID, "{url}");
        }
    }

    #[test]
    fn test_ignores_playlist_params() {
        let identity = resolve(&format!("https://www.youtube.com/watch?v={ID}&list=XYZ")).unwrap();
        assert_eq!(identity.video_id(), ID);
        assert_eq!(identity.canonical_url(), format!("https://www.youtube.com/watch?v={ID}"));
    }

    #[test]
    fn test_strips_concatenated_fragments() {
        let identity = resolve(&format!("https://youtu.be/{ID}&t=42")).unwrap();
        assert_eq!(identity.video_id(), ID);
    }

    #[test]
    fn test_rejects_malformed_input() {
        let bad = [
            "",
            "not a url",
            "www.vimeo.com/watch?v=ABCDEFGHIJK",
            "youtube.com/watch",
            "ftp://www.youtube.com/watch?v=ABCDEFGHIJK",
            "https://www.youtube.com/watch",
            "https://www.youtube.com/watch?v=ABCDEF",
            "https://youtu.be/",
            "https://youtu.be/ABC",
            "https://www.youtube.com/embed/",
            "https://www.youtube.com/channel/UCabcdefghijk",
            "https://vimeo.com/watch?v=ABCDEFGHIJK",
            "https://www.youtube.com/watch?v=ABCDEF$HIJK",
        ];

        for input in bad {
            match resolve(input) {
                Err(ArchiverError::InvalidUrl(_)) => {}
                other => panic!("{input:?} should be InvalidUrl, got {other:?}"),
            }
        }
    }
}
