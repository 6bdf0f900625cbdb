use std::fmt;

use url::Url;

const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid YouTube URL: {url}")]
pub struct InvalidUrlError {
    pub url: String,
}

/// The 11-character identifier that names a YouTube video.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(candidate: &str) -> Option<Self> {
        if candidate.len() == VIDEO_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            Some(Self(candidate.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the video id from a watch link or a `youtu.be` short link.
///
/// Accepted shapes:
/// - `http(s)://{www.,m.,}youtube.com/watch?v=<id>[&...]`
/// - `http(s)://youtu.be/<id>[?...]`
pub fn video_id(url: &str) -> Result<VideoId, InvalidUrlError> {
    parse_video_id(url.trim()).ok_or_else(|| InvalidUrlError {
        url: url.to_owned(),
    })
}

fn parse_video_id(raw: &str) -> Option<VideoId> {
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    match url.host_str()? {
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => {
            if url.path() != "/watch" {
                return None;
            }
            let (_, id) = url.query_pairs().find(|(key, _)| key == "v")?;
            VideoId::parse(&id)
        }
        "youtu.be" => {
            let mut segments = url.path_segments()?;
            let id = segments.next()?;
            if segments.next().is_some() {
                return None;
            }
            VideoId::parse(id)
        }
        _ => None,
    }
}
