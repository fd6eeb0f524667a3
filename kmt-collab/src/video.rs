use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref VIDEO_URL_REGEX: Regex =
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})")
            .unwrap();
    static ref VIDEO_ID_REGEX: Regex = Regex::new(r"^([a-zA-Z0-9_-]{11})$").unwrap();
}

/// Extracts the YouTube video id from a `youtu.be/ID`, `youtube.com/watch?v=ID`
/// or `youtube.com/embed/ID` url, or a bare 11 character id.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let trimmed = url.trim();

    [&*VIDEO_URL_REGEX, &*VIDEO_ID_REGEX]
        .into_iter()
        .find_map(|re| re.captures(trimmed))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// How an embedded video behaves
#[derive(Debug, Clone, Copy)]
pub struct EmbedOptions {
    pub autoplay: bool,
    pub mute: bool,
    /// Looping needs the video to also be its own playlist
    pub looped: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            autoplay: true,
            mute: false,
            looped: true,
        }
    }
}

/// Builds the embed url for a YouTube video id.
pub fn youtube_embed_url(video_id: &str, options: EmbedOptions) -> Option<String> {
    if video_id.is_empty() {
        return None;
    }

    let flag = |on: bool| if on { "1" } else { "0" };

    let url = Url::parse_with_params(
        &format!("https://www.youtube.com/embed/{video_id}"),
        &[
            ("autoplay", flag(options.autoplay)),
            ("mute", flag(options.mute)),
            ("loop", flag(options.looped)),
            ("playlist", video_id),
            ("rel", "0"),
            ("modestbranding", "1"),
            ("playsinline", "1"),
        ],
    )
    .ok()?;

    Some(url.to_string())
}
