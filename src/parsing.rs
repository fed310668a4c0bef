use chrono::Duration;

pub const DEFAULT_TAG: &str = "latest";

/// Components of a container image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageRef {
    /// Tag the runtime will pull; absent tags resolve to `latest`
    pub fn effective_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// True when the reference floats: untagged or `latest`, and not digest-pinned
    pub fn is_floating(&self) -> bool {
        self.digest.is_none() && self.effective_tag() == DEFAULT_TAG
    }
}

/// Split `registry:port/repo/name:tag@digest` into its parts.
///
/// A colon inside the registry host is a port, not a tag. Malformed input
/// never fails: an empty or missing tag is reported as absent.
pub fn parse_image_ref(image: &str) -> ImageRef {
    let image = image.trim();
    let (rest, digest) = match image.split_once('@') {
        Some((rest, digest)) if !digest.is_empty() => (rest, Some(digest.to_string())),
        Some((rest, _)) => (rest, None),
        None => (image, None),
    };

    let last_segment_start = rest.rfind('/').map(|i| i + 1).unwrap_or(0);
    let (name, tag) = match rest[last_segment_start..].rfind(':') {
        Some(pos) => {
            let split = last_segment_start + pos;
            let tag = &rest[split + 1..];
            let tag = if tag.is_empty() { None } else { Some(tag.to_string()) };
            (rest[..split].to_string(), tag)
        }
        None => (rest.to_string(), None),
    };

    ImageRef { name, tag, digest }
}

/// Whole hours, rounded half away from zero
pub fn round_to_hours(age: Duration) -> i64 {
    let minutes = age.num_minutes();
    (minutes + 30).div_euclid(60)
}

/// Comma-separated list with blanks dropped
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
