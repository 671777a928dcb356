//! Cache-busting query helpers.

/// Append `v=<version>` to `url`, joining with `?` or `&` as needed.
pub fn add_cache_buster(url: &str, version: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}v={version}")
}

/// Query string carrying both the version and a timestamp.
pub fn cache_buster(version: &str, timestamp: i64) -> String {
    format!("?v={version}&t={timestamp}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_cache_buster() {
        assert_eq!(add_cache_buster("/assets/app.js", "v3"), "/assets/app.js?v=v3");
        assert_eq!(add_cache_buster("/version.json?t=1", "v3"), "/version.json?t=1&v=v3");
    }

    #[test]
    fn test_cache_buster() {
        assert_eq!(cache_buster("v1", 1718000000000), "?v=v1&t=1718000000000");
    }
}
