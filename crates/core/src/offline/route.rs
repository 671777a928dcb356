//! Strategy selection per request.

use super::request::{Destination, Request};

/// Hosts serving web fonts, cached like build-time assets.
const FONT_HOSTS: &[&str] = &["fonts.googleapis.com", "fonts.gstatic.com"];

/// Paths that must always reflect the deployed build.
const NETWORK_ONLY_PATHS: &[&str] = &["/version.json", "/sw.js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
    NetworkOnly,
}

/// Which of the two cache partitions a response lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub strategy: Strategy,
    /// None for NetworkOnly.
    pub partition: Option<Partition>,
}

impl Route {
    const fn new(strategy: Strategy, partition: Partition) -> Self {
        Self { strategy, partition: Some(partition) }
    }

    const NETWORK_ONLY: Route = Route { strategy: Strategy::NetworkOnly, partition: None };

    pub fn for_request(request: &Request) -> Self {
        if !request.is_get() || NETWORK_ONLY_PATHS.contains(&request.url.path()) {
            return Self::NETWORK_ONLY;
        }

        if request.is_navigation() {
            return Self::new(Strategy::NetworkFirst, Partition::Dynamic);
        }

        if request.url.host_str().is_some_and(|h| FONT_HOSTS.contains(&h)) {
            return Self::new(Strategy::CacheFirst, Partition::Static);
        }

        match request.destination {
            Destination::Document => Self::new(Strategy::NetworkFirst, Partition::Dynamic),
            Destination::Style | Destination::Script | Destination::Font => {
                Self::new(Strategy::CacheFirst, Partition::Static)
            }
            Destination::Image => Self::new(Strategy::StaleWhileRevalidate, Partition::Dynamic),
            Destination::Manifest | Destination::Other => Self::new(Strategy::NetworkFirst, Partition::Dynamic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_routes_by_type() {
        let cases = [
            ("https://w.example/assets/style.1a2b3c4d.css", Strategy::CacheFirst, Some(Partition::Static)),
            ("https://w.example/assets/app.1a2b3c4d.js", Strategy::CacheFirst, Some(Partition::Static)),
            ("https://w.example/fonts/inter.woff2", Strategy::CacheFirst, Some(Partition::Static)),
            ("https://fonts.googleapis.com/css2?family=Inter", Strategy::CacheFirst, Some(Partition::Static)),
            ("https://w.example/images/hero-bg.jpg", Strategy::StaleWhileRevalidate, Some(Partition::Dynamic)),
            ("https://w.example/gifts.html", Strategy::NetworkFirst, Some(Partition::Dynamic)),
            ("https://w.example/manifest.json", Strategy::NetworkFirst, Some(Partition::Dynamic)),
            ("https://w.example/version.json?t=1", Strategy::NetworkOnly, None),
            ("https://w.example/sw.js", Strategy::NetworkOnly, None),
        ];
        for (url, strategy, partition) in cases {
            let route = Route::for_request(&get(url));
            assert_eq!(route.strategy, strategy, "{url}");
            assert_eq!(route.partition, partition, "{url}");
        }
    }

    #[test]
    fn test_navigation_is_network_first() {
        let req = Request::navigate(Url::parse("https://w.example/photos").unwrap());
        assert_eq!(Route::for_request(&req), Route::new(Strategy::NetworkFirst, Partition::Dynamic));
    }

    #[test]
    fn test_non_get_is_network_only() {
        let req = get("https://w.example/images/a.png").with_method("POST");
        assert_eq!(Route::for_request(&req), Route::NETWORK_ONLY);
    }
}
