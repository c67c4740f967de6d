//! Route classification

use crate::config::GateConfig;

/// What the gate needs to know about a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteClass {
    pub is_protected: bool,
    pub is_auth_page: bool,
}

/// Maps request paths to [`RouteClass`]
///
/// Matching is exact or `prefix/...`; a prefix appearing anywhere else in
/// the path, or as the start of a longer segment, does not count.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    protected_prefixes: Vec<String>,
    auth_pages: Vec<String>,
}

impl RouteClassifier {
    pub fn new(config: &GateConfig) -> Self {
        let protected_prefixes = config
            .protected_prefixes
            .iter()
            .map(|prefix| prefix.trim_end_matches('/').to_string())
            .filter(|prefix| !prefix.is_empty())
            .collect();

        let auth_pages = std::iter::once(&config.login_path)
            .chain(config.login_aliases.iter())
            .cloned()
            .collect();

        Self {
            protected_prefixes,
            auth_pages,
        }
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        RouteClass {
            is_protected: self.is_protected(path),
            is_auth_page: self.auth_pages.iter().any(|page| page == path),
        }
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}
