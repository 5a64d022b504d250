//! Debounced, best-effort location suggestions.
//!
//! Every keystroke may call [`FacetResolver::lookup`]. Each call waits out the
//! debounce window; if a newer call for the same facet arrived meanwhile, the
//! older one returns `None` without touching the collaborator. Collaborator
//! failures are logged and turned into an empty suggestion list.

use crate::collaborators::{Facet, FacetLookup};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct FacetResolver {
    lookup: Option<Arc<dyn FacetLookup>>,
    debounce: Duration,
    generations: Mutex<HashMap<Facet, u64>>,
}

impl FacetResolver {
    pub fn new(lookup: Option<Arc<dyn FacetLookup>>, debounce: Duration) -> Self {
        Self {
            lookup,
            debounce,
            generations: Mutex::new(HashMap::new()),
        }
    }

    fn bump(&self, facet: Facet) -> u64 {
        let mut generations = self.generations.lock().unwrap_or_else(|p| p.into_inner());
        let generation = generations.entry(facet).or_insert(0);
        *generation += 1;
        *generation
    }

    fn is_current(&self, facet: Facet, ticket: u64) -> bool {
        let generations = self.generations.lock().unwrap_or_else(|p| p.into_inner());
        generations.get(&facet).copied() == Some(ticket)
    }

    /// Suggestions for `query`, or `None` if a newer lookup superseded this one
    pub async fn lookup(
        &self,
        facet: Facet,
        parent: Option<&str>,
        query: &str,
    ) -> Option<Vec<String>> {
        let ticket = self.bump(facet);
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_current(facet, ticket) {
            return None;
        }

        let Some(lookup) = &self.lookup else {
            return Some(Vec::new());
        };

        let result = match lookup.lookup(facet, parent, query.trim()).await {
            Ok(values) => values,
            Err(e) => {
                tracing::debug!(?facet, "facet lookup failed: {}", e);
                Vec::new()
            }
        };

        // A newer call may have started while this one was on the network
        self.is_current(facet, ticket).then_some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use atelier_common::{EditorError, EditorResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Cities {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl FacetLookup for Cities {
        async fn lookup(
            &self,
            _facet: Facet,
            parent: Option<&str>,
            query: &str,
        ) -> EditorResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EditorError::network("timeout"));
            }
            let all = ["Izmir", "Istanbul", "Ankara"];
            Ok(all
                .iter()
                .filter(|c| c.to_lowercase().starts_with(&query.to_lowercase()))
                .map(|c| match parent {
                    Some(p) => format!("{}/{}", p, c),
                    None => c.to_string(),
                })
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_lookup_returns_none() {
        let cities = Arc::new(Cities::default());
        let resolver = FacetResolver::new(Some(cities.clone()), Duration::from_millis(300));

        let (first, second) = tokio::join!(
            resolver.lookup(Facet::City, None, "I"),
            resolver.lookup(Facet::City, None, "Iz"),
        );

        assert_eq!(first, None);
        assert_eq!(second, Some(vec!["Izmir".to_string()]));
        assert_eq!(cities.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_facets_debounce_independently() {
        let resolver = FacetResolver::new(
            Some(Arc::new(Cities::default())),
            Duration::from_millis(300),
        );
        let (city, district) = tokio::join!(
            resolver.lookup(Facet::City, None, "An"),
            resolver.lookup(Facet::District, Some("Izmir"), "I"),
        );
        assert_eq!(city, Some(vec!["Ankara".to_string()]));
        assert_eq!(
            district,
            Some(vec!["Izmir/Izmir".to_string(), "Izmir/Istanbul".to_string()])
        );
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let resolver = FacetResolver::new(
            Some(Arc::new(Cities {
                fail: true,
                ..Cities::default()
            })),
            Duration::ZERO,
        );
        assert_eq!(resolver.lookup(Facet::City, None, "Iz").await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_without_collaborator_returns_empty() {
        let resolver = FacetResolver::new(None, Duration::ZERO);
        assert_eq!(resolver.lookup(Facet::Neighborhood, None, "x").await, Some(vec![]));
    }
}
