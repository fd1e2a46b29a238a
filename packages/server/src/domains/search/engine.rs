use std::sync::Arc;

use tracing::{debug, instrument};

use super::{Locatable, ProximityStore, Ranked, SearchError, SearchQuery};
use crate::common::pagination::PageRequest;
use crate::domains::locations::{calculate_distance, CoordinateExtractor, DistanceUnit};

/// One page of ranked results plus the match count before pagination
#[derive(Debug, Clone)]
pub struct SearchPage<T> {
    pub items: Vec<Ranked<T>>,
    /// The window applied, if any
    pub page: Option<PageRequest>,
    pub total_count: usize,
}

/// Runs nearby searches against a [`ProximityStore`]
pub struct ProximitySearchEngine<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> ProximitySearchEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Find records within the query radius, nearest first
    ///
    /// Records the store can rank natively come back pre-filtered; the rest
    /// are located through [`CoordinateExtractor`] and silently dropped when
    /// their location cannot be resolved. Only a bad origin or a store
    /// failure fails the request.
    #[instrument(
        skip(self, query),
        fields(
            lat = query.origin.latitude,
            lng = query.origin.longitude,
            radius = query.radius,
        )
    )]
    pub async fn search_nearby<T>(&self, query: &SearchQuery) -> Result<SearchPage<T>, SearchError>
    where
        S: ProximityStore<T>,
        T: Locatable + Send,
    {
        query
            .origin
            .validate()
            .map_err(|e| SearchError::InvalidParameter(format!("Invalid origin: {}", e)))?;

        let radius = query.effective_radius();
        let unit = query.unit;
        let radius_meters = unit.convert(radius, DistanceUnit::Meters);

        let native = self
            .store
            .find_within_radius(query.origin, radius_meters, &query.filters)
            .await?;
        let native_count = native.len();

        let mut candidates: Vec<Ranked<T>> = native
            .into_iter()
            .map(|ranked| Ranked {
                distance: DistanceUnit::Meters.convert(ranked.distance, unit),
                record: ranked.record,
            })
            .collect();

        let fallback = self.store.find_without_geometry(&query.filters).await?;
        let mut unresolved = 0usize;
        for record in fallback {
            let coordinate = match CoordinateExtractor::extract(record.location_source()) {
                Ok(coordinate) => coordinate,
                Err(failure) => {
                    unresolved += 1;
                    debug!(reason = %failure, "Skipping record without a resolvable location");
                    continue;
                }
            };

            let distance = calculate_distance(query.origin, coordinate, unit);
            if distance <= radius {
                candidates.push(Ranked { record, distance });
            }
        }

        candidates.retain(|candidate| candidate.record.matches(&query.filters));
        rank(&mut candidates);

        let total_count = candidates.len();
        let items = match query.page {
            Some(page) => page.slice(candidates),
            None => candidates,
        };

        debug!(
            native_count,
            unresolved,
            total_count,
            returned = items.len(),
            "Proximity search complete"
        );

        Ok(SearchPage {
            items,
            page: query.page,
            total_count,
        })
    }
}

/// Sort ascending by distance; equal distances keep their scan order
pub fn rank<T>(candidates: &mut [Ranked<T>]) {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::locations::{Coordinate, LocationSource};
    use crate::domains::search::{AttributeFilters, StoreError};
    use async_trait::async_trait;

    #[derive(Debug, Clone, PartialEq)]
    struct Place {
        name: &'static str,
        geometry: Option<Coordinate>,
        text: &'static str,
        tags: Vec<String>,
    }

    impl Place {
        fn native(name: &'static str, latitude: f64, longitude: f64) -> Self {
            Self {
                name,
                geometry: Some(Coordinate::new(latitude, longitude).unwrap()),
                text: "",
                tags: Vec::new(),
            }
        }

        fn legacy(name: &'static str, text: &'static str) -> Self {
            Self {
                name,
                geometry: None,
                text,
                tags: Vec::new(),
            }
        }

        fn tagged(mut self, tag: &str) -> Self {
            self.tags.push(tag.to_string());
            self
        }
    }

    impl Locatable for Place {
        fn location_source(&self) -> LocationSource<'_> {
            LocationSource::Text(self.text)
        }

        fn matches(&self, filters: &AttributeFilters) -> bool {
            filters.matches_diagnoses(&self.tags)
        }
    }

    struct PlaceStore {
        places: Vec<Place>,
    }

    #[async_trait]
    impl ProximityStore<Place> for PlaceStore {
        async fn find_within_radius(
            &self,
            origin: Coordinate,
            radius_meters: f64,
            _filters: &AttributeFilters,
        ) -> Result<Vec<Ranked<Place>>, StoreError> {
            let mut ranked: Vec<Ranked<Place>> = self
                .places
                .iter()
                .filter_map(|place| {
                    let geometry = place.geometry?;
                    let distance = calculate_distance(origin, geometry, DistanceUnit::Meters);
                    (distance <= radius_meters).then(|| Ranked {
                        record: place.clone(),
                        distance,
                    })
                })
                .collect();
            rank(&mut ranked);
            Ok(ranked)
        }

        async fn find_without_geometry(
            &self,
            _filters: &AttributeFilters,
        ) -> Result<Vec<Place>, StoreError> {
            Ok(self
                .places
                .iter()
                .filter(|place| place.geometry.is_none())
                .cloned()
                .collect())
        }
    }

    struct UnavailableStore;

    #[async_trait]
    impl ProximityStore<Place> for UnavailableStore {
        async fn find_within_radius(
            &self,
            _origin: Coordinate,
            _radius_meters: f64,
            _filters: &AttributeFilters,
        ) -> Result<Vec<Ranked<Place>>, StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
        }

        async fn find_without_geometry(
            &self,
            _filters: &AttributeFilters,
        ) -> Result<Vec<Place>, StoreError> {
            Err(StoreError::Backend(anyhow::anyhow!("connection refused")))
        }
    }

    fn origin() -> Coordinate {
        Coordinate::new(34.05, -118.25).unwrap()
    }

    fn engine(places: Vec<Place>) -> ProximitySearchEngine<PlaceStore> {
        ProximitySearchEngine::new(Arc::new(PlaceStore { places }))
    }

    fn names(page: &SearchPage<Place>) -> Vec<&'static str> {
        page.items.iter().map(|r| r.record.name).collect()
    }

    #[tokio::test]
    async fn test_merges_native_and_fallback_by_distance() {
        let engine = engine(vec![
            Place::native("native-far", 34.09, -118.25),
            Place::legacy("legacy-near", "Suite 4 (34.0510, -118.2500)"),
            Place::native("native-near", 34.06, -118.25),
            Place::legacy("legacy-mid", "(34.07, -118.25)"),
        ]);

        let page = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()))
            .await
            .unwrap();

        assert_eq!(
            names(&page),
            vec!["legacy-near", "native-near", "legacy-mid", "native-far"]
        );
        assert!(page.items.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_excludes_everything_beyond_radius() {
        // 0.1 degrees of latitude ≈ 6.9 miles
        let engine = engine(vec![
            Place::native("inside", 34.10, -118.25),
            Place::native("outside", 34.15, -118.25),
            Place::legacy("legacy-outside", "(34.20, -118.25)"),
        ]);

        let page = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()).with_radius(5.0))
            .await
            .unwrap();

        assert_eq!(names(&page), vec!["inside"]);
        assert!(page.items.iter().all(|r| r.distance <= 5.0));
    }

    #[tokio::test]
    async fn test_unresolvable_records_are_dropped_not_fatal() {
        let engine = engine(vec![
            Place::legacy("no-coordinates", "4600 Main St, Los Angeles"),
            Place::legacy("out-of-range", "(134.0, -118.25)"),
            Place::legacy("resolvable", "(34.05, -118.25)"),
        ]);

        let page = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()))
            .await
            .unwrap();

        assert_eq!(names(&page), vec!["resolvable"]);
        assert_eq!(page.items[0].distance, 0.0);
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn test_second_page_of_twenty_five_matches() {
        let places: Vec<Place> = (1..=25)
            .map(|i| {
                let name: &'static str = Box::leak(format!("place-{}", i).into_boxed_str());
                Place::native(name, 34.05 + i as f64 * 0.002, -118.25)
            })
            .collect();
        let engine = engine(places);

        let query = SearchQuery::new(origin()).with_page(PageRequest::new(2, 10));
        let page = engine.search_nearby::<Place>(&query).await.unwrap();

        let expected: Vec<String> = (11..=20).map(|i| format!("place-{}", i)).collect();
        let actual: Vec<String> = names(&page).into_iter().map(String::from).collect();
        assert_eq!(actual, expected);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.page, Some(PageRequest::new(2, 10)));
    }

    #[tokio::test]
    async fn test_unpaged_query_returns_every_match() {
        let places: Vec<Place> = (1..=15)
            .map(|i| {
                let name: &'static str = Box::leak(format!("place-{}", i).into_boxed_str());
                Place::native(name, 34.05 + i as f64 * 0.001, -118.25)
            })
            .collect();
        let engine = engine(places);

        let query = SearchQuery::new(origin()).without_paging();
        let page = engine.search_nearby::<Place>(&query).await.unwrap();

        assert_eq!(page.items.len(), 15);
        assert_eq!(page.total_count, 15);
        assert_eq!(page.page, None);
    }

    #[tokio::test]
    async fn test_ties_keep_scan_order() {
        let engine = engine(vec![
            Place::legacy("first", "(34.06, -118.25)"),
            Place::legacy("second", "(34.06, -118.25)"),
            Place::legacy("third", "(34.06, -118.25)"),
        ]);

        let page = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()))
            .await
            .unwrap();

        assert_eq!(names(&page), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_filters_apply_to_both_paths() {
        let engine = engine(vec![
            Place::native("native-autism", 34.06, -118.25).tagged("autism"),
            Place::native("native-other", 34.06, -118.25).tagged("dyslexia"),
            Place::legacy("legacy-autism", "(34.07, -118.25)").tagged("autism"),
        ]);

        let filters = AttributeFilters::default().with_diagnoses_csv(Some("autism"));
        let page = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()).with_filters(filters))
            .await
            .unwrap();

        assert_eq!(names(&page), vec!["native-autism", "legacy-autism"]);
    }

    #[tokio::test]
    async fn test_distances_follow_query_unit() {
        let engine = engine(vec![
            Place::native("native", 34.06, -118.25),
            Place::legacy("legacy", "(34.06, -118.25)"),
        ]);

        let query = SearchQuery::new(origin())
            .with_unit(DistanceUnit::Meters)
            .with_radius(5000.0);
        let page = engine.search_nearby::<Place>(&query).await.unwrap();

        assert_eq!(page.items.len(), 2);
        for ranked in &page.items {
            assert!((ranked.distance - 1111.95).abs() < 1.0);
        }
    }

    #[tokio::test]
    async fn test_invalid_origin_is_rejected() {
        let engine = engine(vec![Place::native("anywhere", 0.0, 0.0)]);
        let query = SearchQuery::new(Coordinate {
            latitude: 91.0,
            longitude: 0.0,
        });

        let result = engine.search_nearby::<Place>(&query).await;
        assert!(matches!(result, Err(SearchError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = ProximitySearchEngine::new(Arc::new(UnavailableStore));
        let result = engine
            .search_nearby::<Place>(&SearchQuery::new(origin()))
            .await;
        assert!(matches!(result, Err(SearchError::StoreUnavailable(_))));
    }
}
