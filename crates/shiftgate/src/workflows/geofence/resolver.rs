use std::sync::Arc;

use tracing::debug;

use super::directory::{DirectoryError, LocationDirectory};
use super::distance::distance_meters;
use super::domain::{
    AssignmentTier, EntityRef, GeoPoint, GeofenceMatch, GeofenceViolation, WorkLocation,
};

/// Decides whether a position lies inside one of an entity's authorized locations.
pub struct GeofenceResolver<D> {
    directory: Arc<D>,
}

impl<D> Clone for GeofenceResolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl From<DirectoryError> for GeofenceViolation {
    fn from(value: DirectoryError) -> Self {
        match value {
            DirectoryError::Unavailable(detail) => GeofenceViolation::DirectoryUnavailable(detail),
        }
    }
}

impl<D> GeofenceResolver<D>
where
    D: LocationDirectory,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Resolve the candidate set for `entity`. Only one precedence tier is consulted.
    pub async fn candidates(
        &self,
        entity: &EntityRef,
    ) -> Result<(AssignmentTier, Vec<WorkLocation>), GeofenceViolation> {
        let assigned = self.directory.assigned_locations(entity).await?;
        if !assigned.is_empty() {
            let mut active = Vec::with_capacity(assigned.len());
            let mut unusable = None;
            for id in assigned {
                match self.directory.location(&id).await? {
                    Some(location) if location.active => active.push(location),
                    _ => {
                        unusable.get_or_insert(id);
                    }
                }
            }
            if active.is_empty() {
                return Err(GeofenceViolation::LocationNotFoundOrInactive(unusable));
            }
            return Ok((AssignmentTier::Explicit, active));
        }

        if let Some(legacy_id) = self.directory.legacy_location(entity).await? {
            return match self.directory.location(&legacy_id).await? {
                Some(location) if location.active => Ok((AssignmentTier::Legacy, vec![location])),
                _ => Err(GeofenceViolation::LocationNotFoundOrInactive(Some(
                    legacy_id,
                ))),
            };
        }

        let active = self.directory.active_locations().await?;
        if active.is_empty() {
            return Err(GeofenceViolation::NoLocationsConfigured);
        }
        Ok((AssignmentTier::AnyActive, active))
    }

    /// Check `position` against the entity's candidates.
    ///
    /// The first candidate whose radius contains the position wins, even when a
    /// later candidate is nearer. On failure the nearest candidate is reported.
    pub async fn resolve(
        &self,
        entity: &EntityRef,
        position: GeoPoint,
    ) -> Result<GeofenceMatch, GeofenceViolation> {
        if !position.is_finite() {
            return Err(GeofenceViolation::InvalidPosition);
        }

        let (tier, candidates) = self.candidates(entity).await?;
        let mut nearest: Option<(f64, &WorkLocation)> = None;

        for location in &candidates {
            let distance = distance_meters(position, location.center);
            if distance.is_nan() {
                continue;
            }
            debug!(
                entity = %entity,
                location = %location.id,
                distance_meters = distance,
                radius_meters = location.radius_meters,
                "geofence candidate measured"
            );

            if distance <= location.radius_meters {
                return Ok(GeofenceMatch {
                    location_id: location.id.clone(),
                    location_name: location.name.clone(),
                    distance_meters: distance,
                    radius_meters: location.radius_meters,
                    tier,
                });
            }

            if nearest.map_or(true, |(best, _)| distance < best) {
                nearest = Some((distance, location));
            }
        }

        match nearest {
            Some((distance, location)) => Err(GeofenceViolation::OutOfRadius {
                location_name: location.name.clone(),
                distance_meters: distance,
                required_radius_meters: location.radius_meters,
            }),
            // Every candidate center was non-finite.
            None => Err(GeofenceViolation::InvalidPosition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::geofence::directory::InMemoryLocationDirectory;
    use crate::workflows::geofence::domain::{EntityKind, LocationId};

    fn site(id: &str, lat: f64, lon: f64, radius: f64, active: bool) -> WorkLocation {
        WorkLocation {
            id: LocationId(id.to_string()),
            name: format!("Site {id}"),
            center: GeoPoint::new(lat, lon),
            radius_meters: radius,
            active,
        }
    }

    fn resolver(directory: InMemoryLocationDirectory) -> GeofenceResolver<InMemoryLocationDirectory> {
        GeofenceResolver::new(Arc::new(directory))
    }

    struct OfflineDirectory;

    fn offline<T>() -> Result<T, DirectoryError> {
        Err(DirectoryError::Unavailable("connection reset".to_string()))
    }

    impl LocationDirectory for OfflineDirectory {
        async fn location(&self, _id: &LocationId) -> Result<Option<WorkLocation>, DirectoryError> {
            offline()
        }

        async fn active_locations(&self) -> Result<Vec<WorkLocation>, DirectoryError> {
            offline()
        }

        async fn assigned_locations(
            &self,
            _entity: &EntityRef,
        ) -> Result<Vec<LocationId>, DirectoryError> {
            offline()
        }

        async fn legacy_location(
            &self,
            _entity: &EntityRef,
        ) -> Result<Option<LocationId>, DirectoryError> {
            offline()
        }
    }

    /// One entity of each kind; every rule must hold for both.
    fn entities() -> [EntityRef; 2] {
        [EntityKind::Worker, EntityKind::Employee].map(|kind| EntityRef {
            kind,
            id: "e-1".to_string(),
        })
    }

    const HERE: GeoPoint = GeoPoint::new(14.5995, 120.9842);

    #[tokio::test]
    async fn boundary_distance_is_inside() {
        let nearby = GeoPoint::new(14.5995, 120.9843);
        let exact = distance_meters(HERE, nearby);
        let resolver = resolver(InMemoryLocationDirectory::new(vec![site(
            "hq",
            HERE.latitude,
            HERE.longitude,
            exact,
            true,
        )]));

        for entity in entities() {
            let matched = resolver
                .resolve(&entity, nearby)
                .await
                .expect("boundary is inclusive");
            assert_eq!(matched.location_id, LocationId("hq".to_string()));
        }
    }

    #[tokio::test]
    async fn explicit_assignments_ignore_legacy_column() {
        for entity in entities() {
            let mut directory = InMemoryLocationDirectory::new(vec![
                site("far", 14.7, 121.1, 50.0, true),
                site("here", 14.5995, 120.9842, 50.0, true),
            ]);
            directory.assign(entity.clone(), LocationId("far".to_string()));
            directory.set_legacy(entity.clone(), LocationId("here".to_string()));
            let resolver = resolver(directory);

            match resolver.resolve(&entity, HERE).await {
                Err(GeofenceViolation::OutOfRadius { location_name, .. }) => {
                    assert_eq!(location_name, "Site far");
                }
                other => panic!("expected out of radius against explicit tier, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn legacy_assignment_used_when_no_explicit_rows() {
        for entity in entities() {
            let mut directory = InMemoryLocationDirectory::new(vec![
                site("other", 14.5995, 120.9842, 50.0, true),
                site("legacy", 14.6500, 121.0500, 50.0, true),
            ]);
            directory.set_legacy(entity.clone(), LocationId("legacy".to_string()));
            let resolver = resolver(directory);

            let (tier, candidates) = resolver
                .candidates(&entity)
                .await
                .expect("legacy resolves");
            assert_eq!(tier, AssignmentTier::Legacy);
            assert_eq!(candidates.len(), 1);
            assert!(resolver.resolve(&entity, HERE).await.is_err());
        }
    }

    #[tokio::test]
    async fn inactive_legacy_location_does_not_fall_back() {
        for entity in entities() {
            let mut directory = InMemoryLocationDirectory::new(vec![
                site("open", 14.5995, 120.9842, 50.0, true),
                site("closed", 14.5995, 120.9842, 50.0, false),
            ]);
            directory.set_legacy(entity.clone(), LocationId("closed".to_string()));
            let resolver = resolver(directory);

            assert_eq!(
                resolver.resolve(&entity, HERE).await,
                Err(GeofenceViolation::LocationNotFoundOrInactive(Some(
                    LocationId("closed".to_string())
                )))
            );
        }
    }

    #[tokio::test]
    async fn missing_explicit_locations_fail_without_fallback() {
        for entity in entities() {
            let mut directory =
                InMemoryLocationDirectory::new(vec![site("open", 14.5995, 120.9842, 50.0, true)]);
            directory.assign(entity.clone(), LocationId("deleted".to_string()));
            let resolver = resolver(directory);

            assert_eq!(
                resolver.resolve(&entity, HERE).await,
                Err(GeofenceViolation::LocationNotFoundOrInactive(Some(
                    LocationId("deleted".to_string())
                )))
            );
        }
    }

    #[tokio::test]
    async fn unusable_explicit_tier_names_first_offending_assignment() {
        for entity in entities() {
            let mut directory = InMemoryLocationDirectory::new(vec![
                site("open", 14.5995, 120.9842, 50.0, true),
                site("closed", 14.5995, 120.9842, 50.0, false),
            ]);
            directory.assign(entity.clone(), LocationId("closed".to_string()));
            directory.assign(entity.clone(), LocationId("deleted".to_string()));
            let resolver = resolver(directory);

            assert_eq!(
                resolver.candidates(&entity).await,
                Err(GeofenceViolation::LocationNotFoundOrInactive(Some(
                    LocationId("closed".to_string())
                )))
            );
        }
    }

    #[tokio::test]
    async fn explicit_tier_keeps_active_subset() {
        for entity in entities() {
            let mut directory = InMemoryLocationDirectory::new(vec![
                site("closed", 14.5995, 120.9842, 50.0, false),
                site("open", 14.5995, 120.9842, 50.0, true),
            ]);
            directory.assign(entity.clone(), LocationId("closed".to_string()));
            directory.assign(entity.clone(), LocationId("open".to_string()));
            let resolver = resolver(directory);

            let matched = resolver
                .resolve(&entity, HERE)
                .await
                .expect("active assignment matches");
            assert_eq!(matched.location_id, LocationId("open".to_string()));
            assert_eq!(matched.tier, AssignmentTier::Explicit);
        }
    }

    #[tokio::test]
    async fn no_active_locations_reports_unconfigured() {
        let resolver = resolver(InMemoryLocationDirectory::new(vec![site(
            "closed", 14.5995, 120.9842, 50.0, false,
        )]));

        for entity in entities() {
            assert_eq!(
                resolver.resolve(&entity, HERE).await,
                Err(GeofenceViolation::NoLocationsConfigured)
            );
        }
    }

    #[tokio::test]
    async fn first_in_radius_candidate_wins_over_nearest() {
        let resolver = resolver(InMemoryLocationDirectory::new(vec![
            site("wide", 14.6000, 120.9842, 500.0, true),
            site("exact", 14.5995, 120.9842, 50.0, true),
        ]));

        for entity in entities() {
            let matched = resolver
                .resolve(&entity, HERE)
                .await
                .expect("inside wide radius");
            assert_eq!(matched.location_id, LocationId("wide".to_string()));
            assert!(matched.distance_meters > 50.0);
        }
    }

    #[tokio::test]
    async fn failure_reports_nearest_candidate() {
        let resolver = resolver(InMemoryLocationDirectory::new(vec![
            site("far", 14.6500, 120.9842, 30.0, true),
            site("near", 14.6020, 120.9842, 75.0, true),
        ]));

        for entity in entities() {
            match resolver.resolve(&entity, HERE).await {
                Err(GeofenceViolation::OutOfRadius {
                    location_name,
                    distance_meters,
                    required_radius_meters,
                }) => {
                    assert_eq!(location_name, "Site near");
                    assert!((distance_meters - 278.0).abs() < 2.0);
                    assert_eq!(required_radius_meters, 75.0);
                }
                other => panic!("expected out of radius, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn non_finite_position_is_rejected() {
        let resolver = resolver(InMemoryLocationDirectory::new(vec![site(
            "hq", 14.5995, 120.9842, 50.0, true,
        )]));

        for entity in entities() {
            assert_eq!(
                resolver
                    .resolve(&entity, GeoPoint::new(f64::NAN, 120.9842))
                    .await,
                Err(GeofenceViolation::InvalidPosition)
            );
        }
    }

    #[tokio::test]
    async fn directory_outage_is_transient_not_unconfigured() {
        let resolver = GeofenceResolver::new(Arc::new(OfflineDirectory));

        for entity in entities() {
            let error = resolver
                .resolve(&entity, HERE)
                .await
                .expect_err("directory offline");
            assert_eq!(error.code(), "directory_unavailable");
            assert!(error.is_transient());
        }
    }
}
