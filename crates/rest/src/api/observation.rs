//! The Observation write path.
//!
//! An Observation is checked, its Datastream confirmed, its FeatureOfInterest
//! resolved, and only then persisted in a single storage call. Each step can
//! fail and stop the ones after it:
//!
//! 1. mandatory fields (`result`, `Datastream`), all reported together
//! 2. the Datastream must carry an id and exist
//! 3. the FeatureOfInterest is derived when absent, created when supplied
//!    without an id, and used as-is when it carries one
//! 4. persist
//! 5. links
//! 6. notifications on `Datastreams(<id>)/Observations` and `Observations`
//!
//! Nothing is rolled back after step 4. Notifications are queued and never
//! fail the write.

use chrono::{SecondsFormat, Utc};
use sensorthings_persistence::core::{EntityStorage, SensorThingsStorage};
use sensorthings_persistence::types::{
    Datastream, Entity, EntityId, FeatureOfInterest, Observation,
};
use tracing::{debug, warn};

use super::SensorThingsApi;
use super::facade::require_mandatory;
use super::feature_of_interest::resolve;
use crate::error::{RestError, RestResult};

impl<S: SensorThingsStorage> SensorThingsApi<S> {
    /// Creates an Observation.
    pub async fn create_observation(&self, mut observation: Observation) -> RestResult<Observation> {
        require_mandatory(&observation)?;

        let datastream_id = observation
            .datastream_id()
            .ok_or_else(|| RestError::BadRequest {
                message: "Datastream reference must carry an @iot.id".to_string(),
            })?;

        if !EntityStorage::<Datastream>::exists(self.storage(), datastream_id).await? {
            return Err(RestError::BadRequest {
                message: format!("Datastream {} does not exist", datastream_id),
            });
        }

        let feature = self
            .feature_of_interest_for(datastream_id, observation.feature_of_interest.take())
            .await?;
        observation.datastream = Some(Datastream::reference(datastream_id));
        observation.feature_of_interest = Some(feature.clone());

        if observation.phenomenon_time.is_none() {
            observation.phenomenon_time =
                Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        }

        let mut persisted = EntityStorage::<Observation>::post(self.storage(), observation).await?;
        persisted.feature_of_interest = Some(feature);
        persisted.set_all_links(self.base_url());

        debug!(
            id = ?persisted.id,
            datastream_id = %datastream_id,
            feature_id = ?persisted.feature_of_interest_id(),
            "Created Observation"
        );

        self.notifier().observation_created(datastream_id, &persisted);
        Ok(persisted)
    }

    /// Creates an Observation under the given Datastream.
    ///
    /// Any Datastream in the body is replaced by a reference to `datastream_id`.
    pub async fn create_observation_for_datastream(
        &self,
        datastream_id: EntityId,
        mut observation: Observation,
    ) -> RestResult<Observation> {
        observation.datastream = Some(Datastream::reference(datastream_id));
        self.create_observation(observation).await
    }

    /// Applies a partial update to an Observation.
    pub async fn patch_observation(
        &self,
        id: EntityId,
        patch: Observation,
    ) -> RestResult<Observation> {
        self.patch(id, patch).await
    }

    /// Deletes an Observation.
    pub async fn delete_observation(&self, id: EntityId) -> RestResult<()> {
        self.delete::<Observation>(id).await
    }

    async fn feature_of_interest_for(
        &self,
        datastream_id: EntityId,
        supplied: Option<FeatureOfInterest>,
    ) -> RestResult<FeatureOfInterest> {
        match supplied {
            None => resolve(self.storage(), datastream_id).await.map_err(|e| {
                debug!(datastream_id = %datastream_id, error = %e, "FeatureOfInterest derivation failed");
                RestError::BadRequest {
                    message: format!("Unable to derive FeatureOfInterest: {}", e),
                }
            }),
            Some(feature) if feature.id.is_none() => self.create(feature).await.map_err(|e| {
                warn!(error = %e, "Nested FeatureOfInterest creation failed");
                RestError::Conflict {
                    message: format!("Unable to create nested FeatureOfInterest: {}", e),
                }
            }),
            Some(feature) => Ok(feature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiSettings;
    use crate::notifications::Notifier;
    use sensorthings_persistence::backends::memory::InMemoryBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn api() -> SensorThingsApi<InMemoryBackend> {
        SensorThingsApi::new(
            Arc::new(InMemoryBackend::new()),
            ApiSettings::default(),
            Notifier::disabled(),
        )
    }

    #[tokio::test]
    async fn test_missing_fields_reported_together() {
        let api = api();
        let err = api
            .create_observation(Observation::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.messages(),
            vec![
                "Missing mandatory parameter: Observation.result".to_string(),
                "Missing mandatory parameter: Observation.Datastream".to_string(),
            ]
        );
        assert_eq!(api.storage().write_count(), 0);
    }

    #[tokio::test]
    async fn test_datastream_without_id_rejected() {
        let api = api();
        let observation = Observation {
            result: Some(json!(1)),
            datastream: Some(Datastream::default()),
            ..Default::default()
        };
        let err = api.create_observation(observation).await.unwrap_err();
        assert!(matches!(err, RestError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_for_datastream_injects_reference() {
        let api = api();
        let observation = Observation {
            result: Some(json!(1)),
            ..Default::default()
        };
        let err = api
            .create_observation_for_datastream(EntityId::new(4), observation)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Datastream 4 does not exist");
    }
}
