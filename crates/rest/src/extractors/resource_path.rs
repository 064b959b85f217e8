//! Resource path segments.
//!
//! A SensorThings path addresses a collection (`Things`), an entity
//! (`Things(1)`), or something reached from an entity through a navigation
//! property (`Things(1)/Datastreams`, `Datastreams(7)/Thing`). Segment
//! matching ignores case.

use sensorthings_persistence::types::{EntityId, EntityType, ParentRef};

use crate::error::{RestError, RestResult};

/// A `Collection` or `Collection(id)` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePath {
    /// The addressed entity type.
    pub entity_type: EntityType,
    /// The entity id, if the segment names one entity.
    pub id: Option<EntityId>,
}

impl ResourcePath {
    /// Parses a segment such as `things`, `Things(1)` or `Things('1')`.
    pub fn parse(segment: &str) -> RestResult<Self> {
        let (name, id) = match segment.split_once('(') {
            Some((name, rest)) => {
                let raw = rest.strip_suffix(')').ok_or_else(|| RestError::BadRequest {
                    message: format!("Malformed resource path segment: {}", segment),
                })?;
                let id = raw.parse::<EntityId>().map_err(|e| RestError::BadRequest {
                    message: e.to_string(),
                })?;
                (name, Some(id))
            }
            None => (segment, None),
        };

        let entity_type = EntityType::from_collection(name).ok_or_else(|| RestError::NotFound {
            message: format!("Unknown resource: {}", name),
        })?;

        Ok(Self { entity_type, id })
    }

    /// Returns the id, failing if the segment names a whole collection.
    pub fn require_id(&self) -> RestResult<EntityId> {
        self.id.ok_or_else(|| RestError::BadRequest {
            message: format!(
                "An entity id is required, e.g. {}(1)",
                self.entity_type.collection_name()
            ),
        })
    }

    /// Returns the segment as the parent of a navigation.
    pub fn as_parent(&self) -> RestResult<ParentRef> {
        Ok(ParentRef::new(self.entity_type, self.require_id()?))
    }

    /// Fails if the segment names a single entity.
    pub fn require_collection(&self) -> RestResult<()> {
        match self.id {
            Some(_) => Err(RestError::BadRequest {
                message: format!(
                    "Entities are created on the collection, e.g. {}",
                    self.entity_type.collection_name()
                ),
            }),
            None => Ok(()),
        }
    }
}

/// A navigation property following an entity segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// A related collection, e.g. `Datastreams(7)/Observations`.
    Collection(EntityType),
    /// A single related entity, e.g. `Datastreams(7)/Thing`.
    Entity(EntityType),
}

impl Navigation {
    /// Parses a navigation segment.
    pub fn parse(segment: &str) -> RestResult<Self> {
        if let Some(entity_type) = EntityType::from_collection(segment) {
            return Ok(Navigation::Collection(entity_type));
        }
        EntityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(segment))
            .map(Navigation::Entity)
            .ok_or_else(|| RestError::NotFound {
                message: format!("Unknown navigation property: {}", segment),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collection() {
        let path = ResourcePath::parse("things").unwrap();
        assert_eq!(path.entity_type, EntityType::Thing);
        assert_eq!(path.id, None);
    }

    #[test]
    fn test_parse_entity() {
        let path = ResourcePath::parse("FeaturesOfInterest(12)").unwrap();
        assert_eq!(path.entity_type, EntityType::FeatureOfInterest);
        assert_eq!(path.id, Some(EntityId::new(12)));

        let quoted = ResourcePath::parse("observations('3')").unwrap();
        assert_eq!(quoted.id, Some(EntityId::new(3)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ResourcePath::parse("sensors"),
            Err(RestError::NotFound { .. })
        ));
        assert!(matches!(
            ResourcePath::parse("things(abc)"),
            Err(RestError::BadRequest { .. })
        ));
        assert!(matches!(
            ResourcePath::parse("things(1"),
            Err(RestError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_require_id() {
        assert!(ResourcePath::parse("things").unwrap().require_id().is_err());
        assert_eq!(
            ResourcePath::parse("things(4)").unwrap().as_parent().unwrap(),
            ParentRef::new(EntityType::Thing, EntityId::new(4))
        );
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(
            Navigation::parse("observations").unwrap(),
            Navigation::Collection(EntityType::Observation)
        );
        assert_eq!(
            Navigation::parse("featureofinterest").unwrap(),
            Navigation::Entity(EntityType::FeatureOfInterest)
        );
        assert!(Navigation::parse("sensor").is_err());
    }
}
