//! Query option support check.

use sensorthings_persistence::types::{EntityType, QueryOptions};

use crate::error::{RestError, RestResult};

/// Confirms every requested option is supported for `entity_type`.
///
/// Fails on the first unsupported option, in request order. Must run before
/// the request reaches storage.
pub fn check_supported(options: &QueryOptions, entity_type: EntityType) -> RestResult<()> {
    match options
        .requested()
        .into_iter()
        .find(|kind| !entity_type.supports(*kind))
    {
        Some(option) => Err(RestError::UnsupportedQueryOption {
            option,
            entity_type,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorthings_persistence::types::QueryOptionKind;

    #[test]
    fn test_every_type_accepts_its_whitelist() {
        for entity_type in EntityType::ALL {
            for kind in entity_type.supported_options() {
                let query = match kind {
                    QueryOptionKind::Filter => "$filter=result gt 5",
                    QueryOptionKind::Expand => "$expand=Datastream",
                    QueryOptionKind::Select => "$select=id",
                    QueryOptionKind::OrderBy => "$orderby=id desc",
                    QueryOptionKind::Top => "$top=5",
                    QueryOptionKind::Skip => "$skip=5",
                    QueryOptionKind::Count => "$count=true",
                    QueryOptionKind::ResultFormat => "$resultFormat=dataArray",
                };
                let options = QueryOptions::parse(query).unwrap();
                assert!(
                    check_supported(&options, entity_type).is_ok(),
                    "{} should accept {}",
                    entity_type,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_result_format_rejected_outside_observations() {
        let options = QueryOptions::parse("$top=2&$resultFormat=dataArray").unwrap();
        for entity_type in EntityType::ALL {
            let result = check_supported(&options, entity_type);
            if entity_type == EntityType::Observation {
                assert!(result.is_ok());
            } else {
                assert!(matches!(
                    result,
                    Err(RestError::UnsupportedQueryOption {
                        option: QueryOptionKind::ResultFormat,
                        ..
                    })
                ));
            }
        }
    }

    #[test]
    fn test_empty_options_pass() {
        assert!(check_supported(&QueryOptions::new(), EntityType::Thing).is_ok());
    }

    #[test]
    fn test_non_system_parameters_ignored() {
        let options = QueryOptions::parse("token=abc&$top=1").unwrap();
        assert!(check_supported(&options, EntityType::Location).is_ok());
    }
}
