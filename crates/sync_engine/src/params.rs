//! Typed reads from the parameter snapshot.

use contracts::{ContractError, Coordinate, ParamsSnapshot, PARAM_MAP_STYLE, PARAM_NAV_DESTINATION};

/// Parse a `{"latitude": .., "longitude": ..}` parameter
///
/// A missing key is `Ok(None)`; a present but malformed value is an error.
pub fn coordinate_from_param(
    params: &dyn ParamsSnapshot,
    key: &str,
) -> Result<Option<Coordinate>, ContractError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Coordinate>(raw)
        .map(Some)
        .map_err(|e| ContractError::param_format(key, e.to_string()))
}

/// Style index parameter; a missing key is `Ok(None)`
pub fn style_index(params: &dyn ParamsSnapshot) -> Result<Option<usize>, ContractError> {
    let Some(raw) = params.get(PARAM_MAP_STYLE) else {
        return Ok(None);
    };

    raw.trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|e| ContractError::param_format(PARAM_MAP_STYLE, e.to_string()))
}

/// Destination with malformed values logged and treated as absent
pub fn destination(params: &dyn ParamsSnapshot) -> Option<Coordinate> {
    lenient(coordinate_from_param(params, PARAM_NAV_DESTINATION))
}

pub(crate) fn lenient<T>(result: Result<Option<T>, ContractError>) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed parameter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{StaticParams, PARAM_LAST_GPS_POSITION};

    #[test]
    fn test_coordinate_param() {
        let params = StaticParams::new()
            .with_coordinate(PARAM_LAST_GPS_POSITION, Coordinate::new(10.0, 20.0));
        let value = coordinate_from_param(&params, PARAM_LAST_GPS_POSITION).unwrap();
        assert_eq!(value, Some(Coordinate::new(10.0, 20.0)));
        assert_eq!(coordinate_from_param(&params, PARAM_NAV_DESTINATION).unwrap(), None);
    }

    #[test]
    fn test_malformed_coordinate() {
        let params = StaticParams::new().with(PARAM_NAV_DESTINATION, "not json");
        assert!(matches!(
            coordinate_from_param(&params, PARAM_NAV_DESTINATION),
            Err(ContractError::ParamFormat { .. })
        ));
        assert_eq!(destination(&params), None);
    }

    #[test]
    fn test_style_index() {
        let params = StaticParams::new().with(PARAM_MAP_STYLE, " 3 ");
        assert_eq!(style_index(&params).unwrap(), Some(3));

        let params = StaticParams::new().with(PARAM_MAP_STYLE, "-1");
        assert!(style_index(&params).is_err());

        assert_eq!(style_index(&StaticParams::new()).unwrap(), None);
    }
}
