//! Location queries used to derive the ZIP-code filter.

use std::collections::BTreeSet;
use std::str::FromStr;

use pawmatch_client::types::{GeoBoundingBox, LOCATION_SEARCH_SIZE, LocationSearchRequest};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LocationQueryError {
    #[error("enter a city, a state or a bounding box to search locations")]
    Empty,
    #[error("'{0}' is not a two-letter state code")]
    InvalidState(String),
    #[error("bounding box coordinates must be finite numbers")]
    NonFinite,
    #[error("latitude {0} is out of range, expected -90 to 90")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is out of range, expected -180 to 180")]
    LongitudeOutOfRange(f64),
    #[error("top ({top}) must not be south of bottom ({bottom})")]
    InvertedLatitude { top: f64, bottom: f64 },
    #[error("left ({left}) must not be east of right ({right})")]
    InvertedLongitude { left: f64, right: f64 },
    #[error("expected a bounding box as 'top,left,bottom,right', got '{0}'")]
    MalformedBoundingBox(String),
}

/// A geographic rectangle given by its edges in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl BoundingBox {
    pub fn validate(&self) -> Result<(), LocationQueryError> {
        let edges = [self.top, self.left, self.bottom, self.right];
        if edges.iter().any(|edge| !edge.is_finite()) {
            return Err(LocationQueryError::NonFinite);
        }
        for latitude in [self.top, self.bottom] {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(LocationQueryError::LatitudeOutOfRange(latitude));
            }
        }
        for longitude in [self.left, self.right] {
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(LocationQueryError::LongitudeOutOfRange(longitude));
            }
        }
        if self.top < self.bottom {
            return Err(LocationQueryError::InvertedLatitude {
                top: self.top,
                bottom: self.bottom,
            });
        }
        if self.left > self.right {
            return Err(LocationQueryError::InvertedLongitude {
                left: self.left,
                right: self.right,
            });
        }
        Ok(())
    }
}

/// Parses `top,left,bottom,right`.
///
/// Only the syntax is checked here, see [BoundingBox::validate].
impl FromStr for BoundingBox {
    type Err = LocationQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LocationQueryError::MalformedBoundingBox(s.to_string());
        let edges = s
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        let [top, left, bottom, right] = edges[..] else {
            return Err(malformed());
        };
        Ok(BoundingBox {
            top,
            left,
            bottom,
            right,
        })
    }
}

impl From<BoundingBox> for GeoBoundingBox {
    fn from(bbox: BoundingBox) -> Self {
        GeoBoundingBox {
            top: bbox.top,
            left: bbox.left,
            bottom: bbox.bottom,
            right: bbox.right,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationQuery {
    pub city: Option<String>,
    pub states: BTreeSet<String>,
    pub bounding_box: Option<BoundingBox>,
}

impl LocationQuery {
    /// Trim the city and states and upper-case state codes.
    /// Blank entries are dropped.
    pub fn normalized(self) -> Self {
        let city = self
            .city
            .map(|city| city.trim().to_string())
            .filter(|city| !city.is_empty());
        let states = self
            .states
            .into_iter()
            .map(|state| state.trim().to_uppercase())
            .filter(|state| !state.is_empty())
            .collect();
        Self {
            city,
            states,
            bounding_box: self.bounding_box,
        }
    }

    /// Check the query and turn it into a request body.
    ///
    /// Nothing is sent for a query that fails validation.
    pub fn validate(&self) -> Result<LocationSearchRequest, LocationQueryError> {
        let query = self.clone().normalized();
        if query.city.is_none() && query.states.is_empty() && query.bounding_box.is_none() {
            return Err(LocationQueryError::Empty);
        }

        if let Some(state) = query
            .states
            .iter()
            .find(|state| state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(LocationQueryError::InvalidState(state.clone()));
        }

        if let Some(bbox) = &query.bounding_box {
            bbox.validate()?;
        }

        Ok(LocationSearchRequest {
            city: query.city,
            states: (!query.states.is_empty()).then(|| query.states.into_iter().collect()),
            geo_bounding_box: query.bounding_box.map(GeoBoundingBox::from),
            size: LOCATION_SEARCH_SIZE,
        })
    }
}
