//! Route requests and the access/egress legs they carry.

use serde::{Deserialize, Serialize};

use crate::domain::{Cost, StopIndex, Time};

use super::direction::SearchDirection;
use super::search::SearchError;

/// Window during which an access or egress leg may be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: Time,
    pub close: Time,
}

/// A pre-computed street leg between the origin or destination and a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEgress {
    pub stop: StopIndex,
    pub duration_secs: i32,

    /// Generalized cost of the leg in centi-seconds. When absent the cost is
    /// derived from the duration and the walk reluctance.
    #[serde(default)]
    pub cost: Option<Cost>,

    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

impl AccessEgress {
    pub fn new(stop: StopIndex, duration_secs: i32) -> Self {
        Self {
            stop,
            duration_secs,
            cost: None,
            opening_hours: None,
        }
    }

    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_opening_hours(mut self, hours: OpeningHours) -> Self {
        self.opening_hours = Some(hours);
        self
    }

    /// Earliest time at or after `time` the leg can be started.
    pub fn earliest_departure_time(&self, time: Time) -> Option<Time> {
        match self.opening_hours {
            None => Some(time),
            Some(hours) if time > hours.close => None,
            Some(hours) => Some(time.max(hours.open)),
        }
    }

    /// Latest time at or before `time` the leg can be started.
    pub fn latest_departure_time(&self, time: Time) -> Option<Time> {
        match self.opening_hours {
            None => Some(time),
            Some(hours) if time < hours.open => None,
            Some(hours) => Some(time.min(hours.close)),
        }
    }
}

/// A request to route between an origin and a destination.
///
/// The origin and destination are represented only by their access and
/// egress legs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    pub access: Vec<AccessEgress>,
    pub egress: Vec<AccessEgress>,

    /// Earliest departure for depart-at, latest arrival for arrive-by.
    pub time: Time,

    #[serde(default)]
    pub direction: SearchDirection,

    /// Overrides the configured search window (minutes).
    #[serde(default)]
    pub search_window_mins: Option<i64>,
}

impl RouteRequest {
    /// Create a depart-at request.
    pub fn depart_at(access: Vec<AccessEgress>, egress: Vec<AccessEgress>, time: Time) -> Self {
        Self {
            access,
            egress,
            time,
            direction: SearchDirection::DepartAt,
            search_window_mins: None,
        }
    }

    /// Create an arrive-by request.
    pub fn arrive_by(access: Vec<AccessEgress>, egress: Vec<AccessEgress>, time: Time) -> Self {
        Self {
            direction: SearchDirection::ArriveBy,
            ..Self::depart_at(access, egress, time)
        }
    }

    pub fn with_search_window_mins(mut self, mins: i64) -> Self {
        self.search_window_mins = Some(mins);
        self
    }

    /// Validate the request against a network with `stop_count` stops.
    pub fn validate(&self, stop_count: usize) -> Result<(), SearchError> {
        if self.access.is_empty() {
            return Err(SearchError::InvalidRequest("no access legs".to_string()));
        }
        if self.egress.is_empty() {
            return Err(SearchError::InvalidRequest("no egress legs".to_string()));
        }

        for leg in self.access.iter().chain(&self.egress) {
            if leg.stop.0 >= stop_count {
                return Err(SearchError::InvalidRequest(format!(
                    "stop {} is out of range",
                    leg.stop
                )));
            }
            if leg.duration_secs < 0 {
                return Err(SearchError::InvalidRequest(format!(
                    "leg to stop {} has a negative duration",
                    leg.stop
                )));
            }
            if leg.cost.is_some_and(|c| c < 0) {
                return Err(SearchError::InvalidRequest(format!(
                    "leg to stop {} has a negative cost",
                    leg.stop
                )));
            }
        }

        if self.search_window_mins.is_some_and(|w| w < 0) {
            return Err(SearchError::InvalidRequest(
                "search window is negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Legs the search starts from: access for depart-at, egress for arrive-by.
    pub(crate) fn search_access(&self) -> &[AccessEgress] {
        match self.direction {
            SearchDirection::DepartAt => &self.access,
            SearchDirection::ArriveBy => &self.egress,
        }
    }

    /// Legs the search finishes with.
    pub(crate) fn search_egress(&self) -> &[AccessEgress] {
        match self.direction {
            SearchDirection::DepartAt => &self.egress,
            SearchDirection::ArriveBy => &self.access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: i32) -> Time {
        Time::from_seconds(s)
    }

    fn leg(stop: usize) -> AccessEgress {
        AccessEgress::new(StopIndex(stop), 60)
    }

    #[test]
    fn opening_hours() {
        let l = leg(0).with_opening_hours(OpeningHours {
            open: t(100),
            close: t(200),
        });
        assert_eq!(l.earliest_departure_time(t(50)), Some(t(100)));
        assert_eq!(l.earliest_departure_time(t(150)), Some(t(150)));
        assert_eq!(l.earliest_departure_time(t(201)), None);
        assert_eq!(l.latest_departure_time(t(250)), Some(t(200)));
        assert_eq!(l.latest_departure_time(t(99)), None);

        let open = leg(0);
        assert_eq!(open.earliest_departure_time(t(5)), Some(t(5)));
        assert_eq!(open.latest_departure_time(t(5)), Some(t(5)));
    }

    #[test]
    fn validate_rejects_missing_legs() {
        let req = RouteRequest::depart_at(vec![], vec![leg(1)], t(0));
        assert!(matches!(req.validate(3), Err(SearchError::InvalidRequest(_))));

        let req = RouteRequest::depart_at(vec![leg(0)], vec![], t(0));
        assert!(matches!(req.validate(3), Err(SearchError::InvalidRequest(_))));
    }

    #[test]
    fn validate_rejects_bad_legs() {
        let req = RouteRequest::depart_at(vec![leg(0)], vec![leg(7)], t(0));
        assert!(req.validate(3).is_err());

        let req = RouteRequest::depart_at(vec![AccessEgress::new(StopIndex(0), -5)], vec![leg(1)], t(0));
        assert!(req.validate(3).is_err());

        let req = RouteRequest::depart_at(vec![leg(0).with_cost(-1)], vec![leg(1)], t(0));
        assert!(req.validate(3).is_err());

        let req = RouteRequest::depart_at(vec![leg(0)], vec![leg(1)], t(0)).with_search_window_mins(-1);
        assert!(req.validate(3).is_err());

        let req = RouteRequest::depart_at(vec![leg(0)], vec![leg(1)], t(0));
        assert!(req.validate(3).is_ok());
    }

    #[test]
    fn search_legs_follow_direction() {
        let req = RouteRequest::arrive_by(vec![leg(0)], vec![leg(1)], t(0));
        assert_eq!(req.search_access()[0].stop, StopIndex(1));
        assert_eq!(req.search_egress()[0].stop, StopIndex(0));
    }

    #[test]
    fn request_from_json() {
        let req: RouteRequest = serde_json::from_str(
            r#"{"access": [{"stop": 0, "duration_secs": 30}],
                "egress": [{"stop": 2, "duration_secs": 0, "cost": 500}],
                "time": "08:00:00", "direction": "arrive_by"}"#,
        )
        .unwrap();
        assert_eq!(req.direction, SearchDirection::ArriveBy);
        assert_eq!(req.time, Time::from_hms(8, 0, 0));
        assert_eq!(req.egress[0].cost, Some(500));
    }
}
