use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Booking state of a parking space.
/// Anything the API reports other than the two known states is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpaceStatus {
    Available,
    Booked,
    Other(String),
}

impl SpaceStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, SpaceStatus::Available)
    }
}

impl From<String> for SpaceStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Available" => SpaceStatus::Available,
            "Booked" => SpaceStatus::Booked,
            _ => SpaceStatus::Other(s),
        }
    }
}

impl From<SpaceStatus> for String {
    fn from(status: SpaceStatus) -> Self {
        match status {
            SpaceStatus::Available => "Available".to_string(),
            SpaceStatus::Booked => "Booked".to_string(),
            SpaceStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpaceStatus::Available => f.write_str("Available"),
            SpaceStatus::Booked => f.write_str("Booked"),
            SpaceStatus::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: i64,
    /// Label shown on the lot grid; booking and status updates address this number
    #[serde(rename = "spaceNumber", default, skip_serializing_if = "Option::is_none")]
    pub space_number: Option<i64>,
    pub status: SpaceStatus,
    /// Remaining fields are passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParkingSpace {
    /// Space number, falling back to the record id when the API omits it
    pub fn number(&self) -> i64 {
        self.space_number.unwrap_or(self.id)
    }
}

/// `PATCH /parkinglots/spaces/:spaceNumber`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceStatusUpdate {
    pub status: SpaceStatus,
}

/// Counts shown above the lot grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LotSummary {
    pub available: usize,
    pub booked: usize,
}

impl LotSummary {
    pub fn from_spaces(spaces: &[ParkingSpace]) -> Self {
        let available = spaces.iter().filter(|s| s.status.is_available()).count();
        Self {
            available,
            booked: spaces.len() - available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_space_deserialize_keeps_extra_fields() {
        let space: ParkingSpace =
            serde_json::from_value(json!({"id": 3, "status": "Available", "level": "B1"})).unwrap();
        assert_eq!(space.id, 3);
        assert_eq!(space.number(), 3);
        assert!(space.status.is_available());
        assert_eq!(space.extra["level"], "B1");
    }

    #[test]
    fn test_space_number_is_distinct_from_id() {
        let space: ParkingSpace =
            serde_json::from_value(json!({"id": 3, "spaceNumber": 12, "status": "Booked"}))
                .unwrap();
        assert_eq!(space.id, 3);
        assert_eq!(space.number(), 12);
        assert_eq!(serde_json::to_value(&space).unwrap()["spaceNumber"], 12);
    }

    #[test]
    fn test_unknown_status_round_trips_verbatim() {
        let space: ParkingSpace =
            serde_json::from_value(json!({"id": 9, "status": "Maintenance"})).unwrap();
        assert_eq!(space.status, SpaceStatus::Other("Maintenance".to_string()));
        assert_eq!(serde_json::to_value(&space).unwrap()["status"], "Maintenance");
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_value(SpaceStatusUpdate {
            status: SpaceStatus::Booked,
        })
        .unwrap();
        assert_eq!(body, json!({"status": "Booked"}));
    }

    #[test]
    fn test_lot_summary_counts_non_available_as_booked() {
        let spaces: Vec<ParkingSpace> = serde_json::from_value(json!([
            {"id": 1, "status": "Available"},
            {"id": 2, "status": "Booked"},
            {"id": 3, "status": "Maintenance"},
            {"id": 4, "status": "Available"}
        ]))
        .unwrap();

        assert_eq!(
            LotSummary::from_spaces(&spaces),
            LotSummary {
                available: 2,
                booked: 2
            }
        );
    }
}
