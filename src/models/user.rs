use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleEntry {
    pub registration: String,
    pub plate_number: String,
}

/// User record as edited in the user-management screen, payment details included
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagedUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
    pub card_number: String,
    pub expiration_date: String,
    pub cvv: String,
    pub billing_address: String,
    pub driver_license: String,
    pub driver_license_expiration: String,
    pub insurance: String,
    pub number_of_vehicles: usize,
    pub vehicles: Vec<VehicleEntry>,
}

impl ManagedUser {
    /// Resize the vehicle list to `count` blank entries
    pub fn set_vehicle_count(&mut self, count: usize) {
        self.number_of_vehicles = count;
        self.vehicles = vec![VehicleEntry::default(); count];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_vehicle_count() {
        let mut user = ManagedUser::default();
        user.set_vehicle_count(2);
        assert_eq!(user.number_of_vehicles, 2);
        assert_eq!(user.vehicles.len(), 2);
        user.set_vehicle_count(0);
        assert!(user.vehicles.is_empty());
    }

    #[test]
    fn test_wire_names_and_optional_fields() {
        let user = ManagedUser {
            first_name: "Grace".to_string(),
            ..Default::default()
        };
        let body = serde_json::to_value(&user).unwrap();
        assert_eq!(body["firstName"], "Grace");
        assert!(body.get("id").is_none());
        assert!(body.get("password").is_none());
        assert!(body.get("driverLicenseExpiration").is_some());

        let parsed: ManagedUser =
            serde_json::from_str(r#"{"id": 4, "email": "g@h.io"}"#).unwrap();
        assert_eq!(parsed.id, Some(4));
        assert_eq!(parsed.email, "g@h.io");
    }
}
