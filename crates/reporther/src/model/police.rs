use serde::{Deserialize, Serialize};

id_type!(DepartmentId, "department");

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle (haversine) distance in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliceDepartment {
    pub id: DepartmentId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Coordinates,
}

/// Payload for creating or replacing a police department (admin only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliceDepartmentDraft {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Coordinates,
}

impl PoliceDepartmentDraft {
    pub fn into_department(self, id: DepartmentId) -> PoliceDepartment {
        PoliceDepartment {
            id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            location: self.location,
        }
    }
}

/// A department together with its distance from the searched point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyDepartment {
    pub department: PoliceDepartment,
    pub distance_km: f64,
}

/// An address suggestion returned by address search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressMatch {
    pub address: String,
    pub location: Coordinates,
}
