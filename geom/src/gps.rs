use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bounds, Pt2D};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// longitude is x, latitude is y
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> LonLat {
        LonLat {
            longitude: lon,
            latitude: lat,
        }
    }
}

impl fmt::Display for LonLat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LonLat({0}, {1})", self.longitude, self.latitude)
    }
}

/// The geographic extent of a map. Converts between GPS and world-space using an equirectangular
/// projection anchored at the northwest corner, so y grows southward like screen space.
/// `scale` is world-space units per meter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GPSBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
    pub scale: f64,
}

impl GPSBounds {
    pub fn new(min: LonLat, max: LonLat, scale: f64) -> GPSBounds {
        GPSBounds {
            min_lon: min.longitude,
            min_lat: min.latitude,
            max_lon: max.longitude,
            max_lat: max.latitude,
            scale,
        }
    }

    pub fn contains(&self, pt: LonLat) -> bool {
        pt.longitude >= self.min_lon
            && pt.longitude <= self.max_lon
            && pt.latitude >= self.min_lat
            && pt.latitude <= self.max_lat
    }

    fn meters_per_degree_lon(&self) -> f64 {
        let mid_lat = (self.min_lat + self.max_lat) / 2.0;
        METERS_PER_DEGREE_LAT * mid_lat.to_radians().cos()
    }

    pub fn convert(&self, pt: LonLat) -> Pt2D {
        let x = (pt.longitude - self.min_lon) * self.meters_per_degree_lon();
        let y = (self.max_lat - pt.latitude) * METERS_PER_DEGREE_LAT;
        Pt2D::new(x * self.scale, y * self.scale)
    }

    pub fn convert_back(&self, pt: Pt2D) -> LonLat {
        let lon = self.min_lon + pt.x() / self.scale / self.meters_per_degree_lon();
        let lat = self.max_lat - pt.y() / self.scale / METERS_PER_DEGREE_LAT;
        LonLat::new(lon, lat)
    }

    /// The world-space bounds covered.
    pub fn to_bounds(&self) -> Bounds {
        Bounds::from(&[
            self.convert(LonLat::new(self.min_lon, self.max_lat)),
            self.convert(LonLat::new(self.max_lon, self.min_lat)),
        ])
    }
}
