use crate::error::GeoError;

pub const MAX_PITCH: f64 = 85.0;
pub const DEFAULT_FLY_DURATION_MS: u32 = 1500;

/// A picked point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// `[lng, lat]`, the order map libraries expect.
    pub fn lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub center: Location,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl CameraState {
    /// Clamps zoom and pitch into range and wraps bearing into `[0, 360)`.
    pub fn new(center: Location, zoom: f64, pitch: f64, bearing: f64) -> Self {
        let zoom = if zoom.is_finite() { zoom.max(0.0) } else { 0.0 };
        let pitch = if pitch.is_finite() {
            pitch.clamp(0.0, MAX_PITCH)
        } else {
            0.0
        };
        let bearing = if bearing.is_finite() {
            bearing.rem_euclid(360.0)
        } else {
            0.0
        };
        Self {
            center,
            zoom,
            pitch,
            bearing,
        }
    }

    pub fn with_center(self, center: Location) -> Self {
        Self { center, ..self }
    }
}

/// How a camera change reaches the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMove {
    Jump,
    Fly { duration_ms: u32 },
}

impl CameraMove {
    pub fn fly() -> Self {
        Self::Fly {
            duration_ms: DEFAULT_FLY_DURATION_MS,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Fly { duration_ms } if *duration_ms > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            Location::new(91.0, 0.0),
            Err(GeoError::InvalidLatitude(91.0))
        );
        assert_eq!(
            Location::new(0.0, -180.5),
            Err(GeoError::InvalidLongitude(-180.5))
        );
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn lng_lat_order() {
        let loc = Location::new(35.9078, 74.3441).unwrap();
        assert_eq!(loc.lng_lat(), [74.3441, 35.9078]);
    }

    #[test]
    fn camera_normalizes_ranges() {
        let center = Location::new(30.0, 69.0).unwrap();
        let cam = CameraState::new(center, -2.0, 120.0, -90.0);
        assert_eq!(cam.zoom, 0.0);
        assert_eq!(cam.pitch, MAX_PITCH);
        assert_eq!(cam.bearing, 270.0);

        let cam = CameraState::new(center, 12.0, 60.0, 360.0);
        assert_eq!(cam.bearing, 0.0);
    }

    #[test]
    fn zero_duration_fly_is_not_animated() {
        assert!(CameraMove::fly().is_animated());
        assert!(!CameraMove::Fly { duration_ms: 0 }.is_animated());
        assert!(!CameraMove::Jump.is_animated());
    }
}
