//! Turning a user-supplied location string into concrete coordinates.
//!
//! Two forms are accepted: `"lat,lon"` for a single point, and
//! `"lat1,lon1:lat2,lon2"` (top-left:bottom-right) for a bounding box that
//! is expanded into a grid of sample points.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GridMethod {
    Hex,
    Square,
}

#[derive(thiserror::Error, Debug)]
pub enum LocationError {
    #[error(
        "location parameter {0:?} seems malformed. Please use \"latitude,longitude\" or \
         \"top-left-latitude,top-left-longitude:bottom-right-latitude,bottom-right-longitude\""
    )]
    Malformed(String),
}

/// Parse a location string into an ordered list of coordinates.
///
/// `num_cells` and `method` only matter for the bounding-box form, where
/// they control how many sample points the box is split into and how the
/// points are laid out.
pub fn parse_locations(
    location: &str,
    num_cells: usize,
    method: GridMethod,
) -> Result<Vec<LatLng>, LocationError> {
    let malformed = || LocationError::Malformed(location.to_string());

    let parts: Vec<&str> = location.split(':').collect();
    match parts.as_slice() {
        [point] => Ok(vec![parse_point(point).ok_or_else(malformed)?]),
        [top_left, bottom_right] => {
            let top_left = parse_point(top_left).ok_or_else(malformed)?;
            let bottom_right = parse_point(bottom_right).ok_or_else(malformed)?;
            let (num_lat, num_lng) = get_cell_nums(top_left, bottom_right, num_cells);
            let grid = LatLngGrid {
                top_left,
                bottom_right,
                num_cells_lat: num_lat,
                num_cells_lng: num_lng,
            };
            Ok(grid.locations(method))
        }
        _ => Err(malformed()),
    }
}

fn parse_point(part: &str) -> Option<LatLng> {
    let mut pieces = part.split(',');
    let lat = pieces.next()?.trim().parse::<f64>().ok()?;
    let lng = pieces.next()?.trim().parse::<f64>().ok()?;
    if pieces.next().is_some() {
        return None;
    }
    Some(LatLng::new(lat, lng))
}

/// Split `num_cells` over the two axes proportionally to the box's aspect
/// ratio, so cells come out roughly square (in degrees). Both counts are at
/// least 1.
pub fn get_cell_nums(top_left: LatLng, bottom_right: LatLng, num_cells: usize) -> (usize, usize) {
    let lat_extent = (top_left.lat - bottom_right.lat).abs();
    let lng_extent = (bottom_right.lng - top_left.lng).abs();
    let n = num_cells.max(1) as f64;

    if lat_extent <= f64::EPSILON || lng_extent <= f64::EPSILON {
        // Degenerate box: put all cells along the non-zero axis
        return if lat_extent <= f64::EPSILON {
            (1, num_cells.max(1))
        } else {
            (num_cells.max(1), 1)
        };
    }

    let ratio = lat_extent / lng_extent;
    let num_lat = ((n * ratio).sqrt().round() as usize).max(1);
    let num_lng = ((n / ratio).sqrt().round() as usize).max(1);
    (num_lat, num_lng)
}

/// A regular grid of sample points spanning a bounding box.
///
/// Cell-count contract:
/// - `square` yields exactly `num_cells_lat * num_cells_lng` points
///   (one per cell center, row-major from the top-left).
/// - `hex` staggers every other row by half a cell and gives those rows
///   one extra point, yielding
///   `num_cells_lat * num_cells_lng + num_cells_lat / 2` points.
#[derive(Debug, Clone)]
pub struct LatLngGrid {
    pub top_left: LatLng,
    pub bottom_right: LatLng,
    pub num_cells_lat: usize,
    pub num_cells_lng: usize,
}

impl LatLngGrid {
    pub fn locations(&self, method: GridMethod) -> Vec<LatLng> {
        match method {
            GridMethod::Square => self.square_locations(),
            GridMethod::Hex => self.hex_locations(),
        }
    }

    fn cell_size(&self) -> (f64, f64) {
        let d_lat = (self.bottom_right.lat - self.top_left.lat) / self.num_cells_lat as f64;
        let d_lng = (self.bottom_right.lng - self.top_left.lng) / self.num_cells_lng as f64;
        (d_lat, d_lng)
    }

    fn square_locations(&self) -> Vec<LatLng> {
        let (d_lat, d_lng) = self.cell_size();
        let mut locations = Vec::with_capacity(self.num_cells_lat * self.num_cells_lng);
        for i in 0..self.num_cells_lat {
            let lat = self.top_left.lat + (i as f64 + 0.5) * d_lat;
            for j in 0..self.num_cells_lng {
                let lng = self.top_left.lng + (j as f64 + 0.5) * d_lng;
                locations.push(LatLng::new(lat, lng));
            }
        }
        locations
    }

    fn hex_locations(&self) -> Vec<LatLng> {
        let (d_lat, d_lng) = self.cell_size();
        let mut locations = Vec::new();
        for i in 0..self.num_cells_lat {
            let lat = self.top_left.lat + (i as f64 + 0.5) * d_lat;
            if i % 2 == 0 {
                for j in 0..self.num_cells_lng {
                    let lng = self.top_left.lng + (j as f64 + 0.5) * d_lng;
                    locations.push(LatLng::new(lat, lng));
                }
            } else {
                // Offset rows sit on the cell boundaries and carry one
                // extra point, covering both box edges
                for j in 0..=self.num_cells_lng {
                    let lng = self.top_left.lng + j as f64 * d_lng;
                    locations.push(LatLng::new(lat, lng));
                }
            }
        }
        locations
    }
}
