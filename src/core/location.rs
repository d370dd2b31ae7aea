use geo::{HaversineDistance, Point};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::{ListingProfile, RenterProfile};

/// Named place with coordinates in degrees
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Case-insensitive lookup from neighborhood names to coordinates
///
/// Unknown names resolve to nothing; there is no default coordinate, so
/// unresolvable locations never look artificially close to each other.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: BTreeMap<String, Point<f64>>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_places(places: &[Place]) -> Self {
        let mut gazetteer = Self::new();
        for place in places {
            gazetteer.insert(&place.name, place.latitude, place.longitude);
        }
        gazetteer
    }

    pub fn with_place(mut self, name: &str, latitude: f64, longitude: f64) -> Self {
        self.insert(name, latitude, longitude);
        self
    }

    pub fn insert(&mut self, name: &str, latitude: f64, longitude: f64) {
        let key = name.trim().to_lowercase();
        if !key.is_empty() {
            self.places.insert(key, Point::new(longitude, latitude));
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Resolve a place name exactly (case-insensitive)
    pub fn locate(&self, name: &str) -> Option<Point<f64>> {
        self.places.get(&name.trim().to_lowercase()).copied()
    }

    /// Resolve free text such as an address: exact name first, then the
    /// longest known place name contained in the text
    pub fn locate_in_text(&self, text: &str) -> Option<Point<f64>> {
        if let Some(point) = self.locate(text) {
            return Some(point);
        }
        let text = text.to_lowercase();
        self.places
            .iter()
            .filter(|(name, _)| text.contains(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, point)| *point)
    }
}

/// Great-circle distance in kilometers
#[inline]
pub fn distance_km(a: Point<f64>, b: Point<f64>) -> f64 {
    a.haversine_distance(&b) / 1000.0
}

/// Best linear-decay proximity between any preferred location and the listing
///
/// Returns `1 - d / radius` for the closest resolvable preferred location
/// within `radius_km`, or 0 when nothing resolves or everything is too far.
pub fn proximity_score(
    gazetteer: &Gazetteer,
    preferred: impl IntoIterator<Item = impl AsRef<str>>,
    listing: &ListingProfile,
    radius_km: f64,
) -> f64 {
    if radius_km <= 0.0 {
        return 0.0;
    }

    let target = gazetteer.locate_in_text(&listing.location).or_else(|| {
        listing
            .neighborhood_type
            .as_deref()
            .and_then(|kind| gazetteer.locate(kind))
    });
    let Some(target) = target else {
        return 0.0;
    };

    preferred
        .into_iter()
        .filter_map(|name| gazetteer.locate(name.as_ref()))
        .map(|origin| distance_km(origin, target))
        .filter(|distance| *distance <= radius_km)
        .map(|distance| (1.0 - distance / radius_km).max(0.0))
        .fold(0.0, f64::max)
}

/// Location refinement signal for the blender
///
/// Geodesic proximity wins when it resolves to a positive score; otherwise
/// text containment (0.8), neighborhood-profile containment (0.7), else 0.3.
pub fn location_refinement(
    gazetteer: &Gazetteer,
    renter: &RenterProfile,
    listing: &ListingProfile,
    radius_km: f64,
) -> f64 {
    let listing_location = listing.location.trim().to_lowercase();
    if renter.locations.is_empty() || listing_location.is_empty() {
        return 0.5;
    }

    let geo_score = proximity_score(gazetteer, &renter.locations, listing, radius_km);
    if geo_score > 0.0 {
        return geo_score;
    }

    let preferred: Vec<String> = renter
        .locations
        .iter()
        .map(|loc| loc.trim().to_lowercase())
        .filter(|loc| !loc.is_empty())
        .collect();

    if preferred
        .iter()
        .any(|loc| listing_location.contains(loc.as_str()) || loc.contains(listing_location.as_str()))
    {
        return 0.8;
    }

    let in_profile = listing
        .neighborhood_profile
        .iter()
        .any(|tag| preferred.contains(&tag.trim().to_lowercase()));
    if in_profile {
        return 0.7;
    }

    0.3
}
