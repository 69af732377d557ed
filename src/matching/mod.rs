//! Donor Matching
//!
//! Pure functions behind donor search: great-circle distance, the ABO/Rh
//! transfusion-compatibility table, and distance-ranked candidate paging.

use serde::Serialize;

use crate::types::blood::{BloodType, NeededBloodType};
use crate::types::geo::Coordinates;
use crate::types::pagination::Pagination;
use crate::types::user::{User, UserResponse};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, standard haversine.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Donor blood types safe to transfuse to the given recipient type.
///
/// Standard ABO/Rh compatibility. `Any` (which also covers unrecognized
/// input) matches every group.
pub fn compatible_donors(recipient: NeededBloodType) -> &'static [BloodType] {
    use BloodType::*;

    match recipient {
        NeededBloodType::Specific(APos) => &[APos, ANeg, OPos, ONeg],
        NeededBloodType::Specific(ANeg) => &[ANeg, ONeg],
        NeededBloodType::Specific(BPos) => &[BPos, BNeg, OPos, ONeg],
        NeededBloodType::Specific(BNeg) => &[BNeg, ONeg],
        NeededBloodType::Specific(AbPos) => &BloodType::ALL,
        NeededBloodType::Specific(AbNeg) => &[ANeg, BNeg, AbNeg, ONeg],
        NeededBloodType::Specific(OPos) => &[OPos, ONeg],
        NeededBloodType::Specific(ONeg) => &[ONeg],
        NeededBloodType::Specific(Unknown) | NeededBloodType::Any => &BloodType::ALL,
    }
}

/// A candidate donor with their computed distance to the search origin.
#[derive(Debug, Clone, Serialize)]
pub struct RankedDonor {
    #[serde(flatten)]
    pub donor: UserResponse,
    pub distance_km: f64,
}

/// A distance-ordered page of donors.
#[derive(Debug, Clone, Serialize)]
pub struct RankedDonors {
    pub data: Vec<RankedDonor>,
    pub pagination: Pagination,
}

/// Rank candidate donors by distance from `origin` and slice out the
/// requested page.
///
/// Candidates without a location are discarded. The total and page count
/// describe the ranked set, and an empty set still reports one page.
pub fn rank_donors(
    origin: Coordinates,
    candidates: Vec<User>,
    page: u32,
    limit: u32,
) -> RankedDonors {
    let mut ranked: Vec<RankedDonor> = candidates
        .iter()
        .filter_map(|donor| {
            donor.location.map(|location| RankedDonor {
                donor: donor.into(),
                distance_km: haversine_km(origin, location),
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total = ranked.len() as u64;
    let page = page.max(1);
    let limit = limit.max(1);
    let offset = (page as usize - 1).saturating_mul(limit as usize);

    let data: Vec<RankedDonor> = ranked
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect();

    RankedDonors {
        data,
        pagination: Pagination::new(page, limit, total),
    }
}
