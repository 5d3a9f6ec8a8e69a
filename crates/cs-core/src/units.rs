// cs-core/src/units.rs

use uom::si::f64::Time as UomTime;

/// Canonical time quantity (SI, f64).
pub type Time = UomTime;

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn days(v: f64) -> Time {
    use uom::si::time::day;
    Time::new::<day>(v)
}

/// Calendar years of [`constants::DAYS_PER_YEAR`] days, not uom's 365-day year.
#[inline]
pub fn years(v: f64) -> Time {
    s(v * constants::SECONDS_PER_YEAR)
}

#[inline]
pub fn as_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

pub mod constants {
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Tropical year.
    pub const DAYS_PER_YEAR: f64 = 365.2422;
    pub const SECONDS_PER_YEAR: f64 = SECONDS_PER_DAY * DAYS_PER_YEAR;
}
