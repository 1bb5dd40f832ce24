/// Mean Earth radius (IUGG), in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Minimum timestep count to run per-timestep detection on the Rayon pool.
pub const PARALLEL_TIMESTEP_THRESHOLD: usize = 8;

/// Number of histogram bins for automatic (Otsu / Yen) thresholding.
pub const THRESHOLD_HISTOGRAM_BINS: usize = 256;

/// Default fixed OLR threshold, in W m^-2. Pixels strictly below are cloud.
pub const DEFAULT_OLR_THRESHOLD: f32 = 230.0;

/// Default minimum blob area, in km^2, for a blob to become a candidate.
pub const DEFAULT_AREA_THRESHOLD_KM2: f64 = 500_000.0;

/// Default lower bound of the hemisphere-referenced orientation, in degrees.
pub const DEFAULT_ANGLE_MIN: f64 = -80.0;

/// Default upper bound of the hemisphere-referenced orientation, in degrees.
pub const DEFAULT_ANGLE_MAX: f64 = -10.0;

/// Default latitude (degrees) the band must reach on its equatorward side.
pub const DEFAULT_TOP_LATITUDE: f64 = -15.0;

/// Default latitude (degrees) the band must reach on its poleward side.
pub const DEFAULT_BOTTOM_LATITUDE: f64 = -30.0;

/// Default minimum overlap fraction for parent/child linking (10%).
pub const DEFAULT_OVERLAP_FRACTION: f64 = 0.1;

/// A band whose easternmost pixel, wrapped to [0, 360), lies beyond this
/// longitude while its westernmost sits on 0 degrees crosses the antimeridian seam.
pub const ANTIMERIDIAN_SPAN_LON: f64 = 250.0;

/// Seconds per hour, used to turn hourly accumulated flux (J m^-2) into W m^-2.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Detection periods (hours) accepted by date ranges and temporal averaging.
pub const SUPPORTED_PERIODS_HOURS: [u32; 5] = [1, 3, 6, 12, 24];

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-10;
