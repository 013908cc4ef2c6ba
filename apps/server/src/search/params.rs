//! Search parameter parsing and normalization.
//!
//! Every parameter is optional and every malformed value normalizes to a
//! sensible default instead of rejecting the request: an unparseable page
//! becomes page 1, an unparseable latitude disables the proximity filter,
//! an unknown sort falls back to relevance.

/// Raw, normalized request parameters. Numeric fields hold whatever parsed
/// as a finite number; resolution against configured defaults happens in the
/// filter compiler.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Academy type; `None` means "all".
    pub kind: Option<String>,
    pub id: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    /// Rating bucket selector as supplied (0 = no constraint).
    pub min_rating: f64,
    pub min_fee: Option<f64>,
    pub max_fee: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub sort: SortMode,
    pub page: Option<f64>,
    pub limit: Option<f64>,
}

/// Requested result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Relevance,
    Distance,
    Newest,
    StartedNewest,
    StartedOldest,
    PriceLowHigh,
    PriceHighLow,
}

impl SortMode {
    /// Parse a sort value; unknown values mean relevance.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "distance" => Self::Distance,
            "newest" => Self::Newest,
            "started_newest" => Self::StartedNewest,
            "started_oldest" => Self::StartedOldest,
            "price_low_high" => Self::PriceLowHigh,
            "price_high_low" => Self::PriceHighLow,
            _ => Self::Relevance,
        }
    }

    pub fn is_fee_sort(self) -> bool {
        matches!(self, Self::PriceLowHigh | Self::PriceHighLow)
    }
}

impl SearchParams {
    /// Parse parameters from ordered (key, value) items as they appear in the
    /// query string. Later occurrences of a key win.
    pub fn from_items(items: &[(String, String)]) -> Self {
        let mut params = Self::default();

        for (key, value) in items {
            match key.as_str() {
                "q" => params.q = non_empty(value),
                "type" => {
                    params.kind = match value.trim() {
                        "" | "all" => None,
                        other => Some(other.to_string()),
                    }
                }
                "id" => params.id = non_empty(value),
                "state" => params.state = non_empty(value),
                "country" => params.country = non_empty(value),
                "minRating" => params.min_rating = parse_finite(value).unwrap_or(0.0),
                "minFee" => params.min_fee = parse_finite(value),
                "maxFee" => params.max_fee = parse_finite(value),
                "lat" => params.lat = parse_finite(value),
                "lng" => params.lng = parse_finite(value),
                "radiusKm" => params.radius_km = parse_finite(value),
                "sort" => params.sort = SortMode::parse(value),
                "page" => params.page = parse_finite(value),
                "limit" => params.limit = parse_finite(value),
                _ => {
                    // Unknown parameters are ignored, matching lenient
                    // query-string handling elsewhere in the API.
                }
            }
        }

        params
    }

    /// Whether the request asks for proximity handling: both coordinates must
    /// parse as finite numbers.
    pub fn has_geo(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_finite(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
