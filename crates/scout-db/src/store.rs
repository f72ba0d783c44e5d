use scout_core::AppError;
use scout_core::listing::{Listing, OpeningHours};
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};

/// PostgreSQL implementation of every Scout store trait.
///
/// The trait impls live next to their tables: `sessions`, `listings`,
/// `cache` and `search_log`.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn persistence(e: sqlx::Error) -> AppError {
    AppError::PersistenceError(e.to_string())
}

// -- Listing columns shared by raw_listings and processed_listings --

#[derive(sqlx::FromRow)]
pub(crate) struct ListingColumns {
    name: String,
    description: Option<String>,
    rating: Option<f64>,
    reviews: Option<i32>,
    category: Option<String>,
    website: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    opening_hours: Option<Json<OpeningHours>>,
    price_level: Option<String>,
    thumbnail: Option<String>,
    place_id: Option<String>,
}

impl From<ListingColumns> for Listing {
    fn from(row: ListingColumns) -> Self {
        Listing {
            name: row.name,
            description: row.description,
            rating: row.rating,
            reviews: row.reviews.map(|r| r.max(0) as u32),
            category: row.category,
            website: row.website,
            address: row.address,
            phone: row.phone,
            latitude: row.latitude,
            longitude: row.longitude,
            opening_hours: row.opening_hours.map(|Json(hours)| hours),
            price_level: row.price_level,
            thumbnail: row.thumbnail,
            place_id: row.place_id,
        }
    }
}

/// Column list matching [`ListingColumns`], for SELECTs.
pub(crate) const LISTING_SELECT: &str = "name, description, rating, reviews, category, website, \
     address, phone, latitude, longitude, opening_hours, price_level, thumbnail, place_id";
