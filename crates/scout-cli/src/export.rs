//! Flat CSV projection of raw and processed listings.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use scout_core::listing::Listing;
use scout_core::models::{ProcessedListing, RawListing};

#[derive(Serialize)]
struct CsvRow<'a> {
    position: u32,
    name: &'a str,
    category: Option<&'a str>,
    address: Option<&'a str>,
    phone: Option<&'a str>,
    website: Option<&'a str>,
    website_status_code: Option<u16>,
    rating: Option<f64>,
    reviews: Option<u32>,
    price_level: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    opening_hours: Option<String>,
    place_id: Option<&'a str>,
}

impl<'a> CsvRow<'a> {
    fn new(position: u32, listing: &'a Listing, website_status_code: Option<u16>) -> Self {
        Self {
            position,
            name: &listing.name,
            category: listing.category.as_deref(),
            address: listing.address.as_deref(),
            phone: listing.phone.as_deref(),
            website: listing.website.as_deref(),
            website_status_code,
            rating: listing.rating,
            reviews: listing.reviews,
            price_level: listing.price_level.as_deref(),
            latitude: listing.latitude,
            longitude: listing.longitude,
            opening_hours: listing
                .opening_hours
                .as_ref()
                .and_then(|hours| serde_json::to_string(hours).ok()),
            place_id: listing.place_id.as_deref(),
        }
    }
}

pub fn write_raw<W: Write>(out: W, listings: &[RawListing]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for raw in listings {
        writer.serialize(CsvRow::new(raw.position, &raw.listing, None))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_processed<W: Write>(out: W, listings: &[ProcessedListing]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for processed in listings {
        writer.serialize(CsvRow::new(
            processed.position,
            &processed.listing,
            processed.website_status_code,
        ))?;
    }
    writer.flush()?;
    Ok(())
}
