//! CSV export and bulk import of property listings.

use axum::{body::Body, extract::Multipart, http::HeaderMap};
use mysql::prelude::Queryable;
use serde_json::json;

use super::{data::*, insert_property, operator_with};
use crate::{
    commit_or_rollback,
    database::get_conn,
    libs::{gen_id, parse_multipart},
    perm::action::PropertyGroup,
    response::BodyFile,
    Response, ResponseResult,
};

/// Rows read from an import file; the rest is ignored.
pub const IMPORT_LIMIT: usize = 1000;
const EXPORT_CHUNK_ROWS: usize = 200;

pub static EXPORT_HEADER: [&str; 5] = ["Address", "Type", "Location", "Price", "Status"];

fn format_price(price: Option<f64>) -> String {
    price.map(|p| format!("{p:.2}")).unwrap_or_default()
}

/// Encode listings as CSV, split into chunks of at most `rows_per_chunk` rows.
/// The first chunk carries the header.
pub fn export_chunks(
    properties: &[PropertyListing],
    rows_per_chunk: usize,
) -> Result<Vec<Vec<u8>>, csv::Error> {
    let mut chunks = properties
        .chunks(rows_per_chunk.max(1))
        .enumerate()
        .map(|(i, batch)| encode(batch, i == 0))
        .collect::<Result<Vec<_>, _>>()?;
    if chunks.is_empty() {
        chunks.push(encode(&[], true)?);
    }
    Ok(chunks)
}

fn encode(batch: &[PropertyListing], with_header: bool) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if with_header {
        writer.write_record(EXPORT_HEADER)?;
    }
    for p in batch {
        writer.write_record([
            p.address.as_str(),
            p.property_type.as_str(),
            p.location.as_str(),
            format_price(p.price).as_str(),
            p.status.as_str(),
        ])?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

pub async fn export_properties(headers: HeaderMap) -> Result<BodyFile, Response> {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::EXPORT)?;
    let properties: Vec<PropertyListing> = conn.query(format!(
        "SELECT {PROPERTY_FIELDS} FROM property_listing ORDER BY location, address, id"
    ))?;
    let chunks = export_chunks(&properties, EXPORT_CHUNK_ROWS)?;
    tracing::info!(operator = %operator.id(), rows = properties.len(), "properties exported");
    Ok(BodyFile::attachment(
        csv_body(chunks),
        mime::TEXT_CSV_UTF_8,
        "properties.csv",
    ))
}

fn csv_body(chunks: Vec<Vec<u8>>) -> Body {
    Body::from_stream(tokio_stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>)))
}

/// One row of the listing spreadsheet.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ImportRow {
    #[serde(rename = "Type of Property")]
    property_type: String,
    #[serde(rename = "Area Name")]
    area_name: String,
    #[serde(rename = "Location")]
    location: String,
    floors: String,
    #[serde(rename = "Covered Area")]
    covered_area: String,
    #[serde(rename = "Electricity Status")]
    electricity_status: String,
    #[serde(rename = "Bathroom")]
    bathroom: String,
    bedroom: String,
    #[serde(rename = "Booking Amount")]
    booking_amount: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Possession Status")]
    possession_status: String,
}

/// Spreadsheet amount: placeholders and junk read as 0, thousands
/// separators are dropped.
pub fn lenient_decimal(value: &str) -> f64 {
    if matches!(value, "N/A" | "" | "NA" | "n/a" | "None") {
        return 0.0;
    }
    value
        .replace(',', "")
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Whole-number column; anything but plain digits reads as 0.
fn count(value: &str) -> u32 {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return 0;
    }
    value.parse().unwrap_or(0)
}

fn truncate(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}

impl ImportRow {
    fn into_listing(self) -> PropertyListing {
        // possession states other than the listing statuses mean nothing was sold
        let status = match self.possession_status.parse::<PropertyStatus>() {
            Ok(PropertyStatus::UnderContract) => PropertyStatus::UnderContract,
            _ => PropertyStatus::Available,
        };
        PropertyListing {
            id: gen_id(),
            property_type: truncate(&self.property_type, 30),
            location: truncate(&self.area_name, 30),
            address: truncate(&self.location, 100),
            floors: count(&self.floors),
            covered_area: truncate(&self.covered_area, 30),
            electricity_status: truncate(&self.electricity_status, 30),
            bathroom_count: count(&self.bathroom),
            bedroom_count: count(&self.bedroom),
            booking_amount: Some(lenient_decimal(&self.booking_amount)),
            price: Some(lenient_decimal(&self.price)),
            status,
            image: None,
        }
    }
}

/// Parse up to [`IMPORT_LIMIT`] listings from CSV bytes.
pub fn parse_import(bytes: &[u8]) -> Result<Vec<PropertyListing>, csv::Error> {
    let mut reader = csv::Reader::from_reader(bytes);
    reader
        .deserialize::<ImportRow>()
        .take(IMPORT_LIMIT)
        .map(|row| row.map(ImportRow::into_listing))
        .collect()
}

fn __import(conn: &mut mysql::PooledConn, listings: &[PropertyListing]) -> Result<(), Response> {
    for listing in listings {
        insert_property(conn, listing)?;
    }
    Ok(())
}

pub async fn import_properties(headers: HeaderMap, part: Multipart) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::IMPORT)?;
    let part = parse_multipart(part).await?;
    let file = op::some!(part.files.iter().find(|f| !f.is_empty());
        ret Err(Response::invalid_value("a CSV file is required")));
    let listings = parse_import(&file.bytes)?;
    commit_or_rollback!(__import, &mut conn, &listings)?;
    tracing::info!(operator = %operator.id(), rows = listings.len(), "properties imported");
    Ok(Response::ok(json!({ "imported": listings.len() })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_and_junk_read_as_zero() {
        for v in ["N/A", "", "NA", "n/a", "None", "call us", "NaN"] {
            assert_eq!(lenient_decimal(v), 0.0, "{v}");
        }
        assert_eq!(lenient_decimal(" 1,250,000.50 "), 1_250_000.5);
        assert_eq!(lenient_decimal("42"), 42.0);
    }

    #[test]
    fn import_maps_spreadsheet_columns() {
        let csv = "Type of Property,Area Name,Location,floors,Covered Area,Electricity Status,Bathroom,bedroom,Booking Amount,Price,Possession Status\n\
                   Flat,DHA Phase 5,\"12 Street, Block C\",3,5 Marla,Yes,2,x,N/A,\"4,500,000\",Ready to Move\n\
                   House,Bahria,Precinct 1,,10 Marla,No,3,4,100000,n/a,Under Contract\n";
        let listings = parse_import(csv.as_bytes()).unwrap();
        assert_eq!(listings.len(), 2);
        let flat = &listings[0];
        assert_eq!(flat.property_type, "Flat");
        assert_eq!(flat.location, "DHA Phase 5");
        assert_eq!(flat.address, "12 Street, Block C");
        assert_eq!(flat.floors, 3);
        assert_eq!(flat.bedroom_count, 0);
        assert_eq!(flat.booking_amount, Some(0.0));
        assert_eq!(flat.price, Some(4_500_000.0));
        assert_eq!(flat.status, PropertyStatus::Available);
        let house = &listings[1];
        assert_eq!(house.floors, 0);
        assert_eq!(house.price, Some(0.0));
        assert_eq!(house.status, PropertyStatus::UnderContract);
        assert_ne!(flat.id, house.id);
    }

    #[test]
    fn import_stops_after_limit() {
        let mut csv = String::from("Type of Property,Area Name,Location,Price\n");
        for i in 0..IMPORT_LIMIT + 5 {
            csv.push_str(&format!("Flat,Area {i},Road {i},1000\n"));
        }
        assert_eq!(parse_import(csv.as_bytes()).unwrap().len(), IMPORT_LIMIT);
    }

    #[test]
    fn export_writes_header_and_chunks() {
        let mut a = sample_property("a", PropertyStatus::Available);
        a.address = "1, High Street".into();
        let mut b = sample_property("b", PropertyStatus::UnderContract);
        b.price = None;
        let chunks = export_chunks(&[a, b.clone(), b], 2).unwrap();
        assert_eq!(chunks.len(), 2);
        let text = String::from_utf8(chunks.concat()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Address,Type,Location,Price,Status");
        assert_eq!(lines[1], "\"1, High Street\",House,Gulberg,480000.00,Available");
        assert_eq!(lines[2], "12 Main Boulevard,House,Gulberg,,Under Contract");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn streamed_body_joins_chunks() {
        let listings = [
            sample_property("a", PropertyStatus::Available),
            sample_property("b", PropertyStatus::Sold),
        ];
        let chunks = export_chunks(&listings, 1).unwrap();
        let expected = chunks.concat();
        let body = axum::body::to_bytes(csv_body(chunks), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), expected.as_slice());
        assert!(String::from_utf8(expected).unwrap().ends_with("Sold\n"));
    }

    #[test]
    fn empty_export_still_has_header() {
        let chunks = export_chunks(&[], 10).unwrap();
        assert_eq!(chunks.concat(), b"Address,Type,Location,Price,Status\n");
    }
}
