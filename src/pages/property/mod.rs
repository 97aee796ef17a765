pub mod data;
mod transfer;

use axum::{
    extract::{Multipart, Path, Query},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use mysql::{params, prelude::Queryable, PooledConn};
use serde_json::{json, Value};

use crate::{
    bearer, commit_or_rollback,
    database::get_conn,
    libs::{gen_id, parse_multipart, perm::Operator, read_file, remove_file, store_file},
    parse_jwt_macro,
    perm::action::{PropertyGroup, PROPERTY},
    response::BodyFile,
    workflow::{self, WorkflowStore},
    Config, Response, ResponseResult,
};
use data::{PropertyListing, PropertyStatus, PROPERTY_FIELDS};

pub const PAGE_SIZE: u64 = 10;

pub fn property_router() -> Router {
    Router::new()
        .route("/properties", get(query_properties))
        .route("/property/:id", get(property_detail))
        .route("/property/add", post(add_property))
        .route("/property/edit/:id", post(edit_property))
        .route("/property/delete/:id", delete(delete_property))
        .route("/property/status/:id", post(update_property_status))
        .route("/property/export", get(transfer::export_properties))
        .route("/property/import", post(transfer::import_properties))
        .route("/property/image/:file", get(property_image))
}

/// Resolve the caller and check `property.<action>`.
fn operator_with(headers: &HeaderMap, conn: &mut PooledConn, action: &str) -> Result<Operator, Response> {
    let bearer = bearer!(headers);
    let id = parse_jwt_macro!(&bearer, conn);
    let operator = Operator::new(&id, conn)?;
    operator.require(PROPERTY, action)?;
    Ok(operator)
}

#[derive(Debug, Default, serde::Deserialize)]
struct PageQuery {
    #[serde(default)]
    q: String,
    #[serde(default)]
    page: String,
}

/// 1-based page number, falling back to the first page for junk and to the
/// last page when past the end.
fn clamp_page(page: &str, total_pages: u64) -> u64 {
    let page = page.trim().parse::<u64>().unwrap_or(1).max(1);
    page.min(total_pages.max(1))
}

fn like_pattern(q: &str) -> String {
    let escaped = q
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn query_properties(headers: HeaderMap, Query(query): Query<PageQuery>) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, PropertyGroup::QUERY)?;
    let pattern = like_pattern(&query.q);
    let filter = "WHERE location LIKE :q OR property_type LIKE :q OR address LIKE :q";
    let total: Option<u64> = conn.exec_first(
        format!("SELECT COUNT(*) FROM property_listing {filter}"),
        params! { "q" => &pattern },
    )?;
    let total = total.unwrap_or_default();
    let total_pages = total.div_ceil(PAGE_SIZE).max(1);
    let page = clamp_page(&query.page, total_pages);
    let data: Vec<PropertyListing> = conn.exec(
        format!(
            "SELECT {PROPERTY_FIELDS} FROM property_listing {filter}
            ORDER BY location, address, id LIMIT :limit OFFSET :offset"
        ),
        params! {
            "q" => &pattern,
            "limit" => PAGE_SIZE,
            "offset" => (page - 1) * PAGE_SIZE,
        },
    )?;
    Ok(Response::ok(json!({
        "page": page,
        "total_pages": total_pages,
        "total": total,
        "data": data,
    })))
}

pub(crate) fn find_property(id: &str, conn: &mut PooledConn) -> Result<PropertyListing, Response> {
    let property: Option<PropertyListing> = conn.exec_first(
        format!("SELECT {PROPERTY_FIELDS} FROM property_listing WHERE id = ?"),
        (id,),
    )?;
    property.ok_or_else(|| Response::not_exist(format!("property {id}")))
}

async fn property_detail(headers: HeaderMap, Path(id): Path<String>) -> ResponseResult {
    let mut conn = get_conn()?;
    operator_with(&headers, &mut conn, PropertyGroup::QUERY)?;
    Ok(Response::ok(json!(find_property(&id, &mut conn)?)))
}

fn insert_property(conn: &mut PooledConn, p: &PropertyListing) -> mysql::Result<()> {
    conn.exec_drop(
        format!(
            "INSERT INTO property_listing ({PROPERTY_FIELDS}) VALUES (:id, :property_type,
            :location, :address, :floors, :covered_area, :electricity_status, :bathroom_count,
            :bedroom_count, :booking_amount, :price, :status, :image)"
        ),
        property_params(p),
    )
}

fn property_params(p: &PropertyListing) -> mysql::Params {
    params! {
        "id" => &p.id,
        "property_type" => p.property_type.trim(),
        "location" => p.location.trim(),
        "address" => p.address.trim(),
        "floors" => p.floors,
        "covered_area" => &p.covered_area,
        "electricity_status" => &p.electricity_status,
        "bathroom_count" => p.bathroom_count,
        "bedroom_count" => p.bedroom_count,
        "booking_amount" => p.booking_amount,
        "price" => p.price,
        "status" => p.status,
        "image" => &p.image,
    }
}

async fn add_property(headers: HeaderMap, part: Multipart) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::CREATE)?;
    let part = parse_multipart(part).await?;
    let mut property: PropertyListing = serde_json::from_str(part.json_or_empty())?;
    property.validate().map_err(Response::invalid_value)?;
    workflow::check_manual_status(PropertyStatus::Available, property.status)?;
    property.id = gen_id();
    let dir = Config::get().property_dir();
    if let Some(file) = part.files.iter().find(|f| !f.is_empty()) {
        property.image = Some(store_file(&dir, file)?);
    }
    if let Err(e) = insert_property(&mut conn, &property) {
        if let Some(image) = &property.image {
            remove_file(&dir, image);
        }
        return Err(e.into());
    }
    tracing::info!(operator = %operator.id(), property = %property.id, "property added");
    Ok(Response::ok(json!(property)))
}

/// Runs under the row lock, the same one a sale takes. Returns the saved
/// listing and the image it had before.
fn __edit_property(
    conn: &mut PooledConn,
    mut property: PropertyListing,
    image: Option<String>,
) -> Result<(PropertyListing, Option<String>), Response> {
    let current = conn
        .property_for_update(&property.id)?
        .ok_or_else(|| Response::not_exist(format!("property {}", property.id)))?;
    workflow::check_manual_status(current.status, property.status)?;
    property.image = image.or_else(|| current.image.clone());
    conn.exec_drop(
        "UPDATE property_listing SET property_type = :property_type, location = :location,
        address = :address, floors = :floors, covered_area = :covered_area,
        electricity_status = :electricity_status, bathroom_count = :bathroom_count,
        bedroom_count = :bedroom_count, booking_amount = :booking_amount, price = :price,
        status = :status, image = :image WHERE id = :id",
        property_params(&property),
    )?;
    Ok((property, current.image))
}

fn save_property_edit(
    conn: &mut PooledConn,
    property: PropertyListing,
    image: Option<String>,
) -> Result<(PropertyListing, Option<String>), Response> {
    commit_or_rollback!(__edit_property, conn, property, image)
}

async fn edit_property(headers: HeaderMap, Path(id): Path<String>, part: Multipart) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::UPDATE)?;
    let part = parse_multipart(part).await?;
    let mut property: PropertyListing = serde_json::from_str(part.json_or_empty())?;
    property.validate().map_err(Response::invalid_value)?;
    property.id = id;
    let dir = Config::get().property_dir();
    let image = match part.files.iter().find(|f| !f.is_empty()) {
        Some(file) => Some(store_file(&dir, file)?),
        None => None,
    };
    let (property, previous) = match save_property_edit(&mut conn, property, image.clone()) {
        Ok(saved) => saved,
        Err(e) => {
            if let Some(image) = &image {
                remove_file(&dir, image);
            }
            return Err(e);
        }
    };
    if let Some(old) = previous.filter(|old| property.image.as_ref() != Some(old)) {
        remove_file(&dir, &old);
    }
    tracing::info!(operator = %operator.id(), property = %property.id, "property updated");
    Ok(Response::ok(json!(property)))
}

async fn delete_property(headers: HeaderMap, Path(id): Path<String>) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::DELETE)?;
    let property = find_property(&id, &mut conn)?;
    conn.exec_drop("DELETE FROM property_listing WHERE id = ?", (&id,))?;
    if let Some(image) = &property.image {
        remove_file(&Config::get().property_dir(), image);
    }
    tracing::info!(operator = %operator.id(), property = %id, "property deleted");
    Ok(Response::empty())
}

#[derive(serde::Deserialize)]
struct StatusForm {
    status: String,
}

async fn update_property_status(
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(value): Json<Value>,
) -> ResponseResult {
    let mut conn = get_conn()?;
    let operator = operator_with(&headers, &mut conn, PropertyGroup::UPDATE)?;
    let form: StatusForm = serde_json::from_value(value)?;
    let status: PropertyStatus = form.status.parse().map_err(Response::invalid_value)?;
    let previous = commit_or_rollback!(workflow::change_property_status, &mut conn, &id, status)?;
    tracing::info!(operator = %operator.id(), property = %id, from = %previous, to = %status, "property status updated");
    Ok(Response::ok(json!({ "id": id, "status": status })))
}

async fn property_image(Path(file): Path<String>) -> Result<BodyFile, Response> {
    let bytes = read_file(&Config::get().property_dir(), &file)?;
    Ok(BodyFile::from_path(&file, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_are_clamped() {
        assert_eq!(clamp_page("", 3), 1);
        assert_eq!(clamp_page("abc", 3), 1);
        assert_eq!(clamp_page("0", 3), 1);
        assert_eq!(clamp_page("2", 3), 2);
        assert_eq!(clamp_page("9", 3), 3);
        assert_eq!(clamp_page("4", 0), 1);
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" DHA "), "%DHA%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn sold_is_reserved_for_sales() {
        use workflow::check_manual_status;
        use PropertyStatus::*;
        assert!(check_manual_status(Available, UnderContract).is_ok());
        assert!(check_manual_status(UnderContract, Available).is_ok());
        assert!(check_manual_status(Available, Sold).is_err());
        assert!(check_manual_status(Sold, Available).is_err());
        assert!(check_manual_status(Sold, Sold).is_ok());
    }
}
