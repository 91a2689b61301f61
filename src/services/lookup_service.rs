use crate::{
    dao::models::{LookupEntity, LookupTable},
    dto::common::LookupItem,
    error::ServiceError,
    state::SharedState,
};

/// Rows of a lookup table in display order.
pub async fn list_lookups(
    state: &SharedState,
    table: LookupTable,
) -> Result<Vec<LookupEntity>, ServiceError> {
    let store = state.require_catalog_store().await?;
    Ok(store.list_lookups(table).await?)
}

/// Same as [`list_lookups`] but resolving the table from its route name.
pub async fn list_lookup_items(
    state: &SharedState,
    table: &str,
) -> Result<Vec<LookupItem>, ServiceError> {
    let table = LookupTable::parse(table)
        .ok_or_else(|| ServiceError::NotFound(format!("lookup table `{table}` not found")))?;
    let rows = list_lookups(state, table).await?;
    Ok(rows.into_iter().map(LookupItem::from).collect())
}

/// Ensure `name` is a row of `table`.
pub async fn require_lookup(
    state: &SharedState,
    table: LookupTable,
    name: &str,
) -> Result<LookupEntity, ServiceError> {
    list_lookups(state, table)
        .await?
        .into_iter()
        .find(|row| row.name == name)
        .ok_or_else(|| {
            ServiceError::InvalidInput(format!("`{name}` is not a valid {}", table.as_str()))
        })
}
