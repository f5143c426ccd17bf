use cookbook_types::utils::slug::{numbered_slug, slugify};

use crate::{ChosenConnection, error::Result};

/// Finds free slug for the title in the table, `id` is the record being updated, if any
pub(crate) async fn unique_slug(
    conn: &mut ChosenConnection,
    table: &'static str,
    title: &str,
    id: Option<i64>,
) -> Result<String> {
    let base = slugify(title);
    let sql = format!("SELECT count(*) FROM {table} WHERE slug = ? AND id != ?");
    let mut candidate = base.clone();
    let mut n = 1;
    loop {
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(&candidate)
            .bind(id.unwrap_or(-1))
            .fetch_one(&mut *conn)
            .await?;
        if count == 0 {
            return Ok(candidate);
        }
        n += 1;
        candidate = numbered_slug(&base, n);
    }
}
