use crate::error::{ApiError, ApiResult};
use cookbook_dal::{Batch, ListingParams, Order};
use garde::Validate;
use serde::Serialize;

#[derive(Debug, Clone, Validate, serde::Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct Paging {
    #[garde(range(min = 1))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

fn parse_ordering(orderings: &str) -> ApiResult<Vec<Order>> {
    orderings
        .split(',')
        .map(|name| {
            let (field_name, descending) = match name.trim() {
                "" => return Err(ApiError::InvalidQuery("Empty ordering name".to_string())),
                name if name.len() > 100 => {
                    return Err(ApiError::InvalidQuery("Ordering name too long".to_string()))
                }
                name if name.starts_with('+') => (&name[1..], false),
                name if name.starts_with('-') => (&name[1..], true),
                name => (name, false),
            };

            let order = if descending {
                Order::Desc(field_name.to_string())
            } else {
                Order::Asc(field_name.to_string())
            };

            Ok(order)
        })
        .collect()
}

/// Offset and limit of a page, pages are numbered from 1
pub fn page_params(page: Option<u32>, page_size: u32) -> ListingParams {
    let page = page.unwrap_or(1).max(1);
    ListingParams::new((page as i64 - 1) * page_size as i64, page_size as i64)
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let params = page_params(self.page, self.page_size(default_page_size));
        match self.sort {
            Some(sort) => Ok(params.with_order(parse_ordering(&sort)?)),
            None => Ok(params),
        }
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let total_pages = batch.total.div_ceil(page_size as u64);
        Self {
            page: (batch.offset / page_size as i64) as u32 + 1,
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total: batch.total,
            rows: batch.rows,
        }
    }
}
