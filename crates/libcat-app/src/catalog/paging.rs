use crate::error::{ApiError, ApiResult};
use garde::Validate;
use libcat_dal::{Batch, ListingParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Validate, Deserialize)]
#[garde(allow_unvalidated)]
pub struct Paging {
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    #[garde(length(max = 255))]
    sort: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(default_page_size);
        // computed in i64, page and page_size come from the client and
        // their product does not fit u32
        let offset = i64::from(page - 1) * i64::from(page_size);
        let limit = page_size;
        let order = self
            .sort
            .map(|orderings| {
                orderings
                    .split(',')
                    .map(|name| {
                        let (field_name, descending) = match name.trim() {
                            "" => {
                                return Err(ApiError::InvalidQuery(
                                    "Empty ordering name".to_string(),
                                ))
                            }
                            name if name.len() > 100 => {
                                return Err(ApiError::InvalidQuery(
                                    "Ordering name too long".to_string(),
                                ))
                            }
                            name if name.starts_with('+') => (&name[1..], false),
                            name if name.starts_with('-') => (&name[1..], true),
                            name => (name, false),
                        };

                        let order = if descending {
                            libcat_dal::Order::Desc(field_name.to_string())
                        } else {
                            libcat_dal::Order::Asc(field_name.to_string())
                        };

                        Ok(order)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(ListingParams {
            offset,
            limit: limit.into(),
            order,
        })
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
    /// Number of the following page, when there is one.
    pub next_page: Option<u32>,
    pub rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn try_from_batch(
        batch: Batch<T>,
        page_size: u32,
    ) -> Result<Self, std::num::TryFromIntError> {
        let page = u32::try_from(u64::try_from(batch.offset)? / u64::from(page_size) + 1)?;
        let total_pages =
            u32::try_from((batch.total + page_size as u64 - 1) / page_size as u64)?;
        Ok(Self {
            page,
            page_size,
            total_pages,
            total: batch.total,
            next_page: (page < total_pages).then(|| page + 1),
            rows: batch.rows,
        })
    }

    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        Self::try_from_batch(batch, page_size).expect("Failed to convert batch to page")
        // As we control the batch, this should never fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(offset: i64, total: u64, count: usize) -> Batch<u32> {
        Batch {
            offset,
            total,
            rows: vec![0; count],
        }
    }

    #[test]
    fn test_page_links() {
        let page = Page::from_batch(batch(0, 3, 2), 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.next_page, Some(2));

        let page = Page::from_batch(batch(2, 3, 1), 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.next_page, None);

        let page = Page::from_batch(batch(0, 1, 1), 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.next_page, None);

        let page = Page::from_batch(batch(0, 0, 0), 2);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_large_page_number() {
        // page * page_size well past u32
        let paging = Paging {
            page: Some(4_300_000),
            page_size: Some(1000),
            sort: None,
        };
        let params = paging.into_listing_params(10).unwrap();
        assert_eq!(params.offset, 4_299_999_000);
        assert_eq!(params.limit, 1000);

        let page = Page::from_batch(batch(4_299_999_000, 0, 0), 1000);
        assert_eq!(page.page, 4_300_000);
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_listing_params() {
        let paging = Paging {
            page: Some(3),
            page_size: None,
            sort: Some("-due_back".to_string()),
        };
        let params = paging.into_listing_params(10).unwrap();
        assert_eq!(params.offset, 20);
        assert_eq!(params.limit, 10);
        assert!(matches!(
            params.order.unwrap().as_slice(),
            [libcat_dal::Order::Desc(f)] if f == "due_back"
        ));
    }
}
