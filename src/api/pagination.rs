use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// `?page=&limit=` query parameters. Pages start at 1.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Resolve to a `(limit, offset)` pair, clamping out-of-range values.
    pub fn limit_offset(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        (limit, (page - 1).saturating_mul(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PageQuery::default().limit_offset(), (10, 0));
    }

    #[test]
    fn test_second_page() {
        let query = PageQuery {
            page: Some(2),
            limit: Some(5),
        };
        assert_eq!(query.limit_offset(), (5, 5));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let query = PageQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(query.limit_offset(), (100, 0));

        let query = PageQuery {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(query.limit_offset(), (1, 0));
    }
}
