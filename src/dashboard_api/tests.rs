#[cfg(test)]
mod tests {
    use super::super::types::{DashboardFilter, DashboardQuery};

    #[test]
    fn test_query_fields_are_all_optional() {
        let query: DashboardQuery = serde_json::from_str("{}").unwrap();
        assert!(query.start_date.is_none());
        assert!(query.end_date.is_none());
        assert!(query.room_id.is_none());
        assert!(query.user_id.is_none());
    }

    #[test]
    fn test_default_filter_is_unconstrained() {
        let filter = DashboardFilter::default();
        assert!(filter.start_date.is_none());
        assert!(filter.end_date.is_none());
        assert!(filter.room_id.is_none());
        assert!(filter.user_id.is_none());
    }
}
