use super::{PaginationParams, build_page};
use crate::management::response::Pagination;

#[test]
fn pagination_params_apply_defaults_and_limits() {
    let params = PaginationParams::new(Some(0), Some(200), 20, 100);
    assert_eq!(params.page, 1, "page 应回退到最小值 1");
    assert_eq!(params.limit, 100, "limit 应被限制在最大值内");
    assert_eq!(params.offset(), 0, "第一页 offset 应为 0");
}

#[test]
fn build_page_computes_pages_and_into_response() {
    let params = PaginationParams::new(Some(2), Some(15), 20, 50);
    let info = build_page(95, params);

    assert_eq!(info.page, 2);
    assert_eq!(info.limit, 15);
    assert_eq!(info.total, 95);
    assert_eq!(info.pages, 7);

    let response: Pagination = info.into();
    assert_eq!(response.page, 2);
    assert_eq!(response.total, 95);
}

#[test]
fn build_page_handles_empty_result() {
    let params = PaginationParams::new(None, None, 20, 100);
    let info = build_page(0, params);
    assert_eq!(info.pages, 0);
    assert_eq!(info.total, 0);
}
