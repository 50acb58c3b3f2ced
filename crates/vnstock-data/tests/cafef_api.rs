//! cafef 가격 이력 API 클라이언트 통합 테스트 (mockito 서버 사용).

use chrono::{Duration as ChronoDuration, NaiveDate};
use mockito::{Matcher, Mock, ServerGuard};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::time::Duration;
use vnstock_core::Symbol;
use vnstock_data::provider::cafef_api::PRICE_HISTORY_PATH;
use vnstock_data::{ApiError, CafefApiClient, CafefApiConfig, DateRange, PriceHistoryApi};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()
}

/// i번째 행의 날짜 (최신순).
fn row_date(i: usize) -> NaiveDate {
    base_date() - ChronoDuration::days(i as i64)
}

fn row(i: usize) -> Value {
    json!({
        "Ngay": row_date(i).format("%d/%m/%Y").to_string(),
        "GiaMoCua": 85.5,
        "GiaCaoNhat": 86.0,
        "GiaThapNhat": 84.9,
        "GiaDongCua": 85.8,
        "GiaDieuChinh": 85.8,
        "KhoiLuongKhopLenh": 1000 + i,
        "GiaTriKhopLenh": 85800000,
        "KLThoaThuan": 0,
        "GtThoaThuan": 0,
        "ThayDoi": "0.3(0.35 %)"
    })
}

fn page_body(total: usize, rows: std::ops::Range<usize>) -> String {
    json!({
        "Data": {
            "TotalCount": total,
            "Data": rows.map(row).collect::<Vec<_>>()
        },
        "Message": null,
        "Success": true
    })
    .to_string()
}

fn client(server: &ServerGuard, page_size: u32) -> CafefApiClient {
    CafefApiClient::new(CafefApiConfig {
        base_url: server.url(),
        page_size,
        max_pages: 50,
        timeout: Duration::from_secs(5),
        page_delay: Duration::ZERO,
    })
    .unwrap()
}

fn acv() -> Symbol {
    Symbol::parse("ACV").unwrap()
}

async fn mock_page(
    server: &mut ServerGuard,
    symbol: &str,
    page_index: u32,
    body: String,
) -> Mock {
    server
        .mock("GET", PRICE_HISTORY_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("Symbol".into(), symbol.into()),
            Matcher::UrlEncoded("PageIndex".into(), page_index.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

#[tokio::test]
async fn paginates_until_total_count() {
    let mut server = mockito::Server::new_async().await;
    let p1 = mock_page(&mut server, "ACV", 1, page_body(2500, 0..1000)).await;
    let p2 = mock_page(&mut server, "ACV", 2, page_body(2500, 1000..2000)).await;
    let p3 = mock_page(&mut server, "ACV", 3, page_body(2500, 2000..2500)).await;

    let bars = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap();

    p1.assert_async().await;
    p2.assert_async().await;
    p3.assert_async().await;

    assert_eq!(bars.len(), 2500);
    for (i, bar) in bars.iter().enumerate() {
        assert_eq!(bar.date, row_date(i));
        assert_eq!(bar.volume, 1000 + i as u64);
    }
}

#[tokio::test]
async fn two_day_scenario_keeps_upstream_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = mock_page(&mut server, "ACV", 1, page_body(2, 0..2)).await;

    let bars = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, base_date());
    assert_eq!(bars[1].date, row_date(1));
    assert_eq!(bars[0].close, dec!(85.8));
    assert_eq!(bars[0].change, dec!(0.35));
}

#[tokio::test]
async fn sends_date_range_in_upstream_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PRICE_HISTORY_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("StartDate".into(), "01/01/2026".into()),
            Matcher::UrlEncoded("EndDate".into(), "16/01/2026".into()),
            Matcher::UrlEncoded("PageSize".into(), "1000".into()),
        ]))
        .with_status(200)
        .with_body(page_body(1, 0..1))
        .expect(1)
        .create_async()
        .await;

    let range = DateRange::new(NaiveDate::from_ymd_opt(2026, 1, 1), Some(base_date()));
    let bars = client(&server, 1000).fetch_history(&acv(), range).await.unwrap();

    mock.assert_async().await;
    assert_eq!(bars.len(), 1);
}

#[tokio::test]
async fn missing_inner_data_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_page(
        &mut server,
        "ACV",
        1,
        json!({"Data": {"TotalCount": 2}}).to_string(),
    )
    .await;

    let err = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn html_body_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_page(
        &mut server,
        "ACV",
        1,
        "<html><body>Bảo trì hệ thống</body></html>".to_string(),
    )
    .await;

    let err = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn server_error_is_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", PRICE_HISTORY_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let err = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Upstream { status: 500 }));
}

#[tokio::test]
async fn empty_result_is_no_records() {
    let mut server = mockito::Server::new_async().await;
    let _mock = mock_page(&mut server, "ACV", 1, page_body(0, 0..0)).await;

    let err = client(&server, 1000)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoRecords));
}

#[tokio::test]
async fn changing_total_count_is_incomplete() {
    let mut server = mockito::Server::new_async().await;
    let _p1 = mock_page(&mut server, "ACV", 1, page_body(4, 0..2)).await;
    let _p2 = mock_page(&mut server, "ACV", 2, page_body(5, 2..4)).await;

    let err = client(&server, 2)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::IncompletePagination(_)), "{err:?}");
}

#[tokio::test]
async fn short_middle_page_is_incomplete() {
    let mut server = mockito::Server::new_async().await;
    let _p1 = mock_page(&mut server, "ACV", 1, page_body(6, 0..2)).await;
    let _p2 = mock_page(&mut server, "ACV", 2, page_body(6, 2..3)).await;

    let err = client(&server, 2)
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::IncompletePagination(_)), "{err:?}");
}

#[tokio::test]
async fn too_many_pages_is_incomplete() {
    let mut server = mockito::Server::new_async().await;
    let _p1 = mock_page(&mut server, "ACV", 1, page_body(500, 0..2)).await;

    let client = CafefApiClient::new(CafefApiConfig {
        base_url: server.url(),
        page_size: 2,
        max_pages: 10,
        timeout: Duration::from_secs(5),
        page_delay: Duration::ZERO,
    })
    .unwrap();

    let err = client
        .fetch_history(&acv(), DateRange::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::IncompletePagination(_)));
}

#[tokio::test]
async fn latest_requests_single_row() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", PRICE_HISTORY_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("Symbol".into(), "VNM".into()),
            Matcher::UrlEncoded("PageIndex".into(), "1".into()),
            Matcher::UrlEncoded("PageSize".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(page_body(3000, 0..1))
        .expect(1)
        .create_async()
        .await;

    let bar = client(&server, 1000)
        .fetch_latest(&Symbol::parse("VNM").unwrap())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(bar.symbol.as_str(), "VNM");
    assert_eq!(bar.date, base_date());
}

#[tokio::test]
#[ignore = "실제 cafef.vn 호출"]
async fn live_cafef_history() {
    let client = CafefApiClient::new(CafefApiConfig::default()).unwrap();
    let range = DateRange::new(Some(base_date() - ChronoDuration::days(30)), Some(base_date()));
    let bars = client.fetch_history(&acv(), range).await.unwrap();
    assert!(!bars.is_empty());
    assert!(bars.iter().all(|bar| bar.symbol.as_str() == "ACV"));
}
