use cryptotrack::format::format_value;
use cryptotrack::history::{HistoryFormat, HistoryRecord, HistoryStore};
use cryptotrack::provider::PriceProvider;
use cryptotrack::provider::coingecko::CoinGecko;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn coingecko_replay_fixture_parses_like_real_response() {
    let server = MockServer::start().await;
    let response: serde_json::Value = serde_json::from_str(include_str!(
        "fixtures/coingecko/simple_price_btc_eth_usd.json",
    ))
    .expect("coingecko fixture must be valid JSON");

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .and(query_param("ids", "bitcoin,ethereum"))
        .and(query_param("vs_currencies", "usd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let provider = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let coins = vec!["bitcoin".to_string(), "ethereum".to_string()];
    let lookups = provider
        .fetch(&coins, "usd")
        .await
        .expect("fixture payload should parse");

    assert_eq!(lookups.len(), 2);
    let btc = lookups[0].quote().expect("bitcoin in fixture");
    assert_eq!(format_value(btc.price, false), "67,187.33");
    assert_eq!(format_value(btc.change_24h_pct, true), "2.04%");
    let eth = lookups[1].quote().expect("ethereum in fixture");
    assert_eq!(format_value(eth.change_24h_pct, true), "-0.67%");
}

#[tokio::test]
async fn replayed_quotes_survive_a_history_round_trip() {
    let server = MockServer::start().await;
    let response: serde_json::Value = serde_json::from_str(include_str!(
        "fixtures/coingecko/simple_price_btc_eth_usd.json",
    ))
    .expect("coingecko fixture must be valid JSON");

    Mock::given(method("GET"))
        .and(path("/api/v3/simple/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let provider = CoinGecko::with_base_url(format!("{}/api/v3", server.uri()));
    let coins = vec!["ethereum".to_string(), "bitcoin".to_string()];
    let lookups = provider.fetch(&coins, "usd").await.unwrap();

    let mut record = HistoryRecord::new();
    assert_eq!(record.merge(&lookups), 2);

    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("crypto_history.txt"), HistoryFormat::Full);
    store.save(&record).unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.starts_with("bitcoin,67187.33,"));
    assert_eq!(store.load(), record);
}
