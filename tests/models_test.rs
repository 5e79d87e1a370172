//! Wire-format tests for requests and validated responses.

use rust_decimal_macros::dec;
use serde_json::json;
use tickwire::models::{
    ActiveSymbolsRequest, ContractSettings, ForgetRequest, Granularity, MessageType,
    ProposalRequest, Response, TicksHistoryRequest,
};

#[test]
fn test_request_and_unknown_wire_names() {
    assert_eq!(MessageType::from_wire("ticks_history"), Some(MessageType::Candles));
    assert_eq!(MessageType::from_wire("ping"), None);
}

#[test]
fn test_requests_serialize() {
    let catalog = serde_json::to_value(ActiveSymbolsRequest::brief()).expect("serialize");
    assert_eq!(catalog, json!({"active_symbols": "brief", "product_type": "basic"}));

    let history =
        serde_json::to_value(TicksHistoryRequest::new("R_50", Granularity::HOUR)).expect("serialize");
    assert_eq!(history["granularity"], 3600);
    assert!(history.get("subscribe").is_none());

    let forget = serde_json::to_value(ForgetRequest::new("abc")).expect("serialize");
    assert_eq!(forget, json!({"forget": "abc"}));

    let proposal = serde_json::to_value(ProposalRequest::new("R_100", &ContractSettings::default()))
        .expect("serialize");
    assert_eq!(proposal["amount"], 100.0);
    assert_eq!(proposal["basis"], "stake");
}

#[test]
fn test_candles_response_parses() {
    let text = r#"{
        "candles": [
            {"close": 1234.56, "epoch": 1700000040, "high": 1235.1, "low": 1233.9, "open": 1234.0},
            {"close": 1236.02, "epoch": 1700000100, "high": 1236.5, "low": 1234.5, "open": 1234.56}
        ],
        "echo_req": {"ticks_history": "R_100", "granularity": 60, "style": "candles", "subscribe": 1},
        "msg_type": "candles",
        "pip_size": 2,
        "subscription": {"id": "c1d2e3"}
    }"#;

    let Response::Candles(response) = Response::parse(text).expect("valid frame") else {
        panic!("expected candles");
    };

    assert_eq!(response.candles.len(), 2);
    assert_eq!(response.candles[0].close, dec!(1234.56));
    assert_eq!(response.pip_size, Some(2));
    assert_eq!(response.subscription.map(|s| s.id).as_deref(), Some("c1d2e3"));
}

#[test]
fn test_ohlc_response_parses_string_prices() {
    let text = r#"{
        "echo_req": {"ticks_history": "R_100"},
        "msg_type": "ohlc",
        "ohlc": {
            "close": "1236.18", "epoch": 1700000105, "granularity": 60,
            "high": "1236.50", "id": "c1d2e3", "low": "1236.02",
            "open": "1236.02", "open_time": 1700000100, "pip_size": 2, "symbol": "R_100"
        },
        "subscription": {"id": "c1d2e3"}
    }"#;

    let Response::Ohlc(response) = Response::parse(text).expect("valid frame") else {
        panic!("expected ohlc");
    };

    assert_eq!(response.ohlc.high, dec!(1236.50));
    assert_eq!(response.ohlc.open_time, Some(1_700_000_100));
    assert_eq!(response.ohlc.symbol.as_deref(), Some("R_100"));
}

#[test]
fn test_proposal_response_parses() {
    let text = r#"{
        "echo_req": {"proposal": 1},
        "msg_type": "proposal",
        "proposal": {
            "ask_price": 100, "date_start": 1700000000, "display_value": "100.00",
            "id": "9a8b7c", "longcode": "Win payout if ...", "payout": 195.43,
            "spot": 1236.18, "spot_time": 1700000000
        },
        "subscription": {"id": "9a8b7c"}
    }"#;

    let Response::Proposal(response) = Response::parse(text).expect("valid frame") else {
        panic!("expected proposal");
    };

    assert_eq!(response.proposal.spot, dec!(1236.18));
    assert_eq!(response.proposal.payout, dec!(195.43));
}

#[test]
fn test_shape_mismatch_is_an_error() {
    let text = r#"{"msg_type": "ohlc", "ohlc": {"epoch": "soon"}}"#;

    assert!(Response::parse(text).is_err());
}
