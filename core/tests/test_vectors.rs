//! Verify key conversion and the gateway pipeline against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each gateway vector describes request options, the expected wire request,
//! a simulated outcome and the expected envelope. Bodies are compared as
//! parsed JSON and headers as sorted pairs, so field and header ordering
//! cannot cause false negatives.

use std::sync::Arc;

use serde_json::Value;
use tracker_core::{
    convert_keys_str, ApiGateway, CaseError, Envelope, GatewayConfig, GatewayError, HttpMethod, HttpResponse,
    MemoryTokenStore, QueryValue, RequestOptions, TokenStore, TransportError, UreqTransport,
};

const BASE_URL: &str = "http://localhost:5000/api";

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_query_value(v: &Value) -> QueryValue {
    match v {
        Value::String(s) => QueryValue::Str(s.clone()),
        Value::Bool(b) => QueryValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => QueryValue::Int(i),
            None => QueryValue::Float(n.as_f64().unwrap()),
        },
        other => panic!("unsupported query value: {other}"),
    }
}

fn pairs(v: &Value) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = v
        .as_array()
        .map(|a| a.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    out.sort();
    out
}

// ---------------------------------------------------------------------------
// Key case conversion
// ---------------------------------------------------------------------------

#[test]
fn case_conversion_test_vectors() {
    let raw = include_str!("../../test-vectors/case_conversion.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let direction = case["direction"].as_str().unwrap();
        let result = convert_keys_str(&case["input"], direction);

        match case["error"].as_str() {
            Some("InvalidInput") => {
                assert!(matches!(result, Err(CaseError::InvalidInput)), "{name}: expected InvalidInput");
            }
            Some("InvalidDirection") => {
                assert!(
                    matches!(result, Err(CaseError::InvalidDirection(_))),
                    "{name}: expected InvalidDirection"
                );
            }
            Some(other) => panic!("{name}: unknown error kind {other}"),
            None => assert_eq!(result.unwrap(), case["expected"], "{name}: converted"),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

#[test]
fn gateway_test_vectors() {
    let raw = include_str!("../../test-vectors/gateway.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let store = Arc::new(MemoryTokenStore::new());
        if let Some(token) = case["token"].as_str() {
            store.set(token).unwrap();
        }
        let config = GatewayConfig::new(BASE_URL);
        let gateway = ApiGateway::with_transport(config.clone(), UreqTransport::new(&config), store);

        let opts = &case["options"];
        let mut options = RequestOptions::new(
            parse_method(opts["method"].as_str().unwrap()),
            opts["url"].as_str().unwrap(),
        );
        for pair in opts["query"].as_array().map(|a| a.as_slice()).unwrap_or_default() {
            options = options.query(pair[0].as_str().unwrap(), parse_query_value(&pair[1]));
        }
        if !opts["body"].is_null() {
            options = options.body(opts["body"].clone());
        }
        for (header, value) in pairs(&opts["headers"]) {
            options = options.header(&header, &value);
        }

        // Verify build
        let expected_req = &case["expected_request"];
        let req = gateway.build_request(&options).unwrap();
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let mut headers = req.headers.clone();
        headers.sort();
        assert_eq!(headers, pairs(&expected_req["headers"]), "{name}: headers");

        let body: Value = req
            .body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(Value::Null);
        assert_eq!(body, expected_req["body"], "{name}: body");

        // Verify normalization
        let envelope = match case["transport_error"].as_str() {
            Some(msg) => Envelope::failure(&GatewayError::Transport(TransportError::Network(msg.to_string()))),
            None => {
                let sim = &case["simulated_response"];
                Envelope::from_response(HttpResponse {
                    status: sim["status"].as_u64().unwrap() as u16,
                    headers: Vec::new(),
                    body: sim["body"].as_str().unwrap().to_string(),
                })
            }
        };
        let expected: Envelope = serde_json::from_value(case["expected_envelope"].clone()).unwrap();
        assert_eq!(envelope, expected, "{name}: envelope");
    }
}
