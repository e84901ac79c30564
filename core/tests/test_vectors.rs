//! Verify the verb wrappers against JSON test vectors stored in `test-vectors/`.
//!
//! Each case describes the call, the request the transport should receive, a
//! simulated response, and the lifecycle events and result expected from it.
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use std::sync::{Arc, Mutex};

use api_dispatch::{
    report_error, DispatchError, Dispatcher, DispatcherConfig, Environment, HttpMethod,
    HttpRequest, HttpResponse, RecordingSink, RequestOptions, StaticToken, Transport,
};
use async_trait::async_trait;
use serde_json::Value;

/// Answers a single request with a fixed response and remembers the request.
struct OneShot {
    response: HttpResponse,
    seen: Mutex<Option<HttpRequest>>,
}

#[async_trait]
impl Transport for OneShot {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let previous = self.seen.lock().unwrap().replace(request);
        assert!(previous.is_none(), "transport called twice");
        Ok(self.response.clone())
    }
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

#[tokio::test]
async fn lifecycle_test_vectors() {
    let raw = include_str!("../../test-vectors/lifecycle.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();
    let token = vectors["token"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let action_type = case["action_type"].as_str().unwrap();
        let endpoint = case["endpoint"].as_str().unwrap();
        let requires_auth = case["requires_auth"].as_bool().unwrap();
        let body = case["body"].clone();

        let sim = &case["simulated_response"];
        let transport = Arc::new(OneShot {
            response: HttpResponse {
                status: sim["status"].as_u64().unwrap() as u16,
                headers: Vec::new(),
                body: sim["body"].as_str().unwrap().to_string(),
            },
            seen: Mutex::new(None),
        });
        let dispatcher = Dispatcher::new(
            DispatcherConfig::new(base_url).unwrap(),
            Arc::clone(&transport),
            StaticToken::new(token),
        );
        let sink = RecordingSink::new();

        // A null body means none was supplied. The verb wrappers always pass
        // one, so those cases go through `execute` and `report_error` directly.
        let result = match parse_method(case["method"].as_str().unwrap()) {
            HttpMethod::Get => dispatcher.get(&sink, action_type, endpoint, requires_auth).await,
            HttpMethod::Delete => dispatcher.delete(&sink, action_type, endpoint, requires_auth).await,
            method @ (HttpMethod::Post | HttpMethod::Put) if body.is_null() => {
                let options = RequestOptions::new(endpoint).requires_auth(requires_auth);
                dispatcher
                    .execute(&sink, method, action_type, options)
                    .await
                    .map_err(|e| report_error(&sink, e, action_type, Environment::Production))
            }
            HttpMethod::Post => dispatcher.post(&sink, action_type, endpoint, body, requires_auth).await,
            HttpMethod::Put => dispatcher.put(&sink, action_type, endpoint, body, requires_auth).await,
        };

        // Verify request
        let expected_req = &case["expected_request"];
        let req = transport.seen.lock().unwrap().take().expect("no request sent");
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{base_url}{}", expected_req["path"].as_str().unwrap()), "{name}: url");
        assert_eq!(req.headers, parse_headers(&expected_req["headers"]), "{name}: headers");
        match req.body.as_deref() {
            Some(sent) => {
                let sent: Value = serde_json::from_str(sent).unwrap();
                assert_eq!(sent, expected_req["body"], "{name}: body");
            }
            None => assert!(expected_req["body"].is_null(), "{name}: body should be present"),
        }

        // Verify lifecycle events
        let events: Vec<Value> = sink
            .events()
            .iter()
            .map(|e| serde_json::to_value(e).unwrap())
            .collect();
        assert_eq!(Value::Array(events), case["expected_events"], "{name}: events");

        // Verify outcome
        if let Some(expected_error) = case.get("expected_error") {
            let rejection = result.unwrap_err();
            assert_eq!(&rejection.payload, expected_error, "{name}: error payload");
        } else {
            let payload = result.unwrap();
            assert_eq!(payload, case["expected_result"], "{name}: result");
        }
    }
}
