#[macro_export]
macro_rules! request_metrics {
    ($endpoint:expr, $body:expr) => {{
        metrics::counter!("payment_api_requests_total", "endpoint" => $endpoint.to_string()).increment(1);
        let start = std::time::Instant::now();
        let result = ($body).await;
        let elapsed = start.elapsed().as_secs_f64();
        metrics::histogram!("payment_api_response_time_seconds", "endpoint" => $endpoint.to_string()).record(elapsed);
        if result.is_err() {
            metrics::counter!("payment_api_errors_total", "endpoint" => $endpoint.to_string()).increment(1);
        }
        result
    }};
}

#[macro_export]
macro_rules! resolution_metrics {
    ($outcome:expr) => {{
        metrics::counter!("name_resolutions_total", "outcome" => $outcome.to_string()).increment(1);
    }};
}
