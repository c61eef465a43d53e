//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Config (file / environment) -> sink factory -> dispatcher
//! - HTTP over a real socket -> dispatcher -> file sink

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::DispatcherConfig;
    use std::time::Duration;

    #[test]
    fn test_settings_convert_to_dispatcher_config() {
        let config = ConfigLoader::load_from_str(
            "[dispatcher]\nqueue_capacity = 64\nbatch_size = 8\nflush_interval_ms = 250\n",
            ConfigFormat::Toml,
        )
        .unwrap();

        let dispatcher_config = DispatcherConfig::from(&config.dispatcher);
        assert_eq!(dispatcher_config.queue_capacity, 64);
        assert_eq!(dispatcher_config.batch_size, 8);
        assert_eq!(dispatcher_config.flush_interval, Duration::from_millis(250));
        assert_eq!(dispatcher_config.drain_timeout, Duration::from_secs(5));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::net::{IpAddr, SocketAddr};
    use std::path::Path;
    use std::time::Duration;

    use chrono::Utc;
    use config_loader::ConfigLoader;
    use contracts::{AuditEvent, EventType, Severity};
    use dispatcher::{create_sink, BufferedDispatcher, DispatcherConfig};
    use ingress::AppState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    /// Minimal HTTP/1.1 client: returns (status, body)
    async fn http_request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        let response = String::from_utf8(response).unwrap();

        let status = response
            .split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap();
        let body = response
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (status, body)
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    async fn wait_for_lines(path: &Path, count: usize) -> Vec<serde_json::Value> {
        for _ in 0..100 {
            let lines = read_lines(path);
            if lines.len() >= count {
                return lines;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        read_lines(path)
    }

    /// End-to-end: HTTP -> ingress -> dispatcher -> file sink
    ///
    /// Checks that:
    /// 1. Accepted events reach the file, client ids preserved
    /// 2. Invalid documents are rejected with 400
    /// 3. Shutdown flushes the partial batch
    #[tokio::test]
    async fn test_e2e_http_to_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let vars = HashMap::from([
            ("SINK_TYPE", "file".to_string()),
            ("SINK_PATH", path.display().to_string()),
            ("BATCH_SIZE", "2".to_string()),
            ("FLUSH_INTERVAL", "1h".to_string()),
        ]);
        let config = ConfigLoader::from_lookup(|key| vars.get(key).cloned()).unwrap();

        let sink = create_sink(&config.sink).await.unwrap();
        let probe = sink.probe();
        let dispatcher =
            BufferedDispatcher::spawn(sink, DispatcherConfig::from(&config.dispatcher)).unwrap();

        let state = AppState {
            dispatcher: dispatcher.handle(),
            probe,
            health_timeout: config.server.health_timeout(),
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(ingress::serve(listener, state, async move {
            let _ = stop_rx.await;
        }));

        let client_id = "6f1c1f7e-2d4b-4d8e-9a43-1f7f0a6c2b11";
        let first = format!(
            r#"{{"id":"{client_id}","event_type":"admin_action","severity":"critical","ip_address":"10.1.2.3","endpoint":"/admin/users","http_method":"DELETE","status_code":204}}"#
        );
        let (status, body) = http_request(addr, "POST", "/ingest", &first).await;
        assert_eq!(status, 202);
        assert_eq!(body, "Event queued for ingestion");

        let (status, _) = http_request(
            addr,
            "POST",
            "/ingest",
            r#"{"event_type":"data_access","severity":"low","ip_address":"2001:db8::1","metadata":{"rows":42}}"#,
        )
        .await;
        assert_eq!(status, 202);

        // Size-triggered flush, long before the interval
        let lines = wait_for_lines(&path, 2).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], client_id);
        assert_eq!(lines[0]["status_code"], 204);
        assert_eq!(lines[1]["metadata"]["rows"], 42);
        assert!(lines[1].get("created_at").is_some());

        let (status, body) = http_request(addr, "POST", "/ingest", "{\"event_type\":").await;
        assert_eq!(status, 400);
        assert_eq!(body, "Invalid JSON");

        let (status, body) = http_request(addr, "GET", "/health", "").await;
        assert_eq!(status, 200);
        let health: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["buffer_cap"], 1000);

        // One more event stays in the partial batch until shutdown
        let (status, _) = http_request(
            addr,
            "POST",
            "/ingest",
            r#"{"event_type":"auth_attempt","severity":"medium","ip_address":"192.0.2.10","user_id":"bob"}"#,
        )
        .await;
        assert_eq!(status, 202);

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
        let summary = dispatcher.shutdown().await.unwrap();

        assert_eq!(summary.events_written, 3);
        assert_eq!(summary.size_flushes, 1);
        assert_eq!(summary.shutdown_flushes, 1);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2]["user_id"], "bob");
    }

    /// Interval flush through a file sink built from a TOML config
    #[tokio::test]
    async fn test_interval_flush_with_file_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("events.jsonl");
        let toml = format!(
            "[dispatcher]\nbatch_size = 100\nflush_interval_ms = 50\n\n\
             [sink]\nname = \"jsonl\"\nsink_type = \"file\"\nparams = {{ path = {:?}, fsync = \"false\" }}\n",
            path.display().to_string()
        );
        let config =
            ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap();

        let sink = create_sink(&config.sink).await.unwrap();
        let dispatcher =
            BufferedDispatcher::spawn(sink, DispatcherConfig::from(&config.dispatcher)).unwrap();
        let handle = dispatcher.handle();

        for n in 0..3u8 {
            let event = AuditEvent::new(
                EventType::ApiCall,
                Severity::Medium,
                IpAddr::from([127, 0, 0, n + 1]),
                Utc::now(),
            );
            handle.submit(event).unwrap();
        }

        let lines = wait_for_lines(&path, 3).await;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2]["ip_address"], "127.0.0.3");

        let summary = dispatcher.shutdown().await.unwrap();
        assert_eq!(summary.interval_flushes, 1);
        assert_eq!(summary.shutdown_flushes, 0);
        assert_eq!(handle.metrics().events_written(), 3);
    }
}
