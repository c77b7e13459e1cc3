//! HTTP client abstraction for testability

use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use super::config::CollectorConfig;
use super::types::{
    CollectorError, DeviceRegistration, LocationUpload, RemoteDevice, RemoteZone, ZoneUpload,
};
use crate::BoxFuture;

/// Operations the collector offers.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock collectors in tests. Each call is a single attempt;
/// retry policy belongs to the caller.
pub trait CollectorClient: Send + Sync {
    /// Upload one location fix.
    fn post_location<'a>(
        &'a self,
        upload: &'a LocationUpload,
    ) -> BoxFuture<'a, Result<(), CollectorError>>;

    /// Upload the device's zones and receive the authoritative list.
    fn sync_zones<'a>(
        &'a self,
        device_id: &'a str,
        zones: &'a [ZoneUpload],
    ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>>;

    /// Fetch the device's zones without uploading.
    fn fetch_zones<'a>(
        &'a self,
        device_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>>;

    /// Delete one server-held zone.
    fn delete_zone<'a>(
        &'a self,
        device_id: &'a str,
        zone_id: &'a str,
    ) -> BoxFuture<'a, Result<(), CollectorError>>;

    /// Register (or re-register) a device.
    fn register_device<'a>(
        &'a self,
        registration: &'a DeviceRegistration,
    ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>>;

    /// Look up a device by its unique id.
    fn fetch_device<'a>(
        &'a self,
        device_id: &'a str,
    ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>>;
}

/// Real collector client using reqwest.
pub struct ReqwestCollector {
    client: reqwest::Client,
    config: CollectorConfig,
}

impl ReqwestCollector {
    /// Creates a client for the configured collector.
    pub fn new(config: CollectorConfig) -> Result<Self, CollectorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| CollectorError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The collector base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(Response, String), CollectorError> {
        let url = self.config.url(path);
        trace!(method = %method, url = %url, "Collector request");

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CollectorError::Network(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CollectorError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        Ok((response, url))
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: String) -> Result<T, CollectorError> {
        response.json::<T>().await.map_err(|e| CollectorError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

impl CollectorClient for ReqwestCollector {
    fn post_location<'a>(
        &'a self,
        upload: &'a LocationUpload,
    ) -> BoxFuture<'a, Result<(), CollectorError>> {
        Box::pin(async move {
            self.request(Method::POST, "locations/", Some(upload)).await?;
            Ok(())
        })
    }

    fn sync_zones<'a>(
        &'a self,
        device_id: &'a str,
        zones: &'a [ZoneUpload],
    ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>> {
        Box::pin(async move {
            let path = format!("zones/{}", device_id);
            let (response, url) = self.request(Method::POST, &path, Some(zones)).await?;
            Self::decode(response, url).await
        })
    }

    fn fetch_zones<'a>(
        &'a self,
        device_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>> {
        Box::pin(async move {
            let path = format!("zones/{}", device_id);
            let (response, url) = self.request::<()>(Method::GET, &path, None).await?;
            Self::decode(response, url).await
        })
    }

    fn delete_zone<'a>(
        &'a self,
        device_id: &'a str,
        zone_id: &'a str,
    ) -> BoxFuture<'a, Result<(), CollectorError>> {
        Box::pin(async move {
            let path = format!("zones/{}/{}", device_id, zone_id);
            self.request::<()>(Method::DELETE, &path, None).await?;
            Ok(())
        })
    }

    fn register_device<'a>(
        &'a self,
        registration: &'a DeviceRegistration,
    ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>> {
        Box::pin(async move {
            let (response, url) = self
                .request(Method::POST, "devices/", Some(registration))
                .await?;
            Self::decode(response, url).await
        })
    }

    fn fetch_device<'a>(
        &'a self,
        device_id: &'a str,
    ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>> {
        Box::pin(async move {
            let path = format!("devices/{}", device_id);
            let (response, url) = self.request::<()>(Method::GET, &path, None).await?;
            Self::decode(response, url).await
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    use crate::geofence::DEFAULT_RADIUS_M;

    #[derive(Default)]
    struct MockState {
        uploads: Vec<LocationUpload>,
        location_script: VecDeque<Result<(), CollectorError>>,
        zones: Vec<RemoteZone>,
        next_zone_id: i64,
        zone_uploads: Vec<Vec<ZoneUpload>>,
        devices: Vec<RemoteDevice>,
        offline: bool,
        calls: usize,
    }

    /// In-memory collector for tests.
    ///
    /// Location uploads succeed unless the mock is offline or a scripted
    /// result says otherwise. Zone sync mimics the real backend: uploaded
    /// zones are added unless one already exists within ~11 m.
    #[derive(Default)]
    pub struct MockCollector {
        state: Mutex<MockState>,
    }

    impl MockCollector {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_offline(&self, offline: bool) {
            self.state.lock().offline = offline;
        }

        /// Queue results for the next location uploads, in order.
        pub fn script_locations(&self, results: Vec<Result<(), CollectorError>>) {
            self.state.lock().location_script.extend(results);
        }

        pub fn uploads(&self) -> Vec<LocationUpload> {
            self.state.lock().uploads.clone()
        }

        pub fn calls(&self) -> usize {
            self.state.lock().calls
        }

        pub fn add_server_zone(&self, name: &str, latitude: f64, longitude: f64, radius: f64) -> i64 {
            let mut state = self.state.lock();
            state.next_zone_id += 1;
            let id = state.next_zone_id;
            state.zones.push(RemoteZone {
                id,
                name: name.to_string(),
                latitude,
                longitude,
                radius,
            });
            id
        }

        pub fn server_zones(&self) -> Vec<RemoteZone> {
            self.state.lock().zones.clone()
        }

        pub fn zone_uploads(&self) -> Vec<Vec<ZoneUpload>> {
            self.state.lock().zone_uploads.clone()
        }

        pub fn add_device(&self, device_id: &str) {
            let mut state = self.state.lock();
            let id = state.devices.len() as i64 + 1;
            state.devices.push(RemoteDevice {
                id,
                device_id: device_id.to_string(),
                name: None,
                is_active: Some(true),
            });
        }

        pub fn devices(&self) -> Vec<RemoteDevice> {
            self.state.lock().devices.clone()
        }

        fn enter(&self) -> Result<parking_lot::MutexGuard<'_, MockState>, CollectorError> {
            let mut state = self.state.lock();
            state.calls += 1;
            if state.offline {
                return Err(CollectorError::Network("connection refused".into()));
            }
            Ok(state)
        }
    }

    fn not_found(path: String) -> CollectorError {
        CollectorError::Status {
            status: 404,
            url: format!("mock://{}", path),
        }
    }

    impl CollectorClient for MockCollector {
        fn post_location<'a>(
            &'a self,
            upload: &'a LocationUpload,
        ) -> BoxFuture<'a, Result<(), CollectorError>> {
            let result = self.enter().and_then(|mut state| {
                let result = state.location_script.pop_front().unwrap_or(Ok(()));
                if result.is_ok() {
                    state.uploads.push(upload.clone());
                }
                result
            });
            Box::pin(async move { result })
        }

        fn sync_zones<'a>(
            &'a self,
            _device_id: &'a str,
            zones: &'a [ZoneUpload],
        ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>> {
            let result = self.enter().map(|mut state| {
                state.zone_uploads.push(zones.to_vec());
                for zone in zones {
                    let duplicate = state.zones.iter().any(|existing| {
                        (existing.latitude - zone.latitude).abs() < 0.0001
                            && (existing.longitude - zone.longitude).abs() < 0.0001
                    });
                    if !duplicate {
                        state.next_zone_id += 1;
                        let id = state.next_zone_id;
                        state.zones.push(RemoteZone {
                            id,
                            name: zone.name.clone(),
                            latitude: zone.latitude,
                            longitude: zone.longitude,
                            radius: zone.radius,
                        });
                    }
                }
                state.zones.clone()
            });
            Box::pin(async move { result })
        }

        fn fetch_zones<'a>(
            &'a self,
            _device_id: &'a str,
        ) -> BoxFuture<'a, Result<Vec<RemoteZone>, CollectorError>> {
            let result = self.enter().map(|state| state.zones.clone());
            Box::pin(async move { result })
        }

        fn delete_zone<'a>(
            &'a self,
            device_id: &'a str,
            zone_id: &'a str,
        ) -> BoxFuture<'a, Result<(), CollectorError>> {
            let result = self.enter().and_then(|mut state| {
                let before = state.zones.len();
                state.zones.retain(|z| z.id.to_string() != zone_id);
                if state.zones.len() == before {
                    Err(not_found(format!("zones/{}/{}", device_id, zone_id)))
                } else {
                    Ok(())
                }
            });
            Box::pin(async move { result })
        }

        fn register_device<'a>(
            &'a self,
            registration: &'a DeviceRegistration,
        ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>> {
            let result = self.enter().map(|mut state| {
                let id = state.devices.len() as i64 + 1;
                let device = RemoteDevice {
                    id,
                    device_id: registration.device_id.clone(),
                    name: Some(registration.name.clone()),
                    is_active: Some(true),
                };
                state.devices.push(device.clone());
                device
            });
            Box::pin(async move { result })
        }

        fn fetch_device<'a>(
            &'a self,
            device_id: &'a str,
        ) -> BoxFuture<'a, Result<RemoteDevice, CollectorError>> {
            let result = self.enter().and_then(|state| {
                state
                    .devices
                    .iter()
                    .find(|d| d.device_id == device_id)
                    .cloned()
                    .ok_or_else(|| not_found(format!("devices/{}", device_id)))
            });
            Box::pin(async move { result })
        }
    }

    fn upload() -> LocationUpload {
        LocationUpload {
            latitude: 1.0,
            longitude: 2.0,
            timestamp: "2024-05-01T00:00:00.000Z".into(),
            device_unique_id: "device-1".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_uploads() {
        let mock = MockCollector::new();
        mock.post_location(&upload()).await.unwrap();

        assert_eq!(mock.uploads(), vec![upload()]);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_script_and_offline() {
        let mock = MockCollector::new();
        mock.script_locations(vec![Err(CollectorError::Network("flaky".into()))]);

        assert!(mock.post_location(&upload()).await.is_err());
        assert!(mock.post_location(&upload()).await.is_ok());

        mock.set_offline(true);
        assert!(mock.post_location(&upload()).await.is_err());
        assert_eq!(mock.uploads().len(), 1);
    }

    #[tokio::test]
    async fn test_reqwest_client_reports_unreachable_host() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = CollectorConfig::new(format!("http://127.0.0.1:{}", port))
            .with_timeout(Duration::from_secs(2));
        let client = ReqwestCollector::new(config).unwrap();

        let result = client.post_location(&upload()).await;
        assert!(matches!(result, Err(CollectorError::Network(_))));
    }

    // ------------------------------------------------------------------
    // ReqwestCollector against a local HTTP server
    // ------------------------------------------------------------------

    struct CapturedRequest {
        request_line: String,
        body: String,
    }

    /// Answer a single HTTP request with `status` and a JSON `body`, handing
    /// the request line and body back to the test.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (ReqwestCollector, oneshot::Receiver<CapturedRequest>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];

            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                assert!(n > 0, "connection closed before end of headers");
            };

            let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.trim()
                        .eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);

            while raw.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before end of body");
                raw.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            let _ = tx.send(CapturedRequest {
                request_line: head.lines().next().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&raw[header_end..header_end + content_length])
                    .to_string(),
            });
        });

        let config = CollectorConfig::new(base_url).with_timeout(Duration::from_secs(5));
        (ReqwestCollector::new(config).unwrap(), rx)
    }

    #[tokio::test]
    async fn test_post_location_wire_format() {
        let (client, request) = serve_once("201 Created", "").await;

        client.post_location(&upload()).await.unwrap();

        let request = request.await.unwrap();
        assert_eq!(request.request_line, "POST /locations/ HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "latitude": 1.0,
                "longitude": 2.0,
                "timestamp": "2024-05-01T00:00:00.000Z",
                "device_unique_id": "device-1",
            })
        );
    }

    #[tokio::test]
    async fn test_post_location_server_error_is_status() {
        let (client, _request) = serve_once("500 Internal Server Error", "").await;

        let result = client.post_location(&upload()).await;

        match result {
            Err(CollectorError::Status { status, url }) => {
                assert_eq!(status, 500);
                assert!(url.ends_with("/locations/"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sync_zones_posts_list_and_decodes_response() {
        let (client, request) = serve_once(
            "200 OK",
            r#"[{"id":7,"name":"Home","latitude":19.4,"longitude":-99.1,"radius":150.0,"device_unique_id":"device-1","created_at":"2024-05-01T00:00:00Z"}]"#,
        )
        .await;
        let zones = vec![ZoneUpload {
            name: "Home".into(),
            latitude: 19.4,
            longitude: -99.1,
            radius: 150.0,
            device_unique_id: "device-1".into(),
        }];

        let remote = client.sync_zones("device-1", &zones).await.unwrap();

        assert_eq!(
            remote,
            vec![RemoteZone {
                id: 7,
                name: "Home".into(),
                latitude: 19.4,
                longitude: -99.1,
                radius: 150.0,
            }]
        );
        let request = request.await.unwrap();
        assert_eq!(request.request_line, "POST /zones/device-1 HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body[0]["name"], "Home");
        assert_eq!(body[0]["radius"], 150.0);
        assert_eq!(body[0]["device_unique_id"], "device-1");
    }

    #[tokio::test]
    async fn test_fetch_zones_defaults_missing_radius() {
        let (client, request) = serve_once(
            "200 OK",
            r#"[{"id":3,"name":"Depot","latitude":10.0,"longitude":20.0}]"#,
        )
        .await;

        let remote = client.fetch_zones("device-1").await.unwrap();

        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].radius, DEFAULT_RADIUS_M);
        assert_eq!(
            request.await.unwrap().request_line,
            "GET /zones/device-1 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_fetch_zones_bad_body_is_decode_error() {
        let (client, _request) = serve_once("200 OK", "not json").await;

        let result = client.fetch_zones("device-1").await;

        assert!(matches!(result, Err(CollectorError::Decode { .. })));
    }

    #[tokio::test]
    async fn test_delete_zone_path_and_not_found() {
        let (client, request) = serve_once("404 Not Found", r#"{"detail":"Not found"}"#).await;

        let err = client.delete_zone("device-1", "7").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            request.await.unwrap().request_line,
            "DELETE /zones/device-1/7 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_register_device_decodes_record() {
        let (client, request) = serve_once(
            "201 Created",
            r#"{"id":12,"device_id":"device-1","name":"Van","is_active":true}"#,
        )
        .await;
        let registration = DeviceRegistration {
            device_id: "device-1".into(),
            name: "Van".into(),
            mac_address: "unknown".into(),
            brand: "Acme".into(),
            model: "T1".into(),
        };

        let device = client.register_device(&registration).await.unwrap();

        assert_eq!(device.id, 12);
        assert_eq!(device.device_id, "device-1");
        let request = request.await.unwrap();
        assert_eq!(request.request_line, "POST /devices/ HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["mac_address"], "unknown");
        assert_eq!(body["brand"], "Acme");
    }

    #[tokio::test]
    async fn test_fetch_unknown_device_is_not_found() {
        let (client, request) = serve_once("404 Not Found", "").await;

        let err = client.fetch_device("device-9").await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(
            request.await.unwrap().request_line,
            "GET /devices/device-9 HTTP/1.1"
        );
    }
}
