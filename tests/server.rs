use serde_json::{Value, json};
use tokio::sync::oneshot;
use transfer_proxy::{ProxyConfig, Server, router};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn serves_uploads_over_a_real_socket_and_drains_on_shutdown() {
    let mock = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/photo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("https://example.com/xyz/photo.png\n"))
        .expect(1)
        .mount(&mock)
        .await;

    let app = router(ProxyConfig::new(mock.uri().parse().unwrap())).unwrap();
    let server = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve_with_shutdown(app, async {
        let _ = stopped.await;
    }));

    let client = reqwest::Client::new();
    let endpoint = format!("http://{addr}/api/transfer");

    let preflight = client
        .request(reqwest::Method::OPTIONS, &endpoint)
        .send()
        .await
        .unwrap();
    assert_eq!(preflight.status(), 200);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
    assert!(preflight.text().await.unwrap().is_empty());

    let upload = client
        .post(&endpoint)
        .json(&json!({ "fileName": "photo.png", "mimeType": "image/png", "fileContent": "iVBORw0KGgo=" }))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status(), 200);
    assert_eq!(upload.headers()["content-type"], "application/json");
    let body: Value = upload.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "downloadUrl": "https://example.com/xyz/photo.png" }));

    // Idle keep-alive connections would otherwise hold the drain open.
    drop(client);
    stop.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
