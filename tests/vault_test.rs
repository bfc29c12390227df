use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ekstack::error::StackError;
use ekstack::secrets::{self, RequiredSecret, SecretStore, VaultClient};

const TOKEN: &str = "s.test-token";

fn client(server: &MockServer) -> VaultClient {
    VaultClient::new(&server.uri(), SecretString::from(TOKEN.to_string()))
        .expect("Failed to build Vault client")
}

#[tokio::test]
async fn test_kubeconfig_round_trip() {
    let server = MockServer::start().await;
    let kubeconfig = json!({"kubeconfig": "apiVersion: v1\nkind: Config\ncurrent-context: np-demo\n"});

    Mock::given(method("POST"))
        .and(path("/v1/secret/np-demo/kube-system/kubeconfig"))
        .and(header("X-Vault-Token", TOKEN))
        .and(body_json(&kubeconfig))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/secret/np-demo/kube-system/kubeconfig"))
        .and(header("X-Vault-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_id": "1",
            "lease_duration": 2764800,
            "renewable": false,
            "data": kubeconfig,
        })))
        .mount(&server)
        .await;

    let vault = client(&server);
    vault
        .write("secret/np-demo/kube-system/kubeconfig", &kubeconfig)
        .await
        .expect("write failed");

    let read = vault
        .read("secret/np-demo/kube-system/kubeconfig")
        .await
        .expect("read failed");
    assert_eq!(serde_json::Value::Object(read), kubeconfig);

    let fetched = secrets::fetch_kubeconfig(&vault, "np-demo")
        .await
        .expect("fetch failed");
    assert!(fetched.contains("current-context: np-demo"));
}

#[tokio::test]
async fn test_missing_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/all-clusters/kube-system/ssh"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;

    let err = client(&server)
        .read("secret/all-clusters/kube-system/ssh")
        .await
        .unwrap_err();
    assert!(matches!(err, StackError::SecretNotFound(p) if p == "secret/all-clusters/kube-system/ssh"));
}

#[tokio::test]
async fn test_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"errors": ["permission denied"]})))
        .mount(&server)
        .await;

    let err = client(&server).read("secret/anything").await.unwrap_err();
    assert!(matches!(err, StackError::Vault(_)));
    assert!(err.to_string().contains("403"));
}

#[tokio::test]
async fn test_preflight_detects_empty_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/all-clusters/kube-system/ssh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id_rsa.pub": "ssh-rsa AAAAB3Nza"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/pequod/ansible-awx/web-administrator-credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"password": ""}
        })))
        .mount(&server)
        .await;

    let vault = client(&server);
    let ssh = [RequiredSecret::new("secret/all-clusters/kube-system/ssh", "id_rsa.pub")];
    secrets::check_required(&vault, &ssh)
        .await
        .expect("ssh key should be present");

    let awx = [RequiredSecret::new(
        "secret/pequod/ansible-awx/web-administrator-credentials",
        "password",
    )];
    let err = secrets::check_required(&vault, &awx).await.unwrap_err();
    assert!(matches!(err, StackError::SecretFieldMissing { field, .. } if field == "password"));
}
