//! Integration tests for rpcwire.
//!
//! These tests run the checked-in generated `UserService` module end to end:
//! generated stub -> Endpoint -> LocalTransport -> Router -> generated
//! handler -> implementation, and back.

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use rpcwire::client::StatusKinds;
use rpcwire::handler::{DispatchMode, DynamicService, NotFoundPolicy, Routed, Router};
use rpcwire::result::{raise, ErrorMapper};
use rpcwire::transport::{Body, HttpClient, HttpMethod, HttpRequest, LocalTransport};
use rpcwire::{BoxFuture, Empty, Endpoint, ErrorKind, Failure, Fault, Format, Try};

#[path = "generated/user_service.rs"]
mod user_service;

use user_service::UserService;

const BASE_URL: &str = "http://local/rpc";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: i32,
    first_name: String,
    last_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetRequest {
    id: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GetResponse {
    user: User,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeleteRequest {
    id: i32,
}

struct Users;

impl UserService for Users {
    fn get_user(&self, request: GetRequest) -> BoxFuture<'_, Result<GetResponse, Fault>> {
        Box::pin(async move {
            if request.id < 0 {
                return Err(raise(
                    ErrorKind::NotFound,
                    format!("no user {}", request.id),
                ));
            }
            Ok(GetResponse {
                user: User {
                    id: request.id,
                    first_name: "Jordan".to_string(),
                    last_name: "Demeulenaere".to_string(),
                },
            })
        })
    }

    fn delete_user(&self, request: DeleteRequest) -> BoxFuture<'_, Result<Empty, Fault>> {
        Box::pin(async move {
            let id = u32::try_from(request.id)?;
            if id == 0 {
                unimplemented!("deleting the root user");
            }
            Ok(Empty {})
        })
    }
}

fn router() -> Router {
    Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .build()
}

fn transport(router: Router) -> Arc<LocalTransport> {
    Arc::new(LocalTransport::new(Arc::new(router), BASE_URL))
}

fn stub(format: Format) -> user_service::UserServiceStub {
    let endpoint = Endpoint::builder(transport(router()), BASE_URL)
        .format(format)
        .build();
    user_service::client(endpoint)
}

fn jordan(id: i32) -> GetResponse {
    GetResponse {
        user: User {
            id,
            first_name: "Jordan".to_string(),
            last_name: "Demeulenaere".to_string(),
        },
    }
}

fn raw_request(path: &str, content_type: &str, body: &'static [u8]) -> HttpRequest {
    HttpRequest {
        url: format!("{}{}", BASE_URL, path),
        method: HttpMethod::Post,
        body: Some(Body::new(Bytes::from_static(body), content_type)),
        headers: HashMap::new(),
    }
}

#[tokio::test]
async fn test_get_user_try_form() {
    for format in Format::ALL {
        let reply = stub(format).try_get_user(GetRequest { id: 42 }).await;
        assert_eq!(reply, Try::Success(jordan(42)), "format {format}");
    }
}

#[tokio::test]
async fn test_get_user_raising_form() {
    for format in Format::ALL {
        let reply = stub(format).get_user(GetRequest { id: 42 }).await.unwrap();
        assert_eq!(reply, jordan(42), "format {format}");
    }
}

#[tokio::test]
async fn test_not_found_try_form() {
    for format in Format::ALL {
        let reply = stub(format).try_get_user(GetRequest { id: -1 }).await;
        assert_eq!(
            reply,
            Try::Failure(Failure::new(ErrorKind::NotFound, "no user -1")),
            "format {format}"
        );
    }
}

#[tokio::test]
async fn test_not_found_raising_form() {
    for format in Format::ALL {
        let fault = stub(format)
            .get_user(GetRequest { id: -1 })
            .await
            .unwrap_err();
        assert_eq!(
            fault.failure(),
            Some(&Failure::new(ErrorKind::NotFound, "no user -1")),
            "format {format}"
        );
    }
}

#[tokio::test]
async fn test_absent_output_is_empty() {
    for format in Format::ALL {
        let reply = stub(format).try_delete_user(DeleteRequest { id: 7 }).await;
        assert_eq!(reply, Try::Success(Empty {}));
    }
}

#[tokio::test]
async fn test_raised_errors_and_panics_are_mapped() {
    let stub = stub(Format::Json);

    let reply = stub.try_delete_user(DeleteRequest { id: -5 }).await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::OutOfRange);

    let reply = stub.try_delete_user(DeleteRequest { id: 0 }).await;
    let failure = reply.failure().unwrap();
    assert_eq!(failure.error, ErrorKind::Unimplemented);
    assert!(failure
        .message
        .as_deref()
        .unwrap()
        .contains("deleting the root user"));

    // The server survived the panic.
    let reply = stub.try_get_user(GetRequest { id: 1 }).await;
    assert_eq!(reply, Try::Success(jordan(1)));
}

#[tokio::test]
async fn test_custom_error_mapper() {
    struct Strict;

    impl ErrorMapper for Strict {
        fn map_error(&self, _error: &(dyn Error + 'static)) -> ErrorKind {
            ErrorKind::FailedPrecondition
        }
    }

    let router = Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .error_mapper(Strict)
        .build();
    let stub = user_service::client(Endpoint::new(transport(router), BASE_URL));

    let reply = stub.try_delete_user(DeleteRequest { id: -5 }).await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::FailedPrecondition);

    // Pre-tagged failures bypass the mapper.
    let reply = stub.try_get_user(GetRequest { id: -1 }).await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_json_wire_shape() {
    let response = transport(router())
        .send(raw_request(
            "/UserService/getUser",
            "application/json",
            br#"{"id":42}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status.code, 200);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(
        &response.body.unwrap().content[..],
        br#"{"status":"success","value":{"user":{"id":42,"firstName":"Jordan","lastName":"Demeulenaere"}}}"#
    );
}

#[tokio::test]
async fn test_unsupported_media_type() {
    let response = transport(router())
        .send(raw_request("/UserService/getUser", "text/plain", b"42"))
        .await
        .unwrap();

    assert_eq!(response.status.code, 415);
    let text = String::from_utf8(response.body.unwrap().content.to_vec()).unwrap();
    assert!(text.contains("application/json"));
    assert!(text.contains("application/octet-stream"));
}

#[tokio::test]
async fn test_undecodable_request_is_400() {
    let response = transport(router())
        .send(raw_request(
            "/UserService/getUser",
            "application/json",
            br#"{"name":"x"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status.code, 400);
    let outcome: Try<Empty> = Format::Json
        .decode(&response.body.unwrap().content)
        .unwrap();
    assert_eq!(outcome.failure().unwrap().error, ErrorKind::InvalidArgument);
}

#[tokio::test]
async fn test_unknown_service_and_rpc() {
    for path in ["/OrderService/getUser", "/UserService/getOrder"] {
        let response = transport(router())
            .send(raw_request(path, "application/json", b"{}"))
            .await
            .unwrap();
        assert_eq!(response.status.code, 404, "path {path}");
    }

    // A bare 404 is INTERNAL unless the endpoint asks for detailed kinds.
    let empty = user_service::client(Endpoint::new(
        transport(Router::builder().build()),
        BASE_URL,
    ));
    let reply = empty.try_get_user(GetRequest { id: 42 }).await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::Internal);

    let detailed = Endpoint::builder(transport(Router::builder().build()), BASE_URL)
        .status_kinds(StatusKinds::Detailed)
        .build();
    let reply = user_service::client(detailed)
        .try_get_user(GetRequest { id: 42 })
        .await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::Unimplemented);
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    let endpoint = Endpoint::new(transport(router()), "http://elsewhere/rpc");
    let reply = user_service::client(endpoint)
        .try_get_user(GetRequest { id: 42 })
        .await;
    assert_eq!(reply.failure().unwrap().error, ErrorKind::Unavailable);
}

#[test]
fn test_duplicate_bind_fails() {
    let result = Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .bind(user_service::handler(Arc::new(Users)));

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Registry already bound to service named UserService"
    );
}

#[tokio::test]
async fn test_two_services_both_route() {
    let echo = DynamicService::new("EchoService")
        .rpc("echo", |text: String| async move { Ok::<_, Fault>(text) });
    let router = Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .bind(echo)
        .unwrap()
        .build();
    assert_eq!(
        router.registry().service_names(),
        vec!["UserService", "EchoService"]
    );

    let endpoint = Endpoint::new(transport(router), BASE_URL);
    let echoed: Try<String> = endpoint.call("EchoService", "echo", "hello").await;
    assert_eq!(echoed, Try::Success("hello".to_string()));

    let reply = user_service::client(endpoint)
        .try_get_user(GetRequest { id: 3 })
        .await;
    assert_eq!(reply, Try::Success(jordan(3)));
}

#[tokio::test]
async fn test_opaque_mode_end_to_end() {
    let router = Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .dispatch_mode(DispatchMode::Opaque)
        .build();
    let endpoint = Endpoint::builder(transport(router), BASE_URL)
        .format(Format::Binary)
        .dispatch_mode(DispatchMode::Opaque)
        .build();
    let stub = user_service::client(endpoint);

    let reply = stub.try_get_user(GetRequest { id: 42 }).await;
    assert_eq!(reply, Try::Success(jordan(42)));

    let reply = stub.try_get_user(GetRequest { id: -1 }).await;
    assert_eq!(
        reply,
        Try::Failure(Failure::new(ErrorKind::NotFound, "no user -1"))
    );
}

#[tokio::test]
async fn test_pass_through_for_embedding() {
    let router = Router::builder()
        .bind(user_service::handler(Arc::new(Users)))
        .unwrap()
        .not_found(NotFoundPolicy::PassThrough)
        .build();

    let routed = router
        .route_path("/Static/index", Some("application/json"), Bytes::new())
        .await;
    assert_eq!(routed, Routed::PassThrough);

    let routed = router
        .route_path(
            "/UserService/getUser",
            Some("application/json"),
            Bytes::from_static(br#"{"id":5}"#),
        )
        .await;
    assert_eq!(routed.into_response().unwrap().status, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_share_one_stub() {
    let stub = stub(Format::Binary);

    let calls = (0..32).map(|id| {
        let stub = stub.clone();
        async move { (id, stub.try_get_user(GetRequest { id }).await) }
    });

    for (id, reply) in futures::future::join_all(calls).await {
        assert_eq!(reply, Try::Success(jordan(id)));
    }
}
