//! End-to-end tests of every transport against a mock runtime API server.

use lambda_runtime_client::invocation::{ERROR_CAUSE_HEADER, ERROR_CAUSE_MAX_SIZE, ERROR_TYPE_HEADER};
use lambda_runtime_client::{
    InvocationError, RuntimeClient, RuntimeClientConfig, RuntimeClientError, TransportError,
    TransportKind, USER_AGENT,
};
use mockito::{Matcher, Server, ServerGuard};

const NEXT_PATH: &str = "/2018-06-01/runtime/invocation/next";
const ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:demo";

const ALL_TRANSPORTS: [TransportKind; 3] = [
    TransportKind::SingleConnection,
    TransportKind::Pooled,
    TransportKind::NonBlocking,
];

fn client_for(server: &ServerGuard, kind: TransportKind) -> RuntimeClient {
    let config = RuntimeClientConfig::new(server.host_with_port())
        .unwrap()
        .with_transport(kind);
    RuntimeClient::from_config(&config).unwrap()
}

fn error_path(id: &str) -> String {
    format!("/2018-06-01/runtime/invocation/{id}/error")
}

#[test]
fn next_invocation_with_mandatory_headers() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let mock = server
            .mock("GET", NEXT_PATH)
            .match_header("user-agent", USER_AGENT)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "req-1")
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .with_body("{\"hello\":\"world\"}")
            .create();

        let invocation = client_for(&server, kind).wait_for_next_invocation().unwrap();

        assert_eq!(invocation.id(), "req-1", "{kind}");
        assert_eq!(invocation.invoked_function_arn(), ARN);
        assert_eq!(invocation.deadline_ms(), 0);
        assert_eq!(invocation.xray_trace_id(), None);
        assert_eq!(invocation.content(), b"{\"hello\":\"world\"}");
        mock.assert();
    }
}

#[test]
fn next_invocation_with_optional_headers() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "req-2")
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .with_header("lambda-runtime-deadline-ms", "5000")
            .with_header("lambda-runtime-trace-id", "Root=1-5759e988-bd862e3fe1be46a994272793")
            .with_header("lambda-runtime-client-context", "{\"client\":{}}")
            .with_header("lambda-runtime-cognito-identity", "{\"identityId\":\"id\"}")
            .create();

        let invocation = client_for(&server, kind).wait_for_next_invocation().unwrap();

        assert_eq!(invocation.deadline_ms(), 5000, "{kind}");
        assert_eq!(
            invocation.xray_trace_id(),
            Some("Root=1-5759e988-bd862e3fe1be46a994272793")
        );
        assert_eq!(invocation.client_context(), Some("{\"client\":{}}"));
        assert_eq!(invocation.cognito_identity(), Some("{\"identityId\":\"id\"}"));
        assert!(invocation.content().is_empty());
    }
}

#[test]
fn next_invocation_missing_request_id() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .create();

        let err = client_for(&server, kind)
            .wait_for_next_invocation()
            .unwrap_err();
        assert!(err.is_protocol_violation(), "{kind}");
        assert_eq!(err.to_string(), "Request ID absent");
    }
}

#[test]
fn next_invocation_missing_function_arn() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "req-3")
            .create();

        let err = client_for(&server, kind)
            .wait_for_next_invocation()
            .unwrap_err();
        assert_eq!(err.to_string(), "Function ARN absent", "{kind}");
    }
}

#[test]
fn next_invocation_large_payload() {
    let payload: Vec<u8> = (0..3 * 1024 * 1024u32).map(|i| (i % 253) as u8).collect();

    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "req-big")
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .with_body(&payload)
            .create();

        let invocation = client_for(&server, kind).wait_for_next_invocation().unwrap();
        assert_eq!(invocation.content().len(), payload.len(), "{kind}");
        assert!(invocation.content() == payload.as_slice(), "{kind} payload differs");
    }
}

#[test]
fn next_invocation_over_payload_limit() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "req-4")
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .with_body(vec![b'x'; 2048])
            .create();

        let config = RuntimeClientConfig::new(server.host_with_port())
            .unwrap()
            .with_transport(kind)
            .with_max_payload_size(1024);
        let client = RuntimeClient::from_config(&config).unwrap();

        let err = client.wait_for_next_invocation().unwrap_err();
        assert!(
            matches!(
                err,
                RuntimeClientError::Transport {
                    context: "Failed to get next invoke",
                    source: TransportError::PayloadTooLarge { limit: 1024 },
                }
            ),
            "{kind}: {err}"
        );
    }
}

#[test]
fn next_invocation_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    for kind in ALL_TRANSPORTS {
        let config = RuntimeClientConfig::new(format!("127.0.0.1:{port}"))
            .unwrap()
            .with_transport(kind);
        let client = RuntimeClient::from_config(&config).unwrap();

        let err = client.wait_for_next_invocation().unwrap_err();
        assert!(
            err.to_string().starts_with("Failed to get next invoke: "),
            "{kind}: {err}"
        );
    }
}

#[test]
fn post_invocation_success_sends_payload() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2018-06-01/runtime/invocation/req-5/response")
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::Exact("{\"result\":42}".to_string()))
            .with_status(202)
            .create();

        client_for(&server, kind)
            .post_invocation_success("req-5", b"{\"result\":42}")
            .unwrap();
        mock.assert();
    }
}

#[test]
fn post_invocation_error_with_type_and_cause() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let mock = server
            .mock("POST", error_path("req-6").as_str())
            .match_header("user-agent", USER_AGENT)
            .match_header("content-type", "application/json")
            .match_header(ERROR_TYPE_HEADER, "Runtime.HandlerError")
            .match_header(ERROR_CAUSE_HEADER, "{\"exceptions\":[]}")
            .match_body(Matcher::Exact("{\"errorMessage\":\"boom\"}".to_string()))
            .with_status(202)
            .create();

        let report = InvocationError::builder("{\"errorMessage\":\"boom\"}")
            .with_id("req-6")
            .with_error_type("Runtime.HandlerError")
            .with_error_cause("{\"exceptions\":[]}")
            .build();
        client_for(&server, kind).post_invocation_error(&report).unwrap();
        mock.assert();
    }
}

#[test]
fn post_invocation_error_omits_empty_type_and_oversized_cause() {
    let oversized_cause = "c".repeat(ERROR_CAUSE_MAX_SIZE);

    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let mock = server
            .mock("POST", error_path("req-7").as_str())
            .match_header(ERROR_TYPE_HEADER, Matcher::Missing)
            .match_header(ERROR_CAUSE_HEADER, Matcher::Missing)
            .with_status(202)
            .create();

        let report = InvocationError::builder("{}")
            .with_id("req-7")
            .with_error_type("")
            .with_error_cause(oversized_cause.as_str())
            .build();
        client_for(&server, kind).post_invocation_error(&report).unwrap();
        mock.assert();
    }
}

#[test]
fn post_invocation_error_rejects_non_accepted_status() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        server
            .mock("POST", error_path("req-8").as_str())
            .with_status(200)
            .create();

        let report = InvocationError::builder("{}").with_id("req-8").build();
        let err = client_for(&server, kind)
            .post_invocation_error(&report)
            .unwrap_err();

        let expected = format!(
            "http://{}/2018-06-01/runtime/invocation/req-8/error Response code: '200'.",
            server.host_with_port()
        );
        assert!(err.is_protocol_violation(), "{kind}");
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn post_init_error() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/2018-06-01/runtime/init/error")
            .match_header("content-type", "application/json")
            .match_header(ERROR_TYPE_HEADER, "Runtime.Unknown")
            .with_status(202)
            .create();

        let report = InvocationError::builder("{\"errorMessage\":\"init failed\"}")
            .with_error_type("Runtime.Unknown")
            .build();
        client_for(&server, kind).post_init_error(&report).unwrap();
        mock.assert();
    }
}

#[test]
fn post_init_error_rejects_non_accepted_status() {
    let mut server = Server::new();
    server
        .mock("POST", "/2018-06-01/runtime/init/error")
        .with_status(500)
        .create();

    let report = InvocationError::builder("{}").build();
    let err = client_for(&server, TransportKind::Pooled)
        .post_init_error(&report)
        .unwrap_err();
    assert!(err.to_string().ends_with("/2018-06-01/runtime/init/error Response code: '500'."));
}

#[test]
fn full_cycle_on_one_client() {
    for kind in ALL_TRANSPORTS {
        let mut server = Server::new();
        let next = server
            .mock("GET", NEXT_PATH)
            .with_status(200)
            .with_header("lambda-runtime-aws-request-id", "cycle")
            .with_header("lambda-runtime-invoked-function-arn", ARN)
            .with_body("ping")
            .expect(2)
            .create();
        let response = server
            .mock("POST", "/2018-06-01/runtime/invocation/cycle/response")
            .match_body(Matcher::Exact("pong".to_string()))
            .with_status(202)
            .expect(2)
            .create();

        let client = client_for(&server, kind);
        for _ in 0..2 {
            let invocation = client.wait_for_next_invocation().unwrap();
            assert_eq!(invocation.content(), b"ping");
            client.post_invocation_success(invocation.id(), b"pong").unwrap();
        }

        next.assert();
        response.assert();
    }
}
