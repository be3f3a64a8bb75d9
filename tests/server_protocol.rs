use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use legacy_graph::api::server;
use legacy_graph::application::GraphSession;
use legacy_graph::config::EngineConfig;
use serde_json::{json, Value};

struct Client {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    fn connect(addr: std::net::SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("Failed to connect to server");
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { stream, reader }
    }

    fn send_raw(&mut self, line: &str) -> Value {
        self.stream.write_all(line.as_bytes()).unwrap();
        self.stream.write_all(b"\n").unwrap();

        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        serde_json::from_str(&response).unwrap()
    }

    fn send(&mut self, request: Value) -> Value {
        self.send_raw(&request.to_string())
    }
}

#[test]
fn test_server_session_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let session = Arc::new(GraphSession::cpp(EngineConfig::default()).unwrap());
    let handle = thread::spawn(move || server::serve(listener, session));

    let mut client = Client::connect(addr);

    let response = client.send(json!({ "command": "PING" }));
    assert_eq!(response["status"], "success");
    assert_eq!(response["data"], "PONG");

    // Queries before any analysis report not_found rather than empty lists.
    let response = client.send(json!({ "command": "GET_CALLEES", "params": { "function": "A" } }));
    assert_eq!(response["status"], "error");
    assert_eq!(response["kind"], "not_found");

    let source = "void orphan(){} void A(){ B(); } void B(){ A(); C(); } void C(){ C(); }";
    let response = client.send(json!({ "command": "ANALYZE", "params": { "source": source } }));
    assert_eq!(response["status"], "success");
    assert_eq!(response["data"]["functions"], 4);

    let response = client.send(json!({ "command": "GET_CALLEES", "params": { "function": "B" } }));
    assert_eq!(response["data"]["callees"], json!(["A", "C"]));

    let response = client.send(json!({ "command": "GET_CALLERS", "params": { "function": "C" } }));
    assert_eq!(response["data"]["callers"], json!(["B", "C"]));

    let response = client.send(json!({ "command": "DETECT_CYCLES" }));
    let rendered: Vec<&str> = response["data"]["rendered"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(rendered.contains(&"C -> C"));
    assert!(rendered.contains(&"A -> B -> A"));

    let response = client.send(json!({ "command": "GET_ORPHANS" }));
    assert_eq!(response["data"]["orphans"], json!(["orphan"]));

    let response = client.send(json!({ "command": "GET_GRAPH" }));
    assert_eq!(response["data"]["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(response["data"]["edges"][0]["type"], "call");

    let response = client.send_raw("this is not json");
    assert_eq!(response["status"], "error");
    assert_eq!(response["kind"], "bad_request");

    let response = client.send(json!({ "command": "SHUTDOWN" }));
    assert_eq!(response["status"], "success");

    // The accept loop exits instead of terminating the process.
    handle.join().unwrap().unwrap();
}

#[test]
fn test_concurrent_clients_share_one_graph() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let session = Arc::new(GraphSession::cpp(EngineConfig::default()).unwrap());
    let handle = thread::spawn(move || server::serve(listener, session));

    let mut writer = Client::connect(addr);
    let response = writer.send(json!({
        "command": "ANALYZE",
        "params": { "source": "void main_loop(){ tick(); } void tick(){}" }
    }));
    assert_eq!(response["data"]["functions"], 2);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                let mut client = Client::connect(addr);
                client.send(json!({ "command": "GET_CALLERS", "params": { "function": "tick" } }))
            })
        })
        .collect();

    for reader in readers {
        let response = reader.join().unwrap();
        assert_eq!(response["data"]["callers"], json!(["main_loop"]));
    }

    writer.send(json!({ "command": "SHUTDOWN" }));
    handle.join().unwrap().unwrap();
}
