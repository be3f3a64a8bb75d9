use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::dto::{CyclesDto, GraphDto};
use crate::application::GraphSession;
use crate::domain::error::{AnalysisError, GraphError};

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<Value>,
}

#[derive(Debug, Error)]
enum CommandError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Failed to encode response: {0}")]
    Internal(#[from] serde_json::Error),
}

impl From<GraphError> for CommandError {
    fn from(e: GraphError) -> Self {
        CommandError::Analysis(e.into())
    }
}

impl CommandError {
    fn kind(&self) -> &'static str {
        match self {
            CommandError::BadRequest(_) => "bad_request",
            CommandError::Analysis(e) => e.kind(),
            CommandError::Internal(_) => "internal",
        }
    }
}

pub fn start_server(port: u16, session: Arc<GraphSession>) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!(%address, "API server listening");
    serve(listener, session)
}

/// Accept connections until a client sends `SHUTDOWN`.
pub fn serve(listener: TcpListener, session: Arc<GraphSession>) -> Result<()> {
    let local = listener.local_addr()?;
    let shutdown = Arc::new(AtomicBool::new(false));

    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let session = Arc::clone(&session);
                let shutdown = Arc::clone(&shutdown);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &session, &shutdown, local) {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => warn!(error = %e, "accept error"),
        }
    }

    info!("API server stopped");
    Ok(())
}

fn handle_connection(
    mut stream: TcpStream,
    session: &GraphSession,
    shutdown: &AtomicBool,
    local: SocketAddr,
) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break; // Connection closed
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (result, stop) = match serde_json::from_str::<CommandReq>(trimmed) {
            Ok(req) => {
                debug!(command = %req.command, "request");
                let stop = req.command == "SHUTDOWN";
                (process_command(session, req), stop)
            }
            Err(e) => (
                Err(CommandError::BadRequest(format!("Invalid JSON format: {}", e))),
                false,
            ),
        };

        let response = match result {
            Ok(data) => json!({
                "status": "success",
                "data": data
            }),
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "request rejected");
                json!({
                    "status": "error",
                    "kind": e.kind(),
                    "message": e.to_string()
                })
            }
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if stop {
            info!("shutdown requested");
            shutdown.store(true, Ordering::SeqCst);
            // Wake the accept loop so it observes the flag.
            let _ = TcpStream::connect(local);
            break;
        }
    }
    Ok(())
}

fn str_param<'a>(params: &'a Option<Value>, key: &str) -> Result<&'a str, CommandError> {
    params
        .as_ref()
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .ok_or_else(|| CommandError::BadRequest(format!("Missing '{}' param", key)))
}

fn process_command(session: &GraphSession, req: CommandReq) -> Result<Value, CommandError> {
    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "ANALYZE" => {
            let source = str_param(&req.params, "source")?;
            let functions = session.analyze(source)?;
            Ok(json!({
                "functions": functions,
                "message": format!(
                    "Successfully analyzed codebase. Graph built with {} functions.",
                    functions
                ),
            }))
        }
        "GET_CALLEES" => {
            let function = str_param(&req.params, "function")?;
            let callees = session.callees(function)?;
            let message = if callees.is_empty() {
                format!("Function '{}' does not call any other functions.", function)
            } else {
                format!("Function '{}' calls: {}", function, callees.join(", "))
            };
            Ok(json!({ "function": function, "callees": callees, "message": message }))
        }
        "GET_CALLERS" => {
            let function = str_param(&req.params, "function")?;
            let callers = session.callers(function)?;
            let message = if callers.is_empty() {
                format!("Function '{}' is not called by any other function.", function)
            } else {
                format!("Function '{}' is called by: {}", function, callers.join(", "))
            };
            Ok(json!({ "function": function, "callers": callers, "message": message }))
        }
        "DETECT_CYCLES" => {
            let dto = CyclesDto::new(session.cycles()?);
            Ok(serde_json::to_value(dto)?)
        }
        "GET_ORPHANS" => {
            let orphans: Vec<String> = session.orphans().into_iter().collect();
            Ok(json!({ "orphans": orphans }))
        }
        "GET_GRAPH" => {
            let max_cycles = session.config().max_cycles;
            let dto = session.with_graph(|g| GraphDto::from_graph(g, max_cycles))?;
            Ok(serde_json::to_value(dto)?)
        }
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => Err(CommandError::BadRequest(format!(
            "Unknown command: {}",
            req.command
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn session() -> GraphSession {
        GraphSession::cpp(EngineConfig::default()).unwrap()
    }

    fn req(command: &str, params: Value) -> CommandReq {
        CommandReq {
            command: command.to_string(),
            params: Some(params),
        }
    }

    #[test]
    fn test_unknown_command_is_bad_request() {
        let err = process_command(&session(), req("FROBNICATE", json!({}))).unwrap_err();
        assert_eq!(err.kind(), "bad_request");
        assert_eq!(err.to_string(), "Unknown command: FROBNICATE");
    }

    #[test]
    fn test_missing_param() {
        let err = process_command(&session(), req("GET_CALLERS", json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'function' param");
    }

    #[test]
    fn test_analyze_then_query() {
        let session = session();
        let data = process_command(
            &session,
            req("ANALYZE", json!({ "source": "void A(){ B(); } void B(){}" })),
        )
        .unwrap();
        assert_eq!(data["functions"], 2);

        let data = process_command(&session, req("GET_CALLERS", json!({ "function": "B" }))).unwrap();
        assert_eq!(data["callers"], json!(["A"]));
        assert_eq!(data["message"], "Function 'B' is called by: A");

        let err =
            process_command(&session, req("GET_CALLEES", json!({ "function": "Z" }))).unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert_eq!(err.to_string(), "Function 'Z' not found in graph.");
    }

    #[test]
    fn test_encoding_failure_is_internal() {
        let err: CommandError = serde_json::from_str::<Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), "internal");
        assert!(err.to_string().starts_with("Failed to encode response"));
    }

    #[test]
    fn test_detect_cycles_rendering() {
        let session = session();
        session.analyze("void A(){ A(); }").unwrap();
        let data = process_command(&session, req("DETECT_CYCLES", json!({}))).unwrap();
        assert_eq!(data["cycles"], json!([["A"]]));
        assert_eq!(data["rendered"], json!(["A -> A"]));
    }
}
