//! Minimal trellis example: JSON endpoints, a splat route and the status route.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl http://localhost:3000/users/42.json
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -X PUT http://localhost:3000/users/42        # 405
//!   curl http://localhost:3000/files/docs/readme.md
//!   curl http://localhost:3000/boom                   # 500, server keeps going
//!   curl http://localhost:3000/.status

use http::StatusCode;
use http::header::{HeaderValue, LOCATION};
use serde::{Deserialize, Serialize};
use trellis::{Config, Dispatcher, Error, Request, ResponseWriter, Router, Server};

#[derive(Serialize)]
struct User<'a> {
    id: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
struct NewUser {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let router = Router::new()
        .get("/users/:id", get_user)
        .post("/users", create_user)
        .delete("/users/:id", delete_user)
        .get("/files/*path", get_file)
        .get("/boom", boom);

    let config = Config { gzip: true, status_service: true, ..Config::default() };
    let dispatcher = Dispatcher::new(router, config)?;

    Server::bind("0.0.0.0:3000")?.serve(dispatcher).await
}

// GET /users/:id
fn get_user(w: &mut ResponseWriter, r: &Request) -> Result<(), Error> {
    let id = r.param("id").unwrap_or("unknown");
    w.write_json(&User { id, name: "alice" })
}

// POST /users → 201 + Location
fn create_user(w: &mut ResponseWriter, r: &Request) -> Result<(), Error> {
    let input: NewUser = match r.decode_json() {
        Ok(input) => input,
        Err(_) => return trellis::error(w, "expected {\"name\": ...}", StatusCode::BAD_REQUEST),
    };
    w.set_header(LOCATION, HeaderValue::from_static("/users/99"));
    w.write_header(StatusCode::CREATED);
    w.write_json(&User { id: "99", name: &input.name })
}

// DELETE /users/:id → 204
fn delete_user(w: &mut ResponseWriter, _r: &Request) {
    w.write_header(StatusCode::NO_CONTENT);
}

// GET /files/*path
fn get_file(w: &mut ResponseWriter, r: &Request) -> Result<(), Error> {
    w.write_json(&serde_json::json!({ "path": r.param("path") }))
}

fn boom(_w: &mut ResponseWriter, _r: &Request) {
    panic!("this handler always fails");
}
