//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 document for the ECHOES API.
//!
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use echoes_api::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn write_spec(api_doc: &utoipa::openapi::OpenApi, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!(
        "OpenAPI specification with {} paths generated at {}",
        api_doc.paths.paths.len(),
        path
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    write_spec(&ApiDoc::openapi(), &output)
}
