use serde_json::{json, Value};
use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_json(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(data) = data {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    detail: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&error_json(message, detail))?);
        }
        OutputFormat::Text => match detail {
            Some(detail) => eprintln!("Error: {} ({})", message, detail),
            None => eprintln!("Error: {}", message),
        },
    }
    Ok(())
}

fn success_json(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });
    if let Some(data) = data {
        response["data"] = data;
    }
    response
}

fn error_json(message: &str, detail: Option<&str>) -> Value {
    let mut response = json!({
        "success": false,
        "error": message
    });
    if let Some(detail) = detail {
        response["detail"] = json!(detail);
    }
    response
}
