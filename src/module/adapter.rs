//! Field-delimited chat formatting.
//!
//! Inputs are rendered as `[[ ## name ## ]]` sections in the user turn and
//! the model is asked to answer with the output fields in the same layout,
//! followed by `[[ ## completed ## ]]`.

use super::signature::{Field, Signature};
use crate::error::LmError;
use crate::lm::{LmRequest, Message};
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

static FIELD_HEADER: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\[\[ ## (\w+) ## \]\]\s*$"));

const COMPLETED: &str = "completed";

fn header(name: &str) -> String {
    format!("[[ ## {name} ## ]]")
}

fn describe_fields(out: &mut String, fields: &[Field]) {
    for (i, field) in fields.iter().enumerate() {
        let _ = writeln!(out, "{}. `{}` (str): {}", i + 1, field.name, field.desc);
    }
}

/// Renders the system instruction for `signature`.
pub fn system_prompt(signature: &Signature) -> String {
    let mut out = String::new();
    out.push_str("Your input fields are:\n");
    describe_fields(&mut out, &signature.inputs);
    out.push_str("Your output fields are:\n");
    describe_fields(&mut out, &signature.outputs);

    out.push_str(
        "All interactions will be structured in the following way, with the appropriate values filled in.\n\n",
    );
    for field in signature.inputs.iter().chain(&signature.outputs) {
        let _ = writeln!(out, "{}\n{{{}}}\n", header(field.name), field.name);
    }
    let _ = writeln!(out, "{}", header(COMPLETED));

    out.push_str("In adhering to this structure, your objective is: \n");
    let _ = write!(out, "        {}", signature.instructions);
    out
}

/// Renders the user turn carrying the input values.
pub fn user_prompt(signature: &Signature, values: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (name, value) in values {
        let _ = writeln!(out, "{}\n{value}\n", header(name));
    }

    out.push_str("Respond with the corresponding output fields, starting with the field ");
    let names: Vec<String> = signature
        .outputs
        .iter()
        .map(|f| format!("`{}`", header(f.name)))
        .collect();
    out.push_str(&names.join(", then "));
    let _ = write!(
        out,
        ", and then ending with the marker for `{}`.",
        header(COMPLETED)
    );
    out
}

/// Builds the full chat request for one call.
pub fn format_request(signature: &Signature, values: &[(&str, &str)]) -> LmRequest {
    LmRequest {
        messages: vec![
            Message::System(system_prompt(signature)),
            Message::User(user_prompt(signature, values)),
        ],
    }
}

/// Extracts the output fields of `signature` from a completion.
///
/// Unknown sections are ignored; every declared output must be present.
pub fn parse_completion(
    signature: &Signature,
    completion: &str,
) -> Result<HashMap<String, String>, LmError> {
    let re = FIELD_HEADER
        .as_ref()
        .map_err(|e| LmError::InvalidRequest(e.to_string()))?;

    let headers: Vec<(String, usize, usize)> = re
        .captures_iter(completion)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some((name.as_str().to_string(), whole.start(), whole.end()))
        })
        .collect();

    let mut fields = HashMap::new();
    for (i, (name, _, body_start)) in headers.iter().enumerate() {
        let body_end = headers
            .get(i + 1)
            .map_or(completion.len(), |(_, next_start, _)| *next_start);
        if name == COMPLETED || !signature.outputs.iter().any(|f| f.name == name) {
            continue;
        }
        let value = completion
            .get(*body_start..body_end)
            .unwrap_or_default()
            .trim();
        fields.entry(name.clone()).or_insert_with(|| value.to_string());
    }

    for field in &signature.outputs {
        if !fields.contains_key(field.name) {
            tracing::warn!(field = field.name, "completion is missing output field");
            return Err(LmError::MissingOutputField {
                field: field.name.to_string(),
            });
        }
    }

    Ok(fields)
}
