//! Parsing of the model's first-pass reply.
//!
//! A reply is a tool request only if, after trimming whitespace and at most
//! one surrounding Markdown code fence, it is a JSON object with a
//! `tool_call` key:
//!
//! ```json
//! {"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": 5}}}
//! ```
//!
//! Anything else is the final answer and is returned verbatim.

use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

use super::{
    GET_ORDER_DETAILS, GET_PRODUCT_DETAILS, OrderDetailsParams, ProductDetailsParams, ToolCall,
};

/// What the model's first-pass reply means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Plain answer text, to be shown to the customer as is.
    Reply(String),
    /// A request to run a tool before answering.
    ToolCall(ToolCall),
}

/// A `tool_call` that is present but cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("tool_call is not an object")]
    ToolCallNotObject,

    #[error("tool_call has no string function_name")]
    MissingFunctionName,

    #[error("tool_call parameters is not an object")]
    ParametersNotObject,
}

/// Interpret a first-pass reply.
///
/// # Errors
///
/// Returns a [`DirectiveError`] if the reply carries a structurally malformed
/// `tool_call`.
pub fn parse_reply(text: &str) -> Result<Directive, DirectiveError> {
    let candidate = strip_code_fence(text.trim());

    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(candidate) else {
        return Ok(Directive::Reply(text.to_string()));
    };
    let Some(tool_call) = object.remove("tool_call") else {
        return Ok(Directive::Reply(text.to_string()));
    };

    let Value::Object(tool_call) = tool_call else {
        return Err(DirectiveError::ToolCallNotObject);
    };

    let function_name = match tool_call.get("function_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim(),
        _ => return Err(DirectiveError::MissingFunctionName),
    };

    let empty = Map::new();
    let parameters = match tool_call.get("parameters") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(parameters)) => parameters,
        Some(_) => return Err(DirectiveError::ParametersNotObject),
    };

    Ok(Directive::ToolCall(to_tool_call(function_name, parameters)))
}

fn to_tool_call(function_name: &str, parameters: &Map<String, Value>) -> ToolCall {
    match function_name {
        GET_PRODUCT_DETAILS => ToolCall::ProductDetails(ProductDetailsParams {
            product_id: parse_id(parameters.get("product_id")),
            product_name: parameters
                .get("product_name")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        }),
        GET_ORDER_DETAILS => ToolCall::OrderDetails(OrderDetailsParams {
            order_id: parse_id(parameters.get("order_id")),
            supplied_user_id: parameters.get("user_id").map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }),
        other => ToolCall::Unsupported {
            function_name: other.to_string(),
        },
    }
}

/// Accept a JSON integer, an integral float such as `5.0`, or a numeric string.
fn parse_id<T>(value: Option<&Value>) -> Option<T>
where
    T: From<i32> + FromStr,
{
    match value? {
        Value::Number(number) => number
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .or_else(|| number.as_f64().and_then(integral_i32))
            .map(T::from),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral_i32(value: f64) -> Option<i32> {
    let in_range = (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value);
    (in_range && value.fract() == 0.0).then_some(value as i32)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return text;
    };

    inner.strip_prefix("json").unwrap_or(inner).trim()
}

#[cfg(test)]
mod tests {
    use shopchat_core::{OrderId, ProductId};

    use super::*;

    #[test]
    fn test_plain_text_is_reply() {
        let directive = parse_reply("Hello! How can I help you today?").expect("parse");
        assert_eq!(
            directive,
            Directive::Reply("Hello! How can I help you today?".to_string())
        );
    }

    #[test]
    fn test_reply_is_verbatim() {
        let text = "  Sure thing.\n";
        assert_eq!(
            parse_reply(text).expect("parse"),
            Directive::Reply(text.to_string())
        );
    }

    #[test]
    fn test_json_without_tool_call_is_reply() {
        let text = r#"{"answer": "42"}"#;
        assert_eq!(
            parse_reply(text).expect("parse"),
            Directive::Reply(text.to_string())
        );

        let text = "[1, 2, 3]";
        assert_eq!(
            parse_reply(text).expect("parse"),
            Directive::Reply(text.to_string())
        );
    }

    #[test]
    fn test_order_details_with_numeric_string() {
        let text = r#"{"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": "12"}}}"#;
        let directive = parse_reply(text).expect("parse");

        assert_eq!(
            directive,
            Directive::ToolCall(ToolCall::OrderDetails(OrderDetailsParams {
                order_id: Some(OrderId::new(12)),
                supplied_user_id: None,
            }))
        );
    }

    #[test]
    fn test_order_details_records_supplied_user_id() {
        let text = r#"{"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": 5, "user_id": 99}}}"#;
        let Directive::ToolCall(ToolCall::OrderDetails(params)) = parse_reply(text).expect("parse")
        else {
            panic!("expected order details");
        };

        assert_eq!(params.order_id, Some(OrderId::new(5)));
        assert_eq!(params.supplied_user_id.as_deref(), Some("99"));
    }

    #[test]
    fn test_product_details_in_code_fence() {
        let text = "```json\n{\"tool_call\": {\"function_name\": \"get_product_details\", \"parameters\": {\"product_name\": \"denim jacket\"}}}\n```";
        let directive = parse_reply(text).expect("parse");

        assert_eq!(
            directive,
            Directive::ToolCall(ToolCall::ProductDetails(ProductDetailsParams {
                product_id: None,
                product_name: Some("denim jacket".to_string()),
            }))
        );
    }

    #[test]
    fn test_bare_code_fence() {
        let text = "```\n{\"tool_call\": {\"function_name\": \"get_product_details\", \"parameters\": {\"product_id\": 4}}}\n```";
        let Directive::ToolCall(ToolCall::ProductDetails(params)) =
            parse_reply(text).expect("parse")
        else {
            panic!("expected product details");
        };
        assert_eq!(params.product_id, Some(ProductId::new(4)));
    }

    #[test]
    fn test_unparseable_id_is_absent() {
        let text = r#"{"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": "abc"}}}"#;
        let Directive::ToolCall(ToolCall::OrderDetails(params)) = parse_reply(text).expect("parse")
        else {
            panic!("expected order details");
        };
        assert_eq!(params.order_id, None);
    }

    #[test]
    fn test_out_of_range_id_is_absent() {
        let text = r#"{"tool_call": {"function_name": "get_order_details", "parameters": {"order_id": 99999999999}}}"#;
        let Directive::ToolCall(ToolCall::OrderDetails(params)) = parse_reply(text).expect("parse")
        else {
            panic!("expected order details");
        };
        assert_eq!(params.order_id, None);
    }

    #[test]
    fn test_integral_float_id_is_accepted() {
        let order_id = |raw: &str| {
            let text = format!(
                r#"{{"tool_call": {{"function_name": "get_order_details", "parameters": {{"order_id": {raw}}}}}}}"#
            );
            match parse_reply(&text).expect("parse") {
                Directive::ToolCall(ToolCall::OrderDetails(params)) => params.order_id,
                other => panic!("expected order details, got {other:?}"),
            }
        };

        assert_eq!(order_id("5.0"), Some(OrderId::new(5)));
        assert_eq!(order_id("5.5"), None);
        assert_eq!(order_id("1e12"), None);
    }

    #[test]
    fn test_unknown_function_is_unsupported() {
        let text = r#"{"tool_call": {"function_name": "get_weather", "parameters": {}}}"#;
        assert_eq!(
            parse_reply(text).expect("parse"),
            Directive::ToolCall(ToolCall::Unsupported {
                function_name: "get_weather".to_string()
            })
        );
    }

    #[test]
    fn test_missing_parameters_defaults_to_empty() {
        let text = r#"{"tool_call": {"function_name": "get_order_details"}}"#;
        assert_eq!(
            parse_reply(text).expect("parse"),
            Directive::ToolCall(ToolCall::OrderDetails(OrderDetailsParams::default()))
        );
    }

    #[test]
    fn test_malformed_tool_calls() {
        assert_eq!(
            parse_reply(r#"{"tool_call": "get_order_details"}"#),
            Err(DirectiveError::ToolCallNotObject)
        );
        assert_eq!(
            parse_reply(r#"{"tool_call": {"parameters": {}}}"#),
            Err(DirectiveError::MissingFunctionName)
        );
        assert_eq!(
            parse_reply(r#"{"tool_call": {"function_name": 3}}"#),
            Err(DirectiveError::MissingFunctionName)
        );
        assert_eq!(
            parse_reply(r#"{"tool_call": {"function_name": "get_order_details", "parameters": [5]}}"#),
            Err(DirectiveError::ParametersNotObject)
        );
    }
}
