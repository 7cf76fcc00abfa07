use crate::error::RpcError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::BTreeMap;
use xml::reader::{EventReader, XmlEvent};

const XML_DECLARATION: &str = r#"<?xml version="1.0"?>"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Boolean(bool),
    String(String),
    Double(f64),
    DateTime(String),
    Base64(Vec<u8>),
    Struct(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    pub fn member(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|members| members.get(name))
    }

    // Containers, nil and base64 carry no text.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Int(value) => Some(value.to_string()),
            Value::Boolean(value) => Some(bool_text(*value).to_string()),
            Value::String(value) | Value::DateTime(value) => Some(value.clone()),
            Value::Double(value) => Some(value.to_string()),
            Value::Base64(_) | Value::Struct(_) | Value::Array(_) | Value::Nil => None,
        }
    }

    pub fn encode_into(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(value) => push_scalar(out, "int", &value.to_string()),
            Value::Boolean(value) => push_scalar(out, "boolean", bool_text(*value)),
            Value::String(value) => push_scalar(out, "string", value),
            Value::Double(value) => push_scalar(out, "double", &value.to_string()),
            Value::DateTime(value) => push_scalar(out, "dateTime.iso8601", value),
            Value::Base64(bytes) => push_scalar(out, "base64", &STANDARD.encode(bytes)),
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    out.push_str("<member><name>");
                    out.push_str(&html_escape::encode_text(name));
                    out.push_str("</name>");
                    value.encode_into(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Array(values) => {
                out.push_str("<array><data>");
                for value in values {
                    value.encode_into(out);
                }
                out.push_str("</data></array>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn push_scalar(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&html_escape::encode_text(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method: String,
    pub params: Vec<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn encode(&self) -> String {
        let mut out = String::from(XML_DECLARATION);
        out.push_str("<methodCall><methodName>");
        out.push_str(&html_escape::encode_text(&self.method));
        out.push_str("</methodName>");
        if !self.params.is_empty() {
            out.push_str("<params>");
            for param in &self.params {
                out.push_str("<param>");
                param.encode_into(&mut out);
                out.push_str("</param>");
            }
            out.push_str("</params>");
        }
        out.push_str("</methodCall>");
        out
    }
}

pub fn decode_response(xml: &str) -> Result<Value, RpcError> {
    let root = parse_document(xml)?;
    if root.name != "methodResponse" {
        return Err(RpcError::Shape(format!(
            "expected methodResponse, found {}",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let value = fault
            .child("value")
            .ok_or_else(|| RpcError::Shape("fault without value".to_string()))
            .and_then(decode_value)?;
        let code = value
            .member("faultCode")
            .and_then(Value::as_i64)
            .ok_or_else(|| RpcError::Shape("fault without int faultCode".to_string()))?;
        let message = value
            .member("faultString")
            .and_then(Value::to_text)
            .unwrap_or_default();
        return Err(RpcError::Fault { code, message });
    }

    let value = root
        .child("params")
        .and_then(|params| params.child("param"))
        .and_then(|param| param.child("value"))
        .ok_or_else(|| RpcError::Shape("response without params/param/value".to_string()))?;
    decode_value(value)
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }
}

fn parse_document(xml: &str) -> Result<Element, RpcError> {
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    for event in EventReader::from_str(xml) {
        match event.map_err(|err| RpcError::Xml(err.to_string()))? {
            XmlEvent::StartElement { name, .. } => stack.push(Element {
                name: name.local_name,
                ..Element::default()
            }),
            XmlEvent::EndElement { .. } => {
                let element = stack
                    .pop()
                    .ok_or_else(|| RpcError::Xml("unbalanced end tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) | XmlEvent::CData(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| RpcError::Xml("empty document".to_string()))
}

fn decode_value(value: &Element) -> Result<Value, RpcError> {
    let Some(typed) = value.children.first() else {
        return Ok(Value::String(value.text.clone()));
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "string" => Ok(Value::String(text.to_string())),
        "int" | "i4" | "i8" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|err| RpcError::Shape(format!("invalid int {text:?}: {err}"))),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Boolean(true)),
            "0" | "false" => Ok(Value::Boolean(false)),
            other => Err(RpcError::Shape(format!("invalid boolean {other:?}"))),
        },
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|err| RpcError::Shape(format!("invalid double {text:?}: {err}"))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|err| RpcError::Shape(format!("invalid base64: {err}")))
        }
        "nil" => Ok(Value::Nil),
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|child| child.name == "member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| RpcError::Shape("struct member without name".to_string()))?;
                let value = member.child("value").ok_or_else(|| {
                    RpcError::Shape(format!("struct member {} without value", name.text))
                })?;
                members.insert(name.text.clone(), decode_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        "array" => {
            let data = typed
                .child("data")
                .ok_or_else(|| RpcError::Shape("array without data".to_string()))?;
            data.children
                .iter()
                .filter(|child| child.name == "value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        other => Err(RpcError::Shape(format!("unknown value type {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_call_without_params() {
        let body = MethodCall::new("supervisor.getAllProcessInfo").encode();
        assert_eq!(
            body,
            r#"<?xml version="1.0"?><methodCall><methodName>supervisor.getAllProcessInfo</methodName></methodCall>"#
        );
    }

    #[test]
    fn encodes_string_param() {
        let body = MethodCall::new("supervisor.startProcess")
            .with_param("worker-2")
            .encode();
        assert_eq!(
            body,
            r#"<?xml version="1.0"?><methodCall><methodName>supervisor.startProcess</methodName><params><param><value><string>worker-2</string></value></param></params></methodCall>"#
        );
    }

    #[test]
    fn escapes_markup_in_params() {
        let body = MethodCall::new("supervisor.stopProcess")
            .with_param("a<b&c")
            .encode();
        assert!(body.contains("<string>a&lt;b&amp;c</string>"));
    }

    #[test]
    fn encodes_nested_values() {
        let mut members = BTreeMap::new();
        members.insert("wait".to_string(), Value::Boolean(true));
        members.insert("ids".to_string(), Value::Array(vec![Value::Int(1), Value::Nil]));
        let body = MethodCall::new("x").with_param(Value::Struct(members)).encode();
        assert!(body.contains(
            "<struct><member><name>ids</name><value><array><data><value><int>1</int></value><value><nil/></value></data></array></value></member><member><name>wait</name><value><boolean>1</boolean></value></member></struct>"
        ));
    }

    #[test]
    fn decodes_struct_members_regardless_of_order() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value><struct>
        <member><name>statename</name><value><string>RUNNING</string></value></member>
        <member><name>pid</name><value><int>42</int></value></member>
        <member><name>name</name><value>web</value></member>
      </struct></value>
    </param>
  </params>
</methodResponse>"#;
        let value = decode_response(xml).expect("decode failed");
        assert_eq!(value.member("name").and_then(Value::as_str), Some("web"));
        assert_eq!(value.member("statename").and_then(Value::as_str), Some("RUNNING"));
        assert_eq!(value.member("pid").and_then(Value::as_i64), Some(42));
    }

    #[test]
    fn decodes_typed_scalars() {
        let xml = r#"<methodResponse><params><param><value><array><data>
            <value><i4>-3</i4></value>
            <value><boolean>0</boolean></value>
            <value><double>1.5</double></value>
            <value><dateTime.iso8601>20240101T10:00:00</dateTime.iso8601></value>
            <value><base64>aGVs
bG8=</base64></value>
            <value><string>a &amp; b</string></value>
            <value><nil/></value>
        </data></array></value></param></params></methodResponse>"#;
        let value = decode_response(xml).expect("decode failed");
        assert_eq!(
            value.as_array().expect("array"),
            &[
                Value::Int(-3),
                Value::Boolean(false),
                Value::Double(1.5),
                Value::DateTime("20240101T10:00:00".to_string()),
                Value::Base64(b"hello".to_vec()),
                Value::String("a & b".to_string()),
                Value::Nil,
            ]
        );
    }

    #[test]
    fn untyped_value_keeps_whitespace() {
        let xml = "<methodResponse><params><param><value> padded </value></param></params></methodResponse>";
        let value = decode_response(xml).expect("decode failed");
        assert_eq!(value, Value::String(" padded ".to_string()));
    }

    #[test]
    fn decodes_fault() {
        let xml = r#"<?xml version="1.0"?>
<methodResponse><fault><value><struct>
  <member><name>faultCode</name><value><int>60</int></value></member>
  <member><name>faultString</name><value><string>ALREADY_STARTED: web</string></value></member>
</struct></value></fault></methodResponse>"#;
        let err = decode_response(xml).expect_err("fault expected");
        assert_eq!(
            err,
            RpcError::Fault {
                code: 60,
                message: "ALREADY_STARTED: web".to_string(),
            }
        );
    }

    #[test]
    fn fault_without_int_code_is_a_shape_error() {
        for code in ["", "<member><name>faultCode</name><value><string>60</string></value></member>"] {
            let xml = format!(
                "<methodResponse><fault><value><struct>{code}<member><name>faultString</name><value>BAD_NAME</value></member></struct></value></fault></methodResponse>"
            );
            let err = decode_response(&xml).expect_err("error expected");
            assert_eq!(err, RpcError::Shape("fault without int faultCode".to_string()));
        }
    }

    #[test]
    fn datetime_text_is_trimmed() {
        let xml = "<methodResponse><params><param><value><dateTime.iso8601> 2024 </dateTime.iso8601></value></param></params></methodResponse>";
        let value = decode_response(xml).expect("decode failed");
        assert_eq!(value.to_text().as_deref(), Some("2024"));
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = decode_response("<methodResponse><params>").expect_err("error expected");
        assert!(matches!(err, RpcError::Xml(_)));
    }

    #[test]
    fn rejects_unexpected_root() {
        let err = decode_response("<html><body>proxy error</body></html>").expect_err("error expected");
        assert!(matches!(err, RpcError::Shape(_)));
    }

    #[test]
    fn rejects_member_without_value() {
        let xml = "<methodResponse><params><param><value><struct><member><name>name</name></member></struct></value></param></params></methodResponse>";
        let err = decode_response(xml).expect_err("error expected");
        assert!(matches!(err, RpcError::Shape(_)));
    }
}
