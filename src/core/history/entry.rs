use crate::core::prelude::*;
use crate::util::vm_float;

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// One recorded operation. Serialises in the same camelCase shape the history has always been
/// stored in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Older histories stored fractional or string ids; those load as 0 and are re-keyed by the
    /// store.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub operation: String,
    pub input_a: Value,
    pub input_b: Option<Value>,
    pub result: Value,
    /// Milliseconds.
    #[serde(default)]
    pub duration: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredId {
    Integer(u64),
    Number(f64),
    Text(String),
}

fn deserialize_id<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match StoredId::deserialize(deserializer)? {
        StoredId::Integer(id) => id,
        StoredId::Number(_) => 0,
        StoredId::Text(id) => id.trim().parse().unwrap_or(0),
    })
}

impl HistoryEntry {
    pub fn from_event(id: u64, timestamp: OffsetDateTime, event: &OperationEvent) -> Self {
        Self {
            id,
            timestamp,
            kind: event.kind,
            operation: event.operation.clone(),
            input_a: event.input_a,
            input_b: event.input_b,
            result: event.result,
            duration: event.duration_ms,
        }
    }

    pub fn display_name(&self) -> &str {
        operation_display_name(&self.operation)
    }

    pub fn formatted_result(&self) -> String {
        format_result(&self.result, &self.operation)
    }

    /// The text the search box matches against.
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.display_name(),
            self.kind,
            format_input(&self.input_a),
            self.input_b.as_ref().map(format_input).unwrap_or_default(),
            self.formatted_result()
        )
        .to_lowercase()
    }

    /// The result as the engines produced it, with angles marked as such.
    pub fn op_result(&self) -> OpResult {
        match self.result {
            Value::Scalar(value) if self.operation == "angle" => OpResult::angle(value),
            Value::Scalar(value) => OpResult::scalar(value),
            Value::Vector(v) => OpResult::Vector(v),
            Value::Matrix(m) => OpResult::Matrix(m),
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (date, time) = super::csv_file::date_and_time(self.timestamp).map_err(|_| fmt::Error)?;
        writeln!(
            f,
            "[{}] {} {}  {time} - {date}",
            self.id,
            type_label(self.kind),
            self.display_name()
        )?;
        writeln!(f, "  Entrada A: {}", format_input(&self.input_a))?;
        if let Some(input_b) = &self.input_b {
            writeln!(f, "  Entrada B: {}", format_input(input_b))?;
        }
        write!(f, "  Resultado: {}", self.formatted_result().replace('\n', "\n             "))?;
        if self.duration > 0.0 {
            write!(f, "\n  {:.3}ms", self.duration)?;
        }
        Ok(())
    }
}

/// The name shown to users for an operation. Unknown names are shown as they are.
pub fn operation_display_name(operation: &str) -> &str {
    match operation {
        "sum" => "Suma",
        "subtract" => "Resta",
        "multiply" => "Multiplicación",
        "cross" => "Producto Cruz",
        "magnitude" => "Magnitud",
        "normalize" => "Normalización",
        "dot" => "Producto Punto",
        "angle" => "Ángulo entre Vectores",
        "determinant" => "Determinante",
        other => other,
    }
}

pub fn type_label(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Vector => "VECTOR",
        OperationKind::Matrix => "MATRIX",
    }
}

pub fn format_input(value: &Value) -> String {
    match value {
        Value::Scalar(x) => vm_float::format_plain(*x),
        Value::Vector(v) => v.to_plain_string(),
        Value::Matrix(m) => m.to_plain_string(),
    }
}

pub fn format_result(value: &Value, operation: &str) -> String {
    match (value, operation) {
        (Value::Scalar(x), "magnitude" | "determinant") => format!("{x:.4}"),
        (Value::Scalar(x), "angle") => format!("{x:.2}°"),
        (Value::Scalar(x), _) => format!("{x:.6}"),
        (Value::Vector(v), _) => format!("({:.4}, {:.4}, {:.4})", v.x, v.y, v.z),
        (Value::Matrix(m), _) => m.to_plain_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn entry(operation: &str, result: Value) -> HistoryEntry {
        HistoryEntry {
            id: 42,
            timestamp: datetime!(2024-03-05 14:07:09 UTC),
            kind: OperationKind::Vector,
            operation: operation.to_string(),
            input_a: Value::Vector(Vec3::new(3.0, 4.0, 2.0)),
            input_b: Some(Value::Vector(Vec3::new(1.0, -2.0, 5.0))),
            result,
            duration: 0.25,
        }
    }

    #[test]
    fn json_shape() {
        let e = entry("dot", Value::Scalar(5.0));
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["id"], 42);
        assert_eq!(json["timestamp"], "2024-03-05T14:07:09Z");
        assert_eq!(json["type"], "vector");
        assert_eq!(json["inputA"]["x"], 3.0);
        assert_eq!(json["inputB"]["z"], 5.0);
        assert_eq!(json["result"], 5.0);
        assert_eq!(json["duration"], 0.25);

        let decoded: HistoryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, e);
    }

    #[test]
    fn missing_duration_defaults_to_zero() {
        let json = r#"{"id":1,"timestamp":"2024-03-05T14:07:09.123Z","type":"matrix",
            "operation":"determinant","inputA":[[1,2],[3,4]],"inputB":null,"result":-2}"#;
        let e: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.duration, 0.0);
        assert_eq!(e.input_b, None);
        assert_eq!(e.kind, OperationKind::Matrix);
        assert_eq!(e.formatted_result(), "-2.0000");
    }

    #[test]
    fn legacy_ids_load_as_zero() {
        let json = |id: &str| {
            format!(
                r#"{{"id":{id},"timestamp":"2024-04-05T19:21:18.901Z","type":"vector",
                "operation":"dot","inputA":{{"x":3,"y":4,"z":2}},"inputB":{{"x":1,"y":-2,"z":5}},
                "result":5,"duration":0.1}}"#
            )
        };
        let id_of = |id: &str| serde_json::from_str::<HistoryEntry>(&json(id)).unwrap().id;
        assert_eq!(id_of("1712345678901.4321"), 0);
        assert_eq!(id_of("-3"), 0);
        assert_eq!(id_of(r#""1712345678901.4321""#), 0);
        assert_eq!(id_of(r#""77""#), 77);
        assert_eq!(id_of("1712345678901"), 1_712_345_678_901);
        assert!(serde_json::from_str::<HistoryEntry>(&json("null")).is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(operation_display_name("sum"), "Suma");
        assert_eq!(operation_display_name("angle"), "Ángulo entre Vectores");
        assert_eq!(operation_display_name("transpose"), "transpose");
        assert_eq!(type_label(OperationKind::Matrix), "MATRIX");
    }

    #[test]
    fn result_formatting() {
        assert_eq!(format_result(&Value::Scalar(5.385_164_8), "magnitude"), "5.3852");
        assert_eq!(format_result(&Value::Scalar(90.0), "angle"), "90.00°");
        assert_eq!(format_result(&Value::Scalar(5.0), "dot"), "5.000000");
        assert_eq!(
            format_result(&Value::Vector(Vec3::new(4.0, 2.0, 7.0)), "sum"),
            "(4.0000, 2.0000, 7.0000)"
        );
        let m: Matrix = "1,2;3,4".parse().unwrap();
        assert_eq!(format_result(&Value::Matrix(m), "sum"), "[[1, 2], [3, 4]]");
        assert_eq!(format_input(&Value::Matrix(m)), "[[1, 2], [3, 4]]");
    }

    #[test]
    fn search_text() {
        let e = entry("cross", Value::Vector(Vec3::new(24.0, -13.0, -10.0)));
        assert_eq!(
            e.search_text(),
            "producto cruz vector (3, 4, 2) (1, -2, 5) (24.0000, -13.0000, -10.0000)"
        );
    }

    #[test]
    fn op_result_marks_angles() {
        assert_eq!(entry("angle", Value::Scalar(45.0)).op_result(), OpResult::angle(45.0));
        assert_eq!(entry("dot", Value::Scalar(5.0)).op_result(), OpResult::scalar(5.0));
    }

    #[test]
    fn display() {
        let text = entry("dot", Value::Scalar(5.0)).to_string();
        assert_eq!(
            text,
            "[42] VECTOR Producto Punto  14:07:09 - 05/03/2024\n  \
             Entrada A: (3, 4, 2)\n  \
             Entrada B: (1, -2, 5)\n  \
             Resultado: 5.000000\n  \
             0.250ms"
        );
    }
}
