//! JSON encoding for floats that keeps non-finite sentinels.
//!
//! `serde_json` writes NaN and infinities as `null`, which reads back as an
//! absent value. These serializers emit `"NaN"`, `"Infinity"` and
//! `"-Infinity"` instead; finite values stay plain numbers.

use serde::Serializer;

pub const NAN: &str = "NaN";
pub const INFINITY: &str = "Infinity";
pub const NEG_INFINITY: &str = "-Infinity";

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    let v = *value;
    if v.is_nan() {
        serializer.serialize_str(NAN)
    } else if v == f64::INFINITY {
        serializer.serialize_str(INFINITY)
    } else if v == f64::NEG_INFINITY {
        serializer.serialize_str(NEG_INFINITY)
    } else {
        serializer.serialize_f64(v)
    }
}

/// For `Option<f64>` fields: `None` stays `null`.
pub fn serialize_option<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize(v, serializer),
        None => serializer.serialize_none(),
    }
}
