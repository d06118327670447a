//! Minor-unit money. Feed JSON carries decimal amounts; everything past the
//! boundary is integer cents.

/// Serde adapter: decimal JSON number <-> cents.
pub mod decimal_cents {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cents: &i64, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_f64(*cents as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
        let value = f64::deserialize(de)?;
        Ok((value * 100.0).round() as i64)
    }
}

/// Render cents in the CRM's `"123.45"` string form.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
