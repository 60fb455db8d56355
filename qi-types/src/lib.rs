use derive_more::Display;
use serde::{Deserialize, Deserializer, Serialize};

pub mod banner;
pub mod category;
pub mod product;
pub mod source;
pub mod text;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
#[serde(from = "String", into = "&'static str")]
pub enum StockStatus {
    #[default]
    #[display("En stock")]
    InStock,
    #[display("Agotado")]
    OutOfStock,
    #[display("Bajo pedido")]
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InStock => "instock",
            Self::OutOfStock => "outofstock",
            Self::OnBackorder => "onbackorder",
        }
    }
}

impl From<&str> for StockStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "outofstock" => Self::OutOfStock,
            "onbackorder" => Self::OnBackorder,
            _ => Self::InStock,
        }
    }
}

impl From<String> for StockStatus {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl From<StockStatus> for &'static str {
    fn from(s: StockStatus) -> Self {
        s.as_str()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
pub enum PhysicalState {
    #[display("Líquido")]
    Liquido,
    #[display("Sólido")]
    Solido,
    #[display("Polvo")]
    Polvo,
    #[display("Granular")]
    Granular,
    #[display("Pasta")]
    Pasta,
    #[display("Gas")]
    Gas,
    #[serde(other)]
    #[display("Desconocido")]
    Unknown,
}

/// Backends are inconsistent about identifiers: the same field may hold a
/// string, a number, a populated document (`{"_id": ...}`) or an extended
/// JSON object id (`{"$oid": ...}`).
pub fn id_from_value(value: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("_id")
            .or_else(|| map.get("id"))
            .or_else(|| map.get("$oid"))
            .and_then(id_from_value),
        other => Some(other.to_string()),
    }
}

pub fn de_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(de)?;
    Ok(id_from_value(&value).unwrap_or_default())
}

pub fn de_opt_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(id_from_value))
}

pub fn de_ids<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(de)?;
    Ok(values
        .unwrap_or_default()
        .iter()
        .filter_map(id_from_value)
        .collect())
}

/// Treats `null` the same as a missing field.
pub fn de_null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}
