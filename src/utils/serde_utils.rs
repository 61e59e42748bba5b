use serde::{Deserialize, Deserializer};

// The admin frontend likes to send empty strings for fields
// the editor left blank. Those should become NULL in database,
// so DTO conversions run optional strings through this:
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.is_empty()
      { None } else { Some(s) },
    None => None
  }
}

// Double Option trick for update requests: a missing key means
// "don't touch the field", an explicit null means "clear it".
// To be used with:
// #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
pub fn deserialize_null_value<'de, D, T>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}
