use serde::Serialize;

use super::error::MalformedLabelError;
use super::reference::ReferenceEntity;

pub const SEPARATOR: &str = " - ";

/// `"<id> - <display fields joined by spaces>"`.
pub fn encode(entity: &ReferenceEntity) -> String {
    format!("{}{}{}", entity.id, SEPARATOR, entity.display.join(" "))
}

/// Recovers the id prefix. Display text may itself contain the separator;
/// only the first occurrence delimits the id.
pub fn decode(label: &str) -> Result<i64, MalformedLabelError> {
    let malformed = || MalformedLabelError {
        label: label.to_string(),
    };
    let (head, _) = label.split_once(SEPARATOR).ok_or_else(malformed)?;
    head.parse::<i64>().map_err(|_| malformed())
}

pub fn decode_all<'a, I>(labels: I) -> Result<Vec<i64>, MalformedLabelError>
where
    I: IntoIterator<Item = &'a str>,
{
    labels.into_iter().map(decode).collect()
}

/// Picker option as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerOption {
    pub id: i64,
    pub label: String,
}

impl From<&ReferenceEntity> for PickerOption {
    fn from(entity: &ReferenceEntity) -> Self {
        Self {
            id: entity.id,
            label: encode(entity),
        }
    }
}
