//! Text encoding of settings records

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::SettingsError;

/// A value the store can keep in an encrypted slot.
///
/// Needs a text encoding, a default for "nothing stored", and equality for
/// duplicate suppression.
pub trait SettingsRecord:
    Serialize + DeserializeOwned + Default + PartialEq + Clone + Send + Sync + 'static
{
}

impl<T> SettingsRecord for T where
    T: Serialize + DeserializeOwned + Default + PartialEq + Clone + Send + Sync + 'static
{
}

/// Encode a record as JSON text
pub fn encode_record<T: Serialize>(record: &T) -> Result<String, SettingsError> {
    serde_json::to_string(record).map_err(|e| SettingsError::Encode {
        reason: e.to_string(),
    })
}

/// Decode JSON text into a record, failing on malformed input
pub fn decode_record<T: DeserializeOwned>(text: &str) -> Result<T, SettingsError> {
    serde_json::from_str(text).map_err(|e| SettingsError::Decode {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::UserProfile;
    use assert_matches::assert_matches;

    #[test]
    fn test_encode_decode() {
        let profile = UserProfile::named("Grace");
        let text = encode_record(&profile).unwrap();
        assert_eq!(decode_record::<UserProfile>(&text).unwrap(), profile);
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert_matches!(
            decode_record::<UserProfile>("{\"name\":"),
            Err(SettingsError::Decode { .. })
        );
        assert_matches!(
            decode_record::<UserProfile>("[1,2,3]"),
            Err(SettingsError::Decode { .. })
        );
        assert_matches!(
            decode_record::<UserProfile>(""),
            Err(SettingsError::Decode { .. })
        );
    }
}
