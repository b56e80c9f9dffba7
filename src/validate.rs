use crate::ename::EName;
use crate::entry::eq_ignore_case;
use crate::errors::{NameError, Result};

/// Characters that may not appear in a name.
pub const INVALID_NAME_CHARACTERS: &str = "\"' ,\n\r\t";

/// Characters that may not appear in an object name, a stricter superset.
pub const INVALID_OBJECT_NAME_CHARACTERS: &str = "\"' ,/.:|&!~\n\r\t@#(){}[]=;^%$`";

/// Checks that `text` can be used as a user-visible name.
///
/// The empty string and `None` are reserved for the null name.
pub fn validate_name(text: &str, invalid: &str) -> Result<()> {
    if text.is_empty() || eq_ignore_case(text, EName::None.as_str()) {
        return Err(NameError::ReservedName(text.to_owned()));
    }

    match text.chars().find(|c| invalid.contains(*c)) {
        Some(found) => Err(NameError::InvalidCharacter {
            name: text.to_owned(),
            found,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_names() {
        validate_name("PlayerStart_3", INVALID_NAME_CHARACTERS).unwrap();
        validate_name("Größe", INVALID_OBJECT_NAME_CHARACTERS).unwrap();
    }

    #[test]
    fn rejects_listed_characters() {
        let err = validate_name("Bad Name", INVALID_NAME_CHARACTERS).unwrap_err();
        assert!(matches!(err, NameError::InvalidCharacter { found: ' ', .. }));

        validate_name("Path.Name", INVALID_NAME_CHARACTERS).unwrap();
        let err = validate_name("Path.Name", INVALID_OBJECT_NAME_CHARACTERS).unwrap_err();
        assert!(matches!(err, NameError::InvalidCharacter { found: '.', .. }));
    }

    #[test]
    fn none_and_empty_are_reserved() {
        assert!(matches!(
            validate_name("", INVALID_NAME_CHARACTERS),
            Err(NameError::ReservedName(_))
        ));
        assert!(matches!(
            validate_name("NONE", INVALID_NAME_CHARACTERS),
            Err(NameError::ReservedName(_))
        ));
    }
}
