use crate::error::CrmlinkError;

pub const STATE_SEPARATOR: char = ':';

/// Pack caller identity into the OAuth `state` parameter.
pub fn pack_state(user_id: &str, org_id: &str) -> String {
    format!("{user_id}{STATE_SEPARATOR}{org_id}")
}

/// Split a `state` parameter back into `(user_id, org_id)`.
///
/// Splits at the first separator only. A user id containing `:` therefore
/// shifts the remainder into the org id; identifiers are not checked for the
/// separator on either side of the round trip.
pub fn parse_state(state: Option<&str>) -> Result<(String, String), CrmlinkError> {
    let state = state.ok_or(CrmlinkError::InvalidState)?;
    let (user_id, org_id) = state
        .split_once(STATE_SEPARATOR)
        .ok_or(CrmlinkError::InvalidState)?;
    Ok((user_id.to_string(), org_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_and_parse_round_trip() {
        let state = pack_state("user-42", "org-7");
        assert_eq!(state, "user-42:org-7");
        assert_eq!(
            parse_state(Some(&state)).unwrap(),
            ("user-42".to_string(), "org-7".to_string())
        );
    }

    #[test]
    fn missing_state_is_invalid() {
        assert!(matches!(parse_state(None), Err(CrmlinkError::InvalidState)));
    }

    #[test]
    fn state_without_separator_is_invalid() {
        assert!(matches!(
            parse_state(Some("user-42")),
            Err(CrmlinkError::InvalidState)
        ));
        assert!(matches!(parse_state(Some("")), Err(CrmlinkError::InvalidState)));
    }

    #[test]
    fn extra_separators_stay_in_org_id() {
        let (user, org) = parse_state(Some("u:org:extra")).unwrap();
        assert_eq!(user, "u");
        assert_eq!(org, "org:extra");
    }

    #[test]
    fn empty_halves_are_accepted() {
        let (user, org) = parse_state(Some(":")).unwrap();
        assert!(user.is_empty());
        assert!(org.is_empty());
    }
}
