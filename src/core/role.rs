// Role derivation - maps a group name to its canonical access role.

/// Derive the canonical role identifier for a group name.
///
/// Every character that is not an ASCII letter, digit or whitespace is
/// stripped; the remainder is uppercased; each whitespace run collapses
/// to a single underscore; the result is prefixed with `ROLE_`.
///
/// Total and deterministic: an empty or fully-stripped name yields
/// `ROLE_`.
pub fn derive_role(name: &str) -> String {
    let mut role = String::with_capacity(name.len() + 5);
    role.push_str("ROLE_");

    let mut in_whitespace_run = false;
    for c in name.chars() {
        if c.is_whitespace() {
            in_whitespace_run = true;
        } else if c.is_ascii_alphanumeric() {
            if in_whitespace_run {
                role.push('_');
                in_whitespace_run = false;
            }
            role.push(c.to_ascii_uppercase());
        }
        // Any other character is stripped without ending the run.
    }
    if in_whitespace_run {
        role.push('_');
    }

    role
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_role_from_plain_name() {
        assert_eq!(derive_role("Marketing"), "ROLE_MARKETING");
    }

    #[test]
    fn strips_punctuation_and_joins_words() {
        assert_eq!(derive_role("Marketing Team!"), "ROLE_MARKETING_TEAM");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(derive_role("a  \t b"), "ROLE_A_B");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(derive_role("Floor 2 Lobby"), "ROLE_FLOOR_2_LOBBY");
    }

    #[test]
    fn stripped_chars_do_not_split_words() {
        assert_eq!(derive_role("caf\u{e9}s"), "ROLE_CAFS");
    }

    #[test]
    fn empty_name_yields_bare_prefix() {
        assert_eq!(derive_role(""), "ROLE_");
        assert_eq!(derive_role("!!!"), "ROLE_");
    }
}
