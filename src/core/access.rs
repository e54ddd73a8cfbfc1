// Access gate - the single permission predicate for group-scoped
// mutations. Administrators bypass every check; everyone else needs the
// role derived from the group's name.

use crate::models::{Group, Identity};

/// Grants every group-scoped permission.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Required to enter the admin surface at all; granted by an
/// administrator once an account is approved.
pub const ROLE_ACCESS: &str = "ROLE_ACCESS";

/// Whether `user` may act on `group`'s resources.
///
/// True when the user holds [`ROLE_ADMIN`], or holds exactly the group's
/// derived role. Absence of either side denies.
pub fn can_act(user: Option<&Identity>, group: Option<&Group>) -> bool {
    let (user, group) = match (user, group) {
        (Some(user), Some(group)) => (user, group),
        _ => return false,
    };

    user.has_role(ROLE_ADMIN) || user.has_role(&group.role)
}

/// Whether `user` may use the admin surface at all.
pub fn can_enter_admin(user: &Identity) -> bool {
    user.has_role(ROLE_ADMIN) || user.has_role(ROLE_ACCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(role: &str) -> Group {
        Group {
            id: 1,
            name: "Marketing".into(),
            role: role.into(),
        }
    }

    fn user(roles: &[&str]) -> Identity {
        Identity::new(1, roles.iter().map(|r| r.to_string()))
    }

    #[test]
    fn admin_can_act_on_any_group() {
        let admin = user(&[ROLE_ADMIN]);
        assert!(can_act(Some(&admin), Some(&group("ROLE_MARKETING"))));
        assert!(can_act(Some(&admin), Some(&group("ROLE_ANYTHING_ELSE"))));
    }

    #[test]
    fn matching_group_role_grants_access() {
        let member = user(&[ROLE_ACCESS, "ROLE_MARKETING"]);
        assert!(can_act(Some(&member), Some(&group("ROLE_MARKETING"))));
    }

    #[test]
    fn missing_group_role_denies() {
        let outsider = user(&[ROLE_ACCESS, "ROLE_SALES"]);
        assert!(!can_act(Some(&outsider), Some(&group("ROLE_MARKETING"))));
    }

    #[test]
    fn role_match_is_exact_not_substring() {
        let near_miss = user(&["ROLE_MARKETING_TEAM"]);
        assert!(!can_act(Some(&near_miss), Some(&group("ROLE_MARKETING"))));
    }

    #[test]
    fn absent_user_or_group_denies() {
        let admin = user(&[ROLE_ADMIN]);
        assert!(!can_act(None, Some(&group("ROLE_MARKETING"))));
        assert!(!can_act(Some(&admin), None));
        assert!(!can_act(None, None));
    }

    #[test]
    fn admin_surface_requires_access_or_admin() {
        assert!(can_enter_admin(&user(&[ROLE_ACCESS])));
        assert!(can_enter_admin(&user(&[ROLE_ADMIN])));
        assert!(!can_enter_admin(&user(&["ROLE_USER"])));
    }
}
