use super::*;

#[test]
fn ids_match_permission_tiers() {
    assert_eq!(Role::Admin.id(), 1);
    assert_eq!(Role::Observer.id(), 2);
    assert_eq!(Role::FieldStaff.id(), 3);
}

#[test]
fn from_id_inverts_id() {
    for role in Role::ALL {
        assert_eq!(Role::from_id(role.id()), Ok(role));
    }
}

#[test]
fn from_id_rejects_out_of_range() {
    assert!(Role::from_id(0).is_err());
    assert!(Role::from_id(4).is_err());
    assert!(Role::from_id(255).is_err());
}

#[test]
fn parses_names_and_aliases() {
    assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    assert_eq!(" Observer ".parse::<Role>(), Ok(Role::Observer));
    assert_eq!("field-staff".parse::<Role>(), Ok(Role::FieldStaff));
    assert_eq!("fieldStaff".parse::<Role>(), Ok(Role::FieldStaff));
    assert!("voter".parse::<Role>().is_err());
}

#[test]
fn serde_uses_canonical_names() {
    assert_eq!(serde_json::to_string(&Role::FieldStaff).unwrap(), "\"field_staff\"");
    let role: Role = serde_json::from_str("\"field-staff\"").unwrap();
    assert_eq!(role, Role::FieldStaff);
    assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
}

#[test]
fn admin_may_enter_every_prefix() {
    for path in ["/admin", "/observer/reports", "/field-staff/census", "/anything"] {
        assert!(Role::Admin.may_enter(path), "{path}");
    }
}

#[test]
fn observer_limited_to_observer_segment() {
    assert!(Role::Observer.may_enter("/observer"));
    assert!(Role::Observer.may_enter("/observer/incidents"));
    assert!(!Role::Observer.may_enter("/observers"));
    assert!(!Role::Observer.may_enter("/admin/voters"));
    assert!(!Role::Observer.may_enter("/field-staff"));
}

#[test]
fn field_staff_limited_to_field_staff_segment() {
    assert!(Role::FieldStaff.may_enter("/field-staff/households"));
    assert!(!Role::FieldStaff.may_enter("/observer"));
}

#[test]
fn leading_segment_of_root_is_empty() {
    assert_eq!(leading_segment("/"), "");
    assert_eq!(leading_segment(""), "");
    assert_eq!(leading_segment("/admin/voters"), "admin");
}
