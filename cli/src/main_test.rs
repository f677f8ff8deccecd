use access::UserId;

use super::*;

fn observer_json() -> String {
    r#"{"id":5,"name":"Amina","email":"amina@example.org","role":"observer","role_id":2}"#.to_owned()
}

fn unreachable_backend_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

// =============================================================================
// argument parsing
// =============================================================================

#[test]
fn parses_token_mint_arguments() {
    let cli = Cli::try_parse_from(["ballotctl", "token", "mint", "--role", "field-staff", "--format", "jwt"]).unwrap();
    let Command::Token(TokenCommand { command: TokenSubcommand::Mint { role, ttl_secs, format } }) = cli.command else {
        panic!("expected token mint");
    };
    assert_eq!(role, Role::FieldStaff);
    assert_eq!(ttl_secs, 3600);
    assert_eq!(format, TokenFormat::Jwt);
}

#[test]
fn rejects_unknown_token_format() {
    assert!(Cli::try_parse_from(["ballotctl", "token", "inspect", "abc", "--format", "paseto"]).is_err());
}

#[test]
fn parses_guard_check_without_token() {
    let cli = Cli::try_parse_from(["ballotctl", "guard", "check", "/admin"]).unwrap();
    let Command::Guard(GuardCommand { command: GuardSubcommand::Check { path, token, format } }) = cli.command else {
        panic!("expected guard check");
    };
    assert_eq!(path, "/admin");
    assert_eq!(token, None);
    assert_eq!(format, TokenFormat::Compact);
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn resolve_role_defaults_to_user_role() {
    let user: User = serde_json::from_str(&observer_json()).unwrap();
    assert_eq!(resolve_role(&user, None), "observer");
    assert_eq!(resolve_role(&user, Some("  ".into())), "observer");
    assert_eq!(resolve_role(&user, Some("lead-observer".into())), "lead-observer");
}

#[test]
fn describe_decision_reports_location() {
    let guard = RouteGuard::default();
    let observer = SessionClaims::new(Role::Observer, access::unix_now() + 60).encode_unsigned(TokenFormat::Compact);
    let out = describe_decision(&guard.check("/admin/voters", Some(&observer), access::unix_now()));
    assert_eq!(out, json!({"decision": "unauthorized", "location": "/unauthorized", "clears_cookie": false}));

    let out = describe_decision(&guard.check("/login", None, access::unix_now()));
    assert_eq!(out, json!({"decision": "allow", "location": null, "clears_cookie": false}));
}

#[test]
fn describe_claims_marks_expiry() {
    let claims = SessionClaims::new(Role::Admin, 100);
    assert_eq!(describe_claims(&claims, 200)["expired"], json!(true));
    assert_eq!(describe_claims(&claims, 50)["role_id"], json!(1));
}

// =============================================================================
// session commands against a file store
// =============================================================================

#[tokio::test]
async fn login_whoami_logout_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("session.json");
    let backend = unreachable_backend_url();

    let session = open_session(&store, &backend, 2).unwrap();
    assert!(!session.is_logged_in());
    run_login(
        session,
        LoginArgs { token: "tok.sig".into(), user: observer_json(), role: None },
    )
    .unwrap();

    let reloaded = open_session(&store, &backend, 2).unwrap();
    let user = reloaded.user().unwrap();
    assert_eq!(user.id, UserId::Number(5));
    assert_eq!(reloaded.role(), Some("observer"));
    run_whoami(&reloaded, TokenFormat::Compact).unwrap();

    // Remote failure is reported but does not fail the command.
    run_logout(reloaded).await.unwrap();
    assert!(!open_session(&store, &backend, 2).unwrap().is_logged_in());
}

#[test]
fn login_rejects_invalid_user_json() {
    let dir = tempfile::tempdir().unwrap();
    let session = open_session(&dir.path().join("s.json"), "http://127.0.0.1:9/api", 1).unwrap();
    let err = run_login(session, LoginArgs { token: "t".into(), user: "{}".into(), role: None }).unwrap_err();
    assert!(matches!(err, CliError::InvalidUser(_)));
}

#[test]
fn whoami_reports_expiry_for_jwt_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("session.json");
    let token = SessionClaims::new(Role::Observer, access::unix_now() + 600).encode_unsigned(TokenFormat::Jwt);
    let session = open_session(&store, "http://127.0.0.1:9/api", 1).unwrap();
    run_login(session, LoginArgs { token, user: observer_json(), role: None }).unwrap();

    let session = open_session(&store, "http://127.0.0.1:9/api", 1).unwrap();
    let report = whoami_report(&session, TokenFormat::Jwt, access::unix_now()).unwrap();
    assert_eq!(report["expired"], json!(false));
    assert_eq!(report["role"], json!("observer"));

    // A jwt-shaped token does not decode as compact, so expiry is unknown.
    let report = whoami_report(&session, TokenFormat::Compact, access::unix_now()).unwrap();
    assert!(report.get("expired").is_none());
}

#[test]
fn parses_whoami_format() {
    let cli = Cli::try_parse_from(["ballotctl", "whoami", "--format", "jwt"]).unwrap();
    assert!(matches!(cli.command, Command::Whoami { format: TokenFormat::Jwt }));
}
