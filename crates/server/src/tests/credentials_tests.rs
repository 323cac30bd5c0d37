use super::*;
use chrono::TimeZone;
use jsonwebtoken::{decode, DecodingKey, Validation};

fn issuer(secret: Option<&str>) -> CredentialIssuer {
    CredentialIssuer::new(IssuerConfig {
        api_key: "devkey".into(),
        api_secret: secret.map(str::to_string),
        default_user_id: "demo-user".into(),
    })
}

#[test]
fn credential_expires_exactly_one_hour_after_issuance() {
    let issuer = issuer(Some("devsecret"));
    for subject in ["demo-user", "alice", "user with spaces", "ünïcødé"] {
        let credential = issuer.issue(Some(subject)).expect("credential");
        assert_eq!(credential.validity(), Duration::seconds(3600));
        assert!(credential.expires_at > credential.issued_at);
        assert_eq!(credential.subject.as_str(), subject);
    }
}

#[test]
fn token_claims_carry_issuer_subject_and_window() {
    let issuer = issuer(Some("devsecret"));
    let now = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap();
    let credential = issuer.issue_at(Some("alice"), now).expect("credential");

    let mut validation = Validation::default();
    validation.validate_exp = false;
    let decoded = decode::<serde_json::Value>(
        &credential.token,
        &DecodingKey::from_secret(b"devsecret"),
        &validation,
    )
    .expect("decode");

    assert_eq!(decoded.claims["iss"], "devkey");
    assert_eq!(decoded.claims["user_id"], "alice");
    assert_eq!(decoded.claims["sub"], "user/alice");
    assert_eq!(decoded.claims["iat"], now.timestamp());
    assert_eq!(decoded.claims["exp"], now.timestamp() + 3600);
    assert!(!credential.is_expired_at(now + Duration::seconds(3599)));
    assert!(credential.is_expired_at(now + Duration::seconds(3600)));
}

#[test]
fn missing_or_blank_subject_falls_back_to_default_identity() {
    let issuer = issuer(Some("devsecret"));
    assert_eq!(
        issuer.issue(None).expect("credential").subject.as_str(),
        "demo-user"
    );
    assert_eq!(
        issuer.issue(Some("  ")).expect("credential").subject.as_str(),
        "demo-user"
    );
}

#[test]
fn missing_secret_is_a_config_error() {
    let issuer = issuer(None);
    assert!(!issuer.is_configured());
    for subject in [None, Some("alice")] {
        let err = issuer.issue(subject).expect_err("no secret");
        assert!(matches!(err, IssueError::Config));
        assert_eq!(err.public_message(), "API_SECRET is not set");
    }
}

#[test]
fn repeated_issues_are_independent() {
    let issuer = issuer(Some("devsecret"));
    let earlier = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let later = earlier + Duration::seconds(10);
    let first = issuer.issue_at(Some("alice"), earlier).expect("first");
    let second = issuer.issue_at(Some("alice"), later).expect("second");
    assert_ne!(first.token, second.token);
    assert_eq!(second.expires_at - first.expires_at, Duration::seconds(10));
}
