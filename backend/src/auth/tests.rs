use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};

const SECRET: &str = "supersecretjwtsecretforunittesting123";

fn token_for(claims: &AccessClaims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn claims(role: &str, exp: usize) -> AccessClaims {
    AccessClaims {
        sub: "123e4567-e89b-12d3-a456-426614174000".to_string(),
        role: role.to_string(),
        email: Some("member@example.com".to_string()),
        exp,
    }
}

#[test]
fn test_validate_access_token_success() {
    let my_claims = claims("admin", 9999999999);
    let token = token_for(&my_claims, SECRET);

    let decoded = validate_access_token(&token, SECRET).expect("Valid token should pass");
    assert_eq!(decoded.sub, my_claims.sub);
    assert_eq!(decoded.role, "admin");
    assert_eq!(decoded.email, my_claims.email);
}

#[test]
fn test_validate_access_token_expired() {
    let token = token_for(&claims("user", 1), SECRET);

    assert!(validate_access_token(&token, SECRET).is_err());
}

#[test]
fn test_validate_access_token_invalid_signature() {
    let token = token_for(&claims("user", 9999999999), "wrongsecret");

    assert!(validate_access_token(&token, SECRET).is_err());
}

#[test]
fn test_ensure_admin_rejects_members() {
    let member = AuthUser {
        user_id: Uuid::new_v4(),
        email: None,
        role: UserRole::User,
    };
    let admin = AuthUser {
        role: UserRole::Admin,
        ..member.clone()
    };

    assert!(matches!(
        member.ensure_admin(),
        Err(UseCaseError::Forbidden(_))
    ));
    assert!(admin.ensure_admin().is_ok());
}
