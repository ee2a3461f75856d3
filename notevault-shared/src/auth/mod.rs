/// Authentication and authorization
///
/// - `jwt`: HS256 token creation and validation
/// - `password`: Argon2id hashing and verification
/// - `middleware`: bearer-token resolution to a (user, tenant) identity
/// - `authorization`: explicit capability checks (admin, same-tenant)
pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
