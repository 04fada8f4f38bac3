/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and the registration password policy
/// - [`jwt`]: HS256 token signing and validation
/// - [`tokens`]: password-reset tokens bound to account state
pub mod jwt;
pub mod password;
pub mod tokens;
