/// bcrypt-backed password hashing with a fixed work factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialVerifier {
    cost: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed")]
pub struct CredentialError(#[from] bcrypt::BcryptError);

impl CredentialVerifier {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Salted and therefore different on every call.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// A malformed hash is reported exactly like a wrong password.
    pub fn verify(&self, hash: &str, plaintext: &str) -> bool {
        bcrypt::verify(plaintext, hash).unwrap_or(false)
    }
}
