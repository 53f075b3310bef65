/// API key pair used to sign requests
#[derive(Clone)]
pub(crate) struct Credentials {
    pub(crate) secret_id: String,
    pub(crate) secret_key: String,

    /// Set only for temporary credentials
    pub(crate) token: Option<String>,
}

impl Credentials {
    pub(crate) fn new(secret_id: &str, secret_key: &str, token: Option<&str>) -> Self {
        Credentials {
            secret_id: secret_id.to_string(),
            secret_key: secret_key.to_string(),
            token: token.map(|t| t.to_string()),
        }
    }

    /// Both parts of the key pair are presented
    pub(crate) fn is_valid(&self) -> bool {
        !self.secret_id.is_empty() && !self.secret_key.is_empty()
    }
}

/// Never print the secret key, even in debug logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &mask(&self.secret_key))
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Keep the last four characters, enough to tell keys apart
pub(crate) fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();

    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - 4))
}
