use anyhow::{bail, Context, Result};

/// Hard cap on the token length. Real invest API tokens are well under this;
/// anything longer means the file does not contain a bare token.
pub const MAX_TOKEN_LEN: usize = 128;

/// Bearer token for the invest API, read once per run from a local file.
///
/// Deliberately no `Debug` impl so the token cannot end up in logs.
#[derive(Clone)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Reads the first line of `path` as the token.
    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read token file {path}"))?;
        Self::from_contents(&raw)
            .with_context(|| format!("invalid token file {path}"))
    }

    pub(crate) fn from_contents(raw: &str) -> Result<Self> {
        let token = raw.lines().next().unwrap_or("").trim();
        if token.is_empty() {
            bail!("token file is empty");
        }
        if token.len() > MAX_TOKEN_LEN {
            bail!(
                "token is {} bytes, exceeds the {MAX_TOKEN_LEN} byte limit",
                token.len()
            );
        }
        Ok(Self {
            token: token.to_string(),
        })
    }

    /// Value for the `Authorization` header.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
