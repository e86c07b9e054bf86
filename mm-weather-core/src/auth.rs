//! Slash command token check.

use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// The token Mattermost sends with every callback of one slash command.
///
/// Candidates are compared by HMAC tag, which `verify_slice` checks in constant time.
#[derive(Clone)]
pub struct CommandToken {
    keyed: HmacSha256,
    tag: Vec<u8>,
}

impl CommandToken {
    pub fn new(secret: &str) -> Result<Self, InvalidLength> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())?;
        let tag = keyed
            .clone()
            .chain_update(secret.as_bytes())
            .finalize()
            .into_bytes()
            .to_vec();
        Ok(Self { keyed, tag })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let mut mac = self.keyed.clone();
        mac.update(candidate.as_bytes());
        mac.verify_slice(&self.tag).is_ok()
    }
}

impl fmt::Debug for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommandToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_configured_token() {
        let token = CommandToken::new("s3cret").unwrap();
        assert!(token.matches("s3cret"));
        assert!(!token.matches("s3cre"));
        assert!(!token.matches("s3cret!"));
        assert!(!token.matches(""));
    }

    #[test]
    fn debug_output_hides_token() {
        let token = CommandToken::new("s3cret").unwrap();
        assert!(!format!("{token:?}").contains("s3cret"));
    }
}
