use crate::logger;
use crate::utils::errors::IdentityError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Who this client plays as. Built once at session start and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    game_code: String,
    username: String,
    player_id: String,
}

impl ClientIdentity {
    pub fn new(game_code: impl Into<String>, username: impl Into<String>) -> Self {
        let game_code = game_code.into();
        let username = username.into();
        let player_id = format!("{game_code}_{username}");
        Self {
            game_code,
            username,
            player_id,
        }
    }

    pub fn game_code(&self) -> &str {
        &self.game_code
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct StoredIdentity {
    game_code: String,
    username: String,
}

/// Persists the joined game between runs of the client.
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the stored identity.
    ///
    /// # Returns
    /// * `Ok(ClientIdentity)` - The identity saved by the last `create` or `join`.
    /// * `Err(IdentityError::Missing)` - Nothing was saved, or the saved values are blank.
    pub fn load(&self) -> Result<ClientIdentity, IdentityError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return Err(IdentityError::Missing)
            }
            Err(error) => return Err(error.into()),
        };

        let stored: StoredIdentity = serde_json::from_str(&raw)?;
        if stored.game_code.is_empty() || stored.username.is_empty() {
            return Err(IdentityError::Missing);
        }

        Ok(ClientIdentity::new(stored.game_code, stored.username))
    }

    pub fn save(&self, identity: &ClientIdentity) -> Result<(), IdentityError> {
        let stored = StoredIdentity {
            game_code: identity.game_code().to_string(),
            username: identity.username().to_string(),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        logger!(
            DEBUG,
            "[IDENTITY] Saved `{}` to `{}`",
            identity.player_id(),
            self.path.display()
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<(), IdentityError> {
        match fs::remove_file(&self.path) {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}
