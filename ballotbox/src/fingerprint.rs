use crate::*;
use digest::Digest;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Domain tags keep digests of different purposes from ever colliding
const PASSWORD_DOMAIN: &[u8] = b"ballotbox_password";
const OWNER_DOMAIN: &[u8] = b"ballotbox_owner";
const SECRET_KEY_DOMAIN: &[u8] = b"ballotbox_secret_key";

fn sha256(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = sha2::Sha256::new();
    hasher.update(domain);
    for part in parts {
        // Length-prefix each part so ("ab", "c") and ("a", "bc") differ
        hasher.update(&(part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    bytes
}

macro_rules! fingerprint_type {
    ($name:ident) => {
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            pub fn from_bytes(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s.trim()).map_err(|_| Error::FingerprintBadHex)?;
                if bytes.len() != 32 {
                    return Err(Error::FingerprintBadLen);
                }
                let mut array = [0u8; 32];
                array.copy_from_slice(&bytes);
                Ok($name(array))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                FromStr::from_str(&s).map_err(de::Error::custom)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }
    };
}

fingerprint_type!(PasswordHash);
fingerprint_type!(Commitment);

impl PasswordHash {
    /// Digest of an account password
    ///
    /// The national id is mixed in so two accounts sharing a password never share a
    /// stored digest. Callers that only hold the digest (see
    /// [`Election::verify_voter_credentials`]) derive it with this same function.
    pub fn derive(id: NationalId, password: &str) -> Self {
        PasswordHash(sha256(
            PASSWORD_DOMAIN,
            &[&id.to_bytes(), password.as_bytes()],
        ))
    }

    /// Digest of the system owner's secret
    pub fn owner(secret: &str) -> Self {
        PasswordHash(sha256(OWNER_DOMAIN, &[secret.as_bytes()]))
    }
}

impl Commitment {
    /// One-way commitment to a voter's secret key
    pub fn derive(voter: NationalId, secret_key: &str) -> Self {
        Commitment(sha256(
            SECRET_KEY_DOMAIN,
            &[&voter.to_bytes(), secret_key.as_bytes()],
        ))
    }
}
