use crate::*;

/// Input limits applied to every registration form and to the voting window
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub min_name_len: usize,
    pub min_password_len: usize,
    pub min_voting_hours: u64,
    pub max_voting_hours: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            min_name_len: 3,
            min_password_len: 6,
            min_voting_hours: 1,
            max_voting_hours: 168,
        }
    }
}

impl Limits {
    /// A person's name, trimmed
    pub fn person_name(&self, field: &'static str, name: &str) -> Result<String, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyField(field));
        }
        if name.chars().count() < self.min_name_len {
            return Err(Error::NameTooShort {
                field,
                min: self.min_name_len,
            });
        }
        Ok(name.to_owned())
    }

    /// A province, constituency or party name, trimmed
    pub fn label(&self, field: &'static str, label: &str) -> Result<String, Error> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::EmptyField(field));
        }
        Ok(label.to_owned())
    }

    pub fn password(&self, password: &str) -> Result<(), Error> {
        if password.chars().count() < self.min_password_len {
            return Err(Error::PasswordTooShort(self.min_password_len));
        }
        Ok(())
    }

    pub fn secret_key(&self, secret_key: &str) -> Result<(), Error> {
        if secret_key.is_empty() {
            return Err(Error::EmptyField("secret key"));
        }
        Ok(())
    }

    pub fn voting_hours(&self, hours: u64) -> Result<u64, Error> {
        if hours < self.min_voting_hours || hours > self.max_voting_hours {
            return Err(Error::DurationOutOfRange {
                hours,
                min: self.min_voting_hours,
                max: self.max_voting_hours,
            });
        }
        Ok(hours * SECONDS_PER_HOUR)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_limits() {
        let limits = Limits::default();

        assert_eq!(limits.person_name("name", "  Ali Ahmed ").unwrap(), "Ali Ahmed");
        assert!(matches!(
            limits.person_name("name", "Al"),
            Err(Error::NameTooShort { min: 3, .. })
        ));
        assert!(matches!(
            limits.person_name("name", "   "),
            Err(Error::EmptyField("name"))
        ));

        assert_eq!(limits.label("party", " PTI ").unwrap(), "PTI");
        assert!(limits.label("party", "").is_err());

        assert!(limits.password("admin123").is_ok());
        assert!(limits.password("12345").is_err());
        assert!(limits.secret_key("").is_err());

        assert!(limits.voting_hours(0).is_err());
        assert_eq!(limits.voting_hours(1).unwrap(), SECONDS_PER_HOUR);
        assert_eq!(limits.voting_hours(168).unwrap(), 168 * SECONDS_PER_HOUR);
        assert_eq!(
            limits.voting_hours(169).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
