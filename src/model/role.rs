use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Role {
    #[strum(serialize = "admin")]
    #[serde(rename = "admin")]
    Admin = 1,
    #[strum(serialize = "HR")]
    #[serde(rename = "HR")]
    Hr = 2,
    #[strum(serialize = "employee")]
    #[serde(rename = "employee")]
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_labels_match_stored_values() {
        assert_eq!(Role::Hr.to_string(), "HR");
        assert_eq!(Role::from_str("employee").unwrap(), Role::Employee);
        assert_eq!(Role::from_id(Role::Admin.id()), Some(Role::Admin));
        assert_eq!(Role::from_id(9), None);
    }
}
