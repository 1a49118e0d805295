use derive_more::Display;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display)]
pub enum Role {
    #[display(fmt = "admin")]
    Admin = 1,
    #[display(fmt = "manager")]
    Manager = 2,
    #[display(fmt = "staff")]
    Staff = 3,
    /// Device account that only scans QR badges.
    #[display(fmt = "kiosk")]
    Kiosk = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Staff),
            4 => Some(Role::Kiosk),
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

    #[test]
    fn test_role_ids_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Staff, Role::Kiosk] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(5), None);
        assert_eq!(Role::Kiosk.to_string(), "kiosk");
    }
}
