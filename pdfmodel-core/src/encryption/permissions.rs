//! Document permissions (ISO 32000-1 Table 22)

use crate::error::PdfError;
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

/// One grant an encrypted document can allow without the owner password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Permission {
    Print,
    Edit,
    Copy,
    EditNotes,
    FillAndSign,
    Extract,
    FillAndSignExisting,
    Accessibility,
    DocAssembly,
    HighPrintQuality,
}

bitflags! {
    /// A set of [`Permission`]s, one independent bit per grant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Permissions: u16 {
        const PRINT = 1 << 0;
        const EDIT = 1 << 1;
        const COPY = 1 << 2;
        const EDIT_NOTES = 1 << 3;
        const FILL_AND_SIGN = 1 << 4;
        const EXTRACT = 1 << 5;
        const FILL_AND_SIGN_EXISTING = 1 << 6;
        const ACCESSIBILITY = 1 << 7;
        const DOC_ASSEMBLY = 1 << 8;
        const HIGH_PRINT_QUALITY = 1 << 9;
    }
}

/// `/P` bits 1-2 clear, bits 7-8 and 13-32 set.
const P_BASE: u32 = 0xFFFF_F0C0;

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::Print,
        Permission::Edit,
        Permission::Copy,
        Permission::EditNotes,
        Permission::FillAndSign,
        Permission::Extract,
        Permission::FillAndSignExisting,
        Permission::Accessibility,
        Permission::DocAssembly,
        Permission::HighPrintQuality,
    ];

    pub fn flag(self) -> Permissions {
        match self {
            Permission::Print => Permissions::PRINT,
            Permission::Edit => Permissions::EDIT,
            Permission::Copy => Permissions::COPY,
            Permission::EditNotes => Permissions::EDIT_NOTES,
            Permission::FillAndSign => Permissions::FILL_AND_SIGN,
            Permission::Extract => Permissions::EXTRACT,
            Permission::FillAndSignExisting => Permissions::FILL_AND_SIGN_EXISTING,
            Permission::Accessibility => Permissions::ACCESSIBILITY,
            Permission::DocAssembly => Permissions::DOC_ASSEMBLY,
            Permission::HighPrintQuality => Permissions::HIGH_PRINT_QUALITY,
        }
    }

    /// The `/P` bit this grant is stored in.
    pub fn p_bit(self) -> u32 {
        match self {
            Permission::Print => 0x0004,
            Permission::Edit => 0x0008,
            Permission::Copy | Permission::Extract => 0x0010,
            Permission::EditNotes => 0x0020,
            Permission::FillAndSign | Permission::FillAndSignExisting => 0x0100,
            Permission::Accessibility => 0x0200,
            Permission::DocAssembly => 0x0400,
            Permission::HighPrintQuality => 0x0800,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Print => "Print",
            Permission::Edit => "Edit",
            Permission::Copy => "Copy",
            Permission::EditNotes => "EditNotes",
            Permission::FillAndSign => "FillAndSign",
            Permission::Extract => "Extract",
            Permission::FillAndSignExisting => "FillAndSignExisting",
            Permission::Accessibility => "Accessibility",
            Permission::DocAssembly => "DocAssembly",
            Permission::HighPrintQuality => "HighPrintQuality",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        match wanted.to_ascii_lowercase().as_str() {
            "accessible" => return Ok(Permission::Accessibility),
            "highprint" => return Ok(Permission::HighPrintQuality),
            _ => {}
        }
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PdfError::InvalidEncryptOptions(format!("unknown permission '{s}'")))
    }
}

impl Permissions {
    pub fn allows(&self, permission: Permission) -> bool {
        self.contains(permission.flag())
    }

    pub fn grant(&mut self, permission: Permission) {
        self.insert(permission.flag());
    }

    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.allows(*p))
            .collect()
    }

    /// Projects the set onto the signed 32-bit `/P` value.
    pub fn to_p_value(&self) -> i32 {
        let bits = self
            .granted()
            .into_iter()
            .fold(P_BASE, |acc, p| acc | p.p_bit());
        bits as i32
    }

    /// Recovers the set from a `/P` value. Grants that share a bit are both
    /// reported when that bit is set.
    pub fn from_p_value(p: i32) -> Self {
        let bits = p as u32;
        Permission::ALL
            .into_iter()
            .filter(|perm| bits & perm.p_bit() != 0)
            .map(Permission::flag)
            .collect()
    }
}

impl FromIterator<Permission> for Permissions {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Permissions::empty(), |acc, p| acc | p.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_permission_has_its_own_bit() {
        let mut seen = Permissions::empty();
        for p in Permission::ALL {
            assert!(!seen.intersects(p.flag()), "{p} shares a bit");
            seen |= p.flag();
        }
        assert_eq!(seen, Permissions::all());
    }

    #[test]
    fn test_membership_is_exact() {
        let set: Permissions = [Permission::Print, Permission::Copy].into_iter().collect();
        for p in Permission::ALL {
            let expected = matches!(p, Permission::Print | Permission::Copy);
            assert_eq!(set.allows(p), expected, "{p}");
        }
    }

    #[test]
    fn test_p_value_of_empty_set() {
        assert_eq!(Permissions::empty().to_p_value(), 0xFFFF_F0C0u32 as i32);
        assert_eq!(Permissions::empty().to_p_value(), -3904);
    }

    #[test]
    fn test_p_value_bits() {
        let set: Permissions = [Permission::Print, Permission::HighPrintQuality]
            .into_iter()
            .collect();
        let p = set.to_p_value() as u32;
        assert_eq!(p & 0x4, 0x4);
        assert_eq!(p & 0x800, 0x800);
        assert_eq!(p & 0x8, 0);
    }

    #[test]
    fn test_from_p_value_reports_shared_bits() {
        let p = (P_BASE | 0x10) as i32;
        let set = Permissions::from_p_value(p);
        assert!(set.allows(Permission::Copy));
        assert!(set.allows(Permission::Extract));
        assert!(!set.allows(Permission::Print));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("print".parse::<Permission>().unwrap(), Permission::Print);
        assert_eq!(
            "DocAssembly".parse::<Permission>().unwrap(),
            Permission::DocAssembly
        );
        assert_eq!(
            "Accessible".parse::<Permission>().unwrap(),
            Permission::Accessibility
        );
        assert!("Teleport".parse::<Permission>().is_err());
    }
}
