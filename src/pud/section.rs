/// The twenty sections of a PUD body, in canonical file order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Section {
    Type = 0,
    Ver,
    Desc,
    Ownr,
    Era,
    Erax,
    Dim,
    Udta,
    Alow,
    Ugrd,
    Side,
    Sgld,
    Slbr,
    Soil,
    Aipl,
    Mtxm,
    Sqm,
    Oilm,
    Regm,
    Unit,
}

const TAGS: [&[u8; 4]; Section::COUNT] = [
    b"TYPE", b"VER ", b"DESC", b"OWNR", b"ERA ",
    b"ERAX", b"DIM ", b"UDTA", b"ALOW", b"UGRD",
    b"SIDE", b"SGLD", b"SLBR", b"SOIL", b"AIPL",
    b"MTXM", b"SQM ", b"OILM", b"REGM", b"UNIT",
];

impl Section {
    pub const COUNT: usize = 20;

    pub const ALL: [Section; Section::COUNT] = [
        Section::Type, Section::Ver, Section::Desc, Section::Ownr, Section::Era,
        Section::Erax, Section::Dim, Section::Udta, Section::Alow, Section::Ugrd,
        Section::Side, Section::Sgld, Section::Slbr, Section::Soil, Section::Aipl,
        Section::Mtxm, Section::Sqm, Section::Oilm, Section::Regm, Section::Unit,
    ];

    /// The exact four bytes of the on-disk tag, including padding spaces.
    pub fn tag(self) -> &'static [u8; 4] {
        TAGS[self as usize]
    }

    /// The tag as printable text, trailing padding trimmed.
    pub fn name(self) -> &'static str {
        // The table only holds ASCII.
        core::str::from_utf8(self.tag()).unwrap().trim_end()
    }

    pub fn from_tag(tag: &[u8; 4]) -> Option<Section> {
        Section::ALL.iter().copied().find(|sec| sec.tag() == tag)
    }

    /// ERAX and ALOW may legally be missing from a map.
    pub fn is_optional(self) -> bool {
        matches!(self, Section::Erax | Section::Alow)
    }

    pub(crate) fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for sec in Section::ALL {
            assert_eq!(Section::from_tag(sec.tag()), Some(sec));
        }
        assert_eq!(Section::from_tag(b"XXXX"), None);
        assert_eq!(Section::from_tag(b"era "), None);
    }

    #[test]
    fn names_drop_padding() {
        assert_eq!(Section::Era.name(), "ERA");
        assert_eq!(Section::Mtxm.name(), "MTXM");
        assert_eq!(Section::Sqm.name(), "SQM");
    }

    #[test]
    fn only_erax_and_alow_are_optional() {
        let optional: Vec<_> = Section::ALL.into_iter().filter(|s| s.is_optional()).collect();
        assert_eq!(optional, [Section::Erax, Section::Alow]);
    }
}
